use crate::model::{CampaignResponse, Sentiment};
use crate::row_mapper::MappedRow;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use csv::Writer;
use log::debug;
use std::cmp::Ordering;
use std::io::Write;

const DIGEST_LIMIT: usize = 20_000;
const DIGEST_TRUNCATION_SUFFIX: &str = "...(truncated)";

pub struct DatasetAssembler;

impl DatasetAssembler {
    /// Drop rows with no name, location or message and order the rest most
    /// recent first. Rows whose date fell back to "now" go last, in sheet
    /// order.
    pub fn assemble(rows: Vec<MappedRow>) -> Vec<CampaignResponse> {
        let mut kept: Vec<MappedRow> = rows
            .into_iter()
            .filter(|row| {
                if !row.has_content {
                    debug!("Dropping row {}: no name, location or message", row.index);
                }
                row.has_content
            })
            .collect();

        kept.sort_by(|a, b| {
            compare_recent_first(&a.response, &b.response).then(a.index.cmp(&b.index))
        });

        kept.into_iter().map(|row| row.response).collect()
    }
}

fn compare_recent_first(a: &CampaignResponse, b: &CampaignResponse) -> Ordering {
    match (a.date_parsed, b.date_parsed) {
        (true, true) => b.timestamp.cmp(&a.timestamp),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => Ordering::Equal,
    }
}

/// Client-side view filter. Every criterion left unset matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    /// Inclusive, compared against the UTC date of `timestamp`.
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Case-insensitive substring of name, message or location.
    pub search_query: String,
    pub has_media: bool,
}

impl FilterState {
    pub fn matches(&self, response: &CampaignResponse) -> bool {
        let day = response.timestamp.date_naive();
        if self.start_date.is_some_and(|start| day < start) {
            return false;
        }
        if self.end_date.is_some_and(|end| day > end) {
            return false;
        }

        let query = self.search_query.trim().to_lowercase();
        if !query.is_empty() {
            let found = [&response.name, &response.message, &response.location]
                .iter()
                .any(|field| field.to_lowercase().contains(&query));
            if !found {
                return false;
            }
        }

        !self.has_media || response.has_media()
    }

    pub fn apply<'a>(&self, responses: &'a [CampaignResponse]) -> Vec<&'a CampaignResponse> {
        responses.iter().filter(|r| self.matches(r)).collect()
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DatasetSummary {
    pub total: usize,
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
    pub photos: usize,
    pub videos: usize,
    pub with_media: usize,
    pub undated: usize,
}

impl DatasetSummary {
    pub fn from_responses<'a, I>(responses: I) -> Self
    where
        I: IntoIterator<Item = &'a CampaignResponse>,
    {
        let mut summary = Self::default();
        for response in responses {
            summary.total += 1;
            match response.sentiment {
                Sentiment::Positive => summary.positive += 1,
                Sentiment::Neutral => summary.neutral += 1,
                Sentiment::Negative => summary.negative += 1,
            }
            summary.photos += response.photo_urls.len();
            summary.videos += response.video_urls.len();
            if response.has_media() {
                summary.with_media += 1;
            }
            if !response.date_parsed {
                summary.undated += 1;
            }
        }
        summary
    }
}

pub fn write_json<W: Write>(writer: W, responses: &[&CampaignResponse]) -> Result<()> {
    let mut writer = writer;
    serde_json::to_writer_pretty(&mut writer, responses)
        .context("Failed to serialize responses as JSON")?;
    writeln!(writer)?;
    Ok(())
}

/// Flat table, one record per line. Media cells use `|` between URLs.
pub fn write_csv<W: Write>(writer: W, responses: &[&CampaignResponse]) -> Result<()> {
    let mut writer = Writer::from_writer(writer);

    writer.write_record([
        "Date",
        "Campaign Incharge",
        "Place",
        "Staff",
        "Pamphlets",
        "Remark",
        "Sentiment",
        "Photos",
        "Videos",
    ])?;

    for response in responses {
        let photos = response.photo_urls.join("|");
        let videos = response.video_urls.join("|");
        writer.write_record([
            response.date_of_drive.as_str(),
            response.name.as_str(),
            response.location.as_str(),
            response.staff_involved.as_str(),
            response.pamphlets_used.as_str(),
            response.message.as_str(),
            response.sentiment.as_str(),
            photos.as_str(),
            videos.as_str(),
        ])?;
    }

    writer.flush().context("Failed to write CSV output")?;
    Ok(())
}

/// Text block for a summarization prompt: one `- <day>: <message> (<sentiment>)`
/// line per response, cut at 20 000 characters.
pub fn analysis_digest(responses: &[&CampaignResponse]) -> String {
    let digest = responses
        .iter()
        .map(|r| {
            format!(
                "- {}: {} ({})",
                r.timestamp.format("%Y-%m-%d"),
                r.message,
                r.sentiment
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    match digest.char_indices().nth(DIGEST_LIMIT) {
        Some((cut, _)) => format!("{}{}", &digest[..cut], DIGEST_TRUNCATION_SUFFIX),
        None => digest,
    }
}
