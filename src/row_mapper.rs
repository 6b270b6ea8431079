use crate::dataset::DatasetAssembler;
use crate::extractors::{extract_all_drive_ids, normalize_date_at};
use crate::field_resolver::FieldResolver;
use crate::mapping_config::MappingConfig;
use crate::model::{CampaignResponse, MediaKind};
use crate::raw_row::{normalize_cell, RawRow};
use chrono::{DateTime, Utc};
use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet};

/// A mapped row before dataset assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedRow {
    pub index: usize,
    pub response: CampaignResponse,
    /// A name, location or message was actually found in the row, before
    /// placeholders were substituted.
    pub has_content: bool,
    /// Headers whose cells supplied photo or video identifiers.
    pub media_columns: Vec<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MappingStats {
    pub total_rows: usize,
    pub dropped_rows: usize,
    pub fallback_dates: usize,
    pub photos: usize,
    pub videos: usize,
    /// Headers that supplied media in at least one row.
    pub media_columns: BTreeSet<String>,
    /// Headers that landed in `extra_fields` in at least one row.
    pub extra_columns: BTreeSet<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RowMapper {
    config: MappingConfig,
}

impl RowMapper {
    pub fn new(config: MappingConfig) -> Self {
        Self { config }
    }

    /// Map and assemble a whole sheet.
    pub fn map_rows(&self, rows: &[RawRow]) -> Vec<CampaignResponse> {
        self.map_rows_with_stats(rows).0
    }

    pub fn map_rows_with_stats(&self, rows: &[RawRow]) -> (Vec<CampaignResponse>, MappingStats) {
        self.map_rows_at(rows, Utc::now())
    }

    /// Map a sheet using `now` as the fallback instant for every row whose
    /// date cannot be read.
    pub fn map_rows_at(
        &self,
        rows: &[RawRow],
        now: DateTime<Utc>,
    ) -> (Vec<CampaignResponse>, MappingStats) {
        if let Some(first) = rows.first() {
            info!("Headers detected: {}", first.headers().join(", "));
        }

        let mut stats = MappingStats::default();
        let mut mapped = Vec::with_capacity(rows.len());

        for (index, row) in rows.iter().enumerate() {
            let mapped_row = self.map_row_at(row, index, now);
            stats.total_rows += 1;
            if !mapped_row.response.date_parsed {
                stats.fallback_dates += 1;
            }
            if mapped_row.has_content {
                stats.photos += mapped_row.response.photo_urls.len();
                stats.videos += mapped_row.response.video_urls.len();
                stats
                    .extra_columns
                    .extend(mapped_row.response.extra_fields.keys().cloned());
                stats
                    .media_columns
                    .extend(mapped_row.media_columns.iter().cloned());
            }
            mapped.push(mapped_row);
        }

        let responses = DatasetAssembler::assemble(mapped);
        stats.dropped_rows = stats.total_rows - responses.len();
        info!("Parsed {} valid rows", responses.len());

        (responses, stats)
    }

    pub fn map_row(&self, row: &RawRow, index: usize) -> MappedRow {
        self.map_row_at(row, index, Utc::now())
    }

    pub fn map_row_at(&self, row: &RawRow, index: usize, now: DateTime<Utc>) -> MappedRow {
        let config = &self.config;
        let aliases = &config.aliases;
        let mut resolver = FieldResolver::new(row);

        let raw_date = resolver.resolve_value(&aliases.date);
        let date = normalize_date_at(raw_date, now);
        if !date.parsed {
            debug!("Row {}: unreadable date '{}', using current time", index, raw_date);
        }

        let name = resolver.resolve_value(&aliases.name);

        let mut places: Vec<&str> = Vec::new();
        let primary_place = resolver.resolve_value(&aliases.location);
        if !primary_place.is_empty() {
            places.push(primary_place);
        }
        for extra in &config.extra_places {
            if let Some(column) = resolver.resolve_exact(extra) {
                if !column.value.is_empty() && !column.value.eq_ignore_ascii_case("na") {
                    places.push(column.value);
                }
            }
        }
        let location = places.join(", ");

        let message = resolver.resolve_value(&aliases.message);
        let staff_involved = resolver.resolve_value(&aliases.staff_involved);
        let pamphlets_used = resolver.resolve_value(&aliases.pamphlets_used);

        let mut photo_ids: Vec<String> = Vec::new();
        let mut video_ids: Vec<String> = Vec::new();
        let mut media_columns: Vec<String> = Vec::new();
        for (idx, header, value) in resolver.unconsumed() {
            let ids = extract_all_drive_ids(value);
            if ids.is_empty() {
                continue;
            }
            resolver.consume(idx);
            media_columns.push(header.to_string());
            match config.media_kind(resolver.normalized_header(idx)) {
                MediaKind::Video => video_ids.extend(ids),
                MediaKind::Photo => photo_ids.extend(ids),
            }
        }

        let photo_urls = media_urls(config, MediaKind::Photo, photo_ids);
        let video_urls = media_urls(config, MediaKind::Video, video_ids);

        let sentiment = config.sentiment().classify_response(message, &location);

        let mut extra_fields: BTreeMap<String, String> = BTreeMap::new();
        for (idx, header, value) in resolver.unconsumed() {
            if normalize_cell(value).is_empty()
                || config.is_ignored_header(resolver.normalized_header(idx))
            {
                continue;
            }
            let key = extra_field_key(&extra_fields, header);
            extra_fields.insert(key, value.to_string());
        }

        let has_content = !name.is_empty() || !location.is_empty() || !message.is_empty();

        let date_of_drive = if raw_date.is_empty() {
            date.timestamp.format("%Y-%m-%d").to_string()
        } else {
            raw_date.to_string()
        };

        let response = CampaignResponse {
            id: format!("row-{}", index),
            timestamp: date.timestamp,
            date_parsed: date.parsed,
            date_of_drive,
            name: non_empty_or(name, &config.name_placeholder),
            location: non_empty_or(&location, &config.location_placeholder),
            message: message.to_string(),
            staff_involved: staff_involved.to_string(),
            pamphlets_used: pamphlets_used.to_string(),
            photo_urls,
            video_urls,
            sentiment,
            extra_fields,
        };

        MappedRow {
            index,
            response,
            has_content,
            media_columns,
        }
    }
}

/// Map with the built-in column aliases.
pub fn map_rows(rows: &[RawRow]) -> Vec<CampaignResponse> {
    RowMapper::default().map_rows(rows)
}

fn non_empty_or(value: &str, placeholder: &str) -> String {
    if value.is_empty() {
        placeholder.to_string()
    } else {
        value.to_string()
    }
}

/// `header`, or `header_1`, `header_2`, ... when an earlier column already
/// used that name.
fn extra_field_key(fields: &BTreeMap<String, String>, header: &str) -> String {
    if !fields.contains_key(header) {
        return header.to_string();
    }
    (1..)
        .map(|n| format!("{}_{}", header, n))
        .find(|candidate| !fields.contains_key(candidate))
        .unwrap_or_else(|| header.to_string())
}

fn media_urls(config: &MappingConfig, kind: MediaKind, ids: Vec<String>) -> Vec<String> {
    let mut seen: BTreeSet<String> = BTreeSet::new();
    ids.into_iter()
        .filter(|id| seen.insert(id.clone()))
        .map(|id| config.media_url(kind, &id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Sentiment;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 1, 9, 0, 0).unwrap()
    }

    fn map(pairs: &[(&str, &str)]) -> MappedRow {
        RowMapper::default().map_row_at(&RawRow::from_pairs(pairs.iter().copied()), 3, now())
    }

    #[test]
    fn appends_extra_places_and_skips_na() {
        let row = map(&[
            ("Place 1", "Pune"),
            ("Place 2", "NA"),
            ("Place 3", "Hadapsar"),
        ]);
        assert_eq!(row.response.location, "Pune, Hadapsar");
        assert!(row.response.extra_fields.is_empty());
    }

    #[test]
    fn extra_place_becomes_location_when_primary_missing() {
        let row = map(&[("Place 1", ""), ("place2", "Kothrud")]);
        assert_eq!(row.response.location, "Kothrud");
    }

    #[test]
    fn placeholders_do_not_count_as_content() {
        let row = map(&[("Notes", "just checking")]);
        assert!(!row.has_content);
        assert_eq!(row.response.name, "Unknown Incharge");
        assert_eq!(row.response.location, "Not Specified");
        assert_eq!(row.response.id, "row-3");
        assert_eq!(
            row.response.extra_fields.get("Notes").map(String::as_str),
            Some("just checking")
        );
    }

    #[test]
    fn whole_media_column_goes_to_one_bucket() {
        let row = map(&[
            ("Name", "Asha"),
            ("Movie Upload", "id=V1, https://example.com/d/V2/view"),
            ("Photos", "id=P1\nid=V1"),
        ]);
        assert_eq!(
            row.response.video_urls,
            vec![
                "https://drive.google.com/file/d/V1/preview",
                "https://drive.google.com/file/d/V2/preview"
            ]
        );
        assert_eq!(
            row.response.photo_urls,
            vec![
                "https://lh3.googleusercontent.com/d/P1",
                "https://lh3.googleusercontent.com/d/V1"
            ]
        );
        assert_eq!(row.media_columns, vec!["Movie Upload", "Photos"]);
    }

    #[test]
    fn photo_ids_deduplicated_across_columns() {
        let row = map(&[
            ("Name", "Asha"),
            ("Upload 1", "id=P1 id=P2"),
            ("Upload 2", "id=P2 id=P3"),
        ]);
        assert_eq!(row.response.photo_urls.len(), 3);
        assert!(row.response.photo_urls[2].ends_with("/P3"));
    }

    #[test]
    fn semantic_columns_are_not_scanned_for_media() {
        let row = map(&[("Any Remark", "see id=ABC"), ("Name", "Asha")]);
        assert_eq!(row.response.message, "see id=ABC");
        assert!(row.response.photo_urls.is_empty());
    }

    #[test]
    fn timestamp_column_and_blank_cells_are_not_extras() {
        let row = map(&[
            ("Timestamp", "1/1/2024 10:00:00"),
            ("Name", "Asha"),
            ("Vehicle", "  "),
            ("Volunteers", "12"),
        ]);
        let keys: Vec<&str> = row.response.extra_fields.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Volunteers"]);
    }

    #[test]
    fn duplicate_headers_get_numbered_extra_keys() {
        let row = map(&[
            ("Name", "Asha"),
            ("Notes", "first"),
            ("Notes", "second"),
            ("Notes_1", "third"),
        ]);
        let extras = &row.response.extra_fields;
        assert_eq!(extras.len(), 3);
        assert_eq!(extras.get("Notes").map(String::as_str), Some("first"));
        assert_eq!(extras.get("Notes_1").map(String::as_str), Some("second"));
        assert_eq!(extras.get("Notes_1_1").map(String::as_str), Some("third"));
    }

    #[test]
    fn missing_date_uses_fallback_and_its_day() {
        let row = map(&[("Name", "Asha")]);
        assert!(!row.response.date_parsed);
        assert_eq!(row.response.timestamp, now());
        assert_eq!(row.response.date_of_drive, "2030-01-01");
    }

    #[test]
    fn raw_date_text_is_kept_for_display() {
        let row = map(&[("Date of Drive", " 05/03/2024 "), ("Name", "Asha")]);
        assert!(row.response.date_parsed);
        assert_eq!(row.response.date_of_drive, "05/03/2024");
    }

    #[test]
    fn sentiment_reads_message_and_location() {
        let row = map(&[("Name", "Asha"), ("Place", "Stuck Road"), ("Remark", "")]);
        assert_eq!(row.response.sentiment, Sentiment::Negative);
    }

    #[test]
    fn stats_count_rows_media_and_fallbacks() {
        let rows = vec![
            RawRow::from_pairs([("Date", "2024-02-01"), ("Name", "A"), ("Photo", "id=P1")]),
            RawRow::from_pairs([("Date", "soon"), ("Name", "B"), ("Video", "id=V1")]),
            RawRow::from_pairs([("Date", ""), ("Other", "x")]),
        ];
        let (responses, stats) = RowMapper::default().map_rows_at(&rows, now());
        assert_eq!(responses.len(), 2);
        assert_eq!(stats.total_rows, 3);
        assert_eq!(stats.dropped_rows, 1);
        assert_eq!(stats.fallback_dates, 2);
        assert_eq!(stats.photos, 1);
        assert_eq!(stats.videos, 1);
        assert!(stats.media_columns.contains("Video"));
        assert!(stats.extra_columns.is_empty());
    }
}
