use anyhow::{Context, Result};
use csv::{Reader, ReaderBuilder};
use encoding_rs::WINDOWS_1252;
use log::debug;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Spreadsheet error literals read as empty cells.
pub(crate) fn normalize_cell(value: &str) -> &str {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("#value!") {
        ""
    } else {
        trimmed
    }
}

fn contains_mojibake_markers(value: &str) -> bool {
    value.chars().any(|c| {
        matches!(
            c,
            'Ã' | 'â'
                | '€'
                | '™'
                | 'œ'
                | 'Â'
                | 'Î'
                | '¢'
                | '‰'
                | 'Š'
                | 'ž'
                | '¡'
                | '«'
                | '»'
                | 'š'
                | '‚'
                | '„'
                | '¬'
        )
    })
}

/// Undo UTF-8 text that was decoded as Windows-1252 somewhere upstream.
fn fix_common_mojibake(value: &str) -> Option<String> {
    if !contains_mojibake_markers(value) {
        return None;
    }

    let (encoded, _, encode_had_errors) = WINDOWS_1252.encode(value);
    if encode_had_errors {
        return None;
    }

    match String::from_utf8(encoded.into_owned()) {
        Ok(decoded) if decoded != value && !contains_mojibake_markers(&decoded) => Some(decoded),
        _ => None,
    }
}

pub(crate) fn sanitize_cell(value: &str) -> String {
    let mut cleaned = value.replace('\u{00A0}', " ");
    if let Some(decoded) = fix_common_mojibake(&cleaned) {
        cleaned = decoded;
    }

    if normalize_cell(&cleaned).is_empty() {
        String::new()
    } else {
        cleaned
    }
}

/// One sheet row: headers paired with cell values, in column order.
///
/// Header names are whatever the export produced. Duplicate headers are
/// kept as separate columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    headers: Vec<String>,
    values: Vec<String>,
}

impl RawRow {
    /// Pair headers with values. Missing trailing values read as empty and
    /// values without a header are dropped.
    pub fn new(headers: Vec<String>, mut values: Vec<String>) -> Self {
        if values.len() > headers.len() {
            debug!(
                "Dropping {} cell(s) without a header",
                values.len() - headers.len()
            );
        }
        values.resize(headers.len(), String::new());
        Self { headers, values }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let (headers, values) = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .unzip();
        Self { headers, values }
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// First column with exactly this header.
    pub fn get(&self, header: &str) -> Option<&str> {
        self.headers
            .iter()
            .position(|h| h == header)
            .and_then(|i| self.values.get(i).map(|s| s.as_str()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(String::as_str))
    }

    pub(crate) fn value_at(&self, index: usize) -> &str {
        self.values.get(index).map(String::as_str).unwrap_or("")
    }

    /// True when every cell is empty after trimming.
    pub fn is_blank(&self) -> bool {
        self.values.iter().all(|v| normalize_cell(v).is_empty())
    }
}

/// Parse CSV text into rows.
///
/// With `has_headers == false` columns are named `column_1`, `column_2`, ...
/// Rows whose cells are all empty are skipped.
pub fn parse_csv_text(text: &str, has_headers: bool) -> Result<Vec<RawRow>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(has_headers)
        .flexible(true)
        .from_reader(text.as_bytes());
    read_rows(&mut reader, has_headers)
}

pub fn read_csv_file<P: AsRef<Path>>(path: P) -> Result<Vec<RawRow>> {
    let file = File::open(&path)
        .with_context(|| format!("Failed to open input file {}", path.as_ref().display()))?;
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(file);
    read_rows(&mut reader, true)
}

pub(crate) fn read_rows<R: Read>(reader: &mut Reader<R>, has_headers: bool) -> Result<Vec<RawRow>> {
    let mut headers: Vec<String> = if has_headers {
        reader
            .headers()
            .context("Failed to read CSV header row")?
            .iter()
            .map(|h| sanitize_cell(h.trim_start_matches('\u{feff}')).trim().to_string())
            .collect()
    } else {
        Vec::new()
    };

    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for (row_idx, result) in reader.records().enumerate() {
        let record =
            result.with_context(|| format!("Failed to parse CSV record {}", row_idx + 1))?;
        let values: Vec<String> = record.iter().map(sanitize_cell).collect();

        if !has_headers && values.len() > headers.len() {
            headers.extend((headers.len()..values.len()).map(|i| format!("column_{}", i + 1)));
        }

        let row = RawRow::new(headers.clone(), values);
        if row.is_blank() {
            skipped += 1;
            continue;
        }
        rows.push(row);
    }

    if skipped > 0 {
        debug!("Skipped {} empty CSV line(s)", skipped);
    }

    Ok(rows)
}
