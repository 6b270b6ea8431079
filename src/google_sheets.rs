use anyhow::{anyhow, Context, Result};
use log::{info, warn};
use reqwest::header::CONTENT_TYPE;
use url::form_urlencoded;

pub const DEFAULT_SHEET_NAME: &str = "Form Responses 1";

fn is_valid_sheet_id(id: &str) -> bool {
    if id.len() < 2 || id == "edit" {
        return false;
    }

    let mut chars = id.chars();
    if let Some(first_char) = chars.next() {
        if !first_char.is_alphanumeric() {
            return false;
        }
    } else {
        return false;
    }

    id.chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
}

/// A published response sheet and the tab to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetSource {
    sheet_id: String,
    sheet_name: String,
}

impl SheetSource {
    /// Accept a full `docs.google.com/spreadsheets/d/<id>/...` link or a bare
    /// spreadsheet id.
    pub fn from_input(input: &str, sheet_name: Option<&str>) -> Result<Self> {
        let sheet_id = Self::extract_sheet_id(input)?;
        let sheet_name = sheet_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_SHEET_NAME)
            .to_string();
        Ok(Self {
            sheet_id,
            sheet_name,
        })
    }

    pub fn sheet_id(&self) -> &str {
        &self.sheet_id
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    pub fn extract_sheet_id(input: &str) -> Result<String> {
        let input = input.trim();
        if input.is_empty() {
            anyhow::bail!("Empty spreadsheet link or id");
        }

        let url = match url::Url::parse(input) {
            Ok(url) => url,
            Err(_) if is_valid_sheet_id(input) => return Ok(input.to_string()),
            Err(err) => {
                return Err(err).context(format!("Invalid Google Sheets URL or id: {}", input))
            }
        };

        if url.host_str() != Some("docs.google.com") {
            anyhow::bail!(
                "URL must be from docs.google.com, got: {}",
                url.host_str().unwrap_or("unknown")
            );
        }

        let path = url.path();
        if let Some(start) = path.find("/spreadsheets/d/") {
            let id_start = start + 16;
            let rest = &path[id_start..];
            let sheet_id = rest.split('/').next().unwrap_or("");
            if sheet_id.is_empty() || !is_valid_sheet_id(sheet_id) {
                anyhow::bail!("Invalid or empty spreadsheet ID in URL: {}", url);
            }
            return Ok(sheet_id.to_string());
        }

        anyhow::bail!(
            "Could not extract spreadsheet ID from URL - path should contain '/spreadsheets/d/': {}",
            url
        )
    }

    /// CSV endpoints, most specific first: the named tab through the
    /// visualization API, the whole-sheet export, then the published copy.
    pub fn export_urls(&self) -> Vec<String> {
        let encoded_name: String = form_urlencoded::byte_serialize(self.sheet_name.as_bytes())
            .collect::<String>()
            .replace('+', "%20");
        let base = format!("https://docs.google.com/spreadsheets/d/{}", self.sheet_id);

        vec![
            format!("{}/gviz/tq?tqx=out:csv&sheet={}", base, encoded_name),
            format!("{}/export?format=csv", base),
            format!("{}/pub?output=csv", base),
        ]
    }

    /// Try every endpoint in order and return the first usable CSV body.
    /// When all of them fail, the error carries the last cause.
    pub fn fetch_csv(&self) -> Result<String> {
        let mut last_error: Option<anyhow::Error> = None;

        for url in self.export_urls() {
            info!("Attempting to fetch from: {}", url);
            match fetch_endpoint(&url) {
                Ok(body) => {
                    info!("Successfully fetched from {}", url);
                    return Ok(body);
                }
                Err(err) => {
                    warn!("Fetch failed for {}: {:#}", url, err);
                    last_error = Some(err);
                }
            }
        }

        let cause = last_error.unwrap_or_else(|| anyhow!("Unknown network error"));
        Err(cause.context(format!(
            "Failed to load Google Sheet {} from any endpoint",
            self.sheet_id
        )))
    }
}

fn fetch_endpoint(url: &str) -> Result<String> {
    let response = reqwest::blocking::get(url)
        .with_context(|| format!("Failed to fetch Google Sheets CSV from: {}", url))?;

    if !response.status().is_success() {
        anyhow::bail!(
            "HTTP error {}: Failed to fetch Google Sheets data",
            response.status()
        );
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let body = response
        .text()
        .context("Failed to read response body as text")?;

    validate_csv_payload(content_type.as_deref(), &body)?;
    Ok(body)
}

/// Reject login pages and payloads that cannot be a table.
pub fn validate_csv_payload(content_type: Option<&str>, body: &str) -> Result<()> {
    if content_type.is_some_and(|ct| ct.to_ascii_lowercase().contains("text/html")) {
        anyhow::bail!("Sheet is likely private (received HTML login page instead of CSV)");
    }

    if body.is_empty() || !(body.contains(',') || body.contains('\n')) {
        anyhow::bail!("Response is not CSV: expected comma or newline separated rows");
    }

    Ok(())
}
