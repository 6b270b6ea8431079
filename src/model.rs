use crate::extractors::format_timestamp;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which bucket a media column feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    Video,
}

/// One normalized sheet row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignResponse {
    /// `row-<index>`, only stable within a single run.
    pub id: String,
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    /// False when `timestamp` is the "now" fallback for a missing or
    /// unreadable date.
    pub date_parsed: bool,
    pub date_of_drive: String,
    pub name: String,
    pub location: String,
    pub message: String,
    pub staff_involved: String,
    pub pamphlets_used: String,
    pub photo_urls: Vec<String>,
    pub video_urls: Vec<String>,
    pub sentiment: Sentiment,
    /// Every non-empty column not claimed by a typed field or by media.
    pub extra_fields: BTreeMap<String, String>,
}

impl CampaignResponse {
    pub fn has_media(&self) -> bool {
        !self.photo_urls.is_empty() || !self.video_urls.is_empty()
    }
}

fn serialize_timestamp<S>(timestamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_timestamp(timestamp))
}
