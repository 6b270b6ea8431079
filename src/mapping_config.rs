use crate::extractors::SentimentClassifier;
use crate::field_resolver::normalize_header;
use crate::model::MediaKind;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::sync::OnceLock;

/// The built-in mapping settings. [`MappingConfig::default`] is read from
/// this file, so every default lives here and nowhere else.
pub const DEFAULT_TOML_STR: &str = include_str!("mapping_defaults.toml");

const ID_PLACEHOLDER: &str = "{id}";

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct AliasSection {
    date: Option<Vec<String>>,
    name: Option<Vec<String>>,
    location: Option<Vec<String>>,
    message: Option<Vec<String>>,
    staff_involved: Option<Vec<String>>,
    pamphlets_used: Option<Vec<String>>,
    extra_places: Option<Vec<String>>,
    ignored_headers: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct MediaSection {
    video_keywords: Option<Vec<String>>,
    photo_url_template: Option<String>,
    video_url_template: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SentimentSection {
    positive: Option<Vec<String>>,
    negative: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct PlaceholderSection {
    name: Option<String>,
    location: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct MappingFile {
    aliases: AliasSection,
    media: MediaSection,
    sentiment: SentimentSection,
    placeholders: PlaceholderSection,
}

/// Normalized alias lists, one per semantic field, highest priority first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldAliases {
    pub date: Vec<String>,
    pub name: Vec<String>,
    pub location: Vec<String>,
    pub message: Vec<String>,
    pub staff_involved: Vec<String>,
    pub pamphlets_used: Vec<String>,
}

/// Everything the row mapper needs to know about a sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingConfig {
    pub aliases: FieldAliases,
    /// Normalized headers appended to the location, matched exactly.
    pub extra_places: Vec<String>,
    /// Normalized headers never copied into `extra_fields`.
    pub ignored_headers: Vec<String>,
    /// A media column whose normalized header contains one of these is video.
    pub video_keywords: Vec<String>,
    pub photo_url_template: String,
    pub video_url_template: String,
    pub name_placeholder: String,
    pub location_placeholder: String,
    sentiment: SentimentClassifier,
}

impl Default for MappingConfig {
    fn default() -> Self {
        static DEFAULTS: OnceLock<MappingConfig> = OnceLock::new();
        DEFAULTS
            .get_or_init(|| {
                MappingConfig::from_complete_str(DEFAULT_TOML_STR)
                    .expect("embedded mapping defaults are complete")
            })
            .clone()
    }
}

impl MappingConfig {
    /// Parse the embedded defaults, reporting rather than panicking on a
    /// broken template.
    pub fn from_default_config() -> Result<Self> {
        Self::from_complete_str(DEFAULT_TOML_STR)
    }

    pub fn from_toml_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        use std::fs;
        let contents = fs::read_to_string(&path).with_context(|| {
            format!(
                "Failed to read mapping configuration from {}",
                path.as_ref().display()
            )
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parse a mapping file. Keys the file leaves out keep their defaults.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let file = parse_mapping_file(toml_str)?;
        let mut config = Self::default();
        config.overlay(file)?;
        Ok(config)
    }

    /// Build a config from a file that must set every key.
    fn from_complete_str(toml_str: &str) -> Result<Self> {
        let file = parse_mapping_file(toml_str)?;
        let aliases = file.aliases;
        let media = file.media;

        let positive = required(file.sentiment.positive, "sentiment.positive")?;
        let negative = required(file.sentiment.negative, "sentiment.negative")?;

        Ok(Self {
            aliases: FieldAliases {
                date: required_aliases(aliases.date, "aliases.date")?,
                name: required_aliases(aliases.name, "aliases.name")?,
                location: required_aliases(aliases.location, "aliases.location")?,
                message: required_aliases(aliases.message, "aliases.message")?,
                staff_involved: required_aliases(aliases.staff_involved, "aliases.staff_involved")?,
                pamphlets_used: required_aliases(aliases.pamphlets_used, "aliases.pamphlets_used")?,
            },
            extra_places: required_aliases(aliases.extra_places, "aliases.extra_places")?,
            ignored_headers: required_aliases(aliases.ignored_headers, "aliases.ignored_headers")?,
            video_keywords: required_aliases(media.video_keywords, "media.video_keywords")?,
            photo_url_template: validate_template(
                "photo_url_template",
                required(media.photo_url_template, "media.photo_url_template")?,
            )?,
            video_url_template: validate_template(
                "video_url_template",
                required(media.video_url_template, "media.video_url_template")?,
            )?,
            name_placeholder: required(file.placeholders.name, "placeholders.name")?,
            location_placeholder: required(file.placeholders.location, "placeholders.location")?,
            sentiment: SentimentClassifier::new(positive.as_slice(), negative.as_slice()),
        })
    }

    fn overlay(&mut self, file: MappingFile) -> Result<()> {
        let aliases = file.aliases;
        override_normalized(&mut self.aliases.date, aliases.date);
        override_normalized(&mut self.aliases.name, aliases.name);
        override_normalized(&mut self.aliases.location, aliases.location);
        override_normalized(&mut self.aliases.message, aliases.message);
        override_normalized(&mut self.aliases.staff_involved, aliases.staff_involved);
        override_normalized(&mut self.aliases.pamphlets_used, aliases.pamphlets_used);
        override_normalized(&mut self.extra_places, aliases.extra_places);
        override_normalized(&mut self.ignored_headers, aliases.ignored_headers);
        override_normalized(&mut self.video_keywords, file.media.video_keywords);

        if let Some(template) = file.media.photo_url_template {
            self.photo_url_template = validate_template("photo_url_template", template)?;
        }
        if let Some(template) = file.media.video_url_template {
            self.video_url_template = validate_template("video_url_template", template)?;
        }

        let sentiment = file.sentiment;
        if sentiment.positive.is_some() || sentiment.negative.is_some() {
            let positive = sentiment
                .positive
                .unwrap_or_else(|| self.sentiment.positive().to_vec());
            let negative = sentiment
                .negative
                .unwrap_or_else(|| self.sentiment.negative().to_vec());
            self.sentiment = SentimentClassifier::new(positive.as_slice(), negative.as_slice());
        }

        if let Some(name) = file.placeholders.name {
            self.name_placeholder = name;
        }
        if let Some(location) = file.placeholders.location {
            self.location_placeholder = location;
        }

        Ok(())
    }

    pub fn sentiment(&self) -> &SentimentClassifier {
        &self.sentiment
    }

    /// Video when the normalized header names a video keyword, photo otherwise.
    pub fn media_kind(&self, normalized_header: &str) -> MediaKind {
        if self
            .video_keywords
            .iter()
            .any(|keyword| !keyword.is_empty() && normalized_header.contains(keyword.as_str()))
        {
            MediaKind::Video
        } else {
            MediaKind::Photo
        }
    }

    pub fn media_url(&self, kind: MediaKind, id: &str) -> String {
        let template = match kind {
            MediaKind::Photo => &self.photo_url_template,
            MediaKind::Video => &self.video_url_template,
        };
        template.replace(ID_PLACEHOLDER, id)
    }

    pub fn is_ignored_header(&self, normalized_header: &str) -> bool {
        self.ignored_headers
            .iter()
            .any(|ignored| ignored == normalized_header)
    }
}

fn normalize_all<S: AsRef<str>>(values: &[S]) -> Vec<String> {
    values
        .iter()
        .map(|value| normalize_header(value.as_ref()))
        .filter(|value| !value.is_empty())
        .collect()
}

fn parse_mapping_file(toml_str: &str) -> Result<MappingFile> {
    toml::from_str(toml_str).context("Failed to parse mapping configuration")
}

fn required_aliases(value: Option<Vec<String>>, key: &str) -> Result<Vec<String>> {
    Ok(normalize_all(required(value, key)?.as_slice()))
}

fn required<T>(value: Option<T>, key: &str) -> Result<T> {
    value.with_context(|| format!("Mapping configuration is missing '{}'", key))
}

fn override_normalized(target: &mut Vec<String>, replacement: Option<Vec<String>>) {
    if let Some(values) = replacement {
        *target = normalize_all(values.as_slice());
    }
}

fn validate_template(key: &str, template: String) -> Result<String> {
    if !template.contains(ID_PLACEHOLDER) {
        anyhow::bail!(
            "Media URL template '{}' must contain {}, got: {}",
            key,
            ID_PLACEHOLDER,
            template
        );
    }
    Ok(template)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_template_is_complete() {
        let from_file = MappingConfig::from_default_config().unwrap();
        assert_eq!(from_file, MappingConfig::default());
        assert_eq!(from_file.extra_places, vec!["place2", "place3"]);
        assert_eq!(from_file.ignored_headers, vec!["timestamp"]);
        assert_eq!(from_file.name_placeholder, "Unknown Incharge");
        assert_eq!(from_file.location_placeholder, "Not Specified");
    }

    #[test]
    fn complete_file_must_set_every_key() {
        let err = MappingConfig::from_complete_str("[aliases]\ndate = [\"date\"]\n").unwrap_err();
        assert!(err.to_string().contains("aliases.name"));
    }

    #[test]
    fn partial_sentiment_override_keeps_other_class() {
        let config = MappingConfig::from_toml_str("[sentiment]\npositive = [\"shabash\"]\n").unwrap();
        assert_eq!(config.sentiment().positive().to_vec(), vec!["shabash".to_string()]);
        assert_eq!(
            config.sentiment().negative(),
            MappingConfig::default().sentiment().negative()
        );
    }

    #[test]
    fn aliases_are_normalized_on_load() {
        let config = MappingConfig::default();
        assert_eq!(config.aliases.name, vec!["campaignincharge", "incharge", "name"]);
        assert_eq!(config.aliases.location, vec!["place1", "place"]);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = MappingConfig::from_toml_str(
            r#"
            [aliases]
            name = ["Prabhari", "Incharge"]

            [placeholders]
            location = "Unknown"
            "#,
        )
        .unwrap();

        assert_eq!(config.aliases.name, vec!["prabhari", "incharge"]);
        assert_eq!(config.aliases.message, MappingConfig::default().aliases.message);
        assert_eq!(config.location_placeholder, "Unknown");
        assert_eq!(config.name_placeholder, "Unknown Incharge");
    }

    #[test]
    fn rejects_template_without_placeholder() {
        let err = MappingConfig::from_toml_str(
            r#"
            [media]
            photo_url_template = "https://example.com/static"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("photo_url_template"));
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(MappingConfig::from_toml_str("[aliases]\nnmae = [\"x\"]\n").is_err());
    }

    #[test]
    fn classifies_media_headers() {
        let config = MappingConfig::default();
        assert_eq!(config.media_kind("videoclip"), MediaKind::Video);
        assert_eq!(config.media_kind("moviefile"), MediaKind::Video);
        assert_eq!(config.media_kind("photoupload"), MediaKind::Photo);
        assert_eq!(config.media_kind("upload"), MediaKind::Photo);
    }

    #[test]
    fn builds_media_urls() {
        let config = MappingConfig::default();
        assert_eq!(
            config.media_url(MediaKind::Photo, "AAA111"),
            "https://lh3.googleusercontent.com/d/AAA111"
        );
        assert_eq!(
            config.media_url(MediaKind::Video, "BBB222"),
            "https://drive.google.com/file/d/BBB222/preview"
        );
    }
}
