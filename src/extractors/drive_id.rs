use regex::Regex;
use std::sync::OnceLock;

fn id_patterns() -> &'static [Regex; 3] {
    static PATTERNS: OnceLock<[Regex; 3]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"id=([a-zA-Z0-9_-]+)",
            r"/d/([a-zA-Z0-9_-]+)",
            r"open\?id=([a-zA-Z0-9_-]+)",
        ]
        .map(|pattern| Regex::new(pattern).expect("drive id pattern is valid"))
    })
}

/// Pull a Drive file identifier out of a link or raw token.
///
/// Patterns are tried in order: `id=<token>`, `/d/<token>`, `open?id=<token>`.
/// The first pattern that matches anywhere in the text wins.
pub fn extract_drive_id(text: &str) -> Option<&str> {
    if text.is_empty() {
        return None;
    }

    id_patterns()
        .iter()
        .find_map(|re| re.captures(text).and_then(|caps| caps.get(1)))
        .map(|m| m.as_str())
}

/// Split a cell that may hold several links into its distinct identifiers.
///
/// Fragments are separated by runs of commas, newlines or spaces. Order of
/// first appearance is kept; repeated identifiers are dropped.
pub fn extract_all_drive_ids(cell: &str) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();

    for fragment in cell
        .split(|c| matches!(c, ',' | '\n' | ' '))
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
    {
        if let Some(id) = extract_drive_id(fragment) {
            if !ids.iter().any(|seen| seen == id) {
                ids.push(id.to_string());
            }
        }
    }

    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_query_parameter_form() {
        assert_eq!(
            extract_drive_id("https://drive.google.com/open?id=AAA111"),
            Some("AAA111")
        );
    }

    #[test]
    fn extracts_path_segment_form() {
        assert_eq!(
            extract_drive_id("https://drive.google.com/file/d/1a-B_c/view?usp=sharing"),
            Some("1a-B_c")
        );
    }

    #[test]
    fn query_form_is_tried_before_path_form() {
        assert_eq!(extract_drive_id("https://x.test/d/PATH?id=QUERY"), Some("QUERY"));
    }

    #[test]
    fn returns_none_without_identifier() {
        assert_eq!(extract_drive_id(""), None);
        assert_eq!(extract_drive_id("just some text"), None);
        assert_eq!(extract_drive_id("https://example.com/photo.jpg"), None);
    }

    #[test]
    fn splits_and_deduplicates_cell() {
        let ids = extract_all_drive_ids("id=abc123, id=xyz789\nid=abc123");
        assert_eq!(ids, vec!["abc123", "xyz789"]);
    }

    #[test]
    fn handles_runs_of_delimiters() {
        let ids = extract_all_drive_ids(
            " https://drive.google.com/open?id=one ,, \n\n https://drive.google.com/file/d/two/view ",
        );
        assert_eq!(ids, vec!["one", "two"]);
    }

    #[test]
    fn blank_cell_yields_nothing() {
        assert!(extract_all_drive_ids("").is_empty());
        assert!(extract_all_drive_ids("  \n , ").is_empty());
        assert!(extract_all_drive_ids("no links here").is_empty());
    }
}
