//! Fuzzy attribution of sheet columns to semantic fields.
//!
//! Matching is permissive on purpose: a header matches an alias when the
//! normalized header equals the normalized alias or contains it. When several
//! columns could match, the first one in sheet order wins, not the closest
//! one. Sheets with two plausible "place" columns therefore resolve by column
//! order.

use crate::raw_row::RawRow;

/// Lower-case and keep only `[a-z0-9]`.
///
/// `"Staff Involve(d)"` and `"staffinvolved"` normalize identically.
pub fn normalize_header(header: &str) -> String {
    header
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

fn header_matches(normalized_header: &str, normalized_alias: &str) -> bool {
    !normalized_alias.is_empty()
        && (normalized_header == normalized_alias || normalized_header.contains(normalized_alias))
}

/// Index of the first column, in sheet order, that is not yet consumed and
/// matches any of the (already normalized) aliases.
pub fn find_matching_column(
    normalized_headers: &[String],
    consumed: &[bool],
    normalized_aliases: &[String],
) -> Option<usize> {
    normalized_headers
        .iter()
        .enumerate()
        .filter(|(idx, _)| !consumed.get(*idx).copied().unwrap_or(false))
        .find(|(_, header)| {
            normalized_aliases
                .iter()
                .any(|alias| header_matches(header, alias))
        })
        .map(|(idx, _)| idx)
}

/// A column claimed by a resolution step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedColumn<'a> {
    pub index: usize,
    pub header: &'a str,
    /// Trimmed cell value.
    pub value: &'a str,
}

/// Column bookkeeping for a single row.
///
/// A column is either claimed by a resolution step or listed by
/// [`FieldResolver::unconsumed`], never both.
#[derive(Debug)]
pub struct FieldResolver<'a> {
    row: &'a RawRow,
    normalized: Vec<String>,
    consumed: Vec<bool>,
}

impl<'a> FieldResolver<'a> {
    pub fn new(row: &'a RawRow) -> Self {
        let normalized = row.headers().iter().map(|h| normalize_header(h)).collect();
        Self {
            row,
            normalized,
            consumed: vec![false; row.len()],
        }
    }

    /// Claim the first column matching any alias. A matching column is
    /// claimed even when its cell is empty.
    pub fn resolve(&mut self, normalized_aliases: &[String]) -> Option<ResolvedColumn<'a>> {
        let index = find_matching_column(&self.normalized, &self.consumed, normalized_aliases)?;
        Some(self.claim(index))
    }

    /// Trimmed value of the matched column, or `""` when nothing matches.
    pub fn resolve_value(&mut self, normalized_aliases: &[String]) -> &'a str {
        self.resolve(normalized_aliases)
            .map(|column| column.value)
            .unwrap_or("")
    }

    /// Claim the first unconsumed column whose normalized header is exactly
    /// `normalized_header`.
    pub fn resolve_exact(&mut self, normalized_header: &str) -> Option<ResolvedColumn<'a>> {
        let (index, _) = self
            .normalized
            .iter()
            .enumerate()
            .find(|(idx, header)| !self.consumed[*idx] && header.as_str() == normalized_header)?;
        Some(self.claim(index))
    }

    /// Unconsumed columns in sheet order as `(index, header, raw value)`.
    pub fn unconsumed(&self) -> Vec<(usize, &'a str, &'a str)> {
        let row = self.row;
        row.headers()
            .iter()
            .enumerate()
            .filter(|(idx, _)| !self.consumed[*idx])
            .map(|(idx, header)| (idx, header.as_str(), row.value_at(idx)))
            .collect()
    }

    pub fn normalized_header(&self, index: usize) -> &str {
        self.normalized.get(index).map(String::as_str).unwrap_or("")
    }

    /// Mark a column consumed without reading it through an alias.
    pub fn consume(&mut self, index: usize) {
        if let Some(flag) = self.consumed.get_mut(index) {
            *flag = true;
        }
    }

    pub fn is_consumed(&self, index: usize) -> bool {
        self.consumed.get(index).copied().unwrap_or(false)
    }

    fn claim(&mut self, index: usize) -> ResolvedColumn<'a> {
        self.consumed[index] = true;
        let row = self.row;
        ResolvedColumn {
            index,
            header: row.headers()[index].as_str(),
            value: row.value_at(index).trim(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aliases(list: &[&str]) -> Vec<String> {
        list.iter().map(|a| normalize_header(a)).collect()
    }

    #[test]
    fn normalizes_case_spacing_and_punctuation() {
        assert_eq!(normalize_header("Staff Involve(d)"), "staffinvolved");
        assert_eq!(normalize_header("staffinvolved"), "staffinvolved");
        assert_eq!(normalize_header("  Place-1 "), "place1");
        assert_eq!(normalize_header("Café №2"), "caf2");
    }

    #[test]
    fn first_matching_column_in_sheet_order_wins() {
        let row = RawRow::from_pairs([
            ("Staff Name", "Ravi"),
            ("Campaign Incharge", "Asha"),
        ]);
        let mut resolver = FieldResolver::new(&row);
        let value = resolver.resolve_value(&aliases(&["campaign incharge", "incharge", "name"]));
        assert_eq!(value, "Ravi");
    }

    #[test]
    fn consumed_columns_are_not_matched_again() {
        let row = RawRow::from_pairs([("Place 1", "Pune"), ("Place 2", "Nashik")]);
        let mut resolver = FieldResolver::new(&row);
        let place = aliases(&["place"]);
        assert_eq!(resolver.resolve_value(&place), "Pune");
        assert_eq!(resolver.resolve_value(&place), "Nashik");
        assert_eq!(resolver.resolve_value(&place), "");
        assert!(resolver.unconsumed().is_empty());
    }

    #[test]
    fn matched_empty_cell_is_still_consumed() {
        let row = RawRow::from_pairs([("Any Remark", "   "), ("Notes", "x")]);
        let mut resolver = FieldResolver::new(&row);
        let column = resolver.resolve(&aliases(&["remark"])).unwrap();
        assert_eq!(column.value, "");
        assert_eq!(column.header, "Any Remark");
        assert!(resolver.is_consumed(0));
        assert!(!resolver.is_consumed(1));
        let rest = resolver.unconsumed();
        assert_eq!(rest, vec![(1, "Notes", "x")]);
    }

    #[test]
    fn exact_lookup_ignores_containment() {
        let row = RawRow::from_pairs([("Place 22", "no"), ("place_2", "yes")]);
        let mut resolver = FieldResolver::new(&row);
        let column = resolver.resolve_exact("place2").unwrap();
        assert_eq!(column.value, "yes");
        assert!(resolver.resolve_exact("place2").is_none());
    }

    #[test]
    fn pure_matcher_skips_consumed_and_empty_aliases() {
        let headers = vec!["date".to_string(), "dateofdrive".to_string()];
        assert_eq!(
            find_matching_column(&headers, &[true, false], &aliases(&["date"])),
            Some(1)
        );
        assert_eq!(find_matching_column(&headers, &[false, false], &aliases(&["!!"])), None);
    }
}
