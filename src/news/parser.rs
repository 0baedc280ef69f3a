//! Page parsing and content-addressed naming.

use serde_json::Value;
use tracing::{debug, instrument};

use super::{NewsRecord, ParseError};

/// Decodes one raw API page into records sorted ascending by id.
///
/// Every element must decode; a single bad record fails the whole page,
/// because a partial record set would change the page's file name.
///
/// # Errors
///
/// - [`ParseError::MalformedJson`] if the text is not a JSON array
/// - [`ParseError::InvalidRecord`] if any element is not a valid record
/// - [`ParseError::NoRecords`] if the array is empty
///
/// # Example
///
/// ```
/// use benzinga_core::news::parse_page;
///
/// let records = parse_page(r#"[{"id": 9}, {"id": 3}, {"id": 5}]"#).unwrap();
/// let ids: Vec<u64> = records.iter().map(|r| r.id).collect();
/// assert_eq!(ids, vec![3, 5, 9]);
/// ```
#[instrument(skip(raw), fields(bytes = raw.len()))]
pub fn parse_page(raw: &str) -> Result<Vec<NewsRecord>, ParseError> {
    let elements: Vec<Value> =
        serde_json::from_str(raw).map_err(|e| ParseError::malformed(raw, e))?;

    let mut records = elements
        .into_iter()
        .enumerate()
        .map(|(index, element)| {
            serde_json::from_value::<NewsRecord>(element)
                .map_err(|source| ParseError::InvalidRecord { index, source })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if records.is_empty() {
        return Err(ParseError::no_records(raw));
    }

    records.sort_by_key(|record| record.id);
    debug!(records = records.len(), "parsed page");
    Ok(records)
}

/// Smallest and largest id present in a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdRange {
    /// Smallest id in the page.
    pub min: u64,
    /// Largest id in the page.
    pub max: u64,
}

impl IdRange {
    /// Computes the id range of a set of records, or `None` if it is empty.
    ///
    /// Does not assume the records are sorted.
    #[must_use]
    pub fn of(records: &[NewsRecord]) -> Option<Self> {
        let min = records.iter().map(|r| r.id).min()?;
        let max = records.iter().map(|r| r.id).max()?;
        Some(Self { min, max })
    }

    /// File name the page is stored under: `benzinga_api_{min}_{max}.json`.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("benzinga_api_{}_{}.json", self.min, self.max)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ids(records: &[NewsRecord]) -> Vec<u64> {
        records.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_parse_page_sorts_by_id() {
        let raw = r#"[{"id": 300, "title": "c"}, {"id": 100, "title": "a"}, {"id": 200}]"#;
        let records = parse_page(raw).unwrap();
        assert_eq!(ids(&records), vec![100, 200, 300]);
        assert_eq!(records[0].title.as_deref(), Some("a"));
    }

    #[test]
    fn test_parse_page_single_record() {
        let records = parse_page(r#"[{"id": 5}]"#).unwrap();
        assert_eq!(ids(&records), vec![5]);
        assert_eq!(IdRange::of(&records).unwrap().file_name(), "benzinga_api_5_5.json");
    }

    #[test]
    fn test_parse_page_empty_array_is_error() {
        let err = parse_page("[]").unwrap_err();
        assert!(matches!(err, ParseError::NoRecords { .. }));
    }

    #[test]
    fn test_parse_page_malformed_json_is_error() {
        let err = parse_page("[{\"id\": 1,").unwrap_err();
        assert!(matches!(err, ParseError::MalformedJson { .. }));
    }

    #[test]
    fn test_parse_page_object_instead_of_array_is_error() {
        let err = parse_page(r#"{"error": "bad token"}"#).unwrap_err();
        assert!(matches!(err, ParseError::MalformedJson { .. }));
        assert!(err.to_string().contains("bad token"));
    }

    #[test]
    fn test_parse_page_bad_record_fails_whole_page() {
        let raw = r#"[{"id": 1}, {"title": "missing id"}, {"id": 3}]"#;
        let err = parse_page(raw).unwrap_err();
        assert!(matches!(err, ParseError::InvalidRecord { index: 1, .. }));
    }

    #[test]
    fn test_id_range_matches_min_and_max_of_input() {
        let raw = r#"[{"id": 42}, {"id": 7}, {"id": 1000}, {"id": 99}]"#;
        let records = parse_page(raw).unwrap();
        let range = IdRange::of(&records).unwrap();
        assert_eq!(range, IdRange { min: 7, max: 1000 });
        assert_eq!(range.file_name(), "benzinga_api_7_1000.json");
    }

    #[test]
    fn test_id_range_of_empty_is_none() {
        assert!(IdRange::of(&[]).is_none());
    }

    #[test]
    fn test_same_records_in_any_order_name_the_same_file() {
        let a = parse_page(r#"[{"id": 1}, {"id": 2}, {"id": 3}]"#).unwrap();
        let b = parse_page(r#"[{"id": 3}, {"id": 1}, {"id": 2}]"#).unwrap();
        assert_eq!(
            IdRange::of(&a).unwrap().file_name(),
            IdRange::of(&b).unwrap().file_name()
        );
    }
}
