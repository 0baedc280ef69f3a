//! Error types for news page parsing and timestamp normalization.

use thiserror::Error;

/// Maximum characters of offending input quoted in an error message.
const PREVIEW_CHARS: usize = 120;

/// Errors that can occur while parsing one raw API page.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The page is not valid JSON, or not a JSON array.
    #[error("malformed JSON page: {source}\n  Page starts with: {preview}")]
    MalformedJson {
        /// Truncated page text for display.
        preview: String,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// One element of the array could not be decoded as a news record.
    #[error("record {index} could not be decoded: {source}")]
    InvalidRecord {
        /// Zero-based position of the element in the page.
        index: usize,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The page text was non-empty but held no records.
    #[error("no parseable data found in JSON response: {preview}")]
    NoRecords {
        /// Truncated page text for display.
        preview: String,
    },
}

impl ParseError {
    /// Creates a `MalformedJson` error, quoting the start of the page.
    #[must_use]
    pub fn malformed(raw: &str, source: serde_json::Error) -> Self {
        Self::MalformedJson {
            preview: preview(raw),
            source,
        }
    }

    /// Creates a `NoRecords` error, quoting the start of the page.
    #[must_use]
    pub fn no_records(raw: &str) -> Self {
        Self::NoRecords {
            preview: preview(raw),
        }
    }
}

/// A feed timestamp did not match `Ddd Mmm D YYYY HH:MM:SS GMT+HHMM`.
#[derive(Debug, Clone, Error)]
#[error("unrecognized timestamp '{input}': {reason}")]
pub struct TimestampFormatError {
    /// The timestamp as received.
    pub input: String,
    /// Why the normalized text failed to parse.
    pub reason: String,
}

fn preview(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.chars().count() > PREVIEW_CHARS {
        let head: String = trimmed.chars().take(PREVIEW_CHARS).collect();
        format!("{head}...")
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_no_records_preview_is_truncated() {
        let raw = format!("[{}]", " ".repeat(10) + &"x".repeat(500));
        let msg = ParseError::no_records(&raw).to_string();
        assert!(msg.ends_with("..."), "Expected truncation in: {msg}");
        assert!(msg.len() < 250);
    }

    #[test]
    fn test_timestamp_error_display_quotes_input() {
        let error = TimestampFormatError {
            input: "yesterday".to_string(),
            reason: "input contains invalid characters".to_string(),
        };
        assert!(error.to_string().contains("'yesterday'"));
    }
}
