//! Error types for the download module.
//!
//! [`FetchError`] covers a single page request. [`DownloaderError`] is what the
//! coordinator and driver surface to callers: every variant is fatal to the
//! run, nothing is swallowed.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

use crate::news::ParseError;

/// Errors that can occur while requesting one page from the API.
///
/// URLs stored in these errors always have the API token redacted.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error requesting {url}: {source}")]
    Network {
        /// The redacted request URL.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout requesting {url}")]
    Timeout {
        /// The redacted request URL.
        url: String,
    },

    /// HTTP error response (4xx client errors, 5xx server errors).
    #[error("HTTP {status} requesting {url}")]
    HttpStatus {
        /// The redacted request URL.
        url: String,
        /// The HTTP status code.
        status: u16,
        /// The Retry-After header value, if present (for 429 responses).
        retry_after: Option<String>,
    },

    /// The configured base URL cannot be turned into a request URL.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// The interrupt flag was raised while waiting to send or retry.
    #[error("page request interrupted")]
    Interrupted,
}

impl FetchError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
            retry_after: None,
        }
    }

    /// Creates an HTTP status error with a Retry-After header value.
    pub fn http_status_with_retry_after(
        url: impl Into<String>,
        status: u16,
        retry_after: Option<String>,
    ) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
            retry_after,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }
}

/// Errors that abort a download run.
#[derive(Debug, Error)]
pub enum DownloaderError {
    /// The API key was empty or whitespace.
    #[error("API key must not be empty")]
    MissingApiKey,

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// End date precedes start date; raised before any request is made.
    #[error("end date {end} must be greater than or equal to start date {start}")]
    Range {
        /// Requested first date.
        start: NaiveDate,
        /// Requested last date.
        end: NaiveDate,
    },

    /// A page request failed after the retry policy gave up.
    #[error("failed to fetch page {page} for {date}: {source}")]
    Fetch {
        /// Date being downloaded.
        date: NaiveDate,
        /// Zero-based page index.
        page: u32,
        /// The final request error.
        #[source]
        source: FetchError,
    },

    /// A non-empty page could not be parsed into records.
    #[error("failed to parse page {page} for {date}: {source}")]
    Parse {
        /// Date being downloaded.
        date: NaiveDate,
        /// Zero-based page index.
        page: u32,
        /// The parse failure.
        #[source]
        source: ParseError,
    },

    /// The target page file exists and overwriting is disabled.
    #[error("raw JSON news file exists and not overwriting: {}", path.display())]
    IdempotencyViolation {
        /// The existing file.
        path: PathBuf,
    },

    /// File system error creating directories, deleting or writing files.
    #[error("IO error at {}: {source}", path.display())]
    Io {
        /// The path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The API kept returning data past the page safety bound.
    #[error("page limit of {max_pages} reached for {date} without an empty page")]
    PageLimitExceeded {
        /// Date being downloaded.
        date: NaiveDate,
        /// The configured bound.
        max_pages: u32,
    },

    /// The run was stopped by an interrupt signal.
    #[error("download interrupted")]
    Interrupted,
}

impl DownloaderError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_http_status_display() {
        let error = FetchError::http_status("https://api.example.com/news?token=***", 503);
        let msg = error.to_string();
        assert!(msg.contains("503"), "Expected '503' in: {msg}");
        assert!(msg.contains("token=***"), "Expected redacted URL in: {msg}");
    }

    #[test]
    fn test_fetch_error_timeout_display() {
        let error = FetchError::timeout("https://api.example.com/news");
        assert!(error.to_string().contains("timeout"));
    }

    #[test]
    fn test_range_error_display_names_both_dates() {
        let error = DownloaderError::Range {
            start: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        };
        let msg = error.to_string();
        assert!(msg.contains("2024-01-05"), "Expected start in: {msg}");
        assert!(msg.contains("2024-01-01"), "Expected end in: {msg}");
    }

    #[test]
    fn test_idempotency_violation_display_includes_path() {
        let error = DownloaderError::IdempotencyViolation {
            path: PathBuf::from("/tmp/20240101/benzinga_api_1_2.json"),
        };
        let msg = error.to_string();
        assert!(msg.contains("not overwriting"));
        assert!(msg.contains("benzinga_api_1_2.json"));
    }

    #[test]
    fn test_fetch_variant_keeps_source() {
        use std::error::Error as _;

        let error = DownloaderError::Fetch {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            page: 3,
            source: FetchError::http_status("https://api.example.com/news", 500),
        };
        assert!(error.to_string().contains("page 3"));
        assert!(error.source().is_some());
    }
}
