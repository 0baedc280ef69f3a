//! Benzinga News Downloader Core Library
//!
//! Pulls the paginated Benzinga news feed for a range of dates and stores
//! each page verbatim, named by the record ids it contains, so that re-runs
//! land on the same files.
//!
//! # Architecture
//!
//! - [`download`] - Rate limiting, page requests, per-date and per-range orchestration
//! - [`news`] - Record model, page parsing, and feed timestamp normalization

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod download;
pub mod news;
mod user_agent;

// Re-export commonly used types
pub use download::{
    DailyDownloadCoordinator, DailySummary, DateRangeDriver, DownloadOptions, DownloaderError,
    FetchError, FetcherConfig, PageBody, PageFetcher, RateLimiter, RetryPolicy, RunSummary,
};
pub use news::{IdRange, NewsRecord, ParseError, normalize_utc_timestamp, parse_page};
