//! Rate-limited, paginated download of the news feed to disk.
//!
//! The pieces nest from the outside in:
//!
//! - [`DateRangeDriver`] walks an inclusive date range
//! - [`DailyDownloadCoordinator`] pages through one date and writes each page
//! - [`PageFetcher`] issues one request per page, retrying per [`RetryPolicy`]
//! - [`RateLimiter`] spaces requests by a fixed minimum interval
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::sync::atomic::AtomicBool;
//! use std::time::Duration;
//! use benzinga_core::download::{
//!     DailyDownloadCoordinator, DateRangeDriver, DownloadOptions, FetcherConfig, PageFetcher,
//!     RateLimiter,
//! };
//! use chrono::NaiveDate;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let limiter = Arc::new(RateLimiter::new(Duration::from_millis(500)));
//! let fetcher = PageFetcher::new("my-api-key", limiter, &FetcherConfig::default())?;
//! let options = DownloadOptions::new("/tmp/raw/alternative/benzinga", "/tmp/benzinga-daily");
//! let driver = DateRangeDriver::new(
//!     DailyDownloadCoordinator::new(fetcher, options),
//!     Arc::new(AtomicBool::new(false)),
//! );
//! let start = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
//! let end = NaiveDate::from_ymd_opt(2020, 3, 4).unwrap();
//! let summary = driver.run(start, end).await?;
//! println!("{} pages, {} records", summary.total_pages(), summary.total_records());
//! # Ok(())
//! # }
//! ```

pub mod constants;
mod coordinator;
mod driver;
mod error;
mod fetcher;
pub mod rate_limiter;
mod retry;

pub use coordinator::{DailyDownloadCoordinator, DailySummary, DownloadOptions, date_dir_name};
pub use driver::{DateRangeDriver, RunSummary, each_day};
pub use error::{DownloaderError, FetchError};
pub use fetcher::{FetcherConfig, PageBody, PageFetcher, redact_token};
pub use rate_limiter::{RateLimiter, parse_retry_after};
pub use retry::{DEFAULT_MAX_RETRIES, FailureType, RetryDecision, RetryPolicy, classify_error};
