//! Per-date pagination: fetch, parse, name, and persist each page.
//!
//! One [`DailyDownloadCoordinator::download_day`] call walks pages `0, 1, 2, ...`
//! for a single date until the API answers with an empty page. Each non-empty
//! page is stored verbatim under `{destination_root}/{yyyyMMdd}/`, named by the
//! smallest and largest record id it contains.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::NaiveDate;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};

use super::constants::DEFAULT_MAX_PAGES;
use super::error::{DownloaderError, FetchError};
use super::fetcher::{PageBody, PageFetcher};
use super::retry::RetryPolicy;
use crate::news::{IdRange, parse_page};

/// Directory-name format for a date bucket (`20200304`).
const DATE_DIR_FORMAT: &str = "%Y%m%d";

/// Renders the `yyyyMMdd` name used for date buckets and daily files.
#[must_use]
pub fn date_dir_name(date: NaiveDate) -> String {
    date.format(DATE_DIR_FORMAT).to_string()
}

/// Where and how pages are written.
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// Root of the per-date page directories.
    pub destination_root: PathBuf,
    /// Root holding consolidated `{yyyyMMdd}.json` files from earlier runs.
    pub daily_root: PathBuf,
    /// Replace existing page files instead of failing.
    pub force_overwrite: bool,
    /// Pages fetched per date before giving up on an endless feed.
    pub max_pages: u32,
    /// Retry policy for each page request.
    pub retry_policy: RetryPolicy,
}

impl DownloadOptions {
    /// Options with overwrite enabled and default bounds.
    #[must_use]
    pub fn new(destination_root: impl Into<PathBuf>, daily_root: impl Into<PathBuf>) -> Self {
        Self {
            destination_root: destination_root.into(),
            daily_root: daily_root.into(),
            force_overwrite: true,
            max_pages: DEFAULT_MAX_PAGES,
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Directory holding the pages for `date`.
    #[must_use]
    pub fn date_dir(&self, date: NaiveDate) -> PathBuf {
        self.destination_root.join(date_dir_name(date))
    }

    /// Consolidated daily file for `date`.
    #[must_use]
    pub fn daily_file(&self, date: NaiveDate) -> PathBuf {
        self.daily_root.join(format!("{}.json", date_dir_name(date)))
    }
}

/// Outcome of one completed date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailySummary {
    /// The date downloaded.
    pub date: NaiveDate,
    /// Non-empty pages written.
    pub pages: u32,
    /// Records across all written pages.
    pub records: usize,
    /// Files written, in page order.
    pub files: Vec<PathBuf>,
}

/// Downloads every page of a single date.
#[derive(Debug, Clone)]
pub struct DailyDownloadCoordinator {
    fetcher: PageFetcher,
    options: DownloadOptions,
    interrupted: Arc<AtomicBool>,
}

impl DailyDownloadCoordinator {
    /// Creates a coordinator with its own (never set) interrupt flag.
    #[must_use]
    pub fn new(fetcher: PageFetcher, options: DownloadOptions) -> Self {
        let interrupted = Arc::new(AtomicBool::new(false));
        Self {
            fetcher: fetcher.with_interrupt_flag(Arc::clone(&interrupted)),
            options,
            interrupted,
        }
    }

    /// Shares an interrupt flag, checked before every page and during the
    /// fetcher's rate-limit and retry waits.
    #[must_use]
    pub fn with_interrupt_flag(mut self, interrupted: Arc<AtomicBool>) -> Self {
        self.fetcher = self.fetcher.with_interrupt_flag(Arc::clone(&interrupted));
        self.interrupted = interrupted;
        self
    }

    /// The options this coordinator writes with.
    #[must_use]
    pub fn options(&self) -> &DownloadOptions {
        &self.options
    }

    /// Returns true once the interrupt flag has been raised.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    /// Downloads all pages for `date` into its date directory.
    ///
    /// The date directory must already exist. A stale daily file for the date
    /// is removed first, whatever the overwrite setting.
    ///
    /// # Errors
    ///
    /// Any fetch, parse, or write failure aborts the date. See
    /// [`DownloaderError`] for the variants; none of them leave the loop
    /// running.
    #[instrument(skip(self, date), fields(date = %date))]
    pub async fn download_day(&self, date: NaiveDate) -> Result<DailySummary, DownloaderError> {
        info!("downloading news");
        self.remove_stale_daily_file(date).await?;

        let date_dir = self.options.date_dir(date);
        let mut summary = DailySummary {
            date,
            pages: 0,
            records: 0,
            files: Vec::new(),
        };

        let mut page = 0u32;
        loop {
            if self.is_interrupted() {
                return Err(DownloaderError::Interrupted);
            }
            if page >= self.options.max_pages {
                return Err(DownloaderError::PageLimitExceeded {
                    date,
                    max_pages: self.options.max_pages,
                });
            }

            let raw = match self
                .fetcher
                .fetch_with_retry(date, page, &self.options.retry_policy)
                .await
                .map_err(|source| match source {
                    FetchError::Interrupted => DownloaderError::Interrupted,
                    source => DownloaderError::Fetch { date, page, source },
                })?
            {
                PageBody::Data(raw) => raw,
                PageBody::NoMoreData => {
                    debug!(page, "empty page, date complete");
                    break;
                }
            };

            let records = parse_page(&raw)
                .map_err(|source| DownloaderError::Parse { date, page, source })?;
            let Some(range) = IdRange::of(&records) else {
                // parse_page never yields an empty set
                break;
            };

            let path = date_dir.join(range.file_name());
            info!(page, records = records.len(), path = %path.display(), "writing page");
            self.write_page(&path, &raw).await?;

            summary.pages += 1;
            summary.records += records.len();
            summary.files.push(path);
            page += 1;
        }

        info!(
            pages = summary.pages,
            records = summary.records,
            "finished date"
        );
        Ok(summary)
    }

    async fn remove_stale_daily_file(&self, date: NaiveDate) -> Result<(), DownloaderError> {
        let daily_root = &self.options.daily_root;
        ensure_dir(daily_root).await?;

        let daily_file = self.options.daily_file(date);
        match tokio::fs::remove_file(&daily_file).await {
            Ok(()) => {
                info!(path = %daily_file.display(), "removed stale daily file");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DownloaderError::io(daily_file, e)),
        }
    }

    async fn write_page(&self, path: &Path, raw: &str) -> Result<(), DownloaderError> {
        if self.options.force_overwrite {
            return tokio::fs::write(path, raw)
                .await
                .map_err(|e| DownloaderError::io(path, e));
        }

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::AlreadyExists {
                    DownloaderError::IdempotencyViolation {
                        path: path.to_path_buf(),
                    }
                } else {
                    DownloaderError::io(path, e)
                }
            })?;
        file.write_all(raw.as_bytes())
            .await
            .map_err(|e| DownloaderError::io(path, e))?;
        file.flush().await.map_err(|e| DownloaderError::io(path, e))
    }
}

/// Creates `dir` and its parents if missing.
pub(crate) async fn ensure_dir(dir: &Path) -> Result<(), DownloaderError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| DownloaderError::io(dir, e))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 3, 4).unwrap()
    }

    #[test]
    fn test_date_dir_name_is_compact() {
        assert_eq!(date_dir_name(date()), "20200304");
        assert_eq!(
            date_dir_name(NaiveDate::from_ymd_opt(2021, 11, 9).unwrap()),
            "20211109"
        );
    }

    #[test]
    fn test_options_paths() {
        let options = DownloadOptions::new("/data/news", "/data/daily");
        assert_eq!(options.date_dir(date()), PathBuf::from("/data/news/20200304"));
        assert_eq!(
            options.daily_file(date()),
            PathBuf::from("/data/daily/20200304.json")
        );
    }

    #[test]
    fn test_options_defaults() {
        let options = DownloadOptions::new("a", "b");
        assert!(options.force_overwrite);
        assert_eq!(options.max_pages, DEFAULT_MAX_PAGES);
    }

    #[tokio::test]
    async fn test_ensure_dir_is_idempotent() {
        let temp = tempfile::tempdir().unwrap();
        let nested = temp.path().join("a").join("b");
        ensure_dir(&nested).await.unwrap();
        ensure_dir(&nested).await.unwrap();
        assert!(nested.is_dir());
    }
}
