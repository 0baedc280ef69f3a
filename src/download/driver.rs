//! Date-range orchestration.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use chrono::{Days, NaiveDate};
use tracing::{info, instrument};

use super::coordinator::{DailyDownloadCoordinator, DailySummary, ensure_dir};
use super::error::DownloaderError;

/// Totals for a completed date range.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// One entry per date, in calendar order.
    pub days: Vec<DailySummary>,
    /// Wall-clock time for the whole range.
    pub elapsed: Duration,
}

impl RunSummary {
    /// Pages written across all dates.
    #[must_use]
    pub fn total_pages(&self) -> u64 {
        self.days.iter().map(|d| u64::from(d.pages)).sum()
    }

    /// Records written across all dates.
    #[must_use]
    pub fn total_records(&self) -> usize {
        self.days.iter().map(|d| d.records).sum()
    }
}

/// Iterates calendar days from `start` to `end`, both inclusive.
///
/// Yields nothing when `end < start`.
///
/// ```
/// use benzinga_core::download::each_day;
/// use chrono::NaiveDate;
///
/// let start = NaiveDate::from_ymd_opt(2020, 2, 28).unwrap();
/// let end = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
/// let days: Vec<_> = each_day(start, end).map(|d| d.to_string()).collect();
/// assert_eq!(days, ["2020-02-28", "2020-02-29", "2020-03-01"]);
/// ```
pub fn each_day(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    std::iter::successors(Some(start), |day| day.checked_add_days(Days::new(1)))
        .take_while(move |day| *day <= end)
}

/// Runs the daily coordinator over an inclusive date range, one date at a time.
#[derive(Debug, Clone)]
pub struct DateRangeDriver {
    coordinator: DailyDownloadCoordinator,
    interrupted: Arc<AtomicBool>,
}

impl DateRangeDriver {
    /// Creates a driver. The interrupt flag is shared with the coordinator.
    #[must_use]
    pub fn new(coordinator: DailyDownloadCoordinator, interrupted: Arc<AtomicBool>) -> Self {
        Self {
            coordinator: coordinator.with_interrupt_flag(Arc::clone(&interrupted)),
            interrupted,
        }
    }

    /// Downloads every date in `[start, end]`.
    ///
    /// # Errors
    ///
    /// Returns [`DownloaderError::Range`] before any request when
    /// `end < start`. Otherwise the first failing date aborts the range and
    /// its error is returned.
    #[instrument(skip(self, start, end), fields(start = %start, end = %end))]
    pub async fn run(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RunSummary, DownloaderError> {
        if end < start {
            return Err(DownloaderError::Range { start, end });
        }

        let started = Instant::now();
        let mut days = Vec::new();

        for date in each_day(start, end) {
            if self.interrupted.load(Ordering::SeqCst) {
                return Err(DownloaderError::Interrupted);
            }

            ensure_dir(&self.coordinator.options().date_dir(date)).await?;
            days.push(self.coordinator.download_day(date).await?);
        }

        let summary = RunSummary {
            days,
            elapsed: started.elapsed(),
        };
        info!(
            days = summary.days.len(),
            pages = summary.total_pages(),
            records = summary.total_records(),
            elapsed_secs = summary.elapsed.as_secs_f64(),
            "downloaded news for date range"
        );
        Ok(summary)
    }
}
