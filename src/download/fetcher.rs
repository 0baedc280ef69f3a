//! Paginated page requests against the news API.
//!
//! [`PageFetcher`] issues one `GET {base}/news` request per (date, page),
//! waiting on the shared [`RateLimiter`] first. The API signals the end of a
//! date by answering `[]`, which is surfaced as [`PageBody::NoMoreData`].

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::NaiveDate;
use reqwest::Client;
use reqwest::header::{ACCEPT, RETRY_AFTER};
use tracing::{debug, info, instrument};
use url::Url;

use super::constants::{
    CONNECT_TIMEOUT_SECS, DEFAULT_BASE_URL, EMPTY_PAGE_TOKEN, PAGE_SIZE, READ_TIMEOUT_SECS,
};
use super::error::{DownloaderError, FetchError};
use super::rate_limiter::{RateLimiter, parse_retry_after, sleep_until_or_interrupted};
use super::retry::{FailureType, RetryDecision, RetryPolicy, classify_error};
use crate::user_agent;

/// Query parameter carrying the API key.
const TOKEN_PARAM: &str = "token";

/// Placeholder written in place of the API key in logs and errors.
const REDACTED: &str = "***";

/// Result of a single page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageBody {
    /// Raw JSON text of a non-empty page, exactly as received.
    Data(String),
    /// The API answered with an empty array (or nothing): pagination is over.
    NoMoreData,
}

impl PageBody {
    /// Classifies a response body. `[]` and blank bodies end pagination.
    #[must_use]
    pub fn from_body(body: String) -> Self {
        let trimmed = body.trim();
        if trimmed.is_empty() || trimmed == EMPTY_PAGE_TOKEN {
            Self::NoMoreData
        } else {
            Self::Data(body)
        }
    }
}

/// Connection settings for [`PageFetcher`].
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// API base, e.g. `https://api.benzinga.com/api/v2`.
    pub base_url: String,
    /// TCP connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Whole-request timeout in seconds.
    pub read_timeout_secs: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            read_timeout_secs: READ_TIMEOUT_SECS,
        }
    }
}

/// Issues rate-limited page requests for a calendar date.
///
/// Created once and reused for a whole run, taking advantage of connection
/// pooling.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use benzinga_core::download::{FetcherConfig, PageBody, PageFetcher, RateLimiter};
/// use chrono::NaiveDate;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let limiter = Arc::new(RateLimiter::new(Duration::from_millis(500)));
/// let fetcher = PageFetcher::new("my-api-key", limiter, &FetcherConfig::default())?;
/// let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
/// if let PageBody::Data(json) = fetcher.fetch(date, 0).await? {
///     println!("first page has {} bytes", json.len());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct PageFetcher {
    client: Client,
    base_url: String,
    api_key: String,
    rate_limiter: Arc<RateLimiter>,
    interrupted: Arc<AtomicBool>,
}

impl PageFetcher {
    /// Creates a fetcher for the given API key.
    ///
    /// # Errors
    ///
    /// Returns [`DownloaderError::MissingApiKey`] if the key is blank, or
    /// [`DownloaderError::Client`] if the HTTP client cannot be built.
    #[instrument(level = "debug", skip(api_key, rate_limiter, config), fields(base_url = %config.base_url))]
    pub fn new(
        api_key: impl Into<String>,
        rate_limiter: Arc<RateLimiter>,
        config: &FetcherConfig,
    ) -> Result<Self, DownloaderError> {
        let api_key = api_key.into().trim().to_string();
        if api_key.is_empty() {
            return Err(DownloaderError::MissingApiKey);
        }

        let client = build_client(config.connect_timeout_secs, config.read_timeout_secs)
            .map_err(DownloaderError::Client)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            rate_limiter,
            interrupted: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Shares an interrupt flag. Rate-limit and retry waits end early once it
    /// is set, and the request fails with [`FetchError::Interrupted`].
    #[must_use]
    pub fn with_interrupt_flag(mut self, interrupted: Arc<AtomicBool>) -> Self {
        self.interrupted = interrupted;
        self
    }

    /// Builds the request URL for one page.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidUrl`] if the base URL is malformed.
    pub fn page_url(&self, date: NaiveDate, page: u32) -> Result<Url, FetchError> {
        let endpoint = format!("{}/news", self.base_url);
        Url::parse_with_params(
            &endpoint,
            [
                (TOKEN_PARAM, self.api_key.clone()),
                ("pageSize", PAGE_SIZE.to_string()),
                ("displayOutput", "full".to_string()),
                ("date", date.format("%Y-%m-%d").to_string()),
                ("page", page.to_string()),
            ],
        )
        .map_err(|_| FetchError::invalid_url(endpoint))
    }

    /// Requests one page once, after waiting on the rate limiter.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] for transport failures and non-2xx statuses,
    /// or [`FetchError::Interrupted`] if the interrupt flag is raised while
    /// waiting on the limiter. The body is not validated as JSON here.
    #[instrument(skip(self, date), fields(date = %date))]
    pub async fn fetch(&self, date: NaiveDate, page: u32) -> Result<PageBody, FetchError> {
        if !self
            .rate_limiter
            .wait_unless_interrupted(&self.interrupted)
            .await
        {
            return Err(FetchError::Interrupted);
        }

        let url = self.page_url(date, page)?;
        let display_url = redact_token(&url);
        info!(url = %display_url, "downloading page");

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::timeout(&display_url)
                } else {
                    FetchError::network(&display_url, e.without_url())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(std::string::ToString::to_string);
            return Err(FetchError::http_status_with_retry_after(
                display_url,
                status.as_u16(),
                retry_after,
            ));
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::timeout(&display_url)
            } else {
                FetchError::network(&display_url, e.without_url())
            }
        })?;

        let page_body = PageBody::from_body(body);
        debug!(
            no_more_data = matches!(page_body, PageBody::NoMoreData),
            "page received"
        );
        Ok(page_body)
    }

    /// Requests one page, retrying transient failures per `policy`.
    ///
    /// An empty page is a success and is never retried. A `Retry-After`
    /// header on a 429 response replaces the backoff delay and is recorded
    /// with the rate limiter.
    ///
    /// # Errors
    ///
    /// Returns the last [`FetchError`] once the policy stops retrying, or
    /// [`FetchError::Interrupted`] as soon as the interrupt flag is seen.
    #[instrument(skip(self, date, policy), fields(date = %date, max_attempts = policy.max_attempts()))]
    pub async fn fetch_with_retry(
        &self,
        date: NaiveDate,
        page: u32,
        policy: &RetryPolicy,
    ) -> Result<PageBody, FetchError> {
        let mut attempt = 0u32;

        loop {
            if self.interrupted.load(Ordering::SeqCst) {
                return Err(FetchError::Interrupted);
            }
            attempt += 1;
            debug!(attempt, "attempting page request");

            let error = match self.fetch(date, page).await {
                Ok(body) => return Ok(body),
                Err(FetchError::Interrupted) => return Err(FetchError::Interrupted),
                Err(error) => error,
            };

            let failure_type = classify_error(&error);
            let retry_after_delay = if failure_type == FailureType::RateLimited {
                retry_after_from(&error)
            } else {
                None
            };

            match policy.should_retry(failure_type, attempt) {
                RetryDecision::Retry {
                    delay: backoff_delay,
                    attempt: next_attempt,
                } => {
                    let delay = retry_after_delay.unwrap_or(backoff_delay);
                    if let Some(server_delay) = retry_after_delay {
                        self.rate_limiter.record_server_delay(server_delay).await;
                    }

                    info!(
                        attempt = next_attempt,
                        max_attempts = policy.max_attempts(),
                        delay_ms = delay.as_millis(),
                        using_retry_after = retry_after_delay.is_some(),
                        error = %error,
                        "retrying page request"
                    );
                    let deadline = tokio::time::Instant::now() + delay;
                    if !sleep_until_or_interrupted(deadline, &self.interrupted).await {
                        info!("interrupted while waiting to retry");
                        return Err(FetchError::Interrupted);
                    }
                }
                RetryDecision::DoNotRetry { reason } => {
                    debug!(%reason, attempt, "not retrying page request");
                    return Err(error);
                }
            }
        }
    }
}

impl fmt::Debug for PageFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageFetcher")
            .field("base_url", &self.base_url)
            .field("api_key", &REDACTED)
            .field("rate_limiter", &self.rate_limiter)
            .finish_non_exhaustive()
    }
}

fn retry_after_from(error: &FetchError) -> Option<Duration> {
    match error {
        FetchError::HttpStatus {
            retry_after: Some(value),
            ..
        } => parse_retry_after(value),
        _ => None,
    }
}

/// Renders a request URL with the API key replaced by `***`.
#[must_use]
pub fn redact_token(url: &Url) -> String {
    let mut redacted = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| {
            let value = if key == TOKEN_PARAM {
                REDACTED.to_string()
            } else {
                value.into_owned()
            };
            (key.into_owned(), value)
        })
        .collect();

    if !pairs.is_empty() {
        redacted.query_pairs_mut().clear().extend_pairs(pairs);
    }
    redacted.to_string()
}

fn build_client(connect_timeout_secs: u64, read_timeout_secs: u64) -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(Duration::from_secs(connect_timeout_secs))
        .timeout(Duration::from_secs(read_timeout_secs))
        .gzip(true)
        .user_agent(user_agent::default_api_user_agent())
        .build()
}
