//! Minimum-interval rate limiting for API requests.
//!
//! This module provides the [`RateLimiter`] struct which enforces a fixed
//! minimum delay between consecutive requests to the news API, so a full date
//! range can be paged through without tripping the provider's quota.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use benzinga_core::download::RateLimiter;
//!
//! # async fn example() {
//! let limiter = RateLimiter::new(Duration::from_millis(500));
//!
//! // First request proceeds immediately
//! limiter.wait().await;
//!
//! // Second request waits until 500ms have passed since the first
//! limiter.wait().await;
//! # }
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use super::constants::MAX_RETRY_AFTER;

/// Warning threshold for cumulative delay (5 minutes).
const CUMULATIVE_DELAY_WARNING_THRESHOLD: Duration = Duration::from_secs(300);

/// How often a pending sleep looks at the interrupt flag.
const INTERRUPT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Gate that permits one caller per interval.
///
/// The internal lock is held while the caller sleeps, so concurrent callers
/// queue behind each other and each one observes the marker left by its
/// predecessor. There is no burst allowance.
///
/// # Thread Safety
///
/// `RateLimiter` is `Send + Sync`; wrap it in `Arc` to share it between tasks.
#[derive(Debug)]
pub struct RateLimiter {
    /// Minimum time between permitted calls.
    interval: Duration,

    /// Whether rate limiting is disabled (for `--rate-limit 0`).
    disabled: bool,

    /// Timing state, updated atomically with each permit.
    gate: Mutex<GateState>,

    /// Cumulative delay applied (in milliseconds).
    cumulative_delay_ms: AtomicU64,
}

#[derive(Debug, Default)]
struct GateState {
    /// `None` until the first permit is handed out (first call is immediate).
    last_permit: Option<Instant>,

    /// Earliest time the next permit may be handed out, set from Retry-After.
    hold_until: Option<Instant>,
}

impl RateLimiter {
    /// Creates a new rate limiter with the given minimum interval.
    #[must_use]
    #[instrument(skip_all, fields(interval_ms = interval.as_millis()))]
    pub fn new(interval: Duration) -> Self {
        debug!("creating rate limiter");
        Self {
            interval,
            disabled: false,
            gate: Mutex::new(GateState::default()),
            cumulative_delay_ms: AtomicU64::new(0),
        }
    }

    /// Creates a disabled rate limiter that applies no delays.
    ///
    /// Use this when `--rate-limit 0` is specified.
    #[must_use]
    #[instrument]
    pub fn disabled() -> Self {
        debug!("creating disabled rate limiter");
        Self {
            interval: Duration::ZERO,
            disabled: true,
            gate: Mutex::new(GateState::default()),
            cumulative_delay_ms: AtomicU64::new(0),
        }
    }

    /// Returns whether rate limiting is disabled.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Returns the minimum interval between permitted calls.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns the total delay applied so far.
    #[must_use]
    pub fn cumulative_delay(&self) -> Duration {
        Duration::from_millis(self.cumulative_delay_ms.load(Ordering::SeqCst))
    }

    /// Waits until the caller is permitted to issue a request.
    ///
    /// Returns immediately on the first call. Afterwards, waits until at least
    /// the configured interval has elapsed since the previous permit, or until
    /// a server-mandated hold recorded with
    /// [`record_server_delay`](Self::record_server_delay) expires, whichever
    /// is later.
    #[instrument(skip(self))]
    pub async fn wait(&self) {
        let never_raised = AtomicBool::new(false);
        self.wait_unless_interrupted(&never_raised).await;
    }

    /// Like [`wait`](Self::wait), but gives up as soon as `interrupted` is set.
    ///
    /// Returns `false` without handing out a permit when interrupted.
    #[instrument(skip_all)]
    pub async fn wait_unless_interrupted(&self, interrupted: &AtomicBool) -> bool {
        if self.disabled {
            return !interrupted.load(Ordering::SeqCst);
        }

        let mut gate = self.gate.lock().await;

        let mut not_before = gate.last_permit.map(|last| last + self.interval);
        if let Some(hold) = gate.hold_until.take() {
            not_before = Some(not_before.map_or(hold, |t| t.max(hold)));
        }

        if let Some(not_before) = not_before {
            let now = Instant::now();
            if not_before > now {
                let delay = not_before - now;
                let cumulative = self.add_cumulative_delay(delay);

                debug!(
                    delay_ms = delay.as_millis(),
                    cumulative_ms = cumulative.as_millis(),
                    "applying rate limit delay"
                );

                if cumulative >= CUMULATIVE_DELAY_WARNING_THRESHOLD
                    && cumulative - delay < CUMULATIVE_DELAY_WARNING_THRESHOLD
                {
                    warn!(
                        cumulative_delay_secs = cumulative.as_secs(),
                        "excessive rate limiting - consider a shorter date range"
                    );
                }

                if !sleep_until_or_interrupted(not_before, interrupted).await {
                    debug!("interrupted while rate limited");
                    return false;
                }
            }
        } else {
            debug!("first request - no delay");
        }

        if interrupted.load(Ordering::SeqCst) {
            return false;
        }
        gate.last_permit = Some(Instant::now());
        true
    }

    /// Records a server-mandated delay (from a Retry-After header).
    ///
    /// The next call to [`wait`](Self::wait) will not return before `delay`
    /// has elapsed from now.
    #[instrument(skip(self), fields(delay_ms = delay.as_millis()))]
    pub async fn record_server_delay(&self, delay: Duration) {
        if self.disabled {
            return;
        }
        let until = Instant::now() + delay;
        let mut gate = self.gate.lock().await;
        gate.hold_until = Some(gate.hold_until.map_or(until, |t| t.max(until)));
        debug!("recorded server rate limit");
    }

    #[allow(clippy::cast_possible_truncation)]
    fn add_cumulative_delay(&self, delay: Duration) -> Duration {
        let delay_ms = delay.as_millis() as u64;
        let total = self
            .cumulative_delay_ms
            .fetch_add(delay_ms, Ordering::SeqCst)
            + delay_ms;
        Duration::from_millis(total)
    }
}

/// Sleeps until `deadline`, waking early once `interrupted` is set.
///
/// Returns `false` if the flag cut the sleep short.
pub(crate) async fn sleep_until_or_interrupted(deadline: Instant, interrupted: &AtomicBool) -> bool {
    loop {
        if interrupted.load(Ordering::SeqCst) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        tokio::time::sleep_until(deadline.min(now + INTERRUPT_POLL_INTERVAL)).await;
    }
}

/// Parses a Retry-After header value into a Duration.
///
/// Supports two formats as per RFC 7231:
/// - Integer seconds: `Retry-After: 120`
/// - HTTP-date: `Retry-After: Wed, 21 Oct 2025 07:28:00 GMT`
///
/// Returns `None` if the value cannot be parsed. Caps excessive values at 1 hour.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use benzinga_core::download::parse_retry_after;
///
/// assert_eq!(parse_retry_after("120"), Some(Duration::from_secs(120)));
/// assert_eq!(parse_retry_after("0"), Some(Duration::ZERO));
/// assert_eq!(parse_retry_after("invalid"), None);
/// ```
#[must_use]
#[instrument]
pub fn parse_retry_after(header_value: &str) -> Option<Duration> {
    let header_value = header_value.trim();

    if let Ok(seconds) = header_value.parse::<i64>() {
        if seconds < 0 {
            debug!(seconds, "negative Retry-After value, ignoring");
            return None;
        }

        #[allow(clippy::cast_sign_loss)]
        let duration = Duration::from_secs(seconds as u64);

        if duration > MAX_RETRY_AFTER {
            warn!(
                seconds,
                max_seconds = MAX_RETRY_AFTER.as_secs(),
                "Retry-After exceeds maximum, capping at 1 hour"
            );
            return Some(MAX_RETRY_AFTER);
        }

        return Some(duration);
    }

    let Ok(datetime) = httpdate::parse_http_date(header_value) else {
        debug!(header_value, "unparseable Retry-After value");
        return None;
    };

    match datetime.duration_since(std::time::SystemTime::now()) {
        Ok(duration) if duration > MAX_RETRY_AFTER => {
            warn!(
                delay_secs = duration.as_secs(),
                max_secs = MAX_RETRY_AFTER.as_secs(),
                "Retry-After date exceeds maximum, capping at 1 hour"
            );
            Some(MAX_RETRY_AFTER)
        }
        Ok(duration) => Some(duration),
        // Date is in the past
        Err(_) => Some(Duration::ZERO),
    }
}
