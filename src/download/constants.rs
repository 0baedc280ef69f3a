//! Constants for the download module (endpoint, paging, timeouts, rate limiting).

use std::time::Duration;

/// Default Benzinga API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.benzinga.com/api/v2";

/// Number of records requested per page.
pub const PAGE_SIZE: u32 = 100;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (60 seconds, pages are small).
pub const READ_TIMEOUT_SECS: u64 = 60;

/// Default minimum interval between API requests.
pub const DEFAULT_RATE_LIMIT: Duration = Duration::from_millis(500);

/// Default safety bound on pages fetched for a single date.
pub const DEFAULT_MAX_PAGES: u32 = 1000;

/// Maximum Retry-After header value (1 hour) to prevent excessive delays.
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(3600);

/// Body the API returns once a date has no more pages.
pub(crate) const EMPTY_PAGE_TOKEN: &str = "[]";
