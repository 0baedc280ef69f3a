//! Lenient parsing of the feed's JavaScript-style timestamps.
//!
//! The live feed emits dates shaped like `Wed Mar 4 2020 19:54:18 GMT+0000 (UTC)`,
//! but the producer pads tokens with arbitrary runs of whitespace. The
//! parenthetical zone name duplicates the numeric offset and is discarded.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use super::TimestampFormatError;

/// Token layout after whitespace has been collapsed and the zone name removed.
const TIMESTAMP_FORMAT: &str = "%a %b %e %Y %H:%M:%S GMT%z";

/// Trailing `(ZONE NAME)` fragment.
#[allow(clippy::expect_used)]
static ZONE_NAME_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*\([^()]*\)$").expect("zone name regex is valid") // Static pattern, safe to panic
});

/// Converts a feed timestamp into a UTC instant.
///
/// Whitespace runs anywhere in the input are collapsed to one space and the
/// ends are trimmed. A trailing parenthetical zone abbreviation is optional and
/// ignored; the `GMT±HHMM` offset determines the instant. The function is pure.
///
/// # Errors
///
/// Returns [`TimestampFormatError`] when the cleaned text is not
/// `weekday month day year HH:MM:SS GMT±HHMM`, or names a weekday that does
/// not fall on the given date.
///
/// # Example
///
/// ```
/// use benzinga_core::news::normalize_utc_timestamp;
///
/// let utc = normalize_utc_timestamp("Wed Mar    4 2020 19:54:18  GMT+0000 (UTC)").unwrap();
/// assert_eq!(utc.to_rfc3339(), "2020-03-04T19:54:18+00:00");
/// ```
pub fn normalize_utc_timestamp(raw: &str) -> Result<DateTime<Utc>, TimestampFormatError> {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let cleaned = ZONE_NAME_SUFFIX.replace(&collapsed, "");

    DateTime::parse_from_str(&cleaned, TIMESTAMP_FORMAT)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| TimestampFormatError {
            input: raw.to_string(),
            reason: e.to_string(),
        })
}
