//! News feed data: record model, page parsing, and timestamp normalization.
//!
//! # Example
//!
//! ```
//! use benzinga_core::news::{IdRange, parse_page};
//!
//! let records = parse_page(r#"[{"id": 12}, {"id": 10}]"#).unwrap();
//! let range = IdRange::of(&records).unwrap();
//! assert_eq!(range.file_name(), "benzinga_api_10_12.json");
//! ```

mod error;
mod parser;
mod record;
mod timestamp;

pub use error::{ParseError, TimestampFormatError};
pub use parser::{IdRange, parse_page};
pub use record::{NamedTag, NewsRecord};
pub use timestamp::normalize_utc_timestamp;
