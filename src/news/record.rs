//! News record model decoded from API pages.

use std::fmt;

use serde::{Deserialize, Deserializer};

/// One upstream news item.
///
/// Only `id` matters to the download loop. Every other field is optional and
/// kept verbatim so the page can be inspected without being re-shaped.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewsRecord {
    /// Unique identifier within the feed.
    #[serde(deserialize_with = "deserialize_id")]
    pub id: u64,

    /// Byline.
    #[serde(default)]
    pub author: Option<String>,

    /// Publication time exactly as sent by the API.
    #[serde(default)]
    pub created: Option<String>,

    /// Last update time exactly as sent by the API.
    #[serde(default)]
    pub updated: Option<String>,

    /// Headline.
    #[serde(default)]
    pub title: Option<String>,

    /// Short summary.
    #[serde(default)]
    pub teaser: Option<String>,

    /// Full HTML body (`displayOutput=full`).
    #[serde(default)]
    pub body: Option<String>,

    /// Canonical article URL.
    #[serde(default)]
    pub url: Option<String>,

    /// Image descriptors, left undecoded.
    #[serde(default)]
    pub image: serde_json::Value,

    /// Channels the item was published under.
    #[serde(default)]
    pub channels: Vec<NamedTag>,

    /// Tickers the item mentions.
    #[serde(default)]
    pub stocks: Vec<NamedTag>,

    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<NamedTag>,
}

/// A `{"name": ...}` entry used by channels, stocks, and tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NamedTag {
    /// Display name or ticker symbol.
    #[serde(default)]
    pub name: String,
}

impl NewsRecord {
    /// Ticker symbols mentioned by this item.
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.stocks
            .iter()
            .map(|stock| stock.name.as_str())
            .filter(|name| !name.is_empty())
    }
}

/// Accepts an id sent either as a JSON number or as a string of digits.
fn deserialize_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    struct IdVisitor;

    impl serde::de::Visitor<'_> for IdVisitor {
        type Value = u64;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a non-negative integer id or a string of digits")
        }

        fn visit_u64<E: serde::de::Error>(self, value: u64) -> Result<u64, E> {
            Ok(value)
        }

        fn visit_i64<E: serde::de::Error>(self, value: i64) -> Result<u64, E> {
            u64::try_from(value).map_err(|_| E::custom(format!("negative id {value}")))
        }

        fn visit_str<E: serde::de::Error>(self, value: &str) -> Result<u64, E> {
            let trimmed = value.trim();
            if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
                return Err(E::custom(format!("id '{value}' is not numeric")));
            }
            trimmed
                .parse()
                .map_err(|_| E::custom(format!("id '{value}' is out of range")))
        }
    }

    deserializer.deserialize_any(IdVisitor)
}
