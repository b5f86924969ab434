//! Store key derivation.
//!
//! A store key has the form `<inverse timestamp>/<content id>`. The object
//! store only lists keys in ascending byte order, so the timestamp prefix is
//! written in nines' complement: newer messages get smaller prefixes and are
//! listed first.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Fixed-width ISO-8601 rendering with millisecond precision, e.g.
/// `2024-03-09T17:04:05.123Z`. Every field is zero padded so each digit
/// sits at the same position for any year in `0000..=9999`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Length of any string produced by [`TIMESTAMP_FORMAT`].
pub const TIMESTAMP_LEN: usize = 24;

pub const MIN_ENCODABLE_YEAR: i32 = 0;
pub const MAX_ENCODABLE_YEAR: i32 = 9999;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyCodecError {
    #[error("timestamp {0} is outside the encodable range (years 0000-9999)")]
    TimestampOutOfRange(DateTime<Utc>),
}

#[derive(Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ContentId(pub Uuid);

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.as_hyphenated())
    }
}

#[derive(Debug, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct StoreKey(String);

impl StoreKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl StoreKey {
    /// The non-temporal half of the key.
    pub fn content_id(&self) -> Option<ContentId> {
        let (_, id) = self.0.split_once('/')?;
        Uuid::parse_str(id).ok().map(ContentId)
    }

    /// The timestamp the key was built from, decoded from its inverse prefix.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let (prefix, _) = self.0.split_once('/')?;
        DateTime::parse_from_rfc3339(&nines_complement(prefix))
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}

impl FromStr for StoreKey {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix, id) = s
            .split_once('/')
            .ok_or_else(|| format!("missing separator in key: {}", s))?;
        if prefix.len() != TIMESTAMP_LEN {
            return Err(format!("bad timestamp prefix length: {}", prefix.len()));
        }
        DateTime::parse_from_rfc3339(&nines_complement(prefix))
            .map_err(|e| format!("bad timestamp prefix: {}", e))?;
        Uuid::parse_str(id).map_err(|e| format!("bad content id: {}", e))?;
        Ok(StoreKey(s.to_string()))
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// First step of content id derivation: a name-based (v5) UUID for the
/// author, seeded with the well-known URL namespace.
pub fn derive_author_namespace(author: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, author.as_bytes())
}

/// Second step: a v5 UUID of the content inside the author's namespace.
/// Same author and content always give the same id.
pub fn derive_content_id(author: &str, content: &str) -> ContentId {
    let namespace = derive_author_namespace(author);
    ContentId(Uuid::new_v5(&namespace, content.as_bytes()))
}

/// Renders `timestamp` with [`TIMESTAMP_FORMAT`] and replaces every digit
/// `d` with `9 - d`. Separators are left alone. Sub-millisecond precision
/// is dropped, so ordering is reversed at millisecond resolution.
pub fn encode_inverse_timestamp(timestamp: &DateTime<Utc>) -> Result<String, KeyCodecError> {
    let year = timestamp.year();
    if !(MIN_ENCODABLE_YEAR..=MAX_ENCODABLE_YEAR).contains(&year) {
        return Err(KeyCodecError::TimestampOutOfRange(*timestamp));
    }
    let rendered = timestamp.format(TIMESTAMP_FORMAT).to_string();
    debug_assert_eq!(rendered.len(), TIMESTAMP_LEN);
    Ok(nines_complement(&rendered))
}

pub fn build_key(
    timestamp: &DateTime<Utc>,
    author: &str,
    content: &str,
) -> Result<StoreKey, KeyCodecError> {
    let prefix = encode_inverse_timestamp(timestamp)?;
    let content_id = derive_content_id(author, content);
    Ok(StoreKey(format!("{}/{}", prefix, content_id)))
}

fn nines_complement(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_ascii_digit() {
                (b'9' - (c as u8 - b'0')) as char
            } else {
                c
            }
        })
        .collect()
}
