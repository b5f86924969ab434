use super::key::TIMESTAMP_FORMAT;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A guestbook entry. This is also the persisted object body:
/// `{"message": .., "author": .., "date": "<ISO-8601>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "message")]
    pub content: String,
    pub author: String,
    #[serde(rename = "date", with = "iso_millis")]
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

mod iso_millis {
    use super::TIMESTAMP_FORMAT;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Message {
        Message {
            content: "hello".to_string(),
            author: "anonymous".to_string(),
            created_at: Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
        }
    }

    #[test]
    fn body_uses_field_tagged_layout() {
        let json: serde_json::Value = serde_json::from_slice(&sample().to_bytes().unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "message": "hello",
                "author": "anonymous",
                "date": "2023-11-14T22:13:20.000Z"
            })
        );
    }

    #[test]
    fn ignores_unknown_fields() {
        let body = br#"{"message":"hi","author":"a","date":"2023-11-14T22:13:20.005Z","mood":"sunny"}"#;
        let message = Message::from_bytes(body).unwrap();
        assert_eq!(message.content, "hi");
        assert_eq!(message.created_at.timestamp_subsec_millis(), 5);
    }

    #[test]
    fn rejects_missing_fields() {
        assert!(Message::from_bytes(br#"{"message":"hi"}"#).is_err());
    }
}
