use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt;

/// Store-native continuation marker: listing resumes strictly after it.
/// Only meaningful to the store that produced it.
#[derive(Debug, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct ListMarker(pub String);

impl fmt::Display for ListMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CursorError {
    #[error("cursor is empty")]
    Empty,
    #[error("cursor is not valid base64: {0}")]
    Encoding(String),
    #[error("cursor payload is not valid utf-8")]
    Payload,
}

/// Wraps a marker into the opaque token handed to clients.
pub fn encode_cursor(marker: &ListMarker) -> String {
    STANDARD.encode(marker.0.as_bytes())
}

pub fn decode_cursor(token: &str) -> Result<ListMarker, CursorError> {
    if token.is_empty() {
        return Err(CursorError::Empty);
    }
    let bytes = STANDARD
        .decode(token)
        .map_err(|e| CursorError::Encoding(e.to_string()))?;
    if bytes.is_empty() {
        return Err(CursorError::Empty);
    }
    let marker = String::from_utf8(bytes).map_err(|_| CursorError::Payload)?;
    Ok(ListMarker(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_markers() {
        let markers = [
            "7974-89-87T92:97:94.432Z/5b4b8f4e-3c5a-5d0e-9d0f-6a5b7c8d9e0f",
            "a",
            "key with spaces & symbols ?=+/",
            "ünïcödé/ключ",
        ];
        for m in markers {
            let marker = ListMarker(m.to_string());
            assert_eq!(decode_cursor(&encode_cursor(&marker)), Ok(marker));
        }
    }

    #[test]
    fn token_is_standard_base64() {
        let marker = ListMarker("abc".to_string());
        assert_eq!(encode_cursor(&marker), "YWJj");
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            decode_cursor("not-a-real-token"),
            Err(CursorError::Encoding(_))
        ));
        assert!(matches!(decode_cursor("YWJ"), Err(CursorError::Encoding(_))));
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(decode_cursor(""), Err(CursorError::Empty));
    }

    #[test]
    fn rejects_non_utf8_payload() {
        // 0xff 0xfe 0xfd
        assert_eq!(decode_cursor("//79"), Err(CursorError::Payload));
    }
}
