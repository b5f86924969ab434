use crate::domain_model::*;
use crate::domain_port::ObjectStoreError;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("{subject} is not allowed to {action} {object}")]
    Forbidden {
        subject: String,
        object: String,
        action: Action,
    },
    #[error("invalid cursor: {0}")]
    InvalidCursor(#[from] CursorError),
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("key derivation failed: {0}")]
    Key(#[from] KeyCodecError),
    #[error("store write error: {0}")]
    StoreWrite(String),
    #[error("store read error: {0}")]
    StoreRead(String),
}

impl MessageError {
    pub(crate) fn from_write(err: ObjectStoreError) -> Self {
        MessageError::StoreWrite(err.to_string())
    }

    pub(crate) fn from_read(err: ObjectStoreError) -> Self {
        MessageError::StoreRead(err.to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MessagePage {
    /// Newest first.
    pub items: Vec<Message>,
    /// Opaque token for the next page. Absent at the end of the stream.
    #[serde(rename = "nextToken", skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

#[async_trait::async_trait]
pub trait MessageService: Send + Sync {
    /// Stores `content` under a key derived from `author` and `content`.
    /// Writing the same pair again overwrites the earlier object.
    async fn create_message(
        &self,
        ctx: &RequestContext,
        content: &str,
        author: &str,
    ) -> Result<Message, MessageError>;

    async fn list_messages(
        &self,
        ctx: &RequestContext,
        page_size: Option<PageSize>,
        cursor: Option<&str>,
    ) -> Result<MessagePage, MessageError>;
}
