use crate::domain_model::ListMarker;

/// Largest page a single listing call returns, whatever the caller asks for.
pub const MAX_LIST_KEYS: u32 = 1000;

/// One page of a key listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyPage {
    /// Keys in ascending lexicographic (byte) order.
    pub keys: Vec<String>,
    /// Present only when more keys exist past the last one returned.
    pub next_marker: Option<ListMarker>,
}

#[derive(Debug, thiserror::Error)]
pub enum ObjectStoreError {
    #[error("write failed for {key}: {reason}")]
    Write { key: String, reason: String },
    #[error("read failed: {0}")]
    Read(String),
    #[error("object not found: {0}")]
    NotFound(String),
}

/// A flat key-value object store. No sorting, indexing or querying beyond
/// lexicographic key listing.
///
/// Implementations must give read-after-write consistency for a single key.
/// Listings may lag behind writes.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), ObjectStoreError>;

    async fn get(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError>;

    /// Lists up to `max_keys` keys strictly after `start_after`. The store may
    /// return fewer than requested if it caps page sizes.
    async fn list_keys(
        &self,
        max_keys: u32,
        start_after: Option<&ListMarker>,
    ) -> Result<KeyPage, ObjectStoreError>;
}
