use crate::domain_model::ListMarker;
use crate::domain_port::*;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

/// Object store on plain Redis strings.
///
/// Objects live at `<prefix>:obj:<key>`. In a listed store every key is also
/// a member of the sorted set `<prefix>:index` with score 0, which makes
/// `ZRANGEBYLEX` list them in byte order. An unlisted store skips the index
/// and only supports `put` and `get`.
pub struct RedisObjectStore {
    conn: ConnectionManager,
    prefix: String,
    indexed: bool,
}

impl RedisObjectStore {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        RedisObjectStore {
            conn,
            prefix: prefix.into(),
            indexed: true,
        }
    }

    /// Point lookups only; nothing is added to a listing index.
    pub fn unlisted(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        RedisObjectStore {
            indexed: false,
            ..Self::new(conn, prefix)
        }
    }

    fn object_key(&self, key: &str) -> String {
        object_key(&self.prefix, key)
    }

    fn index_key(&self) -> String {
        index_key(&self.prefix)
    }
}

fn object_key(prefix: &str, key: &str) -> String {
    format!("{}:obj:{}", prefix, key)
}

fn index_key(prefix: &str) -> String {
    format!("{}:index", prefix)
}

fn put_pipeline(prefix: &str, indexed: bool, key: &str, value: Vec<u8>) -> redis::Pipeline {
    let mut pipe = redis::pipe();
    pipe.atomic().set(object_key(prefix, key), value).ignore();
    if indexed {
        pipe.zadd(index_key(prefix), key, 0).ignore();
    }
    pipe
}

/// Lower bound for `ZRANGEBYLEX`: everything, or strictly after the marker.
fn lex_lower_bound(start_after: Option<&ListMarker>) -> String {
    match start_after {
        Some(marker) => format!("({}", marker.0),
        None => "-".to_string(),
    }
}

#[async_trait::async_trait]
impl ObjectStore for RedisObjectStore {
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), ObjectStoreError> {
        let mut conn = self.conn.clone();
        let _: () = put_pipeline(&self.prefix, self.indexed, key, value)
            .query_async(&mut conn)
            .await
            .map_err(|e| ObjectStoreError::Write {
                key: key.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn
            .get(self.object_key(key))
            .await
            .map_err(|e| ObjectStoreError::Read(e.to_string()))?;
        value.ok_or_else(|| ObjectStoreError::NotFound(key.to_string()))
    }

    async fn list_keys(
        &self,
        max_keys: u32,
        start_after: Option<&ListMarker>,
    ) -> Result<KeyPage, ObjectStoreError> {
        if !self.indexed {
            return Err(ObjectStoreError::Read(format!(
                "{} is not listed",
                self.prefix
            )));
        }
        let limit = max_keys.clamp(1, MAX_LIST_KEYS) as usize;
        let mut conn = self.conn.clone();
        let mut keys: Vec<String> = conn
            .zrangebylex_limit(
                self.index_key(),
                lex_lower_bound(start_after),
                "+",
                0,
                (limit + 1) as isize,
            )
            .await
            .map_err(|e| ObjectStoreError::Read(e.to_string()))?;

        let next_marker = if keys.len() > limit {
            keys.truncate(limit);
            keys.last().cloned().map(ListMarker)
        } else {
            None
        };
        Ok(KeyPage { keys, next_marker })
    }
}
