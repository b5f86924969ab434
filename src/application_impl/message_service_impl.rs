use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, SubsecRound, Utc};
use futures_util::future::try_join_all;
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, debug, info, info_span, warn};

/// Message board over two flat object stores.
///
/// `messages` holds one object per message under `<inverse timestamp>/<content id>`.
/// `identities` maps a content id to the key its first write landed on, so a
/// repeated write of the same author and content overwrites that object
/// instead of adding a new one.
pub struct RealMessageService {
    messages: Arc<dyn ObjectStore>,
    identities: Arc<dyn ObjectStore>,
    authorizer: Arc<dyn Authorizer>,
    clock: Arc<dyn Clock>,
    default_page_size: PageSize,
}

impl RealMessageService {
    pub fn new(
        messages: Arc<dyn ObjectStore>,
        identities: Arc<dyn ObjectStore>,
        authorizer: Arc<dyn Authorizer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        RealMessageService {
            messages,
            identities,
            authorizer,
            clock,
            default_page_size: PageSize::DEFAULT,
        }
    }

    pub fn with_default_page_size(mut self, page_size: PageSize) -> Self {
        self.default_page_size = page_size;
        self
    }

    async fn authorize(&self, ctx: &RequestContext, action: Action) -> Result<(), MessageError> {
        let started = Instant::now();
        let allowed = self
            .authorizer
            .is_allowed(&ctx.roles, &ctx.subject, &ctx.object, action)
            .await;
        let evaluation_ms = started.elapsed().as_millis() as u64;

        if allowed {
            info!(authorization = "success", evaluation_ms, "access granted");
            Ok(())
        } else {
            warn!(authorization = "failure", evaluation_ms, "access denied");
            Err(MessageError::Forbidden {
                subject: ctx.subject.clone(),
                object: ctx.object.clone(),
                action,
            })
        }
    }

    /// Key an earlier write of this content id landed on, if any.
    async fn recorded_key(&self, content_id: &ContentId) -> Result<Option<StoreKey>, MessageError> {
        let raw = match self.identities.get(&content_id.to_string()).await {
            Ok(raw) => raw,
            Err(ObjectStoreError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(MessageError::from_read(e)),
        };
        let recorded = String::from_utf8(raw)
            .map_err(|e| e.to_string())
            .and_then(|s| s.parse::<StoreKey>());
        match recorded {
            Ok(key) if key.content_id().as_ref() == Some(content_id) => Ok(Some(key)),
            Ok(key) => {
                warn!(%content_id, %key, "identity entry points at a foreign key, replacing");
                Ok(None)
            }
            Err(e) => {
                warn!(%content_id, error = %e, "unreadable identity entry, replacing");
                Ok(None)
            }
        }
    }

    async fn write(&self, content: &str, author: &str) -> Result<Message, MessageError> {
        let now: DateTime<Utc> = self.clock.now().trunc_subsecs(3);
        let content_id = derive_content_id(author, content);

        // a rewrite keeps the creation time its key sorts by
        let (key, created_at) = match self.recorded_key(&content_id).await? {
            Some(key) => {
                debug!(%key, "rewriting existing message");
                let created_at = key.created_at().unwrap_or(now);
                (key, created_at)
            }
            None => {
                let created_at = now;
                let key = build_key(&created_at, author, content)?;
                // recorded before the object so a retry after a failed put reuses the key
                self.identities
                    .put(&content_id.to_string(), key.as_str().as_bytes().to_vec())
                    .await
                    .map_err(MessageError::from_write)?;
                (key, created_at)
            }
        };

        let message = Message {
            content: content.to_string(),
            author: author.to_string(),
            created_at,
        };
        let body = message
            .to_bytes()
            .map_err(|e| MessageError::StoreWrite(e.to_string()))?;
        self.messages
            .put(key.as_str(), body)
            .await
            .map_err(MessageError::from_write)?;

        info!(%key, "message stored");
        Ok(message)
    }

    async fn fetch(&self, key: &str) -> Result<Message, MessageError> {
        let body = self
            .messages
            .get(key)
            .await
            .map_err(MessageError::from_read)?;
        Message::from_bytes(&body)
            .map_err(|e| MessageError::StoreRead(format!("corrupt object {}: {}", key, e)))
    }

    async fn list(
        &self,
        page_size: Option<PageSize>,
        cursor: Option<&str>,
    ) -> Result<MessagePage, MessageError> {
        let page_size = page_size.unwrap_or(self.default_page_size);
        let start_after = cursor.map(decode_cursor).transpose()?;

        let page = self
            .messages
            .list_keys(page_size.get(), start_after.as_ref())
            .await
            .map_err(MessageError::from_read)?;

        let items = try_join_all(page.keys.iter().map(|key| self.fetch(key))).await?;
        let next_cursor = page.next_marker.as_ref().map(encode_cursor);

        debug!(count = items.len(), more = next_cursor.is_some(), "page listed");
        Ok(MessagePage { items, next_cursor })
    }
}

#[async_trait::async_trait]
impl MessageService for RealMessageService {
    async fn create_message(
        &self,
        ctx: &RequestContext,
        content: &str,
        author: &str,
    ) -> Result<Message, MessageError> {
        let span = info_span!(
            "create_message",
            request_id = %ctx.request_id,
            subject = %ctx.subject,
            object = %ctx.object,
            action = %Action::Write,
        );
        async {
            self.authorize(ctx, Action::Write).await?;
            self.write(content, author).await
        }
        .instrument(span)
        .await
    }

    async fn list_messages(
        &self,
        ctx: &RequestContext,
        page_size: Option<PageSize>,
        cursor: Option<&str>,
    ) -> Result<MessagePage, MessageError> {
        let span = info_span!(
            "list_messages",
            request_id = %ctx.request_id,
            subject = %ctx.subject,
            object = %ctx.object,
            action = %Action::Read,
        );
        async {
            self.authorize(ctx, Action::Read).await?;
            self.list(page_size, cursor).await
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra_memory::MemoryObjectStore;
    use chrono::{Duration, TimeZone};
    use std::collections::HashSet;

    struct StaticAuthorizer(bool);

    #[async_trait::async_trait]
    impl Authorizer for StaticAuthorizer {
        async fn is_allowed(
            &self,
            _roles: &[String],
            _subject: &str,
            _object: &str,
            _action: Action,
        ) -> bool {
            self.0
        }
    }

    struct Fixture {
        messages: Arc<MemoryObjectStore>,
        identities: Arc<MemoryObjectStore>,
        clock: Arc<ManualClock>,
        service: RealMessageService,
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).single().unwrap()
    }

    fn fixture(allowed: bool) -> Fixture {
        let messages = Arc::new(MemoryObjectStore::new());
        let identities = Arc::new(MemoryObjectStore::new());
        let clock = Arc::new(ManualClock::new(t0(), Duration::milliseconds(1)));
        let service = RealMessageService::new(
            messages.clone(),
            identities.clone(),
            Arc::new(StaticAuthorizer(allowed)),
            clock.clone(),
        );
        Fixture {
            messages,
            identities,
            clock,
            service,
        }
    }

    fn ctx() -> RequestContext {
        RequestContext::new("req-1", "user-1", "/api/v1/messages")
    }

    async fn only_key(store: &MemoryObjectStore) -> String {
        let page = store.list_keys(10, None).await.unwrap();
        assert_eq!(page.keys.len(), 1);
        page.keys[0].clone()
    }

    #[tokio::test]
    async fn write_stores_body_under_derived_key() {
        let f = fixture(true);
        let message = f.service.create_message(&ctx(), "hello", "anon").await.unwrap();
        assert_eq!(message.created_at, t0());

        let key = only_key(&f.messages).await;
        assert_eq!(key, build_key(&t0(), "anon", "hello").unwrap().into_string());
        let stored = Message::from_bytes(&f.messages.get(&key).await.unwrap()).unwrap();
        assert_eq!(stored, message);
    }

    #[tokio::test]
    async fn identical_writes_share_a_key() {
        let f = fixture(true);
        let first = f.service.create_message(&ctx(), "hello", "anon").await.unwrap();
        f.clock.advance(Duration::minutes(5));
        let second = f.service.create_message(&ctx(), "hello", "anon").await.unwrap();

        assert_eq!(second.created_at, first.created_at);
        let key = only_key(&f.messages).await;
        let stored = Message::from_bytes(&f.messages.get(&key).await.unwrap()).unwrap();
        assert_eq!(stored.created_at, first.created_at);
    }

    #[tokio::test]
    async fn rewrite_keeps_listing_newest_first() {
        let f = fixture(true);
        f.service.create_message(&ctx(), "A", "anon").await.unwrap();
        f.clock.advance(Duration::minutes(1));
        f.service.create_message(&ctx(), "B", "anon").await.unwrap();
        f.clock.advance(Duration::minutes(1));
        f.service.create_message(&ctx(), "A", "anon").await.unwrap();

        let page = f.service.list_messages(&ctx(), None, None).await.unwrap();
        let contents: Vec<_> = page.items.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["B", "A"]);
        assert!(page.items[0].created_at > page.items[1].created_at);
    }

    #[tokio::test]
    async fn same_content_from_other_author_is_new_message() {
        let f = fixture(true);
        f.service.create_message(&ctx(), "hi", "alice").await.unwrap();
        f.service.create_message(&ctx(), "hi", "bob").await.unwrap();
        assert_eq!(f.messages.len(), 2);
    }

    #[tokio::test]
    async fn retry_after_failed_put_reuses_key() {
        let f = fixture(true);
        f.messages.fail_puts(true);
        let err = f.service.create_message(&ctx(), "hello", "anon").await;
        assert!(matches!(err, Err(MessageError::StoreWrite(_))));
        assert!(f.messages.is_empty());

        f.messages.fail_puts(false);
        f.clock.advance(Duration::seconds(30));
        f.service.create_message(&ctx(), "hello", "anon").await.unwrap();
        let key = only_key(&f.messages).await;
        assert_eq!(key, build_key(&t0(), "anon", "hello").unwrap().into_string());
    }

    #[tokio::test]
    async fn corrupt_identity_entry_is_replaced() {
        let f = fixture(true);
        let content_id = derive_content_id("anon", "hello");
        f.identities
            .put(&content_id.to_string(), b"garbage".to_vec())
            .await
            .unwrap();
        f.service.create_message(&ctx(), "hello", "anon").await.unwrap();
        let recorded = f.identities.get(&content_id.to_string()).await.unwrap();
        assert_eq!(
            String::from_utf8(recorded).unwrap(),
            build_key(&t0(), "anon", "hello").unwrap().into_string()
        );
    }

    #[tokio::test]
    async fn identity_store_failure_fails_write() {
        let f = fixture(true);
        f.identities.fail_puts(true);
        let err = f.service.create_message(&ctx(), "hello", "anon").await;
        assert!(matches!(err, Err(MessageError::StoreWrite(_))));
        assert!(f.messages.is_empty());
    }

    #[tokio::test]
    async fn denied_write_touches_nothing() {
        let f = fixture(false);
        let err = f.service.create_message(&ctx(), "hello", "anon").await;
        assert!(matches!(err, Err(MessageError::Forbidden { action: Action::Write, .. })));
        assert!(f.messages.is_empty());
        assert!(f.identities.is_empty());
    }

    #[tokio::test]
    async fn denied_list_never_reaches_store() {
        let f = fixture(false);
        f.messages.fail_lists(true);
        let err = f.service.list_messages(&ctx(), None, Some("not-a-real-token")).await;
        assert!(matches!(err, Err(MessageError::Forbidden { action: Action::Read, .. })));
    }

    #[tokio::test]
    async fn newest_first_scenario() {
        let f = fixture(true);
        let hello = f.service.create_message(&ctx(), "hello", "anon").await.unwrap();
        f.clock.advance(Duration::seconds(1));
        let world = f.service.create_message(&ctx(), "world", "anon").await.unwrap();

        let one = PageSize::try_from(1).unwrap();
        let first = f.service.list_messages(&ctx(), Some(one), None).await.unwrap();
        assert_eq!(first.items, vec![world]);
        let cursor = first.next_cursor.expect("more pages");

        let second = f
            .service
            .list_messages(&ctx(), Some(one), Some(&cursor))
            .await
            .unwrap();
        assert_eq!(second.items, vec![hello]);
        assert!(second.next_cursor.is_none());
    }

    #[tokio::test]
    async fn paginates_completely_newest_first() {
        let f = fixture(true);
        for i in 0..23 {
            f.service
                .create_message(&ctx(), &format!("message {}", i), "anon")
                .await
                .unwrap();
        }

        let page_size = PageSize::try_from(5).unwrap();
        let mut seen = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = f
                .service
                .list_messages(&ctx(), Some(page_size), cursor.as_deref())
                .await
                .unwrap();
            assert!(page.items.len() <= 5);
            seen.extend(page.items);
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        assert_eq!(seen.len(), 23);
        assert!(seen.windows(2).all(|w| w[0].created_at > w[1].created_at));
        let distinct: HashSet<_> = seen.iter().map(|m| m.content.clone()).collect();
        assert_eq!(distinct.len(), 23);
        assert_eq!(seen[0].content, "message 22");
    }

    #[tokio::test]
    async fn default_page_size_applies() {
        let f = fixture(true);
        for i in 0..25 {
            f.service
                .create_message(&ctx(), &i.to_string(), "anon")
                .await
                .unwrap();
        }
        let page = f.service.list_messages(&ctx(), None, None).await.unwrap();
        assert_eq!(page.items.len(), 20);
        assert!(page.next_cursor.is_some());

        let service = RealMessageService::new(
            f.messages.clone(),
            f.identities.clone(),
            Arc::new(StaticAuthorizer(true)),
            f.clock.clone(),
        )
        .with_default_page_size(PageSize::try_from(7).unwrap());
        let page = service.list_messages(&ctx(), None, None).await.unwrap();
        assert_eq!(page.items.len(), 7);
    }

    #[tokio::test]
    async fn empty_board_lists_nothing() {
        let f = fixture(true);
        let page = f.service.list_messages(&ctx(), None, None).await.unwrap();
        assert!(page.items.is_empty());
        assert!(page.next_cursor.is_none());
    }

    #[tokio::test]
    async fn malformed_cursor_is_rejected() {
        let f = fixture(true);
        f.service.create_message(&ctx(), "hello", "anon").await.unwrap();
        let err = f
            .service
            .list_messages(&ctx(), None, Some("not-a-real-token"))
            .await;
        assert!(matches!(err, Err(MessageError::InvalidCursor(_))));
    }

    #[tokio::test]
    async fn failed_fetch_fails_whole_page() {
        let f = fixture(true);
        for content in ["a", "b", "c"] {
            f.service.create_message(&ctx(), content, "anon").await.unwrap();
        }
        let keys = f.messages.list_keys(10, None).await.unwrap().keys;
        f.messages.fail_get_for(&keys[1]);

        let err = f.service.list_messages(&ctx(), None, None).await;
        assert!(matches!(err, Err(MessageError::StoreRead(_))));
    }

    #[tokio::test]
    async fn corrupt_body_fails_page() {
        let f = fixture(true);
        f.service.create_message(&ctx(), "a", "anon").await.unwrap();
        let key = only_key(&f.messages).await;
        f.messages.put(&key, b"{not json".to_vec()).await.unwrap();

        let err = f.service.list_messages(&ctx(), None, None).await;
        assert!(matches!(err, Err(MessageError::StoreRead(_))));
    }

    #[tokio::test]
    async fn listing_failure_is_store_read_error() {
        let f = fixture(true);
        f.messages.fail_lists(true);
        let err = f.service.list_messages(&ctx(), None, None).await;
        assert!(matches!(err, Err(MessageError::StoreRead(_))));
    }
}
