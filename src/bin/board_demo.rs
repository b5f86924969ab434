//! Writes a handful of messages to an in-memory board and pages through them.
//!
//! $ cargo run --bin board_demo

use chrono::{Duration, Utc};
use guestbook::application_impl::RealMessageService;
use guestbook::application_port::MessageService;
use guestbook::domain_model::{Action, PageSize, RequestContext};
use guestbook::domain_port::ManualClock;
use guestbook::infra_authz::{Policy, RbacAuthorizer};
use guestbook::infra_memory::MemoryObjectStore;
use guestbook::logger::*;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _logger = Logger::new_bootstrap();

    let authorizer = Arc::new(RbacAuthorizer::new(vec![Policy::new(
        "demo",
        "/demo",
        "*",
    )]));
    let clock = Arc::new(ManualClock::new(Utc::now(), Duration::seconds(1)));
    let service = RealMessageService::new(
        Arc::new(MemoryObjectStore::new()),
        Arc::new(MemoryObjectStore::new()),
        authorizer,
        clock,
    );
    let ctx = RequestContext::new("demo-1", "demo", "/demo");

    for content in ["first!", "hello there", "nice board", "hello there"] {
        let message = service.create_message(&ctx, content, "anonymous").await?;
        info!(content, created_at = %message.created_at, "wrote");
    }

    let page_size = PageSize::try_from(2)?;
    let mut cursor: Option<String> = None;
    let mut page_no = 1;
    loop {
        let page = service
            .list_messages(&ctx, Some(page_size), cursor.as_deref())
            .await?;
        for message in &page.items {
            println!("page {}: [{}] {}", page_no, message.created_at, message.content);
        }
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
        page_no += 1;
    }

    let outsider = RequestContext::new("demo-2", "stranger", "/demo");
    let denied = service.list_messages(&outsider, None, None).await;
    println!("stranger may {}: {}", Action::Read, denied.is_ok());

    Ok(())
}
