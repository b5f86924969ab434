use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_authz::*;
use crate::infra_memory::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::settings::Settings;
use std::sync::Arc;

/// Everything the HTTP layer needs, wired from settings.
pub struct Server {
    pub message_service: Arc<dyn MessageService>,
    pub token_decoder: Arc<BearerTokenDecoder>,
    pub author: Arc<str>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let identity_prefix = format!("{}-ids", settings.store.prefix);
        let (messages, identities): (Arc<dyn ObjectStore>, Arc<dyn ObjectStore>) =
            match settings.store.backend.as_str() {
                "memory" => {
                    let messages: Arc<dyn ObjectStore> = Arc::new(MemoryObjectStore::new());
                    let identities: Arc<dyn ObjectStore> = Arc::new(MemoryObjectStore::new());
                    (messages, identities)
                }
                "redis" => {
                    let url = settings
                        .store
                        .redis_url
                        .as_deref()
                        .ok_or_else(|| anyhow::anyhow!("store.redis_url is required for redis"))?;
                    let client = redis::Client::open(url)?;
                    let manager = client.get_connection_manager().await?;
                    let messages: Arc<dyn ObjectStore> = Arc::new(RedisObjectStore::new(
                        manager.clone(),
                        settings.store.prefix.clone(),
                    ));
                    let identities: Arc<dyn ObjectStore> =
                        Arc::new(RedisObjectStore::unlisted(manager, identity_prefix));
                    (messages, identities)
                }
                other => return Err(anyhow::anyhow!("Unknown store backend: {}", other)),
            };

        let policies = settings
            .authz
            .policies
            .iter()
            .map(|rule| Policy::new(&rule.role, &rule.object, &rule.action))
            .collect();
        let authorizer: Arc<dyn Authorizer> = Arc::new(RbacAuthorizer::new(policies));

        let token_decoder = Arc::new(BearerTokenDecoder::new(
            settings.authz.jwt_secret.as_deref(),
        ));
        if !token_decoder.verifies_signature() {
            warn!("authz.jwt_secret not set, bearer tokens are not verified");
        }

        let message_service: Arc<dyn MessageService> = Arc::new(
            RealMessageService::new(messages, identities, authorizer, Arc::new(SystemClock))
                .with_default_page_size(settings.board.default_page_size),
        );

        info!(backend = %settings.store.backend, "server started");

        Ok(Self::from_parts(
            message_service,
            token_decoder,
            &settings.board.author,
        ))
    }

    pub fn from_parts(
        message_service: Arc<dyn MessageService>,
        token_decoder: Arc<BearerTokenDecoder>,
        author: &str,
    ) -> Self {
        Self {
            message_service,
            token_decoder,
            author: Arc::from(author),
        }
    }
}
