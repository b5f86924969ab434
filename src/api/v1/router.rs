use super::error::*;
use super::handler::{self, ListMessagesQuery};
use crate::domain_model::RequestContext;
use crate::server::*;
use std::convert::Infallible;
use std::sync::Arc;
use warp::filters::path::FullPath;
use warp::{Filter, http, reject};

const MAX_MESSAGE_BYTES: u64 = 64 * 1024;

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    // path before method, so unknown paths reject as 404 rather than 405
    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and_then(handler::health);

    let list_messages = warp::path("messages")
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<ListMessagesQuery>())
        .and(with_request_context(server.clone()))
        .and(with(server.message_service.clone()))
        .and_then(handler::list_messages);

    let create_message = warp::path("messages")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_MESSAGE_BYTES))
        .and(warp::body::bytes())
        .and(with_request_context(server.clone()))
        .and(with(server.message_service.clone()))
        .and(with(server.author.clone()))
        .and_then(handler::create_message);

    health.or(list_messages).or(create_message)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

/// Resolves the caller from the bearer token, records their groups as roles
/// and builds the per-request context the service runs with.
fn with_request_context(
    server: Arc<Server>,
) -> impl Filter<Extract = (RequestContext,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>(http::header::AUTHORIZATION.as_ref())
        .and(warp::header::optional::<String>("x-request-id"))
        .and(warp::path::full())
        .and_then(
            move |authorization: Option<String>, request_id: Option<String>, path: FullPath| {
                let server = server.clone();
                async move {
                    let principal = server
                        .token_decoder
                        .decode_header(authorization.as_deref())
                        .map_err(ApiErrorCode::from)
                        .map_err(reject::custom)?;

                    let request_id =
                        request_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
                    Ok::<_, warp::Rejection>(
                        RequestContext::new(request_id, principal.subject, path.as_str())
                            .with_roles(principal.groups),
                    )
                }
            },
        )
}
