use super::error::*;
use crate::application_port::*;
use crate::domain_model::{PageSize, RequestContext};
use serde::Deserialize;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::hyper::body::Bytes;
use warp::{self, reject};

#[derive(Debug, Deserialize)]
pub struct ListMessagesQuery {
    #[serde(rename = "maxItems")]
    pub max_items: Option<i64>,
    pub token: Option<String>,
}

pub async fn list_messages(
    query: ListMessagesQuery,
    ctx: RequestContext,
    message_service: Arc<dyn MessageService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let page_size = query
        .max_items
        .map(PageSize::try_from)
        .transpose()
        .map_err(MessageError::from)
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;
    // an empty token means "first page", anything else must decode
    let cursor = query.token.as_deref().filter(|token| !token.is_empty());

    let page = message_service
        .list_messages(&ctx, page_size, cursor)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&page))
}

pub async fn create_message(
    body: Bytes,
    ctx: RequestContext,
    message_service: Arc<dyn MessageService>,
    author: Arc<str>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let content = std::str::from_utf8(&body)
        .map_err(|_| ApiErrorCode::InvalidRequest("body must be UTF-8 text".to_string()))
        .map_err(reject::custom)?;

    let message = message_service
        .create_message(&ctx, content, &author)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::with_status(
        warp::reply::json(&message),
        StatusCode::CREATED,
    ))
}

pub async fn health() -> Result<impl warp::Reply, warp::Rejection> {
    Ok(warp::reply::json(&serde_json::json!({ "status": "ok" })))
}
