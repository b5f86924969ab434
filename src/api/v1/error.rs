use crate::application_port::*;
use crate::infra_authz::TokenError;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use tracing::{debug, warn};
use warp::http::StatusCode;
use warp::{Rejection, reject};

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
}

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let (status, message) = if let Some(code) = err.find::<ApiErrorCode>() {
        (code.status(), code.to_string())
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not Found".to_string())
    } else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large".to_string())
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        (StatusCode::LENGTH_REQUIRED, "Length Required".to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed".to_string())
    } else {
        warn!("unhandled rejection: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiErrorCode::InternalError.to_string(),
        )
    };

    let json = warp::reply::json(&ErrorBody { message });
    Ok(warp::reply::with_status(json, status))
}

#[derive(Debug, Clone, Error)]
pub enum ApiErrorCode {
    #[error("Unauthorized")]
    InvalidToken,
    #[error("Forbidden")]
    Forbidden,
    #[error("Invalid pagination token")]
    InvalidCursor,
    #[error("Bad Request: {0}")]
    InvalidRequest(String),
    #[error("Internal Server Error")]
    InternalError,
}

impl ApiErrorCode {
    pub fn internal<E: std::fmt::Display>(error: E) -> ApiErrorCode {
        warn!("Internal error: {}", error);
        ApiErrorCode::InternalError
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::InvalidToken => StatusCode::UNAUTHORIZED,
            ApiErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ApiErrorCode::InvalidCursor | ApiErrorCode::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl reject::Reject for ApiErrorCode {}

impl From<MessageError> for ApiErrorCode {
    fn from(error: MessageError) -> Self {
        match error {
            MessageError::Forbidden { .. } => ApiErrorCode::Forbidden,
            MessageError::InvalidCursor(e) => {
                debug!("rejected cursor: {}", e);
                ApiErrorCode::InvalidCursor
            }
            MessageError::Validation(e) => ApiErrorCode::InvalidRequest(e.to_string()),
            e @ (MessageError::Key(_)
            | MessageError::StoreWrite(_)
            | MessageError::StoreRead(_)) => ApiErrorCode::internal(e),
        }
    }
}

impl From<TokenError> for ApiErrorCode {
    fn from(error: TokenError) -> Self {
        debug!("rejected bearer token: {}", error);
        ApiErrorCode::InvalidToken
    }
}
