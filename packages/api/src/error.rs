// ABOUTME: API error type and the JSON error envelope
// ABOUTME: Request-context middleware and panic handler share the same envelope

use std::any::Any;

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use metatag_storage::StorageError;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

/// Main application error type that all handlers return
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{message}")]
    InvalidBody { status: StatusCode, message: String },

    #[error("{0}")]
    Internal(String),
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidBody { status, .. } => *status,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(msg) => ApiError::NotFound(msg),
            err => {
                if !err.is_client_error() {
                    error!(error = %err, "Storage failure while handling request");
                }
                ApiError::BadRequest(err.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

/// JSON body extractor whose rejections use the API error envelope
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Body of every error response
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
    pub details: String,
    /// `METHOD path` of the failed request, filled in by `request_context`
    pub request: String,
}

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    error: &'a ErrorBody,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let details = match &self {
            ApiError::Internal(err) => {
                let request_id = Uuid::new_v4().to_string();
                error!(
                    request_id = %request_id,
                    error = %err,
                    "Internal server error occurred"
                );
                format!("An internal server error occurred (request id: {})", request_id)
            }
            other => {
                info!(
                    status = %status.as_u16(),
                    error = %other,
                    "API error response"
                );
                other.to_string()
            }
        };

        error_response(status, details)
    }
}

fn error_response(status: StatusCode, details: String) -> Response {
    let body = ErrorBody {
        code: status.as_u16(),
        message: status.canonical_reason().unwrap_or("Error").to_string(),
        details,
        request: String::new(),
    };
    render(status, body)
}

fn render(status: StatusCode, body: ErrorBody) -> Response {
    let mut response = (status, Json(ErrorEnvelope { error: &body })).into_response();
    response.extensions_mut().insert(body);
    response
}

/// Stamp error envelopes with the request that produced them
pub async fn request_context(request: Request, next: Next) -> Response {
    let label = format!("{} {}", request.method(), request.uri().path());
    let mut response = next.run(request).await;

    match response.extensions_mut().remove::<ErrorBody>() {
        Some(mut body) => {
            body.request = label;
            render(response.status(), body)
        }
        None => response,
    }
}

/// Turn a handler panic into a 500 envelope
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    ApiError::Internal(format!("handler panicked: {}", detail)).into_response()
}
