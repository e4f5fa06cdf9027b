use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use facesearch::{EmbedError, MatchError, ServiceError, StoreError};
use serde::{Deserialize, Serialize};
use serde_json::json;

pub type ServerResult<T> = Result<T, ServerError>;

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unsupported image type: {0}")]
    UnsupportedImage(String),

    #[error("Payload too large")]
    PayloadTooLarge,

    #[error("Pipeline error: {0}")]
    Service(#[from] ServiceError),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found")]
    NotFound,
}

/// API error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ServerError {
    /// Get HTTP status code for this error
    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::UnsupportedImage(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ServerError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::Service(err) => service_status(err),
            ServerError::Internal(_) | ServerError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code string
    fn error_code(&self) -> &'static str {
        match self {
            ServerError::BadRequest(_) => "BAD_REQUEST",
            ServerError::UnsupportedImage(_) => "UNSUPPORTED_IMAGE",
            ServerError::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            ServerError::Service(ServiceError::Embed(_)) => "EMBED_ERROR",
            ServerError::Service(ServiceError::Store(_)) => "STORE_ERROR",
            ServerError::Service(ServiceError::Match(_)) => "MATCH_ERROR",
            ServerError::Internal(_) => "INTERNAL_ERROR",
            ServerError::Config(_) => "CONFIG_ERROR",
            ServerError::NotFound => "NOT_FOUND",
        }
    }
}

/// Status mapping for pipeline failures.
///
/// Client-caused faults (no detectable face, undecodable image, schema
/// violations such as a malformed birth date) are 4xx; an unreachable
/// engine is a gateway problem; everything else is internal.
fn service_status(err: &ServiceError) -> StatusCode {
    match err {
        ServiceError::Embed(EmbedError::NoFaceDetected)
        | ServiceError::Embed(EmbedError::InvalidImage(_)) => StatusCode::UNPROCESSABLE_ENTITY,
        ServiceError::Embed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        ServiceError::Store(err) | ServiceError::Match(MatchError::Store(err)) => {
            store_status(err)
        }
        ServiceError::Match(MatchError::InvalidConfig(_)) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn store_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::Unavailable(_) => StatusCode::BAD_GATEWAY,
        StoreError::SchemaViolation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        StoreError::Backend(_) | StoreError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code().to_string();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(code = %error_code, %status, "request failed: {message}");
        }

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::Internal(format!("IO error: {err}"))
    }
}

impl From<serde_json::Error> for ServerError {
    fn from(err: serde_json::Error) -> Self {
        ServerError::BadRequest(format!("JSON parse error: {err}"))
    }
}

impl From<axum::extract::multipart::MultipartError> for ServerError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        // The body-size cap trips while the multipart stream is read; keep
        // its 413 instead of flattening it into a generic 400.
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ServerError::PayloadTooLarge
        } else {
            ServerError::BadRequest(format!("Malformed multipart body: {err}"))
        }
    }
}

impl From<StoreError> for ServerError {
    fn from(err: StoreError) -> Self {
        ServerError::Service(ServiceError::Store(err))
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::Internal(err.to_string())
    }
}
