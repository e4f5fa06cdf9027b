//! API route handlers
//!
//! This module contains all HTTP endpoint implementations for the FaceSearch
//! server. Routes are organized by functionality:
//!
//! - `health`: Health checks and readiness
//! - `register`: Person registration (single and bulk)
//! - `search`: Face lookup by image
//! - `admin`: Administrative index operations

pub mod admin;
pub mod health;
pub mod register;
pub mod search;

use crate::error::{ServerError, ServerResult};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// API version and base info
///
/// Returns server information including version and available endpoints.
/// This is the root endpoint (GET /) and requires no authentication.
pub async fn api_info() -> ServerResult<impl IntoResponse> {
    Ok(Json(json!({
        "name": "FaceSearch Server",
        "version": env!("CARGO_PKG_VERSION"),
        "api_version": "v1",
        "endpoints": [
            "/api/v1/register",
            "/api/v1/register/bulk",
            "/api/v1/search",
            "/api/v1/admin/index",
            "/images",
            "/health",
            "/ready"
        ]
    })))
}

/// 404 Not Found handler
///
/// Returns a standardized error response for undefined routes.
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
