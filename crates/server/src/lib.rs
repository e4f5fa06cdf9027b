//! FaceSearch Server - HTTP REST API for face registration and lookup
//!
//! This crate provides the HTTP transport over the FaceSearch pipeline. It
//! supports:
//!
//! - **Registration**: Single and bulk person registration from multipart
//!   image uploads
//! - **Search**: Face lookup by image, answering with the best registered
//!   match above the similarity threshold
//! - **Images**: Static serving of the stored registration photos
//! - **Health**: Liveness and engine-aware readiness probes
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use facesearch::AppConfig;
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     let app_config = AppConfig::from_file(&config.app_config)?;
//!     server::start_server(config, app_config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! - `GET /` - API information
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe (pings the search engine)
//! - `POST /api/v1/register` - Register one person (multipart)
//! - `POST /api/v1/register/bulk` - Register a batch (multipart)
//! - `POST /api/v1/search` - Search by face image (multipart)
//! - `DELETE /api/v1/admin/index` - Delete the whole index
//! - `GET /api/v1/metadata` - Server metadata
//! - `GET /images/*` - Stored registration photos

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::ServerState;
