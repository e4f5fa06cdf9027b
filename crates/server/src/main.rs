//! FaceSearch Server - HTTP REST API for face registration and lookup
//!
//! This binary exposes the FaceSearch pipeline (embed, index, match) via
//! REST endpoints for registering people and looking them up by face image.

use facesearch::AppConfig;
use server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = ServerConfig::load()?;
    let app_config = if config.app_config.exists() {
        AppConfig::from_file(&config.app_config)?
    } else {
        AppConfig::default()
    };

    // Start server
    server::start_server(config, app_config).await?;

    Ok(())
}
