//! Bulk registration CLI.
//!
//! Reads a JSON manifest of people (biographic fields plus an image path per
//! entry), embeds every image, and indexes the whole batch in one write.
//! The batch is all-or-nothing: one unreadable or faceless image fails the
//! run with nothing written.
//!
//! ```text
//! facesearch <config.yaml> <manifest.json>
//! ```
//!
//! Manifest entries look like:
//!
//! ```json
//! [
//!   {
//!     "image": "images/alice.jpg",
//!     "full_name": "Alice",
//!     "birth_place": "Jakarta",
//!     "birth_date": "1990-01-01",
//!     "address": "123 Main St",
//!     "nationality": "ID",
//!     "passport_number": "A1234567",
//!     "gender": "F",
//!     "national_id_number": "3173051234560001",
//!     "marital_status": "Single"
//!   }
//! ]
//! ```
//!
//! Relative image paths resolve against the manifest's directory.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use serde::Deserialize;
use tokio::fs;

use facesearch::{build_service, AppConfig, PersonFields, RegistrationEntry};

#[derive(Debug, Deserialize)]
struct ManifestEntry {
    /// Path to the face image, relative to the manifest file.
    image: PathBuf,
    #[serde(flatten)]
    fields: PersonFields,
}

fn usage() -> anyhow::Error {
    anyhow::anyhow!("usage: facesearch <config.yaml> <manifest.json>")
}

async fn load_entries(manifest_path: &Path) -> anyhow::Result<Vec<RegistrationEntry>> {
    let manifest = fs::read_to_string(manifest_path)
        .await
        .with_context(|| format!("reading manifest {}", manifest_path.display()))?;
    let parsed: Vec<ManifestEntry> =
        serde_json::from_str(&manifest).context("parsing manifest JSON")?;
    let base = manifest_path.parent().unwrap_or_else(|| Path::new("."));

    let mut entries = Vec::with_capacity(parsed.len());
    for mut entry in parsed {
        let image_path = if entry.image.is_absolute() {
            entry.image.clone()
        } else {
            base.join(&entry.image)
        };
        let image_bytes = fs::read(&image_path)
            .await
            .with_context(|| format!("reading image {}", image_path.display()))?;
        if entry.fields.image_path.is_empty() {
            entry.fields.image_path = entry.image.display().to_string();
        }
        entries.push(RegistrationEntry {
            fields: entry.fields,
            image_bytes,
        });
    }
    Ok(entries)
}

async fn run() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let config_path = args.next().ok_or_else(usage)?;
    let manifest_path = args.next().map(PathBuf::from).ok_or_else(usage)?;
    if args.next().is_some() {
        return Err(usage());
    }

    let cfg = AppConfig::from_file(&config_path)
        .with_context(|| format!("loading config {config_path}"))?;
    let service = build_service(&cfg)?;
    service
        .store()
        .ensure_schema()
        .await
        .context("preparing index schema")?;

    let entries = load_entries(&manifest_path).await?;
    if entries.is_empty() {
        tracing::warn!("manifest contains no entries, nothing to do");
        return Ok(());
    }

    let total = entries.len();
    tracing::info!(total, "registering batch");
    let registered = service.register_people(entries).await?;
    tracing::info!(registered, "bulk registration complete");
    println!("registered {registered} of {total} people");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "bulk registration failed");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
