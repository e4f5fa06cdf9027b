use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use axum::body::Bytes;
use facesearch::{PersonFields, RegistrationEntry};
use serde_json::json;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Image types accepted for upload.
const ALLOWED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Biographic form fields required for a registration, in schema order
/// minus `image_path` (the server assigns that).
const REQUIRED_FIELDS: [&str; 9] = [
    "full_name",
    "birth_place",
    "birth_date",
    "address",
    "nationality",
    "passport_number",
    "gender",
    "national_id_number",
    "marital_status",
];

fn image_extension(filename: &str) -> ServerResult<String> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .ok_or_else(|| ServerError::BadRequest("Invalid file extension".to_string()))?;
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(ServerError::UnsupportedImage(ext));
    }
    Ok(ext)
}

/// Persist an uploaded image under a fresh UUID filename and return the
/// stored path (relative, also the `/images/...` basename).
pub(crate) async fn save_image(
    state: &ServerState,
    original_filename: &str,
    bytes: &[u8],
) -> ServerResult<String> {
    let ext = image_extension(original_filename)?;
    let stored_name = format!("{}.{ext}", uuid::Uuid::new_v4().simple());
    let path = state.config.dataset_dir.join(&stored_name);

    tokio::fs::create_dir_all(&state.config.dataset_dir).await?;
    tokio::fs::write(&path, bytes).await?;

    Ok(path.display().to_string())
}

fn required_field(fields: &mut HashMap<String, String>, name: &str) -> ServerResult<String> {
    fields
        .remove(name)
        .ok_or_else(|| ServerError::BadRequest(format!("missing field: {name}")))
}

fn fields_from_form(mut form: HashMap<String, String>) -> ServerResult<PersonFields> {
    Ok(PersonFields {
        full_name: required_field(&mut form, "full_name")?,
        birth_place: required_field(&mut form, "birth_place")?,
        birth_date: required_field(&mut form, "birth_date")?,
        address: required_field(&mut form, "address")?,
        nationality: required_field(&mut form, "nationality")?,
        passport_number: required_field(&mut form, "passport_number")?,
        gender: required_field(&mut form, "gender")?,
        national_id_number: required_field(&mut form, "national_id_number")?,
        marital_status: required_field(&mut form, "marital_status")?,
        image_path: String::new(),
    })
}

/// Register one person
///
/// `POST /api/v1/register` — multipart form with the nine biographic text
/// fields plus an `image` file part. The image is persisted to the dataset
/// directory before the embedding is computed; a pipeline failure after
/// that point leaves the file in place but writes nothing to the index.
pub async fn register_person(
    State(state): State<Arc<ServerState>>,
    mut multipart: Multipart,
) -> ServerResult<impl IntoResponse> {
    let mut form: HashMap<String, String> = HashMap::new();
    let mut image: Option<(String, Bytes)> = None;

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(|n| n.to_string()) else {
            continue;
        };
        if name == "image" {
            let filename = field
                .file_name()
                .map(|f| f.to_string())
                .ok_or_else(|| ServerError::BadRequest("image part needs a filename".into()))?;
            image = Some((filename, field.bytes().await?));
        } else if REQUIRED_FIELDS.contains(&name.as_str()) {
            form.insert(name, field.text().await?);
        }
    }

    let (filename, bytes) =
        image.ok_or_else(|| ServerError::BadRequest("missing field: image".to_string()))?;
    let mut fields = fields_from_form(form)?;
    fields.image_path = save_image(&state, &filename, &bytes).await?;

    let ack = state.service.register_person(fields, bytes.to_vec()).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "person registered",
            "full_name": ack.full_name,
            "national_id_number": ack.national_id_number,
        })),
    ))
}

/// Register a batch of people
///
/// `POST /api/v1/register/bulk` — multipart form with a `persons` part (JSON
/// array of biographic field objects) and one `images` file part per entry,
/// in the same order. All-or-nothing: a single bad entry indexes nothing.
pub async fn register_bulk(
    State(state): State<Arc<ServerState>>,
    mut multipart: Multipart,
) -> ServerResult<impl IntoResponse> {
    let mut persons: Option<Vec<PersonFields>> = None;
    let mut images: Vec<(String, Bytes)> = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("persons") => {
                let text = field.text().await?;
                persons = Some(serde_json::from_str(&text)?);
            }
            Some("images") => {
                let filename = field.file_name().map(|f| f.to_string()).ok_or_else(|| {
                    ServerError::BadRequest("images parts need filenames".into())
                })?;
                images.push((filename, field.bytes().await?));
            }
            _ => {}
        }
    }

    let persons =
        persons.ok_or_else(|| ServerError::BadRequest("missing field: persons".to_string()))?;
    if persons.len() != images.len() {
        return Err(ServerError::BadRequest(format!(
            "{} persons but {} images; counts must match",
            persons.len(),
            images.len()
        )));
    }

    let mut entries = Vec::with_capacity(persons.len());
    for (mut fields, (filename, bytes)) in persons.into_iter().zip(images) {
        fields.image_path = save_image(&state, &filename, &bytes).await?;
        entries.push(RegistrationEntry {
            fields,
            image_bytes: bytes.to_vec(),
        });
    }

    let registered = state.service.register_people(entries).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "batch registered",
            "registered": registered,
        })),
    ))
}
