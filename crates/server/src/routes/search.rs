use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::extract::{Multipart, State};
use axum::response::IntoResponse;
use axum::Json;
use facesearch::{MatchOutcome, PersonFields, SearchHit};
use serde::Serialize;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

/// Positive search response: the best match plus a URL the stored image can
/// be fetched from.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub score: f32,
    /// `/images/<basename>` URL of the registered image.
    pub image: String,
    #[serde(flatten)]
    pub person: PersonFields,
}

fn image_url(person: &PersonFields) -> String {
    let basename = Path::new(&person.image_path)
        .file_name()
        .and_then(|f| f.to_str())
        .unwrap_or("");
    format!("/images/{basename}")
}

impl From<SearchHit> for SearchResponse {
    fn from(hit: SearchHit) -> Self {
        let image = image_url(&hit.person);
        Self {
            score: hit.score,
            image,
            person: hit.person,
        }
    }
}

/// Search for a registered person by face image
///
/// `POST /api/v1/search` — multipart form with a single `image` file part.
/// Always 200 on a well-formed query: either the best match above the
/// threshold or a "data not found" body. No-match is not an HTTP error.
pub async fn search_person(
    State(state): State<Arc<ServerState>>,
    mut multipart: Multipart,
) -> ServerResult<impl IntoResponse> {
    let mut image: Option<Vec<u8>> = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("image") {
            image = Some(field.bytes().await?.to_vec());
        }
    }

    let image =
        image.ok_or_else(|| ServerError::BadRequest("missing field: image".to_string()))?;

    match state.service.find_by_image(image).await? {
        MatchOutcome::Found(hit) => Ok(Json(serde_json::to_value(SearchResponse::from(hit))?)),
        MatchOutcome::NotFound => Ok(Json(json!({ "message": "data not found" }))),
    }
}
