//! End-to-end router tests over the in-memory engine and stub model.

use std::io::Cursor;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use facesearch::AppConfig;
use http_body_util::BodyExt;
use image::{DynamicImage, ImageFormat, RgbImage};
use server::{build_router, ServerConfig, ServerState};
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "test-boundary-7MA4YWxkTrZu0gW";

enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(name, filename, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_request(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

fn png_bytes(rgb: [u8; 3]) -> Vec<u8> {
    let img = RgbImage::from_pixel(64, 64, image::Rgb(rgb));
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageFormat::Png)
        .expect("encode test png");
    buf.into_inner()
}

fn person_parts(name: &'static str) -> Vec<Part<'static>> {
    vec![
        Part::Text("full_name", name),
        Part::Text("birth_place", "Jakarta"),
        Part::Text("birth_date", "1990-01-01"),
        Part::Text("address", "123 Main St"),
        Part::Text("nationality", "ID"),
        Part::Text("passport_number", "A1234567"),
        Part::Text("gender", "F"),
        Part::Text("national_id_number", "3173051234560001"),
        Part::Text("marital_status", "Single"),
    ]
}

/// Router over a fresh in-memory engine; the TempDir keeps the dataset
/// directory alive for the duration of the test.
fn test_router() -> (Router, TempDir) {
    let dataset = TempDir::new().expect("create dataset dir");
    let config = ServerConfig {
        dataset_dir: dataset.path().to_path_buf(),
        ..ServerConfig::default()
    };
    let state = ServerState::new(config, AppConfig::default()).expect("build state");
    (build_router(Arc::new(state)), dataset)
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("JSON body")
}

#[tokio::test]
async fn api_info_lists_endpoints() {
    let (router, _dir) = test_router();
    let response = router
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["name"], "FaceSearch Server");
    assert!(body["endpoints"]
        .as_array()
        .unwrap()
        .iter()
        .any(|e| e == "/api/v1/search"));
}

#[tokio::test]
async fn health_and_readiness_respond_ok() {
    let (router, _dir) = test_router();

    let health = router
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::OK);

    let ready = router
        .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(ready.status(), StatusCode::OK);
    let body = json_body(ready).await;
    assert_eq!(body["components"]["engine"], "ready");
}

#[tokio::test]
async fn unknown_route_is_json_404() {
    let (router, _dir) = test_router();
    let response = router
        .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn register_then_search_finds_the_person() {
    let (router, _dir) = test_router();
    let image = png_bytes([40, 80, 120]);

    let mut parts = person_parts("Alice");
    parts.push(Part::File("image", "alice.png", &image));
    let response = router
        .clone()
        .oneshot(multipart_request("/api/v1/register", &parts))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["full_name"], "Alice");

    let response = router
        .oneshot(multipart_request(
            "/api/v1/search",
            &[Part::File("image", "query.png", &image)],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["full_name"], "Alice");
    assert!(body["score"].as_f64().unwrap() >= 0.89);
    assert!(body["image"].as_str().unwrap().starts_with("/images/"));
}

#[tokio::test]
async fn search_without_registrations_reports_no_match() {
    let (router, _dir) = test_router();
    let image = png_bytes([1, 2, 3]);

    let response = router
        .oneshot(multipart_request(
            "/api/v1/search",
            &[Part::File("image", "query.png", &image)],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["message"], "data not found");
}

#[tokio::test]
async fn register_with_missing_field_is_bad_request() {
    let (router, _dir) = test_router();
    let image = png_bytes([5, 5, 5]);

    // Everything but the national_id_number.
    let parts = vec![
        Part::Text("full_name", "Bob"),
        Part::Text("birth_place", "Bandung"),
        Part::Text("birth_date", "1992-05-15"),
        Part::Text("address", "456 Oak Ave"),
        Part::Text("nationality", "ID"),
        Part::Text("passport_number", "B7654321"),
        Part::Text("gender", "M"),
        Part::Text("marital_status", "Married"),
        Part::File("image", "bob.png", &image),
    ];
    let response = router
        .oneshot(multipart_request("/api/v1/register", &parts))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("national_id_number"));
}

#[tokio::test]
async fn oversized_upload_is_rejected_with_413() {
    let dataset = TempDir::new().expect("create dataset dir");
    let config = ServerConfig {
        dataset_dir: dataset.path().to_path_buf(),
        max_body_size_mb: 0,
        ..ServerConfig::default()
    };
    let state = ServerState::new(config, AppConfig::default()).expect("build state");
    let router = build_router(Arc::new(state));

    let image = png_bytes([5, 5, 5]);
    let response = router
        .oneshot(multipart_request(
            "/api/v1/search",
            &[Part::File("image", "query.png", &image)],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "PAYLOAD_TOO_LARGE");
}

#[tokio::test]
async fn register_with_disallowed_extension_is_rejected() {
    let (router, _dir) = test_router();
    let image = png_bytes([5, 5, 5]);

    let mut parts = person_parts("Mallory");
    parts.push(Part::File("image", "mallory.gif", &image));
    let response = router
        .oneshot(multipart_request("/api/v1/register", &parts))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn register_with_undecodable_image_is_unprocessable() {
    let (router, _dir) = test_router();

    let mut parts = person_parts("Eve");
    parts.push(Part::File("image", "eve.png", b"not an image"));
    let response = router
        .oneshot(multipart_request("/api/v1/register", &parts))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "EMBED_ERROR");
}

#[tokio::test]
async fn bulk_register_indexes_every_entry() {
    let (router, _dir) = test_router();
    let first = png_bytes([10, 0, 0]);
    let second = png_bytes([0, 10, 0]);

    let persons = serde_json::json!([
        {
            "full_name": "Alice", "birth_place": "Jakarta", "birth_date": "1990-01-01",
            "address": "123 Main St", "nationality": "ID", "passport_number": "A1234567",
            "gender": "F", "national_id_number": "3173051234560001", "marital_status": "Single"
        },
        {
            "full_name": "Bob", "birth_place": "Bandung", "birth_date": "1992-05-15",
            "address": "456 Oak Ave", "nationality": "ID", "passport_number": "B7654321",
            "gender": "M", "national_id_number": "3273051234560002", "marital_status": "Married"
        }
    ])
    .to_string();

    let response = router
        .clone()
        .oneshot(multipart_request(
            "/api/v1/register/bulk",
            &[
                Part::Text("persons", &persons),
                Part::File("images", "alice.png", &first),
                Part::File("images", "bob.png", &second),
            ],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["registered"], 2);

    let response = router
        .oneshot(multipart_request(
            "/api/v1/search",
            &[Part::File("image", "query.png", &second)],
        ))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["full_name"], "Bob");
}

#[tokio::test]
async fn bulk_register_rejects_count_mismatch() {
    let (router, _dir) = test_router();

    let persons = serde_json::json!([
        {
            "full_name": "Alice", "birth_place": "Jakarta", "birth_date": "1990-01-01",
            "address": "123 Main St", "nationality": "ID", "passport_number": "A1234567",
            "gender": "F", "national_id_number": "3173051234560001", "marital_status": "Single"
        }
    ])
    .to_string();

    let response = router
        .oneshot(multipart_request(
            "/api/v1/register/bulk",
            &[Part::Text("persons", &persons)],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn admin_delete_index_clears_registrations() {
    let (router, _dir) = test_router();
    let image = png_bytes([40, 80, 120]);

    let mut parts = person_parts("Alice");
    parts.push(Part::File("image", "alice.png", &image));
    let response = router
        .clone()
        .oneshot(multipart_request("/api/v1/register", &parts))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = router
        .clone()
        .oneshot(
            Request::delete("/api/v1/admin/index")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(multipart_request(
            "/api/v1/search",
            &[Part::File("image", "query.png", &image)],
        ))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["message"], "data not found");
}
