//! Concurrency tests: the service is shared across request handlers, so
//! parallel registrations and searches must neither lose writes nor
//! produce unstable answers.

use std::io::Cursor;
use std::sync::Arc;

use facesearch::{build_service, AppConfig, PersonFields};
use image::{DynamicImage, ImageFormat, RgbImage};

fn png_bytes(rgb: [u8; 3]) -> Vec<u8> {
    let img = RgbImage::from_pixel(64, 64, image::Rgb(rgb));
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageFormat::Png)
        .expect("encode test png");
    buf.into_inner()
}

fn fields(name: &str) -> PersonFields {
    PersonFields {
        full_name: name.to_string(),
        birth_place: "Jakarta".into(),
        birth_date: "1990-01-01".into(),
        address: "123 Main St".into(),
        nationality: "ID".into(),
        passport_number: "A1234567".into(),
        gender: "F".into(),
        national_id_number: format!("31730512345{name}"),
        marital_status: "Single".into(),
        image_path: format!("dataset/persons/{name}.png"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_registrations_are_all_searchable() {
    let service = Arc::new(build_service(&AppConfig::default()).unwrap());

    // Distinct colors give distinct stub embeddings per person.
    let people: Vec<(String, Vec<u8>)> = (0..8u8)
        .map(|i| (format!("person-{i}"), png_bytes([i * 30, 255 - i * 30, i])))
        .collect();

    let handles: Vec<_> = people
        .iter()
        .map(|(name, image)| {
            let service = Arc::clone(&service);
            let name = name.clone();
            let image = image.clone();
            tokio::spawn(async move { service.register_person(fields(&name), image).await })
        })
        .collect();

    for handle in handles {
        handle
            .await
            .expect("task completes")
            .expect("registration succeeds");
    }

    for (name, image) in people {
        let outcome = service.find_by_image(image).await.unwrap();
        let hit = outcome.found().unwrap_or_else(|| panic!("{name} not found"));
        assert_eq!(hit.person.full_name, name);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_searches_agree_on_the_answer() {
    let service = Arc::new(build_service(&AppConfig::default()).unwrap());
    let image = png_bytes([40, 80, 120]);
    service
        .register_person(fields("target"), image.clone())
        .await
        .unwrap();

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let service = Arc::clone(&service);
            let image = image.clone();
            tokio::spawn(async move { service.find_by_image(image).await })
        })
        .collect();

    for handle in handles {
        let outcome = handle.await.unwrap().unwrap();
        assert_eq!(outcome.found().unwrap().person.full_name, "target");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn worker_pool_survives_more_requests_than_workers() {
    // Default pool is 3 workers; 12 simultaneous embeds must all complete.
    let service = Arc::new(build_service(&AppConfig::default()).unwrap());
    service
        .register_person(fields("only"), png_bytes([1, 2, 3]))
        .await
        .unwrap();

    let handles: Vec<_> = (0..12u8)
        .map(|i| {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.find_by_image(png_bytes([i, i, i])).await })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }
}
