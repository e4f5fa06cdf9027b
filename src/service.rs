use std::sync::Arc;

use embedder::{EmbedError, Embedder};
use matcher::{FaceMatcher, MatchConfig, MatchError, MatchOutcome};
use serde::{Deserialize, Serialize};
use store::{PersonFields, PersonRecord, PersonStore, StoreError};

/// Errors that can occur while orchestrating the pipeline stages.
///
/// Nothing is retried and nothing is swallowed: each stage's typed error is
/// forwarded to the caller. A negative search result is not an error — it is
/// [`MatchOutcome::NotFound`].
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("embedding stage failed: {0}")]
    Embed(#[from] EmbedError),
    #[error("store stage failed: {0}")]
    Store(#[from] StoreError),
    #[error("match stage failed: {0}")]
    Match(#[from] MatchError),
}

/// Acknowledgment returned for a successful registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationAck {
    pub full_name: String,
    pub national_id_number: String,
}

/// One entry of a bulk registration: biographic fields plus the image bytes
/// to embed.
#[derive(Debug, Clone)]
pub struct RegistrationEntry {
    pub fields: PersonFields,
    pub image_bytes: Vec<u8>,
}

/// Registration and search orchestrators.
///
/// Thin composition over the three pipeline stages: the register path is
/// embed → insert, the search path is embed → thresholded k-NN. The
/// service is cheap to share (`Arc`) across concurrent requests; the
/// embedder's worker pool and the engine provide the only serialization
/// points.
pub struct PersonService {
    embedder: Arc<Embedder>,
    store: Arc<PersonStore>,
    matcher: FaceMatcher,
}

impl PersonService {
    pub fn new(
        embedder: Arc<Embedder>,
        store: Arc<PersonStore>,
        match_cfg: MatchConfig,
    ) -> Result<Self, ServiceError> {
        let matcher = FaceMatcher::new(Arc::clone(&store), match_cfg)?;
        Ok(Self {
            embedder,
            store,
            matcher,
        })
    }

    pub fn store(&self) -> &Arc<PersonStore> {
        &self.store
    }

    /// Register one person: validate the birth date early, compute the
    /// embedding eagerly, persist the record.
    pub async fn register_person(
        &self,
        fields: PersonFields,
        image_bytes: Vec<u8>,
    ) -> Result<RegistrationAck, ServiceError> {
        fields.parsed_birth_date()?;
        let embedding = self.embedder.embed(image_bytes).await?;
        let record = PersonRecord::new(fields, embedding.vector);
        self.store.insert(&record).await?;
        Ok(RegistrationAck {
            full_name: record.fields.full_name,
            national_id_number: record.fields.national_id_number,
        })
    }

    /// Register many people in one batch.
    ///
    /// Every entry is embedded before anything is written; a single
    /// embedding or validation failure fails the batch with no writes.
    /// Returns the number of registered records.
    pub async fn register_people(
        &self,
        entries: Vec<RegistrationEntry>,
    ) -> Result<usize, ServiceError> {
        let mut records = Vec::with_capacity(entries.len());
        for entry in entries {
            entry.fields.parsed_birth_date()?;
            let embedding = self.embedder.embed(entry.image_bytes).await?;
            records.push(PersonRecord::new(entry.fields, embedding.vector));
        }
        let count = records.len();
        self.store.bulk_insert(&records).await?;
        Ok(count)
    }

    /// Search for the registered person most similar to the face in
    /// `image_bytes`.
    pub async fn find_by_image(&self, image_bytes: Vec<u8>) -> Result<MatchOutcome, ServiceError> {
        let embedding = self.embedder.embed(image_bytes).await?;
        let outcome = self.matcher.find_best_match(&embedding.vector).await?;
        Ok(outcome)
    }
}
