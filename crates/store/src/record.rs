use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::StoreError;

/// Calendar date format accepted for `birth_date`.
pub const BIRTH_DATE_FORMAT: &str = "%Y-%m-%d";

/// Biographic attributes of a registered identity.
///
/// All fields are opaque strings except `birth_date`, which must parse as a
/// calendar date before persistence is attempted. This is also the exact
/// projection returned by searches: the embedding never leaves the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonFields {
    pub full_name: String,
    pub birth_place: String,
    /// Calendar date, `YYYY-MM-DD`.
    pub birth_date: String,
    pub address: String,
    pub nationality: String,
    pub passport_number: String,
    pub gender: String,
    pub national_id_number: String,
    pub marital_status: String,
    /// Path of the stored source image; the storage layer owns the file.
    #[serde(default)]
    pub image_path: String,
}

impl PersonFields {
    /// Names of the metadata fields as stored in the index, in mapping order.
    pub const NAMES: [&'static str; 10] = [
        "full_name",
        "birth_place",
        "birth_date",
        "address",
        "nationality",
        "passport_number",
        "gender",
        "national_id_number",
        "marital_status",
        "image_path",
    ];

    pub fn parsed_birth_date(&self) -> Result<NaiveDate, StoreError> {
        NaiveDate::parse_from_str(&self.birth_date, BIRTH_DATE_FORMAT).map_err(|e| {
            StoreError::SchemaViolation(format!(
                "birth_date {:?} is not a valid {BIRTH_DATE_FORMAT} date: {e}",
                self.birth_date
            ))
        })
    }
}

/// One registered identity as persisted in the index.
///
/// Immutable once indexed; there is no per-record update or delete path.
/// Duplicate registrations of the same identity are accepted and each
/// becomes an independent searchable document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonRecord {
    #[serde(flatten)]
    pub fields: PersonFields,
    /// Fixed-length face embedding; serialized under the index's vector
    /// field name.
    #[serde(rename = "image_embedding")]
    pub embedding: Vec<f32>,
}

impl PersonRecord {
    pub fn new(fields: PersonFields, embedding: Vec<f32>) -> Self {
        Self { fields, embedding }
    }

    /// Check the persistence invariants against the index dimensionality.
    pub fn validate(&self, dim: usize) -> Result<(), StoreError> {
        if self.embedding.is_empty() {
            return Err(StoreError::SchemaViolation(format!(
                "person {:?} has no embedding",
                self.fields.full_name
            )));
        }
        if self.embedding.len() != dim {
            return Err(StoreError::SchemaViolation(format!(
                "embedding length {} does not match index dimensionality {dim}",
                self.embedding.len()
            )));
        }
        self.fields.parsed_birth_date()?;
        Ok(())
    }
}

/// A candidate match returned by a k-NN search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Similarity score on the engine scale: bounded cosine, `(1 + cos) / 2`
    /// in `[0, 1]`, higher is more similar.
    pub score: f32,
    pub person: PersonFields,
}

#[cfg(test)]
pub(crate) fn sample_fields(name: &str) -> PersonFields {
    PersonFields {
        full_name: name.to_string(),
        birth_place: "Jakarta".into(),
        birth_date: "1990-01-01".into(),
        address: "123 Main St".into(),
        nationality: "ID".into(),
        passport_number: "A1234567".into(),
        gender: "F".into(),
        national_id_number: "3173051234560001".into(),
        marital_status: "Single".into(),
        image_path: format!("dataset/persons/{name}.jpg"),
    }
}
