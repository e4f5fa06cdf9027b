//! Elasticsearch 8.x engine adapter.
//!
//! Talks plain HTTP via `reqwest`: index creation with a `dense_vector`
//! mapping, `_doc` and `_bulk` writes, and `knn` search. Connectivity and
//! auth problems map to [`StoreError::Unavailable`]; engine-side document
//! rejections map to [`StoreError::SchemaViolation`]. No retries here —
//! retry policy, if any, belongs to the caller.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{json, Value};

use crate::backend::SearchEngine;
use crate::record::{PersonFields, PersonRecord, SearchHit};
use crate::StoreError;

#[derive(Debug)]
pub struct ElasticBackend {
    http: Client,
    base_url: String,
    index: String,
    username: Option<String>,
    password: Option<String>,
    refresh_on_write: bool,
}

impl ElasticBackend {
    pub fn new(
        url: String,
        index: String,
        username: Option<String>,
        password: Option<String>,
        refresh_on_write: bool,
    ) -> Result<Self, StoreError> {
        if index.trim().is_empty() {
            return Err(StoreError::SchemaViolation(
                "index name must not be empty".into(),
            ));
        }
        let http = Client::builder()
            .build()
            .map_err(|e| StoreError::Unavailable(format!("http client: {e}")))?;
        Ok(Self {
            http,
            base_url: url.trim_end_matches('/').to_string(),
            index,
            username,
            password,
            refresh_on_write,
        })
    }

    fn index_url(&self, suffix: &str) -> String {
        format!("{}/{}{suffix}", self.base_url, self.index)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.username {
            Some(user) => builder.basic_auth(user, self.password.as_deref()),
            None => builder,
        }
    }

    fn refresh_query(&self) -> &'static [(&'static str, &'static str)] {
        if self.refresh_on_write {
            &[("refresh", "true")]
        } else {
            &[]
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<(StatusCode, Value), StoreError> {
        let response = self.authed(builder).send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                StoreError::Unavailable(e.to_string())
            } else {
                StoreError::Backend(e.to_string())
            }
        })?;
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        Ok((status, body))
    }

    fn classify_failure(status: StatusCode, body: &Value) -> StoreError {
        let reason = body
            .pointer("/error/reason")
            .and_then(Value::as_str)
            .unwrap_or("unknown engine error")
            .to_string();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                StoreError::Unavailable(format!("authentication failed: {reason}"))
            }
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                StoreError::SchemaViolation(reason)
            }
            _ => StoreError::Backend(format!("engine returned {status}: {reason}")),
        }
    }
}

/// Index settings and mappings for dimensionality `dim`.
///
/// Mirrors the deployment schema: one dense cosine vector field plus
/// keyword metadata fields and a date field for `birth_date`.
pub(crate) fn index_mapping(dim: usize) -> Value {
    let mut properties = serde_json::Map::new();
    properties.insert(
        "image_embedding".into(),
        json!({
            "type": "dense_vector",
            "dims": dim,
            "index": true,
            "similarity": "cosine",
        }),
    );
    for name in PersonFields::NAMES {
        let field_type = if name == "birth_date" { "date" } else { "keyword" };
        properties.insert(name.into(), json!({ "type": field_type }));
    }
    json!({
        "settings": {
            "index.refresh_interval": "5s",
            "number_of_shards": 1,
        },
        "mappings": { "properties": Value::Object(properties) },
    })
}

/// NDJSON body for a `_bulk` index request.
pub(crate) fn bulk_body(index: &str, records: &[PersonRecord]) -> Result<String, StoreError> {
    let mut body = String::new();
    for record in records {
        let action = json!({ "index": { "_index": index } });
        body.push_str(&action.to_string());
        body.push('\n');
        body.push_str(&serde_json::to_string(record)?);
        body.push('\n');
    }
    Ok(body)
}

/// Turn a `_bulk` response into a whole-batch verdict.
///
/// The engine may have applied part of the batch; that partial state is
/// surfaced as a whole-batch failure, never as success.
pub(crate) fn bulk_outcome(count: usize, response: &Value) -> Result<(), StoreError> {
    if response
        .get("errors")
        .and_then(Value::as_bool)
        .unwrap_or(false)
    {
        let first_reason = response
            .pointer("/items/0/index/error/reason")
            .and_then(Value::as_str)
            .unwrap_or("per-document failures in bulk response");
        return Err(StoreError::Backend(format!(
            "bulk insert of {count} documents failed: {first_reason}"
        )));
    }
    Ok(())
}

/// `knn` search request restricted to the metadata fields.
pub(crate) fn knn_body(vector: &[f32], k: usize, num_candidates: usize) -> Value {
    json!({
        "knn": {
            "field": "image_embedding",
            "query_vector": vector,
            "k": k,
            "num_candidates": num_candidates,
        },
        "size": k,
        "_source": PersonFields::NAMES,
    })
}

#[async_trait]
impl SearchEngine for ElasticBackend {
    async fn ensure_schema(&self, dim: usize) -> Result<(), StoreError> {
        let (status, _) = self.send(self.http.head(self.index_url(""))).await?;
        if status.is_success() {
            return Ok(());
        }

        let (status, body) = self
            .send(self.http.put(self.index_url("")).json(&index_mapping(dim)))
            .await?;
        if status.is_success() {
            tracing::info!(index = %self.index, dim, "created index");
            return Ok(());
        }
        // Lost a creation race; the index existing is exactly what we want.
        let already_exists = body
            .pointer("/error/type")
            .and_then(Value::as_str)
            .map(|t| t == "resource_already_exists_exception")
            .unwrap_or(false);
        if already_exists {
            return Ok(());
        }
        Err(Self::classify_failure(status, &body))
    }

    async fn index_document(&self, record: &PersonRecord) -> Result<(), StoreError> {
        let (status, body) = self
            .send(
                self.http
                    .post(self.index_url("/_doc"))
                    .query(self.refresh_query())
                    .json(record),
            )
            .await?;
        if status.is_success() {
            return Ok(());
        }
        Err(Self::classify_failure(status, &body))
    }

    async fn bulk_index(&self, records: &[PersonRecord]) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }
        let body = bulk_body(&self.index, records)?;
        let (status, response) = self
            .send(
                self.http
                    .post(format!("{}/_bulk", self.base_url))
                    .query(self.refresh_query())
                    .header("content-type", "application/x-ndjson")
                    .body(body),
            )
            .await?;
        if !status.is_success() {
            return Err(Self::classify_failure(status, &response));
        }
        bulk_outcome(records.len(), &response)
    }

    async fn knn_search(
        &self,
        vector: &[f32],
        k: usize,
        num_candidates: usize,
    ) -> Result<Vec<SearchHit>, StoreError> {
        let (status, body) = self
            .send(
                self.http
                    .post(self.index_url("/_search"))
                    .json(&knn_body(vector, k, num_candidates)),
            )
            .await?;
        if status == StatusCode::NOT_FOUND {
            // Nothing registered yet; an absent index holds no candidates.
            tracing::warn!(index = %self.index, "knn search against missing index");
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(Self::classify_failure(status, &body));
        }

        let hits = body
            .pointer("/hits/hits")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let mut results = Vec::with_capacity(hits.len());
        for hit in hits {
            let score = hit
                .get("_score")
                .and_then(Value::as_f64)
                .unwrap_or_default() as f32;
            let source = hit
                .get("_source")
                .cloned()
                .ok_or_else(|| StoreError::Backend("search hit without _source".into()))?;
            let person: PersonFields = serde_json::from_value(source)?;
            results.push(SearchHit { score, person });
        }
        Ok(results)
    }

    async fn delete_index(&self) -> Result<(), StoreError> {
        let (status, body) = self
            .send(
                self.http
                    .delete(self.index_url(""))
                    .query(&[("ignore_unavailable", "true")]),
            )
            .await?;
        if status.is_success() || status == StatusCode::NOT_FOUND {
            tracing::info!(index = %self.index, "deleted index");
            return Ok(());
        }
        Err(Self::classify_failure(status, &body))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let (status, body) = self.send(self.http.get(&self.base_url)).await?;
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::classify_failure(status, &body))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::sample_fields;

    #[test]
    fn mapping_declares_cosine_vector_and_metadata_fields() {
        let mapping = index_mapping(128);
        let vector = mapping
            .pointer("/mappings/properties/image_embedding")
            .unwrap();
        assert_eq!(vector["dims"], 128);
        assert_eq!(vector["similarity"], "cosine");
        assert_eq!(vector["index"], true);

        assert_eq!(
            mapping.pointer("/mappings/properties/birth_date/type").unwrap(),
            "date"
        );
        assert_eq!(
            mapping.pointer("/mappings/properties/full_name/type").unwrap(),
            "keyword"
        );
        assert_eq!(
            mapping.pointer("/settings/index.refresh_interval").unwrap(),
            "5s"
        );
    }

    #[test]
    fn knn_body_excludes_the_embedding_from_source() {
        let body = knn_body(&[0.0; 4], 3, 100);
        assert_eq!(body["knn"]["k"], 3);
        assert_eq!(body["knn"]["num_candidates"], 100);
        assert_eq!(body["knn"]["field"], "image_embedding");
        let source: Vec<String> =
            serde_json::from_value(body["_source"].clone()).expect("source list");
        assert!(!source.contains(&"image_embedding".to_string()));
        assert!(source.contains(&"full_name".to_string()));
    }

    #[test]
    fn bulk_body_pairs_action_and_document_lines() {
        let records = vec![
            PersonRecord::new(sample_fields("a"), vec![0.1; 2]),
            PersonRecord::new(sample_fields("b"), vec![0.2; 2]),
        ];
        let body = bulk_body("people", &records).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains(r#""_index":"people""#));
        assert!(lines[1].contains(r#""full_name":"a""#));
        assert!(lines[3].contains(r#""full_name":"b""#));
        assert!(body.ends_with('\n'));
    }

    #[test]
    fn bulk_response_with_errors_fails_the_whole_batch() {
        let response = json!({
            "took": 3,
            "errors": true,
            "items": [
                { "index": { "status": 400, "error": {
                    "type": "mapper_parsing_exception",
                    "reason": "failed to parse field [birth_date]"
                } } },
                { "index": { "status": 201 } }
            ]
        });
        let err = bulk_outcome(2, &response).expect_err("partial batch must fail");
        assert!(matches!(err, StoreError::Backend(_)));
        assert!(err.to_string().contains("failed to parse field [birth_date]"));
        assert!(err.to_string().contains('2'));
    }

    #[test]
    fn clean_bulk_response_is_accepted() {
        let response = json!({
            "took": 3,
            "errors": false,
            "items": [{ "index": { "status": 201 } }]
        });
        assert!(bulk_outcome(1, &response).is_ok());
    }

    #[test]
    fn auth_failures_classify_as_unavailable() {
        let body = json!({ "error": { "reason": "missing authentication credentials" } });
        for status in [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN] {
            let err = ElasticBackend::classify_failure(status, &body);
            assert!(matches!(err, StoreError::Unavailable(_)), "{status}");
            assert!(err.to_string().contains("authentication"));
        }
    }

    #[test]
    fn document_rejections_classify_as_schema_violations() {
        let body = json!({ "error": { "reason": "failed to parse field [image_embedding]" } });
        for status in [StatusCode::BAD_REQUEST, StatusCode::UNPROCESSABLE_ENTITY] {
            let err = ElasticBackend::classify_failure(status, &body);
            assert!(matches!(err, StoreError::SchemaViolation(_)), "{status}");
        }
    }

    #[test]
    fn other_engine_failures_classify_as_backend_errors() {
        let body = json!({ "error": { "reason": "circuit_breaking_exception" } });
        let err = ElasticBackend::classify_failure(StatusCode::INTERNAL_SERVER_ERROR, &body);
        assert!(matches!(err, StoreError::Backend(_)));
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn failure_without_reason_still_classifies() {
        let err = ElasticBackend::classify_failure(StatusCode::BAD_REQUEST, &Value::Null);
        assert!(matches!(err, StoreError::SchemaViolation(_)));
        assert!(err.to_string().contains("unknown engine error"));
    }

    #[test]
    fn empty_index_name_rejected() {
        let err = ElasticBackend::new(
            "http://localhost:9200".into(),
            "  ".into(),
            None,
            None,
            false,
        )
        .expect_err("blank index name");
        assert!(matches!(err, StoreError::SchemaViolation(_)));
    }
}
