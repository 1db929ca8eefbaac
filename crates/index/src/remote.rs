//! Remote HTTP vector index client.
//!
//! Speaks the Pinecone-style wire protocol: `/query`, `/vectors/upsert`
//! and `/vectors/delete`, with chunk text and tenant carried as metadata.

use async_trait::async_trait;
use caremind_core::error::IndexError;
use caremind_core::index::{IndexedVector, RetrievedChunk, VectorIndex};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A client for a remote vector index service.
pub struct RemoteIndex {
    base_url: String,
    api_key: String,
    namespace: Option<String>,
    client: reqwest::Client,
}

impl RemoteIndex {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        namespace: Option<String>,
    ) -> Result<Self, IndexError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| IndexError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            namespace,
            client,
        })
    }

    async fn post<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, IndexError> {
        let url = format!("{}{}", self.base_url, path);
        self.client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| IndexError::Network(e.to_string()))
    }
}

#[async_trait]
impl VectorIndex for RemoteIndex {
    fn name(&self) -> &str {
        "remote"
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        tenant: Option<&str>,
    ) -> Result<Vec<RetrievedChunk>, IndexError> {
        let mut body = serde_json::json!({
            "vector": vector,
            "topK": top_k,
            "includeMetadata": true,
        });
        if let Some(ns) = &self.namespace {
            body["namespace"] = serde_json::json!(ns);
        }
        if let Some(tenant) = tenant {
            body["filter"] = serde_json::json!({ "user_id": { "$eq": tenant } });
        }

        debug!(top_k, tenant = tenant.unwrap_or("*"), "Querying remote index");

        let response = self.post("/query", &body).await?;
        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            return Err(IndexError::QueryFailed(format!(
                "status {status}: {error_body}"
            )));
        }

        let api_resp: QueryApiResponse = response
            .json()
            .await
            .map_err(|e| IndexError::QueryFailed(format!("Failed to parse response: {e}")))?;

        Ok(api_resp
            .matches
            .into_iter()
            .map(|m| RetrievedChunk {
                text: m.metadata.text,
                score: m.score,
                document_id: m.metadata.document_id,
                user_id: m.metadata.user_id,
            })
            .collect())
    }

    async fn upsert(&self, vectors: Vec<IndexedVector>) -> Result<(), IndexError> {
        let api_vectors: Vec<ApiVector> = vectors
            .into_iter()
            .map(|v| ApiVector {
                id: v.id,
                values: v.values,
                metadata: ApiMetadata {
                    text: v.chunk_text,
                    document_id: v.document_id,
                    user_id: v.user_id,
                },
            })
            .collect();

        let mut body = serde_json::json!({ "vectors": api_vectors });
        if let Some(ns) = &self.namespace {
            body["namespace"] = serde_json::json!(ns);
        }

        let response = self.post("/vectors/upsert", &body).await?;
        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            return Err(IndexError::UpsertFailed(format!(
                "status {status}: {error_body}"
            )));
        }

        Ok(())
    }

    async fn delete(&self, ids: &[String]) -> Result<(), IndexError> {
        let mut body = serde_json::json!({ "ids": ids });
        if let Some(ns) = &self.namespace {
            body["namespace"] = serde_json::json!(ns);
        }

        let response = self.post("/vectors/delete", &body).await?;
        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            return Err(IndexError::DeleteFailed(format!(
                "status {status}: {error_body}"
            )));
        }

        Ok(())
    }
}

// --- Wire types (internal) ---

#[derive(Debug, Serialize)]
struct ApiVector {
    id: String,
    values: Vec<f32>,
    metadata: ApiMetadata,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiMetadata {
    text: String,
    document_id: String,
    user_id: String,
}

#[derive(Debug, Deserialize)]
struct QueryApiResponse {
    #[serde(default)]
    matches: Vec<ApiMatch>,
}

#[derive(Debug, Deserialize)]
struct ApiMatch {
    score: f32,
    metadata: ApiMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_trimmed() {
        let index = RemoteIndex::new("https://index.internal/", "key", None).unwrap();
        assert_eq!(index.base_url, "https://index.internal");
    }

    #[test]
    fn parse_query_response() {
        let data = r#"{
            "matches": [
                {
                    "id": "doc-7-0",
                    "score": 0.91,
                    "metadata": {
                        "text": "fasting is required before the exam",
                        "document_id": "doc-7",
                        "user_id": "user-1"
                    }
                }
            ]
        }"#;
        let parsed: QueryApiResponse = serde_json::from_str(data).unwrap();
        assert_eq!(parsed.matches.len(), 1);
        assert_eq!(parsed.matches[0].metadata.document_id, "doc-7");
        assert!((parsed.matches[0].score - 0.91).abs() < 1e-6);
    }

    #[test]
    fn parse_empty_query_response() {
        let parsed: QueryApiResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.matches.is_empty());
    }
}
