//! Shared test doubles for engine tests.

use async_trait::async_trait;
use caremind_core::error::{IndexError, ProviderError};
use caremind_core::index::{IndexedVector, RetrievedChunk, VectorIndex};
use caremind_core::provider::{
    CompletionRequest, CompletionResponse, EmbeddingRequest, EmbeddingResponse, Provider, Usage,
};
use std::sync::Mutex;

/// A mock provider that returns a sequence of scripted completion texts.
///
/// Each call to `complete` returns the next response in the queue and
/// panics when the queue is exhausted. `embed` always succeeds with a
/// fixed small vector per input.
pub struct SequentialMockProvider {
    responses: Mutex<Vec<String>>,
    requests: Mutex<Vec<CompletionRequest>>,
    complete_calls: Mutex<usize>,
    embed_calls: Mutex<usize>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
            complete_calls: Mutex::new(0),
            embed_calls: Mutex::new(0),
        }
    }

    /// A provider that returns a single scripted completion.
    pub fn single_text(text: &str) -> Self {
        Self::new(vec![text.to_string()])
    }

    pub fn complete_calls(&self) -> usize {
        *self.complete_calls.lock().unwrap()
    }

    pub fn embed_calls(&self) -> usize {
        *self.embed_calls.lock().unwrap()
    }

    /// Every completion request seen so far, in call order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        let mut count = self.complete_calls.lock().unwrap();
        let responses = self.responses.lock().unwrap();

        if *count >= responses.len() {
            panic!(
                "SequentialMockProvider: no more responses (call #{}, have {})",
                *count,
                responses.len()
            );
        }

        let content = responses[*count].clone();
        *count += 1;

        Ok(CompletionResponse {
            content,
            model: "mock-model".into(),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
        })
    }

    async fn embed(
        &self,
        request: EmbeddingRequest,
    ) -> Result<EmbeddingResponse, ProviderError> {
        *self.embed_calls.lock().unwrap() += 1;
        Ok(EmbeddingResponse {
            embeddings: request.inputs.iter().map(|_| vec![0.1, 0.2, 0.3]).collect(),
            model: request.model,
            usage: None,
        })
    }
}

/// A provider whose every call fails with a transport error.
pub struct FailingProvider;

#[async_trait]
impl Provider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    async fn complete(
        &self,
        _request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        Err(ProviderError::Network("connection refused".into()))
    }

    async fn embed(
        &self,
        _request: EmbeddingRequest,
    ) -> Result<EmbeddingResponse, ProviderError> {
        Err(ProviderError::EmbeddingFailed("connection refused".into()))
    }
}

/// An index whose every operation fails, simulating an outage.
pub struct FailingIndex;

#[async_trait]
impl VectorIndex for FailingIndex {
    fn name(&self) -> &str {
        "failing"
    }

    async fn query(
        &self,
        _vector: &[f32],
        _top_k: usize,
        _tenant: Option<&str>,
    ) -> Result<Vec<RetrievedChunk>, IndexError> {
        Err(IndexError::Network("index offline".into()))
    }

    async fn upsert(&self, _vectors: Vec<IndexedVector>) -> Result<(), IndexError> {
        Err(IndexError::Network("index offline".into()))
    }

    async fn delete(&self, _ids: &[String]) -> Result<(), IndexError> {
        Err(IndexError::Network("index offline".into()))
    }
}
