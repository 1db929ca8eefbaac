//! `caremind ingest` — Index a plain-text document for retrieval.

use crate::runtime::{self, CliError};
use caremind_engine::{Embedder, Ingestor};
use std::path::Path;

pub async fn run(path: &Path, id: Option<String>, user: &str) -> Result<(), CliError> {
    let config = runtime::load_config()?;

    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;

    let document_id = match id {
        Some(id) => id,
        None => path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document")
            .to_string(),
    };

    let provider = runtime::build_provider(&config)?;
    let index = runtime::build_index(&config)?;

    let ingestor = Ingestor::new(Embedder::new(provider), index);
    let chunks = ingestor
        .ingest_document(&config.model.embedding_model, &document_id, &text, user)
        .await?;

    println!("  Indexed '{document_id}' for {user}: {chunks} chunks");
    Ok(())
}
