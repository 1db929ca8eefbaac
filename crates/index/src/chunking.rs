//! Document chunking for ingestion.
//!
//! Fixed-size character windows with overlap, so a sentence cut at a
//! boundary still appears whole in one of the neighboring chunks.

pub const DEFAULT_CHUNK_SIZE: usize = 400;
pub const DEFAULT_OVERLAP: usize = 50;

/// Split `text` into windows of `chunk_size` characters, each starting
/// `chunk_size - overlap` after the previous one. Operates on char
/// boundaries so multi-byte text never panics.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    assert!(chunk_size > overlap, "chunk_size must exceed overlap");

    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }

    let step = chunk_size - overlap;
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }

    chunks
}

/// Chunk with the default window and overlap.
pub fn chunk_text_default(text: &str) -> Vec<String> {
    chunk_text(text, DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP)
}
