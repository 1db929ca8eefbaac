//! Vector index backends and document chunking for caremind.
//!
//! All backends implement the `caremind_core::VectorIndex` trait.

pub mod chunking;
pub mod in_memory;
pub mod remote;
pub mod vector;

pub use chunking::{chunk_text, chunk_text_default, DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP};
pub use in_memory::InMemoryIndex;
pub use remote::RemoteIndex;
pub use vector::cosine_similarity;
