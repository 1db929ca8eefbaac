//! LLM and embedding service clients for caremind.
//!
//! All providers implement the `caremind_core::Provider` trait.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;
