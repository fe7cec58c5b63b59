//! LLM client for species classification, embeddings and answer generation.

mod client;

pub use client::{LlmClient, LlmConfig, LlmError};
