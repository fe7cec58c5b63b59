//! Retrieval-augmented question answering over the knowledge corpus.
//!
//! Corpus files are chunked, embedded through the LLM service and held in an
//! in-memory index; a question is answered by retrieving the most similar
//! chunks by cosine similarity and generating from a fixed expert prompt.
//! The index is rebuilt from scratch on every `reindex`; the corpus is small
//! enough that incremental updates are not worth the bookkeeping.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::knowledge::KnowledgeBase;
use crate::llm::{LlmClient, LlmError};
use crate::services::KnowledgeIndexer;

const CHUNK_SIZE: usize = 500;
const CHUNK_OVERLAP: usize = 50;
/// Chunks stuffed into the answer prompt.
const CONTEXT_K: usize = 3;
/// Chunks cited back to the caller.
const SOURCE_K: usize = 2;

const ANSWER_PROMPT: &str = "You are an expert on the biodiversity of Islamabad and Margalla Hills \
National Park. Use the following pieces of context to answer the question. If you don't know the \
answer, just say that you don't know, don't try to make up an answer. Keep the answer concise and \
relevant to Islamabad's biodiversity.

Context: {context}

Question: {question}
Answer:";

const ANSWER_TEMPERATURE: f32 = 0.3;
const ANSWER_MAX_TOKENS: u32 = 2048;

/// Errors from the question-answering pipeline.
#[derive(Debug, thiserror::Error)]
pub enum RagError {
    #[error("Knowledge index is empty; add sightings or run reindex")]
    EmptyIndex,
    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// A cited source chunk.
#[derive(Debug, Clone, Serialize)]
pub struct SourceChunk {
    pub text: String,
    /// Corpus file the chunk came from.
    pub source: String,
}

/// Answer plus the chunks it was grounded on.
#[derive(Debug, Clone, Serialize)]
pub struct RagAnswer {
    pub answer: String,
    pub sources: Vec<SourceChunk>,
}

/// One embedded corpus chunk.
struct IndexedChunk {
    origin: String,
    text: String,
    embedding: Vec<f32>,
}

/// In-memory retrieval index over the knowledge corpus.
pub struct RagSystem {
    llm: LlmClient,
    knowledge: Arc<KnowledgeBase>,
    index: RwLock<Vec<IndexedChunk>>,
}

impl RagSystem {
    pub fn new(llm: LlmClient, knowledge: Arc<KnowledgeBase>) -> Self {
        Self {
            llm,
            knowledge,
            index: RwLock::new(Vec::new()),
        }
    }

    /// Number of chunks currently indexed.
    pub async fn chunk_count(&self) -> usize {
        self.index.read().await.len()
    }

    /// Rebuild the index from the corpus files.
    ///
    /// The old index keeps serving reads until the new one is complete, then
    /// is swapped out in one write.
    pub async fn reindex(&self) -> anyhow::Result<usize> {
        let documents = self.knowledge.load_corpus()?;

        let mut chunks = Vec::new();
        for doc in &documents {
            for piece in chunk_text(&doc.text, CHUNK_SIZE, CHUNK_OVERLAP) {
                let embedding = self.llm.embed(&piece).await?;
                chunks.push(IndexedChunk {
                    origin: doc.origin.clone(),
                    text: piece,
                    embedding,
                });
            }
        }

        let count = chunks.len();
        *self.index.write().await = chunks;

        info!(documents = documents.len(), chunks = count, "Knowledge index rebuilt");
        Ok(count)
    }

    /// Answer a free-text question from the indexed corpus.
    pub async fn ask(&self, question: &str) -> Result<RagAnswer, RagError> {
        let query_embedding = self.llm.embed(question).await?;

        let index = self.index.read().await;
        if index.is_empty() {
            return Err(RagError::EmptyIndex);
        }

        let mut ranked: Vec<(f32, &IndexedChunk)> = index
            .iter()
            .map(|c| (cosine_similarity(&query_embedding, &c.embedding), c))
            .collect();
        ranked.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        let context = ranked
            .iter()
            .take(CONTEXT_K)
            .map(|(_, c)| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let sources = ranked
            .iter()
            .take(SOURCE_K)
            .map(|(_, c)| SourceChunk {
                text: c.text.clone(),
                source: c.origin.clone(),
            })
            .collect();
        drop(index);

        let prompt = ANSWER_PROMPT
            .replace("{context}", &context)
            .replace("{question}", question);

        debug!(question, "Answering from knowledge index");
        let answer = self
            .llm
            .generate_with(&prompt, ANSWER_TEMPERATURE, ANSWER_MAX_TOKENS)
            .await?;

        Ok(RagAnswer {
            answer: answer.trim().to_string(),
            sources,
        })
    }
}

#[async_trait]
impl KnowledgeIndexer for RagSystem {
    async fn refresh_index(&self) {
        if let Err(e) = self.reindex().await {
            warn!(error = %e, "Knowledge index refresh failed");
        }
    }
}

/// Split text into chunks of at most `size` characters with `overlap`
/// characters carried between consecutive chunks. Splits on char
/// boundaries, preferring the last whitespace inside the window so words
/// stay intact.
fn chunk_text(text: &str, size: usize, overlap: usize) -> Vec<String> {
    debug_assert!(overlap < size);

    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }
    if chars.len() <= size {
        let whole = text.trim();
        return if whole.is_empty() {
            Vec::new()
        } else {
            vec![whole.to_string()]
        };
    }

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let hard_end = (start + size).min(chars.len());
        let end = if hard_end < chars.len() {
            // Break at the last whitespace in the window when there is one.
            chars[start..hard_end]
                .iter()
                .rposition(|c| c.is_whitespace())
                .map(|pos| start + pos + 1)
                .filter(|&e| e > start + overlap)
                .unwrap_or(hard_end)
        } else {
            hard_end
        };

        let piece: String = chars[start..end].iter().collect();
        let piece = piece.trim();
        if !piece.is_empty() {
            chunks.push(piece.to_string());
        }

        if end >= chars.len() {
            break;
        }
        start = end.saturating_sub(overlap);
    }

    chunks
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmConfig;
    use crate::models::CategoryMode;
    use tempfile::tempdir;

    #[test]
    fn test_chunk_short_text_is_single_chunk() {
        let chunks = chunk_text("a short note about crows", 500, 50);
        assert_eq!(chunks, vec!["a short note about crows".to_string()]);
    }

    #[test]
    fn test_chunk_empty_text() {
        assert!(chunk_text("", 500, 50).is_empty());
        assert!(chunk_text("   \n  ", 500, 50).is_empty());
    }

    #[test]
    fn test_chunk_respects_size_and_overlap() {
        let word = "sighting ";
        let text = word.repeat(200);
        let chunks = chunk_text(&text, 500, 50);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 500);
        }
        // Consecutive chunks share text through the overlap window.
        let tail: String = chunks[0].chars().rev().take(20).collect();
        let tail: String = tail.chars().rev().collect();
        assert!(chunks[1].contains(tail.split_whitespace().next().unwrap()));
    }

    #[test]
    fn test_chunk_prefers_word_boundaries() {
        let text = "word ".repeat(300);
        for chunk in chunk_text(&text, 500, 50) {
            assert!(!chunk.starts_with("ord"));
            assert!(chunk.split_whitespace().all(|w| w == "word"));
        }
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[tokio::test]
    async fn test_ask_with_empty_index_after_disabled_embed() {
        let dir = tempdir().unwrap();
        let knowledge = Arc::new(KnowledgeBase::new(
            dir.path().join("knowledge"),
            "margalla",
            CategoryMode::Extended,
        ));
        let llm = LlmClient::new(LlmConfig::disabled()).unwrap();
        let rag = RagSystem::new(llm, knowledge);

        // Disabled LLM fails at the embedding step before index lookup.
        let result = rag.ask("What birds live here?").await;
        assert!(matches!(result, Err(RagError::Llm(LlmError::Disabled))));
        assert_eq!(rag.chunk_count().await, 0);
    }

    #[tokio::test]
    async fn test_reindex_empty_corpus_yields_empty_index() {
        let dir = tempdir().unwrap();
        let knowledge = Arc::new(KnowledgeBase::new(
            dir.path().join("knowledge"),
            "margalla",
            CategoryMode::Extended,
        ));
        let llm = LlmClient::new(LlmConfig::disabled()).unwrap();
        let rag = RagSystem::new(llm, knowledge);

        // No corpus files yet, so no chunks need embedding.
        let count = rag.reindex().await.unwrap();
        assert_eq!(count, 0);
        assert_eq!(rag.chunk_count().await, 0);
    }
}
