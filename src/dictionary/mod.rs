//! Elenya dictionary retrieval
//!
//! The reference dictionary is split into overlapping chunks, embedded once
//! at startup and searched per request. Lookups go through [`ReferenceIndex`]
//! so the query layer does not care where the vectors live.

pub mod loader;
pub mod query;
pub mod splitter;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::embeddings::{EmbeddingStore, VectorIndex};

pub use loader::DictionaryLoader;
pub use query::{DictionaryQuery, Retrieval};
pub use splitter::TextSplitter;

/// Dictionary fragment with its distance to the query (lower is closer)
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub content: String,
    pub distance: f32,
}

impl ScoredChunk {
    pub fn new(content: impl Into<String>, distance: f32) -> Self {
        Self {
            content: content.into(),
            distance,
        }
    }
}

/// Similarity-searchable store of dictionary chunks
#[async_trait]
pub trait ReferenceIndex: Send + Sync {
    /// Up to `k` chunks ordered by ascending distance
    async fn similarity_search_with_score(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>>;
}

/// Embedded dictionary held in memory
pub struct DictionaryIndex {
    embeddings: Arc<EmbeddingStore>,
    index: VectorIndex,
}

impl DictionaryIndex {
    pub fn new(embeddings: Arc<EmbeddingStore>, index: VectorIndex) -> Self {
        Self { embeddings, index }
    }

    /// Number of chunks loaded
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

#[async_trait]
impl ReferenceIndex for DictionaryIndex {
    async fn similarity_search_with_score(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        let query_embedding = self.embeddings.embed_query(query).await?;
        Ok(self
            .index
            .search(&query_embedding, k)
            .into_iter()
            .map(|(entry, distance)| ScoredChunk::new(entry.content.clone(), distance))
            .collect())
    }
}
