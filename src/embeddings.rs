//! Vector Embeddings for Dictionary Search
//!
//! Wraps the embeddings endpoint and keeps dictionary chunks in an in-memory
//! index searched by squared Euclidean distance (lower is closer).
//! Query embeddings are cached so repeated lookups of the same word skip
//! the network.

use anyhow::{Context, Result};
use moka::future::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::openai::EmbeddingBackend;

/// Inputs per embeddings request when indexing documents
const EMBED_BATCH_SIZE: usize = 100;

/// Embedding generator with a query cache
pub struct EmbeddingStore {
    backend: Arc<dyn EmbeddingBackend>,
    /// LRU cache for query embeddings (max 1000 entries, 1 hour TTL)
    cache: Cache<String, Vec<f32>>,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
}

impl EmbeddingStore {
    pub fn new(backend: Arc<dyn EmbeddingBackend>) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(3600))
            .build();

        Self {
            backend,
            cache,
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
        }
    }

    /// Get cache statistics (hits, misses)
    pub fn cache_stats(&self) -> (u64, u64) {
        (
            self.cache_hits.load(Ordering::Relaxed),
            self.cache_misses.load(Ordering::Relaxed),
        )
    }

    /// Generate embedding for a query (with caching)
    pub async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let cache_key = text.trim().to_string();

        if let Some(cached) = self.cache.get(&cache_key).await {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(cached);
        }
        self.cache_misses.fetch_add(1, Ordering::Relaxed);

        // The endpoint sees the text as the user wrote it
        let mut embeddings = self
            .backend
            .embed(&[text.to_string()])
            .await
            .context("Failed to embed query")?;
        let embedding = embeddings
            .pop()
            .ok_or_else(|| anyhow::anyhow!("Embedding service returned nothing for query"))?;

        self.cache.insert(cache_key, embedding.clone()).await;
        Ok(embedding)
    }

    /// Generate embeddings for document chunks (batched, uncached)
    pub async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(EMBED_BATCH_SIZE) {
            let batch_embeddings = self
                .backend
                .embed(batch)
                .await
                .context("Failed to embed dictionary chunks")?;
            debug!("Embedded batch of {} chunks", batch.len());
            embeddings.extend(batch_embeddings);
        }

        Ok(embeddings)
    }

    /// Squared Euclidean distance between two vectors
    pub fn l2_squared(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() {
            return f32::INFINITY;
        }
        a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
    }
}

/// Chunk with its embedding
#[derive(Debug, Clone)]
pub struct EmbeddedEntry {
    pub content: String,
    pub embedding: Vec<f32>,
}

impl EmbeddedEntry {
    pub fn new(content: String, embedding: Vec<f32>) -> Self {
        Self { content, embedding }
    }
}

/// In-memory vector index
#[derive(Debug, Default)]
pub struct VectorIndex {
    entries: Vec<EmbeddedEntry>,
    dimension: Option<usize>,
}

impl VectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry; the first entry fixes the dimension
    pub fn add(&mut self, entry: EmbeddedEntry) {
        let dimension = *self.dimension.get_or_insert(entry.embedding.len());
        if entry.embedding.len() == dimension {
            self.entries.push(entry);
        } else {
            warn!(
                "Embedding dimension mismatch: expected {}, got {}",
                dimension,
                entry.embedding.len()
            );
        }
    }

    /// Nearest entries by ascending distance
    pub fn search(&self, query_embedding: &[f32], top_k: usize) -> Vec<(&EmbeddedEntry, f32)> {
        let mut results: Vec<(&EmbeddedEntry, f32)> = self
            .entries
            .iter()
            .map(|e| (e, EmbeddingStore::l2_squared(query_embedding, &e.embedding)))
            .collect();

        results.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(top_k);
        results
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }
}
