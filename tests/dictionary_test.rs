//! Dictionary Integration Tests
//!
//! Loads a small text dictionary through the real loader, splitter, embedding
//! cache and vector index. The embedding endpoint is replaced by a keyword
//! embedder so distances are predictable.

use async_trait::async_trait;
use elenya_bot::{
    DictionaryLoader, DictionaryQuery, EmbeddingBackend, EmbeddingStore, OpenAiError,
    ReferenceIndex,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const KEYWORDS: [&str; 3] = ["лес", "свет", "вода"];

/// One-hot embedding per keyword; unmatched text lands on a separate axis
struct KeywordEmbedder {
    calls: AtomicUsize,
}

impl KeywordEmbedder {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }

    fn vector(text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        let mut v = vec![0.0; KEYWORDS.len() + 1];
        match KEYWORDS.iter().position(|k| lower.contains(k)) {
            Some(i) => v[i] = 1.0,
            None => v[KEYWORDS.len()] = 1.0,
        }
        v
    }
}

#[async_trait]
impl EmbeddingBackend for KeywordEmbedder {
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, OpenAiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(inputs.iter().map(|t| Self::vector(t)).collect())
    }
}

const DICTIONARY: &str = "лес — taure (лесной мир)\n\nсвет — calë (сияние)\n\nвода — nén (река)";

async fn load(embedder: Arc<KeywordEmbedder>) -> (tempfile::TempDir, Arc<dyn ReferenceIndex>) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("elenya_dict.md");
    std::fs::write(&path, DICTIONARY).unwrap();

    let store = Arc::new(EmbeddingStore::new(embedder));
    let loader = DictionaryLoader::new(store, 30, 0);
    let index = loader.load_dictionary(&path).await.unwrap();
    assert_eq!(index.len(), 3);

    (dir, Arc::new(index))
}

#[tokio::test]
async fn test_known_word_is_found() {
    let (_dir, index) = load(KeywordEmbedder::new()).await;
    let query = DictionaryQuery::new(index);

    let retrieval = query.search("лес", 3).await.unwrap();

    assert!(retrieval.found);
    assert_eq!(retrieval.chunks, vec!["лес — taure (лесной мир)".to_string()]);
}

#[tokio::test]
async fn test_unknown_word_is_not_found() {
    let (_dir, index) = load(KeywordEmbedder::new()).await;
    let query = DictionaryQuery::new(index);

    // Orthogonal to every chunk: squared distance 2.0 is over the cut-off
    let retrieval = query.search("гора", 3).await.unwrap();

    assert!(!retrieval.found);
    assert!(retrieval.chunks.is_empty());
}

#[tokio::test]
async fn test_raw_search_orders_by_distance() {
    let (_dir, index) = load(KeywordEmbedder::new()).await;

    let results = index.similarity_search_with_score("свет", 3).await.unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].content, "свет — calë (сияние)");
    assert_eq!(results[0].distance, 0.0);
    assert!(results[1].distance >= results[0].distance);
    assert!(results[2].distance >= results[1].distance);
}

#[tokio::test]
async fn test_threshold_is_configurable() {
    let (_dir, index) = load(KeywordEmbedder::new()).await;
    let lenient = DictionaryQuery::with_threshold(index, 2.5);

    let retrieval = lenient.search("гора", 2).await.unwrap();

    assert!(retrieval.found);
    assert_eq!(retrieval.chunks.len(), 2);
}

#[tokio::test]
async fn test_repeated_queries_hit_cache() {
    let embedder = KeywordEmbedder::new();
    let (_dir, index) = load(embedder.clone()).await;
    let after_load = embedder.calls.load(Ordering::SeqCst);

    index.similarity_search_with_score("лес", 1).await.unwrap();
    index.similarity_search_with_score("лес", 1).await.unwrap();

    assert_eq!(embedder.calls.load(Ordering::SeqCst), after_load + 1);
}

#[tokio::test]
async fn test_empty_dictionary_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.txt");
    std::fs::write(&path, "").unwrap();

    let store = Arc::new(EmbeddingStore::new(KeywordEmbedder::new()));
    let loader = DictionaryLoader::new(store, 500, 50);

    assert!(loader.load_dictionary(&path).await.is_err());
}

#[tokio::test]
async fn test_missing_dictionary_is_an_error() {
    let store = Arc::new(EmbeddingStore::new(KeywordEmbedder::new()));
    let loader = DictionaryLoader::new(store, 500, 50);

    let result = loader
        .load_dictionary(std::path::Path::new("/nonexistent/elenya_dict.pdf"))
        .await;
    assert!(result.is_err());
}
