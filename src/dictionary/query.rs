//! Dictionary lookup with a relevance cut-off

use anyhow::Result;
use std::sync::Arc;
use tracing::debug;

use super::ReferenceIndex;
use crate::config::DEFAULT_RELEVANCE_THRESHOLD;

/// Chunks that passed the threshold, in index order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Retrieval {
    pub chunks: Vec<String>,
    pub found: bool,
}

/// Searches the dictionary and keeps only relevant fragments
#[derive(Clone)]
pub struct DictionaryQuery {
    index: Arc<dyn ReferenceIndex>,
    threshold: f32,
}

impl DictionaryQuery {
    pub fn new(index: Arc<dyn ReferenceIndex>) -> Self {
        Self::with_threshold(index, DEFAULT_RELEVANCE_THRESHOLD)
    }

    pub fn with_threshold(index: Arc<dyn ReferenceIndex>, threshold: f32) -> Self {
        Self { index, threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Top-`k` chunks with distance strictly below the threshold
    pub async fn search(&self, query: &str, k: usize) -> Result<Retrieval> {
        let results = self.index.similarity_search_with_score(query, k).await?;

        let chunks: Vec<String> = results
            .into_iter()
            .filter(|chunk| chunk.distance < self.threshold)
            .map(|chunk| chunk.content)
            .collect();
        let found = !chunks.is_empty();

        debug!(
            "Dictionary search {:?}: {} relevant chunk(s) under {}",
            query,
            chunks.len(),
            self.threshold
        );

        Ok(Retrieval { chunks, found })
    }

    /// Render chunks as prompt context; empty when there is nothing to show
    pub fn format_context(chunks: &[String]) -> String {
        if chunks.is_empty() {
            return String::new();
        }

        let mut context = String::from("Информация из словаря Elenya:\n\n");
        for chunk in chunks {
            context.push_str(chunk);
            context.push_str("\n\n");
        }
        context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::ScoredChunk;
    use async_trait::async_trait;

    struct FixedIndex(Vec<ScoredChunk>);

    #[async_trait]
    impl ReferenceIndex for FixedIndex {
        async fn similarity_search_with_score(&self, _query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
            Ok(self.0.iter().take(k).cloned().collect())
        }
    }

    fn query_over(chunks: Vec<ScoredChunk>) -> DictionaryQuery {
        DictionaryQuery::new(Arc::new(FixedIndex(chunks)))
    }

    #[tokio::test]
    async fn test_threshold_is_strict() {
        let query = query_over(vec![
            ScoredChunk::new("лес — taure", 0.9),
            ScoredChunk::new("свет — calë", 1.5),
            ScoredChunk::new("вода — nén", 1.7),
        ]);

        let result = query.search("лес", 3).await.unwrap();
        assert_eq!(result.chunks, vec!["лес — taure".to_string()]);
        assert!(result.found);
    }

    #[tokio::test]
    async fn test_nothing_under_threshold() {
        let query = query_over(vec![ScoredChunk::new("свет — calë", 1.5)]);

        let result = query.search("лес", 3).await.unwrap();
        assert!(result.chunks.is_empty());
        assert!(!result.found);
    }

    #[tokio::test]
    async fn test_empty_index() {
        let result = query_over(vec![]).search("лес", 3).await.unwrap();
        assert_eq!(result, Retrieval::default());
    }

    #[tokio::test]
    async fn test_custom_threshold() {
        let index: Arc<dyn ReferenceIndex> = Arc::new(FixedIndex(vec![ScoredChunk::new("лес — taure", 0.9)]));
        let query = DictionaryQuery::with_threshold(index, 0.5);

        assert!(!query.search("лес", 3).await.unwrap().found);
        assert!((query.threshold() - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_format_context() {
        assert_eq!(DictionaryQuery::format_context(&[]), "");

        let context = DictionaryQuery::format_context(&["лес — taure".to_string(), "свет — calë".to_string()]);
        assert_eq!(
            context,
            "Информация из словаря Elenya:\n\nлес — taure\n\nсвет — calë\n\n"
        );
    }
}
