//! Dictionary loading
//!
//! Reads the reference document (PDF page by page, or a UTF-8 text file),
//! splits every page into chunks and embeds them into a [`DictionaryIndex`].

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use super::{DictionaryIndex, TextSplitter};
use crate::embeddings::{EmbeddedEntry, EmbeddingStore, VectorIndex};

/// Supported dictionary document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Text,
}

impl DocumentFormat {
    /// Detect format from the file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "txt" | "md" | "markdown" => Some(Self::Text),
            _ => None,
        }
    }
}

/// Loads the dictionary into a vector index
pub struct DictionaryLoader {
    embeddings: Arc<EmbeddingStore>,
    splitter: TextSplitter,
}

impl DictionaryLoader {
    pub fn new(embeddings: Arc<EmbeddingStore>, chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            embeddings,
            splitter: TextSplitter::new(chunk_size, chunk_overlap),
        }
    }

    /// Read, split and embed the dictionary at `path`
    pub async fn load_dictionary(&self, path: &Path) -> Result<DictionaryIndex> {
        let owned: PathBuf = path.to_path_buf();
        let pages = tokio::task::spawn_blocking(move || read_pages(&owned))
            .await
            .context("Dictionary reader task failed")??;

        let chunks: Vec<String> = pages
            .iter()
            .flat_map(|page| self.splitter.split_text(page))
            .collect();

        if chunks.is_empty() {
            anyhow::bail!("Dictionary {} contains no text", path.display());
        }

        let embeddings = self.embeddings.embed_documents(&chunks).await?;

        let mut index = VectorIndex::new();
        for (content, embedding) in chunks.into_iter().zip(embeddings) {
            index.add(EmbeddedEntry::new(content, embedding));
        }

        info!(
            "Dictionary loaded: {} fragments from {} page(s) ({})",
            index.len(),
            pages.len(),
            path.display()
        );

        Ok(DictionaryIndex::new(Arc::clone(&self.embeddings), index))
    }
}

/// Extract page texts from the dictionary document
pub fn read_pages(path: &Path) -> Result<Vec<String>> {
    match DocumentFormat::from_path(path) {
        Some(DocumentFormat::Pdf) => read_pdf_pages(path),
        Some(DocumentFormat::Text) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read dictionary {}", path.display()))?;
            Ok(vec![text])
        }
        None => anyhow::bail!(
            "Unsupported dictionary format: {} (expected .pdf, .txt or .md)",
            path.display()
        ),
    }
}

fn read_pdf_pages(path: &Path) -> Result<Vec<String>> {
    let document = lopdf::Document::load(path)
        .with_context(|| format!("Failed to open PDF {}", path.display()))?;

    let mut pages = Vec::new();
    for page_number in document.get_pages().keys() {
        match document.extract_text(&[*page_number]) {
            Ok(text) => pages.push(text),
            Err(e) => warn!("Skipping PDF page {}: {}", page_number, e),
        }
    }
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(DocumentFormat::from_path(Path::new("rag/data/elenya_dict.pdf")), Some(DocumentFormat::Pdf));
        assert_eq!(DocumentFormat::from_path(Path::new("dict.PDF")), Some(DocumentFormat::Pdf));
        assert_eq!(DocumentFormat::from_path(Path::new("dict.md")), Some(DocumentFormat::Text));
        assert_eq!(DocumentFormat::from_path(Path::new("dict.txt")), Some(DocumentFormat::Text));
        assert_eq!(DocumentFormat::from_path(Path::new("dict.docx")), None);
        assert_eq!(DocumentFormat::from_path(Path::new("dict")), None);
    }

    #[test]
    fn test_read_text_pages() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dict.txt");
        std::fs::write(&path, "лес — taure\n").unwrap();

        let pages = read_pages(&path).unwrap();
        assert_eq!(pages, vec!["лес — taure\n".to_string()]);
    }

    #[test]
    fn test_unsupported_format_fails() {
        assert!(read_pages(Path::new("dict.docx")).is_err());
    }

    #[test]
    fn test_missing_file_fails() {
        assert!(read_pages(Path::new("/nonexistent/elenya.txt")).is_err());
    }
}
