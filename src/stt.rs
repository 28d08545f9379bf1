//! Speech-to-text for voice messages

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::error;

use crate::openai::TranscriptionBackend;

/// Transcribes downloaded voice files
pub struct SpeechToText {
    backend: Arc<dyn TranscriptionBackend>,
    language: String,
}

impl SpeechToText {
    pub fn new(backend: Arc<dyn TranscriptionBackend>, language: &str) -> Self {
        Self {
            backend,
            language: language.to_string(),
        }
    }

    /// Recognized text, or an empty string on any failure
    pub async fn transcribe(&self, audio_path: &Path) -> String {
        match self.try_transcribe(audio_path).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                error!("Speech recognition failed: {:#}", e);
                String::new()
            }
        }
    }

    async fn try_transcribe(&self, audio_path: &Path) -> Result<String> {
        let audio = tokio::fs::read(audio_path)
            .await
            .with_context(|| format!("Failed to read {}", audio_path.display()))?;

        let file_name = audio_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("voice.ogg");

        let text = self
            .backend
            .transcribe(file_name, audio, &self.language)
            .await?;
        Ok(text)
    }
}
