//! Image labelling through a vision-capable chat model

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::path::Path;
use std::sync::Arc;
use tracing::error;

use crate::openai::{ChatBackend, ChatMessage, CompletionRequest, ContentPart, ImageUrl};

const LABEL_PROMPT: &str = "Определи, что изображено на картинке. Ответь одним словом или короткой фразой (максимум 2-3 слова). Это должен быть конкретный объект, предмет, природное явление или существо.";

const LABEL_MAX_TOKENS: u32 = 50;

/// Names the main object in a photo
pub struct VisionProcessor {
    chat: Arc<dyn ChatBackend>,
}

impl VisionProcessor {
    pub fn new(chat: Arc<dyn ChatBackend>) -> Self {
        Self { chat }
    }

    /// Short label for the image, or an empty string on any failure
    pub async fn analyze_image(&self, image_path: &Path) -> String {
        match self.try_analyze(image_path).await {
            Ok(label) => label.trim().to_string(),
            Err(e) => {
                error!("Image analysis failed: {:#}", e);
                String::new()
            }
        }
    }

    async fn try_analyze(&self, image_path: &Path) -> Result<String> {
        let bytes = tokio::fs::read(image_path)
            .await
            .with_context(|| format!("Failed to read {}", image_path.display()))?;

        let request = label_request(&bytes);
        let label = self.chat.complete(request).await?;
        Ok(label)
    }
}

fn label_request(image: &[u8]) -> CompletionRequest {
    let data_url = format!("data:image/jpeg;base64,{}", BASE64.encode(image));

    CompletionRequest {
        messages: vec![ChatMessage::user_parts(vec![
            ContentPart::Text {
                text: LABEL_PROMPT.to_string(),
            },
            ContentPart::ImageUrl {
                image_url: ImageUrl { url: data_url },
            },
        ])],
        temperature: None,
        max_tokens: LABEL_MAX_TOKENS,
    }
}
