//! OpenAI API Client
//!
//! Thin client for the three endpoints the bot needs: chat completions,
//! embeddings and audio transcriptions. Each endpoint sits behind a trait so
//! the translation pipeline can run against stubs in tests.

use async_trait::async_trait;
use reqwest::{multipart, Client};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::Config;

/// OpenAI call failures
#[derive(Debug, thiserror::Error)]
pub enum OpenAiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenAI API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("OpenAI returned no content")]
    EmptyResponse,

    #[error("Embedding count mismatch: sent {sent}, received {received}")]
    EmbeddingCount { sent: usize, received: usize },
}

/// Content part of a multimodal message
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ImageUrl {
    pub url: String,
}

/// Message content: plain string or a list of parts
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// Message in a chat completion request
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: MessageContent::Text(content.into()),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: MessageContent::Text(content.into()),
        }
    }

    pub fn user_parts(parts: Vec<ContentPart>) -> Self {
        Self {
            role: "user".to_string(),
            content: MessageContent::Parts(parts),
        }
    }

    /// Text content, if this is a plain-text message
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            MessageContent::Text(text) => Some(text),
            MessageContent::Parts(_) => None,
        }
    }
}

/// Provider-independent completion request
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f32>,
    pub max_tokens: u32,
}

#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Run one completion and return the trimmed answer text
    async fn complete(&self, request: CompletionRequest) -> Result<String, OpenAiError>;
}

#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Embed every input, preserving order
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, OpenAiError>;
}

#[async_trait]
pub trait TranscriptionBackend: Send + Sync {
    async fn transcribe(
        &self,
        file_name: &str,
        audio: Vec<u8>,
        language: &str,
    ) -> Result<String, OpenAiError>;
}

/// API request
#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    max_tokens: u32,
}

/// API response
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

impl ChatCompletionResponse {
    /// Trimmed text of the first choice; blank answers count as missing
    fn into_answer(self) -> Result<String, OpenAiError> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(OpenAiError::EmptyResponse)
    }
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Serialize)]
struct EmbeddingBody<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

const TRANSCRIPTION_MODEL: &str = "whisper-1";

/// OpenAI API client
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    chat_model: String,
    embedding_model: String,
}

impl OpenAiClient {
    pub fn new(
        api_key: &str,
        base_url: &str,
        chat_model: &str,
        embedding_model: &str,
        timeout: std::time::Duration,
    ) -> Result<Self, OpenAiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            chat_model: chat_model.to_string(),
            embedding_model: embedding_model.to_string(),
        })
    }

    /// Create from config
    pub fn from_config(config: &Config) -> Result<Self, OpenAiError> {
        Self::new(
            &config.openai_api_key,
            &config.openai_base_url,
            &config.model,
            &config.embedding_model,
            config.request_timeout,
        )
    }

    pub fn chat_model(&self) -> &str {
        &self.chat_model
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, OpenAiError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(OpenAiError::Api { status, body })
    }
}

#[async_trait]
impl ChatBackend for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, OpenAiError> {
        let body = ChatCompletionBody {
            model: &self.chat_model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        debug!(
            "Calling OpenAI chat: model={}, messages={}, max_tokens={}",
            self.chat_model,
            request.messages.len(),
            request.max_tokens
        );

        let response = self
            .client
            .post(self.url("chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let result: ChatCompletionResponse = Self::check(response).await?.json().await?;

        if let Some(usage) = &result.usage {
            info!(
                "OpenAI response: model={}, in={}, out={}",
                self.chat_model, usage.prompt_tokens, usage.completion_tokens
            );
        }

        result.into_answer()
    }
}

#[async_trait]
impl EmbeddingBackend for OpenAiClient {
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, OpenAiError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let body = EmbeddingBody {
            model: &self.embedding_model,
            input: inputs,
        };

        let response = self
            .client
            .post(self.url("embeddings"))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let mut result: EmbeddingResponse = Self::check(response).await?.json().await?;

        if result.data.len() != inputs.len() {
            return Err(OpenAiError::EmbeddingCount {
                sent: inputs.len(),
                received: result.data.len(),
            });
        }

        result.data.sort_by_key(|d| d.index);
        Ok(result.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl TranscriptionBackend for OpenAiClient {
    async fn transcribe(
        &self,
        file_name: &str,
        audio: Vec<u8>,
        language: &str,
    ) -> Result<String, OpenAiError> {
        let part = multipart::Part::bytes(audio).file_name(file_name.to_string());
        let form = multipart::Form::new()
            .text("model", TRANSCRIPTION_MODEL)
            .text("language", language.to_string())
            .part("file", part);

        let response = self
            .client
            .post(self.url("audio/transcriptions"))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;
        let result: TranscriptionResponse = Self::check(response).await?.json().await?;

        Ok(result.text)
    }
}
