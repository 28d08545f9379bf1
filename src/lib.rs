//! Elenya Bot
//!
//! Telegram tutor for the Elenya elvish language.
//!
//! # Features
//!
//! - **Translation**: Russian ⇄ Elenya through an OpenAI chat model
//! - **Dictionary grounding**: similarity search over the reference dictionary
//! - **Modes**: per-chat dictionary / free mode with an inline keyboard
//! - **Voice**: Whisper transcription before translation
//! - **Images**: vision model names the object, then it is translated
//!
//! # Architecture
//!
//! ```text
//! Telegram ──► Dispatcher ──► BotData ──► TranslationRouter ──► OpenAI chat
//!                               │               │
//!                               │               └── DictionaryQuery ──► DictionaryIndex
//!                               │                                        (embeddings + VectorIndex)
//!                               ├── ModeStore
//!                               ├── SpeechToText ──► OpenAI transcriptions
//!                               └── VisionProcessor ──► OpenAI chat (image input)
//! ```

pub mod config;
pub mod dictionary;
pub mod embeddings;
pub mod mode;
pub mod openai;
pub mod preflight;
pub mod router;
pub mod stt;
pub mod telegram;
pub mod telegram_ui;
pub mod vision;


pub use config::{Config, ConfigError};
pub use dictionary::{DictionaryIndex, DictionaryLoader, DictionaryQuery, ReferenceIndex, Retrieval, ScoredChunk};
pub use embeddings::{EmbeddedEntry, EmbeddingStore, VectorIndex};
pub use mode::{Mode, ModeError, ModeStore};
pub use openai::{ChatBackend, ChatMessage, CompletionRequest, EmbeddingBackend, OpenAiClient, OpenAiError, TranscriptionBackend};
pub use preflight::PreflightResult;
pub use router::{Direction, Translation, TranslationRouter};
pub use stt::SpeechToText;
pub use telegram::{BotData, MediaDownloader, MediaOutcome};
pub use vision::VisionProcessor;
