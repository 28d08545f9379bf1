//! Telegram Bot integration for Elenya Bot
//!
//! Binds the translation services to Telegram updates:
//! - `/start`, `/mode`, `/help` commands and the mode keyboard callbacks
//! - text messages (translated directly)
//! - voice messages (transcribed, then translated)
//! - photos (labelled by the vision model, then translated)
//!
//! Downloaded media lives in the temp directory only for the duration of
//! one handler call.
//!
//! Uses explicit Dispatcher pattern for reliable message polling.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use teloxide::{
    dispatching::{Dispatcher, UpdateFilterExt},
    dptree,
    error_handlers::LoggingErrorHandler,
    net::Download,
    prelude::*,
    types::Update,
};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::dictionary::{DictionaryLoader, DictionaryQuery};
use crate::embeddings::EmbeddingStore;
use crate::mode::ModeStore;
use crate::openai::OpenAiClient;
use crate::router::TranslationRouter;
use crate::stt::SpeechToText;
use crate::telegram_ui::{self, compose_answer, mode_keyboard, ButtonAction, MediaKind};
use crate::vision::VisionProcessor;

/// Fetches a Telegram file to a local path
#[async_trait]
pub trait MediaDownloader: Send + Sync {
    async fn download(&self, file_id: &str, dest: &Path) -> Result<()>;
}

#[async_trait]
impl MediaDownloader for Bot {
    async fn download(&self, file_id: &str, dest: &Path) -> Result<()> {
        let file = self.get_file(file_id).await.context("getFile failed")?;
        let mut dst = tokio::fs::File::create(dest)
            .await
            .with_context(|| format!("Failed to create {}", dest.display()))?;
        self.download_file(&file.path, &mut dst)
            .await
            .context("File download failed")?;
        debug!("Downloaded {} to {}", file_id, dest.display());
        Ok(())
    }
}

/// Result of recognizing one voice message or photo
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaOutcome {
    /// Transcribed speech or the detected object label
    Recognized(String),
    /// Analysis ran but produced nothing
    NotRecognized,
    /// The file could not be fetched
    Failed,
}

impl MediaOutcome {
    /// Text replacing the progress message when there is nothing to translate
    pub fn status_text(&self, kind: MediaKind) -> Option<&'static str> {
        match self {
            Self::Recognized(_) => None,
            Self::NotRecognized => Some(kind.not_recognized_text()),
            Self::Failed => Some(kind.error_text()),
        }
    }
}

/// Services shared by every handler, injected into the dispatcher
pub struct BotData {
    modes: ModeStore,
    router: TranslationRouter,
    stt: SpeechToText,
    vision: VisionProcessor,
    media_dir: PathBuf,
    bot_username: String,
}

impl BotData {
    pub fn new(
        modes: ModeStore,
        router: TranslationRouter,
        stt: SpeechToText,
        vision: VisionProcessor,
        media_dir: PathBuf,
    ) -> Self {
        Self {
            modes,
            router,
            stt,
            vision,
            media_dir,
            bot_username: String::new(),
        }
    }

    /// Username used to tell our `/cmd@bot` commands from other bots'
    pub fn with_bot_username(mut self, username: &str) -> Self {
        self.bot_username = username.to_string();
        self
    }

    /// Wire every service from config; loads and embeds the dictionary
    pub async fn from_config(config: &Config) -> Result<Self> {
        let openai = Arc::new(OpenAiClient::from_config(config).context("Failed to build OpenAI client")?);

        info!("Loading Elenya dictionary from {}", config.dictionary_path.display());
        let embeddings = Arc::new(EmbeddingStore::new(openai.clone()));
        let loader = DictionaryLoader::new(embeddings, config.chunk_size, config.chunk_overlap);
        let index = loader
            .load_dictionary(&config.dictionary_path)
            .await
            .context("Failed to load dictionary")?;
        let query = DictionaryQuery::with_threshold(Arc::new(index), config.relevance_threshold);

        let router = TranslationRouter::new(openai.clone(), Some(query)).with_top_k(config.top_k);
        let stt = SpeechToText::new(openai.clone(), &config.stt_language);
        let vision = VisionProcessor::new(openai);

        Ok(Self::new(
            ModeStore::new(),
            router,
            stt,
            vision,
            std::env::temp_dir(),
        ))
    }

    pub fn modes(&self) -> &ModeStore {
        &self.modes
    }

    /// Translate for a chat according to its mode and build the final reply
    pub async fn translate_reply(
        &self,
        chat_id: i64,
        text: &str,
        header: Option<&str>,
        context: Option<&str>,
    ) -> String {
        let use_dictionary = self.modes.is_dictionary_mode(chat_id).await;
        let translation = self.router.translate(text, use_dictionary, context).await;
        compose_answer(
            header,
            &translation.answer,
            use_dictionary,
            translation.found_in_dictionary,
        )
    }

    /// Apply a keyboard callback and return the confirmation text
    pub async fn apply_callback(&self, chat_id: i64, callback_data: &str) -> &'static str {
        match ButtonAction::decode(callback_data) {
            Some(ButtonAction::SelectMode(mode)) => {
                self.modes.set(chat_id, mode).await;
                telegram_ui::mode_selected_text(mode)
            }
            None => telegram_ui::UNKNOWN_CALLBACK,
        }
    }

    /// Temp path for a downloaded media file
    pub fn media_path(&self, kind: MediaKind, chat_id: i64, file_id: &str) -> PathBuf {
        self.media_dir.join(format!(
            "{}_{}_{}.{}",
            kind,
            chat_id,
            file_id,
            kind.extension()
        ))
    }

    /// Download, recognize and delete one media file
    ///
    /// The temp file is removed whatever happens, including a failed download.
    pub async fn recognize_media(
        &self,
        downloader: &dyn MediaDownloader,
        kind: MediaKind,
        chat_id: i64,
        file_id: &str,
    ) -> MediaOutcome {
        let path = self.media_path(kind, chat_id, file_id);

        let outcome = match downloader.download(file_id, &path).await {
            Ok(()) => {
                let recognized = match kind {
                    MediaKind::Voice => self.stt.transcribe(&path).await,
                    MediaKind::Photo => self.vision.analyze_image(&path).await,
                };
                if recognized.is_empty() {
                    MediaOutcome::NotRecognized
                } else {
                    MediaOutcome::Recognized(recognized)
                }
            }
            Err(e) => {
                error!("Failed to download {} {}: {:#}", kind, file_id, e);
                MediaOutcome::Failed
            }
        };

        remove_temp_file(&path).await;
        outcome
    }

    /// Translation reply for recognized media, headed by what was recognized
    pub async fn media_reply(&self, kind: MediaKind, chat_id: i64, recognized: &str) -> String {
        match kind {
            MediaKind::Voice => {
                let header = telegram_ui::voice_header(recognized);
                self.translate_reply(chat_id, recognized, Some(&header), None)
                    .await
            }
            MediaKind::Photo => {
                let header = telegram_ui::photo_header(recognized);
                let context = telegram_ui::photo_context(recognized);
                self.translate_reply(chat_id, recognized, Some(&header), Some(&context))
                    .await
            }
        }
    }
}

/// Run Telegram bot with explicit Dispatcher for reliable polling
pub async fn run_telegram_bot(config: Config) -> Result<()> {
    let data = BotData::from_config(&config).await?;

    let bot = Bot::new(config.telegram_token.clone());

    // Verify bot token by calling getMe
    info!("Verifying bot token...");
    let username = match bot.get_me().await {
        Ok(me) => {
            let username = me.username.clone().unwrap_or_default();
            info!("Bot authenticated: @{} (ID: {})", username, me.id);
            username
        }
        Err(e) => {
            error!("Failed to authenticate bot: {}", e);
            anyhow::bail!("Bot authentication failed: {}", e);
        }
    };
    let handler_data = Arc::new(data.with_bot_username(&username));

    // Delete any existing webhook to ensure polling works
    if let Err(e) = bot.delete_webhook().await {
        warn!("Failed to delete webhook: {} (continuing anyway)", e);
    }

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(message_handler))
        .branch(Update::filter_callback_query().endpoint(callback_handler));

    info!("===========================================");
    info!("  Elenya Bot is now LIVE - send a message!");
    info!("===========================================");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![handler_data])
        .default_handler(|upd| async move {
            debug!("Unhandled update: {:?}", upd);
        })
        .error_handler(LoggingErrorHandler::with_custom_text(
            "Error in message handler",
        ))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    warn!("Dispatcher stopped");
    Ok(())
}

/// Message handler endpoint for the dispatcher
async fn message_handler(bot: Bot, msg: Message, data: Arc<BotData>) -> ResponseResult<()> {
    let chat_id = msg.chat.id.0;
    let kind = if msg.voice().is_some() {
        "voice"
    } else if msg.photo().is_some() {
        "photo"
    } else {
        "text"
    };
    let text_preview = msg
        .text()
        .unwrap_or("<non-text>")
        .chars()
        .take(50)
        .collect::<String>();

    info!(
        ">>> Message received: chat={}, kind={}, text={:?}",
        chat_id, kind, text_preview
    );

    if let Err(e) = handle_message(&bot, &msg, &data).await {
        error!("Error handling message: {:#}", e);
    }

    Ok(())
}

/// Callback query handler for the mode keyboard
async fn callback_handler(bot: Bot, query: CallbackQuery, data: Arc<BotData>) -> ResponseResult<()> {
    bot.answer_callback_query(&query.id).await?;

    let Some(message) = &query.message else {
        return Ok(());
    };
    let chat_id = message.chat().id;
    let callback_data = query.data.as_deref().unwrap_or("");

    info!("Callback query: chat={}, data={}", chat_id, callback_data);

    let reply = data.apply_callback(chat_id.0, callback_data).await;
    if let Err(e) = bot.edit_message_text(chat_id, message.id(), reply).await {
        warn!("Failed to edit mode message: {}", e);
    }

    Ok(())
}

async fn handle_message(bot: &Bot, msg: &Message, data: &BotData) -> Result<()> {
    if let Some(voice) = msg.voice() {
        return handle_media(bot, msg.chat.id, MediaKind::Voice, &voice.file.id, data).await;
    }

    if let Some(photos) = msg.photo() {
        // Largest resolution comes last
        if let Some(photo) = photos.last() {
            return handle_media(bot, msg.chat.id, MediaKind::Photo, &photo.file.id, data).await;
        }
    }

    if let Some(text) = msg.text() {
        return match parse_command(text, &data.bot_username) {
            Some(ParsedCommand::Own(command)) => handle_command(bot, msg.chat.id, data, command).await,
            Some(ParsedCommand::Foreign) => {
                debug!("Ignoring command for another bot in chat {}", msg.chat.id);
                Ok(())
            }
            None => handle_text(bot, msg.chat.id, data, text).await,
        };
    }

    Ok(())
}

/// Bot command found at the start of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParsedCommand<'a> {
    /// Addressed to this bot, or to no bot in particular
    Own(&'a str),
    /// `/cmd@other_bot`
    Foreign,
}

/// Recognize a Telegram bot command: `/` then `[A-Za-z0-9_]+`, optionally
/// followed by `@username`. Anything else (e.g. `/лес`) is plain text.
pub(crate) fn parse_command<'a>(text: &'a str, bot_username: &str) -> Option<ParsedCommand<'a>> {
    let first = text.strip_prefix('/')?.split_whitespace().next()?;
    let (name, target) = match first.split_once('@') {
        Some((name, target)) => (name, Some(target)),
        None => (first, None),
    };

    if !is_command_word(name) {
        return None;
    }

    match target {
        None => Some(ParsedCommand::Own(name)),
        Some(target) if !is_command_word(target) => None,
        Some(target) if target.eq_ignore_ascii_case(bot_username) => Some(ParsedCommand::Own(name)),
        Some(_) => Some(ParsedCommand::Foreign),
    }
}

fn is_command_word(word: &str) -> bool {
    !word.is_empty() && word.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

async fn handle_command(bot: &Bot, chat_id: ChatId, data: &BotData, command: &str) -> Result<()> {
    match command {
        "start" | "help" => {
            bot.send_message(chat_id, telegram_ui::WELCOME)
                .reply_markup(mode_keyboard())
                .await?;
        }
        "mode" => {
            let mode = data.modes.get_mode(chat_id.0).await;
            bot.send_message(chat_id, telegram_ui::current_mode_text(mode))
                .reply_markup(mode_keyboard())
                .await?;
        }
        other => {
            debug!("Ignoring unknown command /{} from chat {}", other, chat_id);
        }
    }
    Ok(())
}

async fn handle_text(bot: &Bot, chat_id: ChatId, data: &BotData, text: &str) -> Result<()> {
    let progress = bot.send_message(chat_id, telegram_ui::TEXT_PROGRESS).await?;

    let reply = data.translate_reply(chat_id.0, text, None, None).await;

    if let Err(e) = bot.delete_message(chat_id, progress.id).await {
        warn!("Failed to delete progress message: {}", e);
    }
    bot.send_message(chat_id, reply).await?;
    Ok(())
}

async fn handle_media(
    bot: &Bot,
    chat_id: ChatId,
    kind: MediaKind,
    file_id: &str,
    data: &BotData,
) -> Result<()> {
    let progress = bot.send_message(chat_id, kind.progress_text()).await?;

    let outcome = data.recognize_media(bot, kind, chat_id.0, file_id).await;
    let result = match &outcome {
        MediaOutcome::Recognized(recognized) => {
            reply_to_media(bot, chat_id, &progress, kind, recognized, data).await
        }
        other => {
            let status = other.status_text(kind).unwrap_or(kind.error_text());
            bot.edit_message_text(chat_id, progress.id, status)
                .await
                .map(|_| ())
                .map_err(anyhow::Error::from)
        }
    };

    if let Err(e) = result {
        error!("{} processing failed: {:#}", kind, e);
        let _ = bot
            .edit_message_text(chat_id, progress.id, kind.error_text())
            .await;
    }
    Ok(())
}

async fn reply_to_media(
    bot: &Bot,
    chat_id: ChatId,
    progress: &Message,
    kind: MediaKind,
    recognized: &str,
    data: &BotData,
) -> Result<()> {
    bot.edit_message_text(chat_id, progress.id, kind.recognized_text(recognized))
        .await?;

    let reply = data.media_reply(kind, chat_id.0, recognized).await;

    bot.delete_message(chat_id, progress.id).await?;
    bot.send_message(chat_id, reply).await?;
    Ok(())
}

/// Best-effort removal of a downloaded media file
pub(crate) async fn remove_temp_file(path: &Path) {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return;
    }
    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!("Failed to remove temp file {}: {}", path.display(), e);
    }
}
