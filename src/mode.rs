//! Per-chat working mode
//!
//! Each chat either translates against the Elenya dictionary (the default)
//! or lets the model answer freely. Modes live for the process lifetime only.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tokio::sync::RwLock;
use tracing::info;

/// Working mode for a chat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// Answers grounded in the dictionary when a match is found
    #[default]
    Dictionary,
    /// Answers from the model's general knowledge
    Free,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Dictionary => "dictionary",
            Mode::Free => "free",
        }
    }

    /// Human-readable name shown to users
    pub fn display_name(&self) -> &'static str {
        match self {
            Mode::Dictionary => "Словарь Elenya",
            Mode::Free => "Свободный режим",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Mode::Dictionary => Mode::Free,
            Mode::Free => Mode::Dictionary,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ModeError {
    #[error("Unknown mode: {0}")]
    Unknown(String),
}

impl FromStr for Mode {
    type Err = ModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dictionary" => Ok(Mode::Dictionary),
            "free" => Ok(Mode::Free),
            other => Err(ModeError::Unknown(other.to_string())),
        }
    }
}

/// Mode storage keyed by chat id
#[derive(Debug, Default)]
pub struct ModeStore {
    modes: RwLock<HashMap<i64, Mode>>,
}

impl ModeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set mode from its wire name; rejects anything but `dictionary` / `free`
    pub async fn set_mode(&self, chat_id: i64, mode: &str) -> Result<Mode, ModeError> {
        let mode: Mode = mode.parse()?;
        self.set(chat_id, mode).await;
        Ok(mode)
    }

    pub async fn set(&self, chat_id: i64, mode: Mode) {
        self.modes.write().await.insert(chat_id, mode);
        info!("Chat {}: mode set to {}", chat_id, mode);
    }

    /// Current mode, `Dictionary` for chats that never chose one
    pub async fn get_mode(&self, chat_id: i64) -> Mode {
        self.modes
            .read()
            .await
            .get(&chat_id)
            .copied()
            .unwrap_or_default()
    }

    pub async fn is_dictionary_mode(&self, chat_id: i64) -> bool {
        self.get_mode(chat_id).await == Mode::Dictionary
    }

    /// Flip the mode and return the new one
    pub async fn toggle_mode(&self, chat_id: i64) -> Mode {
        let new_mode = {
            let mut modes = self.modes.write().await;
            let entry = modes.entry(chat_id).or_default();
            *entry = entry.toggled();
            *entry
        };
        info!("Chat {}: mode toggled to {}", chat_id, new_mode);
        new_mode
    }
}
