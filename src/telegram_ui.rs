//! Telegram UI Components
//!
//! Inline keyboard for mode selection and the fixed texts the bot sends.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::mode::Mode;

// ============ Inline Keyboards ============

/// Button action types for callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    SelectMode(Mode),
}

impl ButtonAction {
    /// Encode action as callback data string
    pub fn encode(&self) -> String {
        match self {
            Self::SelectMode(mode) => format!("mode_{}", mode.as_str()),
        }
    }

    /// Decode callback data string to action
    pub fn decode(data: &str) -> Option<Self> {
        let mode = data.strip_prefix("mode_")?;
        mode.parse().ok().map(Self::SelectMode)
    }
}

/// Two-option mode keyboard
pub fn mode_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            "📚 Использовать словарь Elenya",
            ButtonAction::SelectMode(Mode::Dictionary).encode(),
        )],
        vec![InlineKeyboardButton::callback(
            "🌟 Свободный режим (без словаря)",
            ButtonAction::SelectMode(Mode::Free).encode(),
        )],
    ])
}

// ============ Texts ============

pub const WELCOME: &str = "✨ Добро пожаловать на путь изучения эльфийского языка Elenya.

Здесь слова звучат как шепот леса, а смысл рождается из света и тишины.

Ты можешь прислать:
• 📝 Текст — слово или фразу для перевода
• 🎤 Голосовое сообщение — я распознаю речь и переведу
• 🖼 Изображение — я определю объект и подберу слово на Elenya

Выбери, как мы будем работать дальше:";

pub const UNKNOWN_CALLBACK: &str = "Неизвестная команда";

pub const NOT_FOUND_WARNING: &str =
    "\n\n⚠️ Слово не найдено в словаре Elenya, перевод дан по общему контексту.";

pub const TEXT_PROGRESS: &str = "⏳ Ищу перевод...";

pub const VOICE_PROGRESS: &str = "🎤 Распознаю голосовое сообщение...";
pub const VOICE_NOT_RECOGNIZED: &str = "❌ Не удалось распознать речь. Попробуй еще раз.";
pub const VOICE_ERROR: &str = "❌ Произошла ошибка при обработке голосового сообщения.";

pub const PHOTO_PROGRESS: &str = "🖼 Анализирую изображение...";
pub const PHOTO_NOT_DETECTED: &str = "❌ Не удалось определить объект на изображении.";
pub const PHOTO_ERROR: &str = "❌ Произошла ошибка при обработке изображения.";

/// Confirmation after a mode button press
pub fn mode_selected_text(mode: Mode) -> &'static str {
    match mode {
        Mode::Dictionary => "✅ Выбран режим: Словарь Elenya

Я буду искать переводы в официальном словаре Elenya.
Если слово не найдено, я предупрежу тебя об этом.

Присылай слова, фразы, голосовые сообщения или изображения! 🌿",
        Mode::Free => "✅ Выбран свободный режим

Я буду использовать общие знания модели для перевода.
Переводы могут быть более креативными и гибкими.

Присылай слова, фразы, голосовые сообщения или изображения! ✨",
    }
}

/// Reply to `/mode`
pub fn current_mode_text(mode: Mode) -> String {
    format!("Текущий режим: {}\n\nВыбери новый режим:", mode.display_name())
}

pub fn voice_recognized_text(recognized: &str) -> String {
    format!("📝 Распознано: {}\n\n⏳ Ищу перевод...", recognized)
}

pub fn photo_detected_text(label: &str) -> String {
    format!("👁 Определено: {}\n\n⏳ Ищу перевод на Elenya...", label)
}

/// Auxiliary context handed to the router for photo labels
pub fn photo_context(label: &str) -> String {
    format!("Это объект на изображении: {}", label)
}

/// Final reply: optional header, the answer, and the not-found warning
/// when dictionary mode found nothing
pub fn compose_answer(
    header: Option<&str>,
    answer: &str,
    use_dictionary: bool,
    found_in_dictionary: bool,
) -> String {
    let mut reply = match header {
        Some(header) => format!("{}\n\n{}", header, answer),
        None => answer.to_string(),
    };

    if use_dictionary && !found_in_dictionary {
        reply.push_str(NOT_FOUND_WARNING);
    }

    reply
}

// ============ Media ============

/// Inbound media the bot recognizes before translating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Voice,
    Photo,
}

impl MediaKind {
    /// Temp file name prefix
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Voice => "voice",
            Self::Photo => "photo",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Voice => "ogg",
            Self::Photo => "jpg",
        }
    }

    pub fn progress_text(&self) -> &'static str {
        match self {
            Self::Voice => VOICE_PROGRESS,
            Self::Photo => PHOTO_PROGRESS,
        }
    }

    pub fn not_recognized_text(&self) -> &'static str {
        match self {
            Self::Voice => VOICE_NOT_RECOGNIZED,
            Self::Photo => PHOTO_NOT_DETECTED,
        }
    }

    pub fn error_text(&self) -> &'static str {
        match self {
            Self::Voice => VOICE_ERROR,
            Self::Photo => PHOTO_ERROR,
        }
    }

    /// Progress text once the content is known
    pub fn recognized_text(&self, recognized: &str) -> String {
        match self {
            Self::Voice => voice_recognized_text(recognized),
            Self::Photo => photo_detected_text(recognized),
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn voice_header(recognized: &str) -> String {
    format!("📝 Распознано: {}", recognized)
}

pub fn photo_header(label: &str) -> String {
    format!("👁 На изображении: {}", label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_roundtrip_wire_names() {
        assert_eq!(ButtonAction::SelectMode(Mode::Dictionary).encode(), "mode_dictionary");
        assert_eq!(ButtonAction::SelectMode(Mode::Free).encode(), "mode_free");
        assert_eq!(
            ButtonAction::decode("mode_dictionary"),
            Some(ButtonAction::SelectMode(Mode::Dictionary))
        );
        assert_eq!(ButtonAction::decode("mode_free"), Some(ButtonAction::SelectMode(Mode::Free)));
    }

    #[test]
    fn test_unknown_callback_data() {
        assert_eq!(ButtonAction::decode("mode_poetry"), None);
        assert_eq!(ButtonAction::decode("free"), None);
        assert_eq!(ButtonAction::decode(""), None);
    }

    #[test]
    fn test_mode_keyboard_has_two_rows() {
        let keyboard = mode_keyboard();
        assert_eq!(keyboard.inline_keyboard.len(), 2);
        assert_eq!(keyboard.inline_keyboard[0].len(), 1);
    }

    #[test]
    fn test_compose_answer_warning() {
        assert_eq!(compose_answer(None, "taure", true, true), "taure");
        assert_eq!(compose_answer(None, "taure", false, false), "taure");
        assert_eq!(
            compose_answer(None, "taure", true, false),
            format!("taure{}", NOT_FOUND_WARNING)
        );
    }

    #[test]
    fn test_compose_answer_header() {
        let reply = compose_answer(Some(&photo_header("дерево")), "Elenya: alda", false, false);
        assert_eq!(reply, "👁 На изображении: дерево\n\nElenya: alda");

        let reply = compose_answer(Some(&voice_header("лес")), "Elenya: taure", true, false);
        assert!(reply.starts_with("📝 Распознано: лес\n\nElenya: taure"));
        assert!(reply.ends_with(NOT_FOUND_WARNING));
    }

    #[test]
    fn test_media_kind_texts() {
        assert_eq!(MediaKind::Voice.not_recognized_text(), VOICE_NOT_RECOGNIZED);
        assert_eq!(MediaKind::Photo.not_recognized_text(), PHOTO_NOT_DETECTED);
        assert_eq!(MediaKind::Voice.error_text(), VOICE_ERROR);
        assert_eq!(MediaKind::Photo.error_text(), PHOTO_ERROR);
        assert!(MediaKind::Photo.recognized_text("дерево").starts_with("👁 Определено: дерево"));
        assert_eq!(MediaKind::Voice.to_string(), "voice");
    }

    #[test]
    fn test_mode_texts() {
        assert!(current_mode_text(Mode::Free).starts_with("Текущий режим: Свободный режим"));
        assert!(mode_selected_text(Mode::Dictionary).contains("Словарь Elenya"));
        assert!(mode_selected_text(Mode::Free).contains("свободный режим"));
        assert_eq!(photo_context("дерево"), "Это объект на изображении: дерево");
    }
}
