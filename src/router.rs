//! Translation Router
//!
//! Builds the tutor prompts, optionally grounds them in dictionary fragments
//! and runs a single chat completion per user request.

use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::dictionary::DictionaryQuery;
use crate::openai::{ChatBackend, ChatMessage, CompletionRequest};

/// Shown to the user when the completion call fails
pub const APOLOGY: &str = "Произошла ошибка при обработке запроса.";

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 500;

/// Code points treated as the user's own language (Cyrillic block)
pub const KNOWN_LANGUAGE_RANGE: std::ops::RangeInclusive<char> = '\u{0400}'..='\u{04FF}';

const BASE_SYSTEM_PROMPT: &str = "Ты — обучающий ассистент по эльфийскому языку Elenya.
Твоя задача — помогать изучать эльфийский язык.

ВАЖНО: Пользователи учат эльфийский язык!
- Если пользователь пишет на русском → дай перевод на Elenya
- Если пользователь пишет на Elenya → дай перевод на русский

Формат ответа:

Elenya: <слово на эльфийском>
Перевод: <перевод на русский>
Пояснение: <краткое пояснение о значении и использовании>

Будь лаконичен, но полезен. Используй поэтичный стиль, отражающий природу эльфийского языка.";

const DICTIONARY_RULES: &str = "

ВАЖНО: Ты ДОЛЖЕН использовать информацию из словаря Elenya, если она предоставлена в контексте.
Если слово найдено в словаре — используй только эту информацию.
Если слово НЕ найдено в словаре — можешь использовать общие знания, но это будет указано отдельно.";

/// Which way the user wants the translation to go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Russian input, answer in Elenya
    IntoElenya,
    /// Elenya input, answer in Russian
    IntoRussian,
}

impl Direction {
    /// Any Cyrillic code point means the user wrote in Russian
    pub fn detect(text: &str) -> Self {
        if text.chars().any(|c| KNOWN_LANGUAGE_RANGE.contains(&c)) {
            Direction::IntoElenya
        } else {
            Direction::IntoRussian
        }
    }
}

/// Answer plus whether the dictionary backed it
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    pub answer: String,
    pub found_in_dictionary: bool,
}

impl Translation {
    fn failed() -> Self {
        Self {
            answer: APOLOGY.to_string(),
            found_in_dictionary: false,
        }
    }
}

/// Routes translation requests to the chat model
pub struct TranslationRouter {
    chat: Arc<dyn ChatBackend>,
    dictionary: Option<DictionaryQuery>,
    top_k: usize,
    temperature: f32,
    max_tokens: u32,
}

impl TranslationRouter {
    pub fn new(chat: Arc<dyn ChatBackend>, dictionary: Option<DictionaryQuery>) -> Self {
        Self {
            chat,
            dictionary,
            top_k: crate::config::DEFAULT_TOP_K,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Translate `text`, grounding in the dictionary when `use_dictionary`.
    ///
    /// `context` is extra information for the model (e.g. what an image shows).
    /// Never fails: completion errors become [`APOLOGY`] with `found = false`.
    pub async fn translate(
        &self,
        text: &str,
        use_dictionary: bool,
        context: Option<&str>,
    ) -> Translation {
        let mut found_in_dictionary = false;
        let mut rag_context = String::new();

        if use_dictionary {
            if let Some(dictionary) = &self.dictionary {
                match dictionary.search(text, self.top_k).await {
                    Ok(retrieval) => {
                        found_in_dictionary = retrieval.found;
                        if retrieval.found {
                            rag_context = DictionaryQuery::format_context(&retrieval.chunks);
                        }
                    }
                    Err(e) => warn!("Dictionary search failed: {:#}", e),
                }
            }
        }

        let request = CompletionRequest {
            messages: vec![
                ChatMessage::system(build_system_prompt(use_dictionary)),
                ChatMessage::user(build_user_prompt(text, &rag_context, context)),
            ],
            temperature: Some(self.temperature),
            max_tokens: self.max_tokens,
        };

        match self.chat.complete(request).await {
            Ok(answer) => {
                debug!(
                    "Translated {:?} (dictionary={}, found={})",
                    text, use_dictionary, found_in_dictionary
                );
                Translation {
                    answer,
                    found_in_dictionary,
                }
            }
            Err(e) => {
                error!("OpenAI request failed: {}", e);
                Translation::failed()
            }
        }
    }
}

/// System prompt; dictionary mode adds the grounding rules
pub fn build_system_prompt(use_dictionary: bool) -> String {
    let mut prompt = BASE_SYSTEM_PROMPT.to_string();
    if use_dictionary {
        prompt.push_str(DICTIONARY_RULES);
    }
    prompt
}

/// User prompt: dictionary context, extra context, then the request itself
pub fn build_user_prompt(text: &str, rag_context: &str, additional_context: Option<&str>) -> String {
    let mut prompt = String::new();

    if !rag_context.is_empty() {
        prompt.push_str(rag_context);
        prompt.push_str("\n\n");
    }

    if let Some(extra) = additional_context.filter(|c| !c.is_empty()) {
        prompt.push_str(&format!("Контекст: {}\n\n", extra));
    }

    match Direction::detect(text) {
        Direction::IntoElenya => prompt.push_str(&format!(
            "Пользователь написал на русском: \"{}\"\nДай перевод на эльфийский язык Elenya.",
            text
        )),
        Direction::IntoRussian => prompt.push_str(&format!(
            "Пользователь написал на Elenya: \"{}\"\nДай перевод на русский язык.",
            text
        )),
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cyrillic_goes_into_elenya() {
        assert_eq!(Direction::detect("лес"), Direction::IntoElenya);
        assert_eq!(Direction::detect("taure и лес"), Direction::IntoElenya);
        assert_eq!(Direction::detect("Ёж"), Direction::IntoElenya);
    }

    #[test]
    fn test_cyrillic_block_boundaries() {
        assert_eq!(Direction::detect("\u{0400}"), Direction::IntoElenya);
        assert_eq!(Direction::detect("\u{04FF}"), Direction::IntoElenya);
        // Greek and Cyrillic Supplement sit just outside
        assert_eq!(Direction::detect("\u{03FF}"), Direction::IntoRussian);
        assert_eq!(Direction::detect("\u{0500}"), Direction::IntoRussian);
    }

    #[test]
    fn test_non_cyrillic_goes_into_russian() {
        assert_eq!(Direction::detect("taure"), Direction::IntoRussian);
        assert_eq!(Direction::detect("calë"), Direction::IntoRussian);
        assert_eq!(Direction::detect(""), Direction::IntoRussian);
        assert_eq!(Direction::detect("123 !?"), Direction::IntoRussian);
    }

    #[test]
    fn test_system_prompt_modes() {
        let free = build_system_prompt(false);
        let grounded = build_system_prompt(true);

        assert!(free.starts_with("Ты — обучающий ассистент"));
        assert!(!free.contains("ДОЛЖЕН использовать информацию из словаря"));
        assert!(grounded.starts_with(&free));
        assert!(grounded.contains("ДОЛЖЕН использовать информацию из словаря"));
    }

    #[test]
    fn test_user_prompt_russian() {
        let prompt = build_user_prompt("лес", "", None);
        assert_eq!(
            prompt,
            "Пользователь написал на русском: \"лес\"\nДай перевод на эльфийский язык Elenya."
        );
    }

    #[test]
    fn test_user_prompt_elenya_with_contexts() {
        let prompt = build_user_prompt(
            "taure",
            "Информация из словаря Elenya:\n\nлес — taure\n\n",
            Some("Это объект на изображении: taure"),
        );

        let dict_pos = prompt.find("Информация из словаря").unwrap();
        let ctx_pos = prompt.find("Контекст: Это объект на изображении: taure").unwrap();
        let ask_pos = prompt.find("Пользователь написал на Elenya: \"taure\"").unwrap();
        assert!(dict_pos < ctx_pos && ctx_pos < ask_pos);
        assert!(prompt.ends_with("Дай перевод на русский язык."));
    }
}
