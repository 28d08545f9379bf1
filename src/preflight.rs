//! Pre-flight Check System
//!
//! Verifies secrets and the dictionary file BEFORE the bot starts polling,
//! so a misconfigured deployment fails with a readable report instead of a
//! stack of API errors.

use std::path::Path;

use crate::config::{Config, ConfigError};
use crate::dictionary::loader::DocumentFormat;

/// Result of pre-flight checks
#[derive(Debug, Default)]
pub struct PreflightResult {
    /// Whether the bot can start
    pub ready: bool,
    /// Passed checks
    pub passed: Vec<String>,
    /// Missing or invalid requirements
    pub missing: Vec<String>,
    /// Non-blocking warnings
    pub warnings: Vec<String>,
}

impl PreflightResult {
    /// Format as a terminal report
    pub fn format_report(&self) -> String {
        let mut msg = String::from("Elenya Bot pre-flight check\n\n");

        for item in &self.passed {
            msg.push_str(&format!("  [ok] {}\n", item));
        }
        for item in &self.missing {
            msg.push_str(&format!("  [!!] {}\n", item));
        }
        for item in &self.warnings {
            msg.push_str(&format!("  [??] {}\n", item));
        }

        msg.push('\n');
        if self.ready {
            msg.push_str("All checks passed. Start the bot with: elenya-bot\n");
        } else {
            msg.push_str("Fix the problems above before starting the bot.\n");
        }
        msg
    }
}

/// Check a loaded (or failed) configuration
pub fn check(config: &Result<Config, ConfigError>) -> PreflightResult {
    let mut result = PreflightResult::default();

    let config = match config {
        Ok(config) => {
            result.passed.push("Telegram token found".to_string());
            result.passed.push("OpenAI API key found".to_string());
            config
        }
        Err(e) => {
            result.missing.push(e.to_string());
            return result;
        }
    };

    check_dictionary(&config.dictionary_path, &mut result);

    if config.relevance_threshold <= 0.0 {
        result.warnings.push(format!(
            "Relevance threshold {} excludes every dictionary match",
            config.relevance_threshold
        ));
    }

    result.ready = result.missing.is_empty();
    result
}

fn check_dictionary(path: &Path, result: &mut PreflightResult) {
    if !path.is_file() {
        result
            .missing
            .push(format!("Dictionary not found: {}", path.display()));
        return;
    }
    result
        .passed
        .push(format!("Dictionary found: {}", path.display()));

    if DocumentFormat::from_path(path).is_none() {
        result.missing.push(format!(
            "Unsupported dictionary format: {} (expected .pdf, .txt or .md)",
            path.display()
        ));
    }
}
