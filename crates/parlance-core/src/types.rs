//! Core data types shared across the translation chain.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TranslateError;

/// Identifies a translation backend. Variant order is the fallback order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProviderId {
    /// Locally cached MarianMT model
    #[serde(rename = "local-model")]
    LocalModel,
    /// MyMemory public API
    #[serde(rename = "remote-a")]
    RemoteA,
    /// Google's free `translate_a/single` endpoint
    #[serde(rename = "remote-b")]
    RemoteB,
}

impl ProviderId {
    /// All providers in fallback order.
    pub const ALL: [ProviderId; 3] = [Self::LocalModel, Self::RemoteA, Self::RemoteB];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LocalModel => "local-model",
            Self::RemoteA => "remote-a",
            Self::RemoteB => "remote-b",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated translation request.
///
/// Construction trims nothing from `text` but rejects blank input, and
/// reduces the target locale to its language key once so every provider
/// sees the same value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    text: String,
    target_lang: String,
}

impl TranslationRequest {
    /// Validate raw fields into a request.
    pub fn new(text: Option<&str>, target: Option<&str>) -> Result<Self, TranslateError> {
        let text = text.filter(|t| !t.trim().is_empty());
        let target = target.map(primary_subtag).filter(|t| !t.is_empty());

        match (text, target) {
            (Some(text), Some(target_lang)) => Ok(Self {
                text: text.to_string(),
                target_lang,
            }),
            _ => Err(TranslateError::Validation(
                "Missing text or target language".to_string(),
            )),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Normalized language key (primary subtag, lowercase).
    pub fn target_lang(&self) -> &str {
        &self.target_lang
    }
}

/// A successful translation, tagged with the provider that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationResult {
    pub translated_text: String,
    pub provider: ProviderId,
}

/// Reduce a locale identifier like `"fr-FR"` to its language key `"fr"`.
pub fn primary_subtag(locale: &str) -> String {
    locale
        .split('-')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
