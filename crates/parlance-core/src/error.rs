//! Error types for Parlance.
//!
//! Provider and model-loading errors stay inside the translation chain and are
//! only logged. What reaches an HTTP caller is either a validation message or
//! a generic aggregate failure.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::types::ProviderId;

/// Top-level error type for Parlance operations.
#[derive(Error, Debug)]
pub enum ParlanceError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Translation chain errors
    #[error(transparent)]
    Translate(#[from] TranslateError),

    /// Caption upstream errors
    #[error("Caption error: {0}")]
    Caption(#[from] CaptionError),

    /// Model loading errors outside the chain (e.g. `models download`)
    #[error("Model error: {0}")]
    Load(#[from] LoadError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Why a single provider attempt failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderFailure {
    /// Transport error or non-success HTTP status
    NetworkFailure {
        message: String,
        status_code: Option<u16>,
    },
    /// The provider did not answer within its time budget
    Timeout(Duration),
    /// No model or route exists for the requested language
    UnsupportedLanguage(String),
    /// The response did not have the expected shape, or signalled failure
    MalformedResponse(String),
    /// Tokenization, generation or decoding failed in the local model
    Inference(String),
}

impl ProviderFailure {
    /// Short machine-friendly label, used as the `cause` log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NetworkFailure { .. } => "network-failure",
            Self::Timeout(_) => "timeout",
            Self::UnsupportedLanguage(_) => "unsupported-language",
            Self::MalformedResponse(_) => "malformed-response",
            Self::Inference(_) => "inference",
        }
    }
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NetworkFailure {
                message,
                status_code: Some(code),
            } => write!(f, "network failure (HTTP {code}): {message}"),
            Self::NetworkFailure { message, .. } => write!(f, "network failure: {message}"),
            Self::Timeout(after) => write!(f, "timed out after {}ms", after.as_millis()),
            Self::UnsupportedLanguage(message) => write!(f, "unsupported language: {message}"),
            Self::MalformedResponse(message) => write!(f, "malformed response: {message}"),
            Self::Inference(message) => write!(f, "inference failed: {message}"),
        }
    }
}

/// A failed attempt by one provider in the chain.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{provider} failed: {cause}")]
pub struct ProviderError {
    pub provider: ProviderId,
    pub cause: ProviderFailure,
}

impl ProviderError {
    pub fn new(provider: ProviderId, cause: ProviderFailure) -> Self {
        Self { provider, cause }
    }

    /// Classify a reqwest error as a timeout or a network failure.
    pub fn from_reqwest(provider: ProviderId, error: &reqwest::Error, timeout: Duration) -> Self {
        let cause = if error.is_timeout() {
            ProviderFailure::Timeout(timeout)
        } else {
            ProviderFailure::NetworkFailure {
                message: error.to_string(),
                status_code: error.status().map(|s| s.as_u16()),
            }
        };
        Self::new(provider, cause)
    }
}

/// Failure to construct a local translation model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// No model exists for this language pair
    #[error("No local model for language '{language_key}': {message}")]
    UnsupportedLanguage {
        language_key: String,
        message: String,
    },

    /// The model exists in principle but could not be fetched or opened
    #[error("Failed to load model for language '{language_key}': {message}")]
    Resource {
        language_key: String,
        message: String,
    },
}

impl LoadError {
    pub fn unsupported(language_key: &str, message: impl Into<String>) -> Self {
        Self::UnsupportedLanguage {
            language_key: language_key.to_string(),
            message: message.into(),
        }
    }

    pub fn resource(language_key: &str, message: impl Into<String>) -> Self {
        Self::Resource {
            language_key: language_key.to_string(),
            message: message.into(),
        }
    }
}

/// Failure inside a local model's tokenize/generate/decode run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct InferenceError(pub String);

/// Errors surfaced by the fallback orchestrator.
#[derive(Error, Debug)]
pub enum TranslateError {
    /// The request is missing text or target language
    #[error("{0}")]
    Validation(String),

    /// Every provider in the chain failed. The individual failures are kept
    /// for logging and never rendered to callers.
    #[error("Translation failed")]
    Exhausted { attempts: Vec<ProviderError> },
}

impl TranslateError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Errors from the caption upstream.
#[derive(Error, Debug)]
pub enum CaptionError {
    /// Upstream request failed or returned non-success status
    #[error("Caption request failed: {message}")]
    Request {
        message: String,
        status_code: Option<u16>,
    },

    /// Upstream answered with a body we could not read a caption from
    #[error("Unexpected caption response: {0}")]
    MalformedResponse(String),
}

/// Convenience type alias for Parlance results.
pub type Result<T> = std::result::Result<T, ParlanceError>;
