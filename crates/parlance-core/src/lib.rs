//! Parlance Core - translation with graceful fallback.
//!
//! Parlance translates English text through a fixed chain of providers and
//! returns the first success:
//!
//! ```text
//! local MarianMT model (cached per language) → MyMemory → Google free endpoint
//! ```
//!
//! A caller only sees an error when the request is invalid or every provider
//! has failed. Individual provider failures are logged and never surfaced.
//!
//! # Usage
//!
//! ```rust,ignore
//! use parlance_core::{Config, Parlance, TranslationRequest};
//!
//! #[tokio::main]
//! async fn main() -> parlance_core::Result<()> {
//!     let parlance = Parlance::new(Config::load()?);
//!
//!     let request = TranslationRequest::new(Some("Good morning"), Some("fr-FR"))?;
//!     let result = parlance.translator().translate(&request).await?;
//!     println!("{} (via {})", result.translated_text, result.provider);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod caption;
pub mod config;
pub mod error;
pub mod translate;
pub mod types;

// Re-exports for convenient access
pub use caption::CaptionClient;
pub use config::Config;
pub use error::{
    CaptionError, ConfigError, LoadError, ParlanceError, ProviderError, ProviderFailure, Result,
    TranslateError,
};
pub use translate::{FallbackTranslator, TranslationProvider};
pub use types::{ProviderId, TranslationRequest, TranslationResult};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parlance services built from one configuration.
///
/// Cheap to share: the translator and caption client are reference counted,
/// so request handlers can clone them out.
pub struct Parlance {
    config: Config,
    translator: std::sync::Arc<FallbackTranslator>,
    captioner: Option<std::sync::Arc<CaptionClient>>,
}

impl Parlance {
    /// Build the provider chain and caption client for `config`.
    ///
    /// Nothing is loaded or contacted here; local models load on first use.
    pub fn new(config: Config) -> Self {
        tracing::debug!("Initializing Parlance v{}", VERSION);
        let translator = std::sync::Arc::new(FallbackTranslator::from_config(&config));
        let captioner = CaptionClient::from_config(&config.caption).map(std::sync::Arc::new);
        Self {
            config,
            translator,
            captioner,
        }
    }

    /// Create a Parlance instance from the default config file.
    pub fn with_defaults() -> Result<Self> {
        let config = Config::load()?;
        Ok(Self::new(config))
    }

    /// Get a reference to the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn translator(&self) -> &std::sync::Arc<FallbackTranslator> {
        &self.translator
    }

    /// The caption client, if `[caption] endpoint` is set.
    pub fn captioner(&self) -> Option<&std::sync::Arc<CaptionClient>> {
        self.captioner.as_ref()
    }

    /// Get the model directory path.
    pub fn model_dir(&self) -> std::path::PathBuf {
        self.config.model_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_parlance_new() {
        let parlance = Parlance::new(Config::default());
        assert_eq!(parlance.translator().provider_ids(), ProviderId::ALL.to_vec());
        assert!(parlance.captioner().is_none());
        assert_eq!(parlance.config().server.port, 10000);
    }
}
