//! Local model provider (head of the chain).
//!
//! Resolves a model through the shared [`ModelCache`] and runs inference on
//! tokio's blocking pool. Any load failure is reported as an unsupported
//! language; escalation to remote providers is the orchestrator's job.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::cache::{ModelCache, ModelLoader};
use super::download::ModelDownloader;
use super::marian::{MarianModel, Seq2SeqModel};
use super::provider::TranslationProvider;
use super::SOURCE_LANG;
use crate::config::LocalModelConfig;
use crate::error::{LoadError, ProviderError, ProviderFailure};
use crate::types::ProviderId;

/// Builds [`MarianModel`]s from `<model_dir>/opus-mt-en-<lang>/`, downloading
/// missing files first when `auto_download` is on.
pub struct MarianLoader {
    model_dir: PathBuf,
    config: LocalModelConfig,
    downloader: ModelDownloader,
}

impl MarianLoader {
    pub fn new(model_dir: PathBuf, config: LocalModelConfig) -> Self {
        let downloader = ModelDownloader::new(&config.hub_endpoint);
        Self {
            model_dir,
            config,
            downloader,
        }
    }

    /// Directory holding the model for a language key.
    pub fn model_path(&self, language_key: &str) -> PathBuf {
        model_path(&self.model_dir, language_key)
    }

    /// Download the model for `language_key` if any file is missing.
    pub async fn ensure_downloaded(&self, language_key: &str) -> Result<PathBuf, LoadError> {
        if !is_valid_language_key(language_key) {
            return Err(LoadError::unsupported(
                language_key,
                "language key must be ASCII alphanumeric",
            ));
        }
        let dir = self.model_path(language_key);
        if !MarianModel::files_present(&dir) {
            self.downloader
                .fetch_model(&self.config.repo_for(language_key), language_key, &dir)
                .await?;
        }
        Ok(dir)
    }
}

#[async_trait]
impl ModelLoader for MarianLoader {
    type Model = MarianModel;

    async fn load(&self, language_key: &str) -> Result<MarianModel, LoadError> {
        if !is_valid_language_key(language_key) {
            return Err(LoadError::unsupported(
                language_key,
                "language key must be ASCII alphanumeric",
            ));
        }

        let dir = self.model_path(language_key);
        if !MarianModel::files_present(&dir) {
            if !self.config.auto_download {
                return Err(LoadError::unsupported(
                    language_key,
                    format!("model not installed at {dir:?} and auto_download is off"),
                ));
            }
            self.ensure_downloaded(language_key).await?;
        }

        let key = language_key.to_string();
        let max_new_tokens = self.config.max_new_tokens;
        tokio::task::spawn_blocking(move || MarianModel::load(&dir, &key, max_new_tokens))
            .await
            .map_err(|e| LoadError::resource(language_key, format!("Model load task failed: {e}")))?
    }
}

/// `<model_dir>/opus-mt-en-<lang>`
pub fn model_path(model_dir: &Path, language_key: &str) -> PathBuf {
    model_dir.join(format!("opus-mt-{SOURCE_LANG}-{language_key}"))
}

/// Language keys become path components and repo names, so only plain
/// subtags are accepted.
fn is_valid_language_key(language_key: &str) -> bool {
    !language_key.is_empty() && language_key.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Translation provider backed by cached local models.
pub struct LocalModelProvider<L: ModelLoader = MarianLoader> {
    cache: Arc<ModelCache<L>>,
}

impl<L: ModelLoader> LocalModelProvider<L> {
    pub fn new(cache: Arc<ModelCache<L>>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<ModelCache<L>> {
        &self.cache
    }
}

#[async_trait]
impl<L> TranslationProvider for LocalModelProvider<L>
where
    L: ModelLoader + 'static,
    L::Model: Seq2SeqModel,
{
    fn id(&self) -> ProviderId {
        ProviderId::LocalModel
    }

    async fn translate(&self, text: &str, target_lang: &str) -> Result<String, ProviderError> {
        let entry = self.cache.get_or_load(target_lang).await.map_err(|e| {
            ProviderError::new(
                ProviderId::LocalModel,
                ProviderFailure::UnsupportedLanguage(e.to_string()),
            )
        })?;

        let text = text.to_string();
        let output = tokio::task::spawn_blocking(move || entry.model().translate(&text))
            .await
            .map_err(|e| {
                ProviderError::new(
                    ProviderId::LocalModel,
                    ProviderFailure::Inference(format!("Inference task failed: {e}")),
                )
            })?
            .map_err(|e| {
                ProviderError::new(ProviderId::LocalModel, ProviderFailure::Inference(e.0))
            })?;

        if output.trim().is_empty() {
            return Err(ProviderError::new(
                ProviderId::LocalModel,
                ProviderFailure::Inference("model produced empty output".into()),
            ));
        }

        Ok(output)
    }

    fn timeout(&self) -> Option<Duration> {
        // Bounded by inference latency only
        None
    }
}
