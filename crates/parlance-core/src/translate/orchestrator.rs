//! Fallback orchestrator: try each provider in order, first success wins.

use std::sync::Arc;
use std::time::Instant;

use super::provider::{ProviderChainFactory, TranslationProvider};
use crate::config::Config;
use crate::error::{ProviderError, ProviderFailure, TranslateError};
use crate::types::{ProviderId, TranslationRequest, TranslationResult};

/// Runs a translation request through the provider chain.
///
/// Providers are attempted strictly one after another. A provider is only
/// called after every earlier one has failed, and nothing after the first
/// success is called at all.
pub struct FallbackTranslator {
    providers: Vec<Arc<dyn TranslationProvider>>,
}

impl FallbackTranslator {
    pub fn new(providers: Vec<Arc<dyn TranslationProvider>>) -> Self {
        Self { providers }
    }

    /// Build the standard chain from config.
    pub fn from_config(config: &Config) -> Self {
        Self::new(ProviderChainFactory::create(config))
    }

    /// Provider ids in the order they will be attempted.
    pub fn provider_ids(&self) -> Vec<ProviderId> {
        self.providers.iter().map(|p| p.id()).collect()
    }

    pub async fn translate(
        &self,
        request: &TranslationRequest,
    ) -> Result<TranslationResult, TranslateError> {
        let target = request.target_lang();
        let mut attempts: Vec<ProviderError> = Vec::with_capacity(self.providers.len());

        for provider in &self.providers {
            let id = provider.id();
            let start = Instant::now();

            match attempt(provider.as_ref(), request.text(), target).await {
                Ok(translated_text) => {
                    tracing::info!(
                        provider = %id,
                        lang = target,
                        "Translated in {}ms",
                        start.elapsed().as_millis()
                    );
                    return Ok(TranslationResult {
                        translated_text,
                        provider: id,
                    });
                }
                Err(err) => {
                    tracing::warn!(
                        provider = %id,
                        cause = err.cause.kind(),
                        lang = target,
                        "{err}"
                    );
                    attempts.push(err);
                }
            }
        }

        tracing::error!(
            lang = target,
            attempts = attempts.len(),
            "All translation providers failed"
        );
        Err(TranslateError::Exhausted { attempts })
    }
}

/// One provider call, bounded by the provider's own timeout if it has one.
async fn attempt(
    provider: &dyn TranslationProvider,
    text: &str,
    target: &str,
) -> Result<String, ProviderError> {
    match provider.timeout() {
        Some(limit) => tokio::time::timeout(limit, provider.translate(text, target))
            .await
            .unwrap_or_else(|_| {
                Err(ProviderError::new(
                    provider.id(),
                    ProviderFailure::Timeout(limit),
                ))
            }),
        None => provider.translate(text, target).await,
    }
}
