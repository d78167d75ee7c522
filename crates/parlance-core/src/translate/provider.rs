//! Translation provider trait and the chain factory.
//!
//! Defines the interface that all providers implement, plus the factory that
//! builds the fixed-order chain from config.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::cache::ModelCache;
use super::google::GoogleFreeProvider;
use super::local::{LocalModelProvider, MarianLoader};
use super::mymemory::MyMemoryProvider;
use crate::config::Config;
use crate::error::ProviderError;
use crate::types::ProviderId;

/// Trait that all translation providers implement.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (the chain holds `Arc<dyn TranslationProvider>`).
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Which slot of the chain this provider fills.
    fn id(&self) -> ProviderId;

    /// Translate `text` from English into `target_lang` (a language key).
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String, ProviderError>;

    /// Wall-clock budget the orchestrator enforces, or `None` for unbounded.
    fn timeout(&self) -> Option<Duration>;
}

/// Builds the provider chain in fallback order.
pub struct ProviderChainFactory;

impl ProviderChainFactory {
    /// Create every enabled provider, ordered local → remote-a → remote-b.
    ///
    /// Disabled providers are skipped; the remaining order never changes.
    pub fn create(config: &Config) -> Vec<Arc<dyn TranslationProvider>> {
        let mut chain: Vec<Arc<dyn TranslationProvider>> = Vec::with_capacity(3);

        if config.local.enabled {
            let loader = MarianLoader::new(config.model_dir(), config.local.clone());
            let cache = Arc::new(ModelCache::new(loader));
            chain.push(Arc::new(LocalModelProvider::new(cache)));
        }
        if config.mymemory.enabled {
            chain.push(Arc::new(MyMemoryProvider::new(&config.mymemory)));
        }
        if config.google.enabled {
            chain.push(Arc::new(GoogleFreeProvider::new(&config.google)));
        }

        let ids: Vec<&str> = chain.iter().map(|p| p.id().as_str()).collect();
        tracing::debug!("Translation chain: {}", ids.join(" -> "));

        chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain_ids(config: &Config) -> Vec<ProviderId> {
        ProviderChainFactory::create(config)
            .iter()
            .map(|p| p.id())
            .collect()
    }

    #[test]
    fn test_default_chain_order() {
        let config = Config::default();
        assert_eq!(chain_ids(&config), ProviderId::ALL.to_vec());
    }

    #[test]
    fn test_disabled_provider_keeps_order() {
        let mut config = Config::default();
        config.mymemory.enabled = false;
        assert_eq!(
            chain_ids(&config),
            vec![ProviderId::LocalModel, ProviderId::RemoteB]
        );
    }

    #[test]
    fn test_timeouts() {
        let config = Config::default();
        let chain = ProviderChainFactory::create(&config);
        assert_eq!(chain[0].timeout(), None);
        assert_eq!(chain[1].timeout(), Some(Duration::from_secs(10)));
        assert_eq!(chain[2].timeout(), Some(Duration::from_secs(10)));
    }
}
