//! Process-wide cache of local translation models, keyed by language.
//!
//! Each key owns a `OnceCell`. The first caller for an unseen key runs the
//! loader; concurrent callers for the same key wait on that construction and
//! receive the same handle. A failed construction leaves the cell empty, so
//! the next request retries from scratch. Entries are never evicted.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Instant, SystemTime};

use async_trait::async_trait;
use tokio::sync::OnceCell;

use crate::error::LoadError;

/// Builds a model for a language key.
#[async_trait]
pub trait ModelLoader: Send + Sync {
    type Model: Send + Sync + 'static;

    async fn load(&self, language_key: &str) -> Result<Self::Model, LoadError>;
}

/// A loaded model plus bookkeeping. Read-only once constructed.
#[derive(Debug)]
pub struct CachedModel<M> {
    language_key: String,
    model: M,
    loaded_at: SystemTime,
}

impl<M> CachedModel<M> {
    pub fn language_key(&self) -> &str {
        &self.language_key
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn loaded_at(&self) -> SystemTime {
        self.loaded_at
    }
}

type Slot<M> = Arc<OnceCell<Arc<CachedModel<M>>>>;

/// Memoizing model factory with exactly-once-success per key.
pub struct ModelCache<L: ModelLoader> {
    loader: L,
    slots: RwLock<HashMap<String, Slot<L::Model>>>,
}

impl<L: ModelLoader> ModelCache<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Return the cached model for `language_key`, loading it on first use.
    pub async fn get_or_load(
        &self,
        language_key: &str,
    ) -> Result<Arc<CachedModel<L::Model>>, LoadError> {
        let slot = self.slot(language_key);
        if let Some(entry) = slot.get() {
            return Ok(entry.clone());
        }

        let entry = slot
            .get_or_try_init(|| async move {
                tracing::info!(language_key, "Loading local translation model");
                let start = Instant::now();
                let model = self.loader.load(language_key).await.inspect_err(|e| {
                    tracing::warn!(language_key, "Model construction failed: {e}");
                })?;
                tracing::info!(
                    language_key,
                    "Local translation model ready in {}ms",
                    start.elapsed().as_millis()
                );
                Ok::<_, LoadError>(Arc::new(CachedModel {
                    language_key: language_key.to_string(),
                    model,
                    loaded_at: SystemTime::now(),
                }))
            })
            .await?;

        Ok(entry.clone())
    }

    /// Whether a model for `language_key` has been successfully loaded.
    pub fn contains(&self, language_key: &str) -> bool {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(language_key)
            .is_some_and(|slot| slot.initialized())
    }

    /// Number of successfully loaded models.
    pub fn len(&self) -> usize {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Get or create the cell for a key. Hits only take the read lock.
    fn slot(&self, language_key: &str) -> Slot<L::Model> {
        if let Some(slot) = self
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(language_key)
        {
            return slot.clone();
        }

        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(language_key.to_string())
            .or_default()
            .clone()
    }
}
