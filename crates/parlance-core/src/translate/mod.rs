//! Fallback translation chain.
//!
//! A locally cached MarianMT model is tried first, then two free remote APIs
//! (MyMemory, then Google's `translate_a/single`). The orchestrator returns the
//! first success and only surfaces an error when every provider has failed.

pub(crate) mod cache;
pub(crate) mod download;
pub(crate) mod google;
pub(crate) mod local;
pub(crate) mod marian;
pub(crate) mod mymemory;
pub(crate) mod orchestrator;
pub(crate) mod provider;

pub use cache::{CachedModel, ModelCache, ModelLoader};
pub use download::ModelDownloader;
pub use google::GoogleFreeProvider;
pub use local::{LocalModelProvider, MarianLoader};
pub use marian::{MarianModel, Seq2SeqModel};
pub use mymemory::MyMemoryProvider;
pub use orchestrator::FallbackTranslator;
pub use provider::{ProviderChainFactory, TranslationProvider};

/// Source language of every translation. Local model names and remote
/// language pairs are all built as `en → target`.
pub const SOURCE_LANG: &str = "en";
