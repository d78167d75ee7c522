//! MarianMT (opus-mt) ONNX inference.
//!
//! Loads an encoder/decoder pair exported to ONNX plus the HF tokenizer and
//! runs greedy decoding. The decoder is the plain (no KV-cache) export, so
//! each step feeds the full generated prefix.

use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Tensor;
use serde::Deserialize;

use crate::error::{InferenceError, LoadError};

pub const ENCODER_FILE: &str = "encoder_model.onnx";
pub const DECODER_FILE: &str = "decoder_model.onnx";
pub const TOKENIZER_FILE: &str = "tokenizer.json";
pub const CONFIG_FILE: &str = "config.json";

/// Every file a model directory must contain.
pub const MODEL_FILES: [&str; 4] = [ENCODER_FILE, DECODER_FILE, TOKENIZER_FILE, CONFIG_FILE];

/// A sequence-to-sequence model the local provider can run.
///
/// Implementations are called from tokio's blocking pool.
pub trait Seq2SeqModel: Send + Sync {
    fn translate(&self, text: &str) -> Result<String, InferenceError>;
}

/// Token ids read from the model's `config.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    pub decoder_start_token_id: i64,
    pub eos_token_id: i64,
    pub pad_token_id: i64,
    /// Maximum encoder input length
    #[serde(default = "default_max_length")]
    pub max_length: usize,
}

fn default_max_length() -> usize {
    512
}

/// A loaded MarianMT model.
///
/// Uses a `Mutex` per session because `Session::run` requires `&mut self`.
pub struct MarianModel {
    encoder: Mutex<Session>,
    decoder: Mutex<Session>,
    tokenizer: tokenizers::Tokenizer,
    generation: GenerationConfig,
    max_new_tokens: usize,
}

impl MarianModel {
    /// Whether `dir` holds every file needed by [`MarianModel::load`].
    pub fn files_present(dir: &Path) -> bool {
        MODEL_FILES.iter().all(|f| dir.join(f).exists())
    }

    /// Load encoder, decoder, tokenizer and generation config from `dir`.
    pub fn load(dir: &Path, language_key: &str, max_new_tokens: usize) -> Result<Self, LoadError> {
        let config_text = std::fs::read_to_string(dir.join(CONFIG_FILE)).map_err(|e| {
            LoadError::resource(language_key, format!("Failed to read {CONFIG_FILE}: {e}"))
        })?;
        let generation: GenerationConfig = serde_json::from_str(&config_text).map_err(|e| {
            LoadError::resource(language_key, format!("Invalid {CONFIG_FILE}: {e}"))
        })?;

        let tokenizer =
            tokenizers::Tokenizer::from_file(dir.join(TOKENIZER_FILE)).map_err(|e| {
                LoadError::resource(language_key, format!("Failed to load tokenizer: {e}"))
            })?;

        let encoder = open_session(&dir.join(ENCODER_FILE), language_key)?;
        let decoder = open_session(&dir.join(DECODER_FILE), language_key)?;

        tracing::debug!(
            language_key,
            "Loaded MarianMT model from {:?} (decoder inputs: {:?})",
            dir,
            decoder
                .inputs()
                .iter()
                .map(|i| i.name())
                .collect::<Vec<_>>()
        );

        Ok(Self {
            encoder: Mutex::new(encoder),
            decoder: Mutex::new(decoder),
            tokenizer,
            generation,
            max_new_tokens,
        })
    }

    /// Run the encoder, returning `(shape, last_hidden_state)`.
    fn encode(
        &self,
        input_ids: &[i64],
        attention_mask: &[i64],
    ) -> Result<(Vec<i64>, Vec<f32>), InferenceError> {
        let seq_len = input_ids.len() as i64;
        let ids = tensor_i64(vec![1, seq_len], input_ids.to_vec())?;
        let mask = tensor_i64(vec![1, seq_len], attention_mask.to_vec())?;

        let mut session = self
            .encoder
            .lock()
            .map_err(|e| InferenceError(format!("Encoder lock poisoned: {e}")))?;

        let outputs = session
            .run(ort::inputs!["input_ids" => ids, "attention_mask" => mask])
            .map_err(|e| InferenceError(format!("Encoder inference failed: {e}")))?;

        let hidden = outputs
            .iter()
            .find(|(name, _)| *name == "last_hidden_state")
            .ok_or_else(|| InferenceError("Encoder did not produce last_hidden_state".into()))?;

        let (shape, data) = hidden
            .1
            .try_extract_tensor::<f32>()
            .map_err(|e| InferenceError(format!("Failed to extract encoder output: {e}")))?;

        Ok((shape.to_vec(), data.to_vec()))
    }

    /// Run one decoder step and return the logits for the last position.
    fn decode_step(
        &self,
        prefix: &[i64],
        attention_mask: &[i64],
        hidden_shape: &[i64],
        hidden: &[f32],
    ) -> Result<Vec<f32>, InferenceError> {
        let prefix_len = prefix.len();
        let ids = tensor_i64(vec![1, prefix_len as i64], prefix.to_vec())?;
        let mask = tensor_i64(vec![1, attention_mask.len() as i64], attention_mask.to_vec())?;
        let states = Tensor::from_array((hidden_shape.to_vec(), hidden.to_vec()))
            .map_err(|e| InferenceError(format!("Failed to create hidden-state tensor: {e}")))?;

        let mut session = self
            .decoder
            .lock()
            .map_err(|e| InferenceError(format!("Decoder lock poisoned: {e}")))?;

        let outputs = session
            .run(ort::inputs![
                "input_ids" => ids,
                "encoder_attention_mask" => mask,
                "encoder_hidden_states" => states
            ])
            .map_err(|e| InferenceError(format!("Decoder inference failed: {e}")))?;

        let logits = outputs
            .iter()
            .find(|(name, _)| *name == "logits")
            .ok_or_else(|| InferenceError("Decoder did not produce logits".into()))?;

        let (shape, data) = logits
            .1
            .try_extract_tensor::<f32>()
            .map_err(|e| InferenceError(format!("Failed to extract logits: {e}")))?;

        // logits are [1, prefix_len, vocab]
        if shape.len() != 3 {
            return Err(InferenceError(format!(
                "Unexpected logits shape: {:?}",
                shape.to_vec()
            )));
        }
        let vocab = shape[2] as usize;
        let start = (prefix_len - 1) * vocab;
        data.get(start..start + vocab)
            .map(<[f32]>::to_vec)
            .ok_or_else(|| InferenceError("Logits shorter than decoder prefix".into()))
    }
}

impl Seq2SeqModel for MarianModel {
    fn translate(&self, text: &str) -> Result<String, InferenceError> {
        let eos = self.generation.eos_token_id;
        let pad = self.generation.pad_token_id;

        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| InferenceError(format!("Tokenization failed: {e}")))?;
        let mut input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        clamp_input(&mut input_ids, self.generation.max_length, eos);

        let attention_mask = vec![1i64; input_ids.len()];
        let (hidden_shape, hidden) = self.encode(&input_ids, &attention_mask)?;

        let mut generated = vec![self.generation.decoder_start_token_id];
        for _ in 0..self.max_new_tokens {
            let logits = self.decode_step(&generated, &attention_mask, &hidden_shape, &hidden)?;
            match next_token(&logits, pad) {
                Some(token) if token != eos => generated.push(token),
                _ => break,
            }
        }

        let output_ids: Vec<u32> = generated[1..].iter().map(|&t| t as u32).collect();
        let decoded = self
            .tokenizer
            .decode(&output_ids, true)
            .map_err(|e| InferenceError(format!("Decoding failed: {e}")))?;

        Ok(decoded.trim().to_string())
    }
}

fn open_session(path: &Path, language_key: &str) -> Result<Session, LoadError> {
    Session::builder()
        .map_err(|e| {
            LoadError::resource(
                language_key,
                format!("Failed to create ONNX session builder: {e}"),
            )
        })?
        .commit_from_file(path)
        .map_err(|e| LoadError::resource(language_key, format!("Failed to load {path:?}: {e}")))
}

fn tensor_i64(shape: Vec<i64>, data: Vec<i64>) -> Result<Tensor<i64>, InferenceError> {
    Tensor::from_array((shape, data))
        .map_err(|e| InferenceError(format!("Failed to create input tensor: {e}")))
}

/// Make sure the encoder input ends in EOS and fits `max_length`.
fn clamp_input(input_ids: &mut Vec<i64>, max_length: usize, eos: i64) {
    if input_ids.last() != Some(&eos) {
        input_ids.push(eos);
    }
    if max_length > 0 && input_ids.len() > max_length {
        input_ids.truncate(max_length - 1);
        input_ids.push(eos);
    }
}

/// Greedy pick over one row of logits. `banned` (the pad token) is never chosen.
fn next_token(logits: &[f32], banned: i64) -> Option<i64> {
    logits
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx as i64 != banned)
        .filter(|(_, score)| !score.is_nan())
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(idx, _)| idx as i64)
}
