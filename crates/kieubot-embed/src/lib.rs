//! Local embedding model for query encoding.
//!
//! Wraps the multilingual-e5 family (XLM-RoBERTa backbone) via candle. The
//! e5 models are asymmetric: queries are encoded as `"query: " + text` and
//! corpus passages as `"passage: " + text`, and vectors are attention-masked
//! mean-pooled then L2-normalized so cosine similarity is a dot product.
//!
//! Set `KIEU_USE_FAKE_EMBEDDINGS=1` to swap in the deterministic hash-based
//! [`FakeEmbedder`] for fast, model-free tests.

use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaModel};
use tokenizers::Tokenizer;
use tracing::{info, warn};

pub use kieubot_core::traits::Embedder;

mod device;
mod pool;
mod tokenize;

pub use pool::masked_mean_l2;

/// Prefix applied to query text before encoding.
pub const QUERY_PREFIX: &str = "query: ";
/// Prefix the ingestion side applies to corpus passages.
pub const PASSAGE_PREFIX: &str = "passage: ";
/// Output dimensionality of multilingual-e5-base.
pub const EMBEDDING_DIM: usize = 768;

const MAX_LEN: usize = 256;

pub struct EmbeddingModel {
    model: XLMRobertaModel,
    tokenizer: Tokenizer,
    device: Device,
}

impl EmbeddingModel {
    /// Load tokenizer, config, and weights from a local model directory.
    /// Model loading failures are startup-time errors; there is no retry.
    pub fn load(model_id: &str, model_dir: Option<&Path>) -> Result<Self> {
        let device = device::select_device();
        let dir = resolve_model_dir(model_id, model_dir)?;
        info!(model_id, dir = %dir.display(), "loading embedding model");

        let tokenizer_path = dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;

        let config_path = dir.join("config.json");
        let config: XLMRobertaConfig =
            serde_json::from_str(&std::fs::read_to_string(&config_path)?)?;

        let weights_path = dir.join("pytorch_model.bin");
        let weights = candle_core::pickle::read_all(&weights_path)?;
        let weights_map: std::collections::HashMap<String, Tensor> = weights.into_iter().collect();
        let vb = VarBuilder::from_tensors(weights_map, DType::F32, &device);
        let model = XLMRobertaModel::new(&config, vb)?;
        info!("embedding model ready");

        Ok(Self { model, tokenizer, device })
    }

    fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let start = Instant::now();
        let (input_ids, attention_mask) =
            tokenize::tokenize_on_device(&self.tokenizer, text, MAX_LEN, &self.device)?;
        // XLM-RoBERTa ignores token types; pass zeros.
        let token_type_ids = Tensor::zeros((1, MAX_LEN), DType::I64, &self.device)?;
        let hidden =
            self.model.forward(&input_ids, &attention_mask, &token_type_ids, None, None, None)?;
        let pooled = pool::masked_mean_l2(&hidden, &attention_mask)?;
        let emb: Vec<f32> = pooled.to_device(&Device::Cpu)?.squeeze(0)?.to_vec1()?;
        if emb.len() != EMBEDDING_DIM {
            return Err(anyhow!("expected {}-dim embedding, got {}", EMBEDDING_DIM, emb.len()));
        }
        if start.elapsed().as_millis() > 100 {
            warn!(elapsed_ms = start.elapsed().as_millis() as u64, text_len = text.len(), "slow embedding");
        }
        Ok(emb)
    }
}

impl Embedder for EmbeddingModel {
    fn dim(&self) -> usize {
        EMBEDDING_DIM
    }

    fn max_len(&self) -> usize {
        MAX_LEN
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed_text(t)).collect()
    }
}

/// Deterministic hash-bucket embedder for tests and offline development.
/// Same text always maps to the same unit-norm vector.
pub struct FakeEmbedder {
    dim: usize,
}

impl FakeEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl Embedder for FakeEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn max_len(&self) -> usize {
        MAX_LEN
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        use std::hash::{Hash, Hasher};
        use twox_hash::XxHash64;

        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            let mut v = vec![0f32; self.dim];
            for (i, token) in text.split_whitespace().enumerate() {
                let mut hasher = XxHash64::with_seed(0);
                token.hash(&mut hasher);
                let h = hasher.finish();
                let idx = (h as usize) % self.dim;
                let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
                v[idx] += val + (i as f32 % 3.0) * 0.01;
            }
            let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
            for x in &mut v {
                *x /= norm;
            }
            out.push(v);
        }
        Ok(out)
    }
}

/// Construct the process-wide embedder: the real model, or the fake one
/// when `KIEU_USE_FAKE_EMBEDDINGS` is set.
pub fn load_embedder(model_id: &str, model_dir: Option<&Path>) -> Result<Box<dyn Embedder>> {
    let use_fake = std::env::var("KIEU_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if use_fake {
        info!("using FakeEmbedder");
        return Ok(Box::new(FakeEmbedder::new(EMBEDDING_DIM)));
    }
    Ok(Box::new(EmbeddingModel::load(model_id, model_dir)?))
}

fn resolve_model_dir(model_id: &str, explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(p) = explicit {
        if p.exists() {
            return Ok(p.to_path_buf());
        }
        return Err(anyhow!("configured model_dir {} does not exist", p.display()));
    }
    if let Ok(dir) = std::env::var("KIEU_MODEL_DIR") {
        let p = PathBuf::from(&dir);
        if p.exists() {
            info!("using KIEU_MODEL_DIR: {}", p.display());
            return Ok(p);
        }
    }
    let basename = model_id.rsplit('/').next().unwrap_or(model_id);
    for candidate in [PathBuf::from("models").join(basename), PathBuf::from("../models").join(basename)] {
        if candidate.exists() {
            info!("using model dir: {}", candidate.display());
            return Ok(candidate);
        }
    }
    Err(anyhow!(
        "Could not locate a model directory for {}. Set model_dir in config or KIEU_MODEL_DIR",
        model_id
    ))
}
