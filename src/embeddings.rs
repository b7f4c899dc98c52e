//! Local sentence embedding backend using candle + sentence-transformers.

use crate::error::{EvalError, Result};
use candle_core::{Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use hf_hub::{Repo, RepoType, api::sync::Api};
use tokenizers::Tokenizer;

/// Text-to-vector capability used for similarity scoring.
///
/// Backends that cannot embed empty input must return
/// [`EvalError::EmptyInput`] rather than a silently wrong vector.
pub trait Embedder {
    /// Embed a single text into a fixed-dimension vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed both sides of a comparison.
    ///
    /// Backends with batch support can override this to run a single
    /// forward pass.
    fn embed_pair(&self, a: &str, b: &str) -> Result<(Vec<f32>, Vec<f32>)> {
        Ok((self.embed(a)?, self.embed(b)?))
    }
}

/// Sentence embedding model running locally on CPU.
pub struct EmbeddingModel {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
}

impl EmbeddingModel {
    /// Load the all-MiniLM-L6-v2 model from Hugging Face Hub.
    pub fn load_minilm() -> Result<Self> {
        Self::load("sentence-transformers/all-MiniLM-L6-v2")
    }

    /// Load a sentence-transformers model by Hugging Face model id.
    pub fn load(model_id: &str) -> Result<Self> {
        let device = Device::Cpu; // CPU for portability

        let api = Api::new()
            .map_err(|e| EvalError::Embedding(format!("Failed to create HF Hub API: {}", e)))?;
        let repo = api.repo(Repo::new(model_id.to_string(), RepoType::Model));

        let config_path = repo
            .get("config.json")
            .map_err(|e| EvalError::Embedding(format!("Failed to fetch config.json: {}", e)))?;
        let tokenizer_path = repo
            .get("tokenizer.json")
            .map_err(|e| EvalError::Embedding(format!("Failed to fetch tokenizer.json: {}", e)))?;
        let weights_path = repo
            .get("model.safetensors")
            .or_else(|_| repo.get("pytorch_model.bin"))
            .map_err(|e| EvalError::Embedding(format!("Failed to fetch model weights: {}", e)))?;

        let config_text = std::fs::read_to_string(&config_path)
            .map_err(|e| EvalError::io(&config_path, e))?;
        let config: BertConfig = serde_json::from_str(&config_text)?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| EvalError::Embedding(format!("Failed to load tokenizer: {}", e)))?;

        let vb =
            unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DTYPE, &device)? };
        let model = BertModel::load(vb, &config)?;

        Ok(Self {
            model,
            tokenizer,
            device,
        })
    }

    /// Encode a batch of texts into normalized embedding vectors.
    fn encode(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| EvalError::Embedding(format!("Tokenization failed: {}", e)))?;

        let max_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0);
        if max_len == 0 {
            return Err(EvalError::EmptyInput);
        }

        let batch_size = texts.len();
        let mut input_ids = Vec::with_capacity(batch_size * max_len);
        let mut attention_mask = Vec::with_capacity(batch_size * max_len);
        let mut token_type_ids = Vec::with_capacity(batch_size * max_len);

        for encoding in &encodings {
            let mut ids = encoding.get_ids().to_vec();
            let mut mask = encoding.get_attention_mask().to_vec();
            let mut types = vec![0u32; ids.len()];

            ids.resize(max_len, 0);
            mask.resize(max_len, 0);
            types.resize(max_len, 0);

            input_ids.extend(ids);
            attention_mask.extend(mask);
            token_type_ids.extend(types);
        }

        let input_ids = Tensor::from_vec(input_ids, (batch_size, max_len), &self.device)?;
        let attention_mask =
            Tensor::from_vec(attention_mask, (batch_size, max_len), &self.device)?;
        let token_type_ids =
            Tensor::from_vec(token_type_ids, (batch_size, max_len), &self.device)?;

        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

        let pooled = mean_pool(&hidden, &attention_mask)?;
        let normalized = l2_normalize(&pooled)?;

        let dim = normalized.dim(1)?;
        let flat: Vec<f32> = normalized.to_vec2::<f32>()?.into_iter().flatten().collect();

        Ok(flat.chunks(dim).map(|row| row.to_vec()).collect())
    }
}

/// Attention-masked mean pooling over the sequence dimension.
fn mean_pool(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let mask = attention_mask
        .unsqueeze(2)?
        .to_dtype(hidden.dtype())?
        .broadcast_as(hidden.shape())?;

    let summed = (hidden * &mask)?.sum(1)?;
    let counts = mask.sum(1)?.clamp(1e-9, f64::MAX)?;
    Ok((summed / counts)?)
}

/// Scale each row to unit length.
fn l2_normalize(embeddings: &Tensor) -> Result<Tensor> {
    let norms = embeddings.sqr()?.sum_keepdim(1)?.sqrt()?;
    let shape = embeddings.shape().clone();
    Ok((embeddings / norms.broadcast_as(&shape)?)?)
}

impl Embedder for EmbeddingModel {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.encode(&[text])?;
        vectors
            .pop()
            .ok_or_else(|| EvalError::Embedding("Encoder returned no vector".to_string()))
    }

    fn embed_pair(&self, a: &str, b: &str) -> Result<(Vec<f32>, Vec<f32>)> {
        let mut vectors = self.encode(&[a, b])?;
        if vectors.len() != 2 {
            return Err(EvalError::Embedding(format!(
                "Encoder returned {} vectors for a pair",
                vectors.len()
            )));
        }
        let second = vectors.pop().unwrap_or_default();
        let first = vectors.pop().unwrap_or_default();
        Ok((first, second))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedEmbedder;

    impl Embedder for FixedEmbedder {
        fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(vec![text.len() as f32, 1.0])
        }
    }

    #[test]
    fn test_default_embed_pair_delegates_to_embed() {
        let backend = FixedEmbedder;
        let (a, b) = backend.embed_pair("abc", "defgh").unwrap();
        assert_eq!(a, vec![3.0, 1.0]);
        assert_eq!(b, vec![5.0, 1.0]);
    }
}
