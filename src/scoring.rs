//! Semantic similarity scoring between answer strings.

use crate::embeddings::Embedder;
use crate::error::Result;

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Scores agreement between two texts as cosine similarity of their
/// embeddings.
///
/// Backend failures propagate as errors: a defaulted zero score would be
/// indistinguishable from a legitimately bad answer.
pub struct SimilarityScorer<E> {
    backend: E,
}

impl<E: Embedder> SimilarityScorer<E> {
    /// Create a scorer over the given embedding backend.
    pub fn new(backend: E) -> Self {
        Self { backend }
    }

    /// Score two texts. Symmetric: `score(a, b) == score(b, a)` within
    /// floating-point tolerance.
    pub fn score(&self, a: &str, b: &str) -> Result<f32> {
        let (va, vb) = self.backend.embed_pair(a, b)?;
        Ok(cosine_similarity(&va, &vb))
    }
}
