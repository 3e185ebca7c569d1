//! Deterministic feature-hashing embedder
//!
//! Projects token counts into a fixed-dimension signed vector. No model and
//! no network, so retrieval keeps working when the embedding backend is
//! unavailable, and identical texts always embed identically.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::error::Result;

use super::EmbeddingProvider;

/// Feature-hashing embedding provider
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    /// Create an embedder with the given output dimensions
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        let lowered = text.to_lowercase();
        for token in lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let digest = Sha256::digest(token.as_bytes());
            let bucket =
                u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]]) as usize
                    % self.dimensions;
            let sign = if digest[4] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }

        vector
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_text(text))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "hashing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_texts_embed_identically() {
        let embedder = HashingEmbedder::default();
        let a = embedder.embed_text("The cat sat on the mat.");
        let b = embedder.embed_text("The cat sat on the mat.");
        assert_eq!(a, b);
    }

    #[test]
    fn embeddings_are_unit_length() {
        let embedder = HashingEmbedder::default();
        let v = embedder.embed_text("some words to embed");
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn empty_text_embeds_to_zero_vector() {
        let embedder = HashingEmbedder::default();
        let v = embedder.embed_text("");
        assert!(v.iter().all(|x| *x == 0.0));
    }
}
