//! Deterministic grouping against a fixed similarity threshold.
//!
//! Walks embeddings in input order; each one not yet assigned opens a new
//! cluster and absorbs every later unassigned embedding whose similarity to
//! it is at or above the threshold. O(n²), no density parameters.

use crate::clustering::domain::embedding_clusterer::EmbeddingClusterer;
use crate::shared::constants::{DEFAULT_SIMILARITY_THRESHOLD, NOISE_LABEL};
use crate::shared::embedding::Embedding;

#[derive(Debug, Clone)]
pub struct ThresholdClusterer {
    threshold: f64,
}

impl ThresholdClusterer {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl Default for ThresholdClusterer {
    fn default() -> Self {
        Self::new(DEFAULT_SIMILARITY_THRESHOLD)
    }
}

impl EmbeddingClusterer for ThresholdClusterer {
    fn cluster(&self, embeddings: &[Embedding]) -> Vec<i32> {
        let n = embeddings.len();
        let mut labels = vec![NOISE_LABEL; n];
        let mut next_label = 0;

        for i in 0..n {
            if labels[i] != NOISE_LABEL {
                continue;
            }
            labels[i] = next_label;
            for j in (i + 1)..n {
                if labels[j] == NOISE_LABEL
                    && embeddings[i].cosine_similarity(&embeddings[j]) >= self.threshold
                {
                    labels[j] = next_label;
                }
            }
            next_label += 1;
        }

        log::info!("Threshold clustering: {next_label} clusters found");
        labels
    }
}
