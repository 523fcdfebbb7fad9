//! Density-based clustering over cosine distance.
//!
//! A point's neighbourhood is every point (itself included) within `eps`
//! cosine distance. Points with at least `min_samples` neighbours are core
//! points; clusters grow from core points in input order and are labelled
//! 0, 1, 2... in discovery order. Points reached by no core point are noise.

use crate::clustering::domain::embedding_clusterer::EmbeddingClusterer;
use crate::shared::constants::{DEFAULT_EPS, DEFAULT_MIN_SAMPLES, NOISE_LABEL};
use crate::shared::embedding::Embedding;

#[derive(Debug, Clone)]
pub struct DbscanClusterer {
    eps: f64,
    min_samples: usize,
}

impl DbscanClusterer {
    pub fn new(eps: f64, min_samples: usize) -> Self {
        Self {
            eps,
            min_samples: min_samples.max(1),
        }
    }

    fn neighbourhoods(&self, embeddings: &[Embedding]) -> Vec<Vec<usize>> {
        let n = embeddings.len();
        let mut neighbours: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();
        for i in 0..n {
            for j in (i + 1)..n {
                if embeddings[i].cosine_distance(&embeddings[j]) <= self.eps {
                    neighbours[i].push(j);
                    neighbours[j].push(i);
                }
            }
        }
        neighbours
    }
}

impl Default for DbscanClusterer {
    fn default() -> Self {
        Self::new(DEFAULT_EPS, DEFAULT_MIN_SAMPLES)
    }
}

impl EmbeddingClusterer for DbscanClusterer {
    fn cluster(&self, embeddings: &[Embedding]) -> Vec<i32> {
        let neighbours = self.neighbourhoods(embeddings);
        let is_core: Vec<bool> = neighbours
            .iter()
            .map(|n| n.len() >= self.min_samples)
            .collect();

        let mut labels = vec![NOISE_LABEL; embeddings.len()];
        let mut next_label = 0;
        let mut stack: Vec<usize> = Vec::new();

        for seed in 0..embeddings.len() {
            if labels[seed] != NOISE_LABEL || !is_core[seed] {
                continue;
            }
            stack.push(seed);
            while let Some(point) = stack.pop() {
                if labels[point] != NOISE_LABEL {
                    continue;
                }
                labels[point] = next_label;
                if is_core[point] {
                    stack.extend(
                        neighbours[point]
                            .iter()
                            .copied()
                            .filter(|&q| labels[q] == NOISE_LABEL),
                    );
                }
            }
            next_label += 1;
        }

        log::info!(
            "DBSCAN (eps={}, min_samples={}): {} clusters, {} noise points",
            self.eps,
            self.min_samples,
            next_label,
            labels.iter().filter(|&&l| l == NOISE_LABEL).count()
        );
        labels
    }
}
