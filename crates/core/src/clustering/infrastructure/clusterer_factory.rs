use crate::clustering::domain::cluster::distinct_labels;
use crate::clustering::domain::cluster_merger::ClusterMerger;
use crate::clustering::domain::embedding_clusterer::EmbeddingClusterer;
use crate::shared::embedding::Embedding;
use crate::shared::grouping_config::{ClusteringConfig, ClusteringStrategy};

use super::adaptive_clusterer::AdaptiveClusterer;
use super::dbscan_clusterer::DbscanClusterer;
use super::threshold_clusterer::ThresholdClusterer;

/// Density clustering followed by centroid merging, as one clusterer.
pub struct MergingClusterer {
    inner: Box<dyn EmbeddingClusterer>,
    merger: ClusterMerger,
}

impl MergingClusterer {
    pub fn new(inner: Box<dyn EmbeddingClusterer>, merger: ClusterMerger) -> Self {
        Self { inner, merger }
    }
}

impl EmbeddingClusterer for MergingClusterer {
    fn cluster(&self, embeddings: &[Embedding]) -> Vec<i32> {
        let initial = self.inner.cluster(embeddings);
        let merged = self.merger.merge(embeddings, &initial);
        log::info!(
            "After merging: {} clusters (was {})",
            distinct_labels(&merged),
            distinct_labels(&initial)
        );
        merged
    }
}

/// Builds the clusterer selected by `config.strategy`.
pub fn create_clusterer(config: &ClusteringConfig) -> Box<dyn EmbeddingClusterer> {
    let dbscan = DbscanClusterer::new(config.eps, config.min_samples);
    let merger = ClusterMerger::new(config.merge_threshold);
    match config.strategy {
        ClusteringStrategy::Dbscan => Box::new(MergingClusterer::new(Box::new(dbscan), merger)),
        ClusteringStrategy::Threshold => {
            Box::new(ThresholdClusterer::new(config.similarity_threshold))
        }
        ClusteringStrategy::Adaptive => Box::new(AdaptiveClusterer::new(
            dbscan,
            merger,
            ThresholdClusterer::new(config.similarity_threshold),
        )),
    }
}

/// Clusters embeddings with the configured strategy, without any I/O.
pub fn cluster_embeddings(embeddings: &[Embedding], config: &ClusteringConfig) -> Vec<i32> {
    if embeddings.is_empty() {
        return Vec::new();
    }
    create_clusterer(config).cluster(embeddings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn at(degrees: f64) -> Embedding {
        let r = degrees.to_radians();
        Embedding::new(vec![r.cos() as f32, r.sin() as f32]).unwrap()
    }

    #[rstest]
    #[case(ClusteringStrategy::Dbscan)]
    #[case(ClusteringStrategy::Threshold)]
    #[case(ClusteringStrategy::Adaptive)]
    fn test_every_strategy_groups_identical_embeddings(#[case] strategy: ClusteringStrategy) {
        let config = ClusteringConfig {
            strategy,
            ..ClusteringConfig::default()
        };
        let labels = cluster_embeddings(&vec![at(45.0); 4], &config);
        assert_eq!(distinct_labels(&labels), 1);
        assert_eq!(labels.len(), 4);
    }

    #[rstest]
    #[case(ClusteringStrategy::Dbscan)]
    #[case(ClusteringStrategy::Threshold)]
    #[case(ClusteringStrategy::Adaptive)]
    fn test_every_strategy_separates_orthogonal_embeddings(#[case] strategy: ClusteringStrategy) {
        let config = ClusteringConfig {
            strategy,
            ..ClusteringConfig::default()
        };
        let labels = cluster_embeddings(&[at(0.0), at(90.0), at(2.0)], &config);
        assert_eq!(labels[0], labels[2]);
        assert_ne!(labels[0], labels[1]);
    }

    #[test]
    fn test_dbscan_strategy_applies_merge() {
        // eps keeps the points apart; centroid merge at 0.7 joins them.
        let config = ClusteringConfig {
            eps: 0.05,
            merge_threshold: 0.7,
            ..ClusteringConfig::default()
        };
        let labels = cluster_embeddings(&[at(0.0), at(40.0)], &config);
        assert_eq!(labels, vec![0, 0]);
    }

    #[test]
    fn test_empty_input() {
        assert!(cluster_embeddings(&[], &ClusteringConfig::default()).is_empty());
    }
}
