use crate::clustering::domain::cluster::distinct_labels;
use crate::clustering::domain::cluster_merger::ClusterMerger;
use crate::clustering::domain::embedding_clusterer::EmbeddingClusterer;
use crate::shared::embedding::Embedding;

use super::dbscan_clusterer::DbscanClusterer;
use super::threshold_clusterer::ThresholdClusterer;

/// Runs density clustering (with merging) and threshold clustering, and
/// keeps whichever produces fewer distinct labels.
///
/// Fewer clusters is used as a proxy for less over-segmentation. The
/// density result wins ties.
pub struct AdaptiveClusterer {
    dbscan: DbscanClusterer,
    merger: ClusterMerger,
    threshold: ThresholdClusterer,
}

impl AdaptiveClusterer {
    pub fn new(dbscan: DbscanClusterer, merger: ClusterMerger, threshold: ThresholdClusterer) -> Self {
        Self {
            dbscan,
            merger,
            threshold,
        }
    }
}

impl EmbeddingClusterer for AdaptiveClusterer {
    fn cluster(&self, embeddings: &[Embedding]) -> Vec<i32> {
        if embeddings.is_empty() {
            return Vec::new();
        }

        let initial = self.dbscan.cluster(embeddings);
        let density_labels = self.merger.merge(embeddings, &initial);
        let threshold_labels = self.threshold.cluster(embeddings);

        let density_count = distinct_labels(&density_labels);
        let threshold_count = distinct_labels(&threshold_labels);
        log::info!("DBSCAN result: {density_count} clusters");
        log::info!("Threshold result: {threshold_count} clusters");

        if threshold_count < density_count {
            log::info!("Using threshold-based clustering result");
            threshold_labels
        } else {
            log::info!("Using DBSCAN clustering result");
            density_labels
        }
    }
}
