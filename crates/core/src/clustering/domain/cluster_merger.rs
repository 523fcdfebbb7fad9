use crate::clustering::domain::cluster::partition;
use crate::clustering::domain::disjoint_set::DisjointSet;
use crate::shared::embedding::Embedding;

/// Collapses clusters whose centroids are near-duplicates.
///
/// Unions are tracked in a [`DisjointSet`], so chains of similar pairs
/// (A~B, B~C) end up in one cluster even when A and C are not directly
/// similar. Each component keeps the label of its first-seen cluster. Noise
/// points are never merged.
#[derive(Debug, Clone)]
pub struct ClusterMerger {
    merge_threshold: f64,
}

impl ClusterMerger {
    pub fn new(merge_threshold: f64) -> Self {
        Self { merge_threshold }
    }

    /// Merges repeatedly, recomputing centroids, until no pair of clusters
    /// reaches the threshold. Running it again on its own output changes
    /// nothing.
    pub fn merge(&self, embeddings: &[Embedding], labels: &[i32]) -> Vec<i32> {
        let mut current = labels.to_vec();
        loop {
            let (next, changed) = self.merge_once(embeddings, &current);
            current = next;
            if !changed {
                return current;
            }
        }
    }

    /// A single merge pass over the current centroids. Returns the relabeled
    /// points and whether any clusters were joined.
    pub fn merge_once(&self, embeddings: &[Embedding], labels: &[i32]) -> (Vec<i32>, bool) {
        if embeddings.len() != labels.len() {
            log::warn!(
                "Skipping cluster merge: {} embeddings but {} labels",
                embeddings.len(),
                labels.len()
            );
            return (labels.to_vec(), false);
        }

        let clusters: Vec<_> = partition(labels)
            .into_iter()
            .filter(|c| !c.is_noise())
            .collect();
        if clusters.len() <= 1 {
            return (labels.to_vec(), false);
        }

        let centroids: Vec<Option<Embedding>> =
            clusters.iter().map(|c| c.centroid(embeddings)).collect();

        let mut components = DisjointSet::new(clusters.len());
        let mut changed = false;
        for i in 0..clusters.len() {
            let Some(ci) = &centroids[i] else { continue };
            for j in (i + 1)..clusters.len() {
                let Some(cj) = &centroids[j] else { continue };
                let similarity = ci.cosine_similarity(cj);
                if similarity >= self.merge_threshold && components.union(i, j) {
                    log::info!(
                        "Merging clusters {} and {} (similarity: {similarity:.3})",
                        clusters[i].label,
                        clusters[j].label
                    );
                    changed = true;
                }
            }
        }

        let mut merged = labels.to_vec();
        if changed {
            for (i, cluster) in clusters.iter().enumerate() {
                let target = clusters[components.find(i)].label;
                for &member in &cluster.members {
                    merged[member] = target;
                }
            }
        }
        (merged, changed)
    }
}
