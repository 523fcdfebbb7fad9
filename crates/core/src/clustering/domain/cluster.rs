use std::collections::HashMap;
use std::collections::HashSet;

use crate::shared::constants::NOISE_LABEL;
use crate::shared::embedding::Embedding;

/// Points sharing one label, by index into the clustered sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    pub label: i32,
    pub members: Vec<usize>,
}

impl Cluster {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_noise(&self) -> bool {
        self.label == NOISE_LABEL
    }

    /// Re-normalized mean of member embeddings.
    pub fn centroid(&self, embeddings: &[Embedding]) -> Option<Embedding> {
        Embedding::centroid(self.members.iter().filter_map(|&i| embeddings.get(i)))
    }
}

/// Splits `labels` into clusters ordered by first appearance. Member indices
/// keep input order. Noise points share one cluster like any other label.
pub fn partition(labels: &[i32]) -> Vec<Cluster> {
    let mut slot: HashMap<i32, usize> = HashMap::new();
    let mut clusters: Vec<Cluster> = Vec::new();
    for (idx, &label) in labels.iter().enumerate() {
        let pos = *slot.entry(label).or_insert_with(|| {
            clusters.push(Cluster {
                label,
                members: Vec::new(),
            });
            clusters.len() - 1
        });
        clusters[pos].members.push(idx);
    }
    clusters
}

/// Number of distinct label values, the noise label counting as one.
pub fn distinct_labels(labels: &[i32]) -> usize {
    labels.iter().collect::<HashSet<_>>().len()
}
