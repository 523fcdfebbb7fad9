use crate::shared::embedding::Embedding;

/// Domain interface for partitioning embeddings by identity.
///
/// Returns one label per embedding, in input order. Label values are
/// arbitrary; only the induced partition is meaningful, except that
/// [`NOISE_LABEL`](crate::shared::constants::NOISE_LABEL) marks points left
/// unassigned.
pub trait EmbeddingClusterer: Send + Sync {
    fn cluster(&self, embeddings: &[Embedding]) -> Vec<i32>;
}
