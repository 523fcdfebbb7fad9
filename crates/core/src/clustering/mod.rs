pub mod domain;
pub mod infrastructure;

pub use infrastructure::clusterer_factory::cluster_embeddings;
