pub mod cluster;
pub mod cluster_merger;
pub mod disjoint_set;
pub mod embedding_clusterer;
