pub mod adaptive_clusterer;
pub mod clusterer_factory;
pub mod dbscan_clusterer;
pub mod threshold_clusterer;
