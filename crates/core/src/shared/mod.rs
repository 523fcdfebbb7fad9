pub mod bounding_box;
pub mod constants;
pub mod embedding;
pub mod face_observation;
pub mod frame;
pub mod grouping_config;
