pub mod quality_scorer;
pub mod quality_weights;
