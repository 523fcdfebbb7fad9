//! Groups photos by the people in them.
//!
//! Faces come from an injected detector, are clustered by embedding
//! similarity and written out as one folder per person with a
//! representative thumbnail.

pub mod clustering;
pub mod detection;
pub mod imaging;
pub mod pipeline;
pub mod quality;
pub mod shared;
pub mod thumbnail;
