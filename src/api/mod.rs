//! Output API for tracker estimates

pub mod formatting;

pub use formatting::{EstimateFormatter, EstimateRecord, OutputFormat};
