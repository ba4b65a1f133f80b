//! Pipeline composition and execution for compositional transforms.

mod runner;

pub use runner::{Pipeline, PipelineConfig, PipelineStep};
