pub mod attribution;
pub mod config;
pub mod error;
pub mod events;
pub mod form;
pub mod inputs;
pub mod logging;
pub mod match_stats;
pub mod pipeline;
pub mod prediction;
pub mod scoring;
pub mod season;
pub mod signals;
pub mod synthetic;

pub use error::{EngineError, Result};
pub use pipeline::{PipelineOutput, run};
