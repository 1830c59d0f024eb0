//! CLI command implementations.

mod config;
mod doctor;
mod generate;
mod serve;

pub use config::run_config;
pub use doctor::run_doctor;
pub use generate::{build_pipeline, is_reported, run_generate, ReportedError};
pub use serve::run_serve;
