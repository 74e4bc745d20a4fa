//! CLI library components for the clinical-trial filter engine.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod summary;
pub mod types;
