//! CLI library components for `sfm-import`.

pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod progress;
pub mod summary;
