//! Command-line interface module.
//!
//! This module handles:
//! - Argument parsing via clap
//! - Turning arguments into a run [`Config`]
//! - The `--list-protocols` listing

mod args;
mod config;
mod help;

pub use args::Args;
pub use config::{Config, OutputMode, Source};
pub use help::list_protocols;
