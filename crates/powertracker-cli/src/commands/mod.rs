//! Command implementations for the CLI.

mod config;
mod report;

pub use config::cmd_config;
pub use report::cmd_report;
