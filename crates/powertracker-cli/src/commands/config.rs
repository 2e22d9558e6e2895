//! Config command implementation.

use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::ConfigAction;
use crate::config::Config;
use crate::setup::run_setup;

pub fn cmd_config(action: ConfigAction, path: &Path, quiet: bool) -> Result<()> {
    match action {
        ConfigAction::Show => {
            if !path.exists() && !quiet {
                eprintln!("No config file at {}", path.display());
            }
            let config = Config::load_from(path)?;
            let content =
                toml::to_string_pretty(&config.masked()).context("Failed to serialize config")?;
            print!("{}", content);
        }
        ConfigAction::Path => {
            println!("{}", path.display());
        }
        ConfigAction::Init => {
            let existing = Config::load_from(path)?;
            run_setup(path, existing)?;
        }
    }
    Ok(())
}
