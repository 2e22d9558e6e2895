//! First-run interactive setup.

use std::io::{self, IsTerminal};
use std::path::Path;

use anyhow::{Context, Result, bail};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Password};
use owo_colors::OwoColorize;
use url::Url;

use crate::config::Config;

/// Whether prompts can be shown.
pub fn is_interactive() -> bool {
    io::stdin().is_terminal() && io::stderr().is_terminal()
}

/// Prompt for the connection settings and save them to `path`.
///
/// Existing optional settings in `base` are kept.
pub fn run_setup(path: &Path, base: Config) -> Result<Config> {
    if !is_interactive() {
        bail!(
            "No terminal available for interactive setup.\n\
             Create {} or pass --url, --api-key and --sensor-id.",
            path.display()
        );
    }

    eprintln!("{}", "Setting up powertracker.".bold());
    let theme = ColorfulTheme::default();

    let url: String = Input::with_theme(&theme)
        .with_prompt("Home Assistant URL")
        .default("http://localhost:8123".to_string())
        .interact_text()
        .context("Failed to read URL")?;
    let url = normalize_url(&url)?;

    let api_key = Password::with_theme(&theme)
        .with_prompt("Home Assistant Long-Lived Access Token")
        .interact()
        .context("Failed to read access token")?;

    let sensor_id: String = Input::with_theme(&theme)
        .with_prompt("Energy sensor entity ID (e.g. sensor.energy_import)")
        .interact_text()
        .context("Failed to read sensor ID")?;

    let config = Config {
        url: Some(url),
        api_key: Some(api_key),
        sensor_id: Some(sensor_id.trim().to_string()),
        ..base
    };
    config.save_to(path)?;
    eprintln!("Saved configuration to {}", path.display().cyan());

    Ok(config)
}

/// Add `http://` when no scheme was typed and check the result parses.
pub fn normalize_url(input: &str) -> Result<String> {
    let input = input.trim();
    let candidate = if input.contains("://") {
        input.to_string()
    } else {
        format!("http://{}", input)
    };
    let url = Url::parse(&candidate).with_context(|| format!("parsing URL '{}'", input))?;
    Ok(url.as_str().trim_end_matches('/').to_string())
}
