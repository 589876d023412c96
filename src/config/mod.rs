pub mod enhance;
pub mod types;

use anyhow::Result;
use std::path::Path;

pub use types::{
    ClashBaseline, ClashDns, FetchSettings, LogConfig, RuleSettings, Settings, SurgeBaseline,
};

/// Load converter settings from a YAML file.
///
/// Missing keys fall back to their defaults, so an empty file is valid.
pub fn load_settings(path: &str) -> Result<Settings> {
    let content = load_settings_content(path)?;
    let settings = parse_settings(&content)?;
    tracing::debug!(path = path, "settings loaded");
    Ok(settings)
}

pub fn parse_settings(content: &str) -> Result<Settings> {
    let settings: Settings = if content.trim().is_empty() {
        Settings::default()
    } else {
        serde_yml::from_str(content)?
    };
    settings.validate()?;
    Ok(settings)
}

pub fn load_settings_content(path: &str) -> Result<String> {
    let raw_content = std::fs::read_to_string(Path::new(path))?;
    let base_dir = Path::new(path)
        .parent()
        .and_then(|p| p.to_str())
        .unwrap_or(".");

    let transformed = enhance::process_includes(&raw_content, base_dir)?;
    Ok(enhance::expand_env_vars(&transformed))
}
