//! Config command handlers

use anyhow::{bail, Context, Result};

use toonhub_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
///
/// Key material is reported as set/not set, never echoed.
pub fn show(output: &Output) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "auth_url": config.auth_url,
                    "auth_anon_key": mask(&config.auth_anon_key),
                    "ai_api_key": mask(&config.ai_api_key),
                    "ai_model": config.ai_model
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            println!("Configuration:");
            println!("  data_dir:      {}", config.data_dir.display());
            println!(
                "  auth_url:      {}",
                config.auth_url.as_deref().unwrap_or("(not set)")
            );
            println!("  auth_anon_key: {}", mask(&config.auth_anon_key));
            println!("  ai_api_key:    {}", mask(&config.ai_api_key));
            println!("  ai_model:      {}", config.ai_model);
            println!();
            println!("Config file: {}", Config::config_file_path().display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(key: String, value: String, output: &Output) -> Result<()> {
    let mut config = Config::load().context("Failed to load configuration")?;

    match key.as_str() {
        "data_dir" => {
            config.data_dir = value.clone().into();
        }
        "auth_url" => {
            config.auth_url = optional(&value);
        }
        "auth_anon_key" => {
            config.auth_anon_key = optional(&value);
        }
        "ai_api_key" => {
            config.ai_api_key = optional(&value);
        }
        "ai_model" => {
            if value.is_empty() {
                bail!("ai_model cannot be empty.");
            }
            config.ai_model = value.clone();
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: data_dir, auth_url, auth_anon_key, ai_api_key, ai_model",
                key
            );
        }
    }

    config.save().context("Failed to save configuration")?;

    let shown = match key.as_str() {
        "auth_anon_key" | "ai_api_key" => "(hidden)",
        _ => value.as_str(),
    };
    output.success(&format!("Set {} = {}", key, shown));

    Ok(())
}

/// Print the config file path
pub fn path() -> Result<()> {
    println!("{}", Config::config_file_path().display());
    Ok(())
}

/// Clearing values accepts both an empty string and the word "none"
fn optional(value: &str) -> Option<String> {
    if value.is_empty() || value == "none" {
        None
    } else {
        Some(value.to_string())
    }
}

fn mask(secret: &Option<String>) -> &'static str {
    if secret.is_some() {
        "(set)"
    } else {
        "(not set)"
    }
}
