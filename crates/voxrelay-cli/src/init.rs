//! `voxrelay init` — write a default configuration file.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use voxrelay_core::config::{get_config_path, load_config, save_config};
use voxrelay_core::utils::get_data_path;

/// Run the init command.
pub fn run() -> Result<()> {
    println!();
    println!("{}", "🔊 voxrelay — Setup".cyan().bold());
    println!();

    let config_path = get_config_path();
    let created = write_default_config(&config_path)?;
    if created {
        println!("  {} created config at {}", "✓".green(), config_path.display());
    } else {
        println!(
            "  {} config already exists at {}",
            "✓".green(),
            config_path.display()
        );
    }

    let data_dir = get_data_path();
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("failed to create {}", data_dir.display()))?;

    println!();
    println!(
        "{}",
        "  Setup complete! Set OPENAI_API_KEY or GEMINI_API_KEY, then run `voxrelay serve`.".green()
    );
    println!();

    Ok(())
}

/// Write the current effective config to `path` unless a file is already
/// there. Returns whether a file was written.
fn write_default_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    let mut config = load_config(Some(path));
    // Keys stay in the environment, never on disk by default
    config.providers.openai.api_key.clear();
    config.providers.gemini.api_key.clear();
    config.providers.elevenlabs.api_key.clear();
    save_config(&config, Some(path))
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxrelay_core::config::Config;

    #[test]
    fn writes_config_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        assert!(write_default_config(&path).unwrap());
        let saved: Config =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(saved.providers.openai.api_key.is_empty());
        assert!(saved.providers.elevenlabs.api_key.is_empty());

        std::fs::write(&path, "{\"server\":{\"port\":4000}}").unwrap();
        assert!(!write_default_config(&path).unwrap());
        let kept = std::fs::read_to_string(&path).unwrap();
        assert!(kept.contains("4000"));
    }
}
