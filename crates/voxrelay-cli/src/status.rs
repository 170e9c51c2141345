//! `voxrelay status` — show configuration and provider status.

use anyhow::Result;
use colored::Colorize;

use voxrelay_core::config::schema::{Config, LocalPrecedence};
use voxrelay_core::config::{get_config_path, load_config};
use voxrelay_core::{active_model, select_mode, ActiveMode};
use voxrelay_providers::registry::{spec_for_mode, ProviderSpec, PROVIDERS};

use crate::helpers::expand_tilde;

fn check(ok: bool, missing: &str) -> String {
    if ok {
        "✓".green().to_string()
    } else {
        missing.red().to_string()
    }
}

/// Status text for one chat backend.
fn provider_status(spec: &ProviderSpec, config: &Config) -> String {
    let key_status = |configured: bool| {
        if configured {
            format!("{} (key set)", "✓".green())
        } else {
            format!("{}", format!("· not configured ({})", spec.env_key).dimmed())
        }
    };
    match spec.name {
        "openai" => key_status(config.providers.openai.is_configured()),
        "gemini" => key_status(config.providers.gemini.is_configured()),
        _ => {
            let binary = expand_tilde(&config.local.binary);
            let precedence = match config.local.precedence {
                LocalPrecedence::Disabled => "disabled",
                LocalPrecedence::Prefer => "prefer",
                LocalPrecedence::Fallback => "fallback",
            };
            format!(
                "{} {} {}",
                binary.display(),
                check(binary.exists(), "(not found)"),
                format!("[{precedence}]").dimmed()
            )
        }
    }
}

/// Row label for a backend; the one `mode` selects is marked.
fn provider_label(spec: &ProviderSpec, mode: ActiveMode) -> String {
    let active = spec_for_mode(mode).is_some_and(|active| active.name == spec.name);
    if active {
        format!("{} ●", spec.display_name)
    } else {
        spec.display_name.to_string()
    }
}

/// Run the status command.
pub fn run() -> Result<()> {
    let config = load_config(None);
    let config_path = get_config_path();
    let mode = select_mode(&config);

    println!();
    println!("{}", "🔊 voxrelay Status".cyan().bold());
    println!();

    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        config_path.display(),
        check(config_path.exists(), "(not found)")
    );
    println!(
        "  {:<18} {}:{}",
        "Listen:".bold(),
        config.server.host,
        config.server.port
    );
    let static_dir = expand_tilde(&config.server.static_dir);
    println!(
        "  {:<18} {} {}",
        "Static files:".bold(),
        static_dir.display(),
        check(static_dir.is_dir(), "(not found)")
    );

    println!();
    println!(
        "  {:<18} {} {}",
        "Mode:".bold(),
        mode.to_string().cyan(),
        active_model(&config, mode).unwrap_or("-").dimmed()
    );
    println!(
        "  {:<18} {} | max_tokens: {} | timeout: {}s",
        "Parameters:".bold(),
        format!("temp: {}", config.request.temperature).dimmed(),
        config.request.max_tokens,
        config.request.timeout_secs,
    );

    println!();
    println!("  {}", "Providers:".bold());
    for spec in PROVIDERS {
        println!(
            "    {:<20} {}",
            provider_label(spec, mode),
            provider_status(spec, &config)
        );
    }

    println!();
    println!("  {}", "Speech:".bold());
    let tts = if config.providers.elevenlabs.is_configured() {
        format!("{} (key set)", "✓".green())
    } else {
        format!("{}", "· not configured (ELEVENLABS_API_KEY)".dimmed())
    };
    println!("    {:<20} {}", "ElevenLabs", tts);
    println!(
        "    {:<20} {}{}",
        "Local command",
        config.speech.command,
        if config.speech.enabled {
            String::new()
        } else {
            format!(" {}", "(disabled)".dimmed())
        }
    );

    println!();

    Ok(())
}
