//! voxrelay CLI — entry point.
//!
//! # Commands
//!
//! - `voxrelay serve` — run the HTTP relay
//! - `voxrelay status` — show configuration and provider status
//! - `voxrelay init` — write a default config file
//! - `voxrelay chat [--server URL]` — voice REPL against a running relay

mod chat;
mod client;
mod helpers;
mod init;
mod serve;
mod status;

use anyhow::Result;
use clap::{Parser, Subcommand};

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// 🔊 voxrelay — prompt relay for OpenAI, Gemini and local models, with speech
#[derive(Parser)]
#[command(name = "voxrelay", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP relay
    Serve {
        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Show configuration and provider status
    Status,

    /// Write a default configuration file
    Init,

    /// Chat with a running relay and hear the answers
    Chat {
        /// Relay base URL (defaults to the configured local port)
        #[arg(short, long)]
        server: Option<String>,

        /// Print answers without speaking them
        #[arg(long, default_value_t = false)]
        no_speak: bool,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { logs } => {
            init_logging(logs, "info");
            serve::run().await
        }
        Commands::Status => status::run(),
        Commands::Init => init::run(),
        Commands::Chat {
            server,
            no_speak,
            logs,
        } => {
            init_logging(logs, "warn");
            chat::run(server, !no_speak).await
        }
    }
}

/// Initialize tracing/logging.
///
/// `VOXRELAY_LOG_FORMAT=json` switches to one JSON object per line.
fn init_logging(verbose: bool, default_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("voxrelay=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };

    let json = std::env::var("VOXRELAY_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_chat_flags() {
        let cli = Cli::parse_from(["voxrelay", "chat", "--server", "http://host:9000", "--no-speak"]);
        match cli.command {
            Commands::Chat {
                server, no_speak, ..
            } => {
                assert_eq!(server.as_deref(), Some("http://host:9000"));
                assert!(no_speak);
            }
            _ => panic!("expected chat"),
        }
    }
}
