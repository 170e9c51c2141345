//! Shared CLI helpers — path expansion, answer printing, banner.

use std::path::PathBuf;

use colored::Colorize;

/// Expand `~` at the start of a path to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_next::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs_next::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// Print a relay answer to stdout.
pub fn print_answer(answer: &str) {
    println!();
    println!("{}", "🔊 voxrelay".cyan().bold());
    if answer.is_empty() {
        println!("{}", "(no response)".dimmed());
    } else {
        println!("{answer}");
    }
    println!();
}

/// Print an error returned by the relay, inline like an answer.
pub fn print_error(message: &str) {
    eprintln!("\n{} {message}\n", "❌ Error:".red().bold());
}

/// Print a playback status line when there is one.
pub fn print_status(status: &str) {
    if !status.is_empty() {
        println!("{}", format!("[{status}]").dimmed());
    }
}

/// Print the banner shown at REPL start.
pub fn print_banner() {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!("{}  v{}", "🔊 voxrelay".cyan().bold(), version.dimmed());
    println!(
        "{}",
        "Type a prompt, /help for commands, or \"exit\" to quit.".dimmed()
    );
    println!();
}

/// Print a "thinking" placeholder while waiting for the relay.
pub fn print_thinking() {
    eprint!("{}", "⠿ thinking...".dimmed());
}

/// Clear the "thinking" placeholder.
pub fn clear_thinking() {
    eprint!("\r{}\r", " ".repeat(40));
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
