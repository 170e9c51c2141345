//! Interactive voice chat against a running relay.
//!
//! Uses `rustyline` for readline-style editing with persistent history and
//! speaks each answer through the playback controller.

use std::time::Duration;

use anyhow::{Context, Result};
use colored::Colorize;
use rustyline::config::Configurer;
use rustyline::history::DefaultHistory;
use rustyline::{DefaultEditor, Editor};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;

use voxrelay_core::config::load_config;
use voxrelay_speech::{CommandSpeech, PlaybackController, PlaybackEnd, PlaybackEvent};

use crate::client::RelayClient;
use crate::helpers;

/// Exit commands (case-insensitive match).
const EXIT_COMMANDS: &[&str] = &["exit", "quit", "/exit", "/quit", ":q"];

/// Extra time the client waits beyond the relay's provider timeout.
const CLIENT_TIMEOUT_MARGIN: Duration = Duration::from_secs(5);

const HELP: &str = "\
  /pause    pause speech
  /resume   resume speech
  /replay   speak the last answer again
  /clear    stop speech
  /health   show the relay's active mode
  exit      quit";

/// A line of REPL input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Input<'a> {
    Exit,
    Pause,
    Resume,
    Replay,
    Clear,
    Health,
    Help,
    Unknown(&'a str),
    Prompt(&'a str),
}

fn parse_input(line: &str) -> Option<Input<'_>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    if is_exit_command(trimmed) {
        return Some(Input::Exit);
    }
    let input = match trimmed.to_lowercase().as_str() {
        "/pause" => Input::Pause,
        "/resume" => Input::Resume,
        "/replay" => Input::Replay,
        "/clear" => Input::Clear,
        "/health" => Input::Health,
        "/help" => Input::Help,
        cmd if cmd.starts_with('/') => Input::Unknown(trimmed),
        _ => Input::Prompt(trimmed),
    };
    Some(input)
}

struct Speaker {
    playback: PlaybackController<CommandSpeech>,
    events: UnboundedReceiver<PlaybackEvent>,
}

impl Speaker {
    /// Apply completion events that arrived since the last prompt.
    fn drain_events(&mut self) {
        while let Ok((id, end)) = self.events.try_recv() {
            if let Some(PlaybackEnd::Errored(message)) = self.playback.finish(id, end) {
                helpers::print_error(&format!("TTS error: {message}"));
            }
        }
    }

    async fn speak(&mut self, text: &str) {
        if let Err(e) = self.playback.speak(text).await {
            helpers::print_error(&format!("TTS error: {e}"));
        }
        helpers::print_status(self.playback.status_line());
    }
}

/// Run the interactive chat loop.
pub async fn run(server: Option<String>, speak: bool) -> Result<()> {
    let config = load_config(None);
    let server = server.unwrap_or_else(|| format!("http://127.0.0.1:{}", config.server.port));
    let timeout = Duration::from_secs(config.request.timeout_secs) + CLIENT_TIMEOUT_MARGIN;
    let client = RelayClient::new(&server, timeout).context("failed to build HTTP client")?;

    let mut speaker = (speak && config.speech.enabled).then(|| {
        let (engine, events) = CommandSpeech::from_config(&config.speech);
        let playback = PlaybackController::new(engine)
            .with_voice(config.speech.voice.clone())
            .with_rate(config.speech.rate);
        Speaker { playback, events }
    });

    helpers::print_banner();
    println!("  Relay: {}", client.base_url().dimmed());
    if speaker.is_none() {
        println!("  {}", "Speech off".dimmed());
    }
    println!();

    let mut editor = create_editor()?;
    let mut last_answer: Option<String> = None;

    loop {
        if let Some(speaker) = speaker.as_mut() {
            speaker.drain_events();
        }

        let line = match editor.readline("You: ") {
            Ok(line) => line,
            Err(rustyline::error::ReadlineError::Interrupted) => break,
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        };

        let Some(input) = parse_input(&line) else {
            continue;
        };
        if input != Input::Exit {
            let _ = editor.add_history_entry(line.trim());
        }
        if let Some(speaker) = speaker.as_mut() {
            speaker.drain_events();
        }

        match input {
            Input::Exit => {
                println!("\nGoodbye! 👋");
                break;
            }
            Input::Prompt(prompt) => {
                debug!(chars = prompt.chars().count(), "sending prompt");
                helpers::print_thinking();
                let result = client.chat(prompt).await;
                helpers::clear_thinking();

                match result {
                    Ok(reply) => {
                        helpers::print_answer(&reply.answer);
                        if let Some(speaker) = speaker.as_mut() {
                            speaker.speak(&reply.answer).await;
                        }
                        last_answer = Some(reply.answer);
                    }
                    // The previous answer stays available for /replay
                    Err(e) => helpers::print_error(&e.to_string()),
                }
            }
            Input::Pause | Input::Resume | Input::Clear => match speaker.as_mut() {
                Some(speaker) => {
                    let result = match input {
                        Input::Pause => speaker.playback.pause(),
                        Input::Resume => speaker.playback.resume(),
                        _ => {
                            speaker.playback.stop();
                            Ok(())
                        }
                    };
                    if let Err(e) = result {
                        println!("{}", e.to_string().dimmed());
                    }
                    helpers::print_status(speaker.playback.status_line());
                }
                None => println!("{}", "Speech is off.".dimmed()),
            },
            Input::Replay => match (speaker.as_mut(), &last_answer) {
                (Some(speaker), Some(_)) => {
                    if let Err(e) = speaker.playback.replay().await {
                        helpers::print_error(&format!("TTS error: {e}"));
                    }
                    helpers::print_status(speaker.playback.status_line());
                }
                (None, Some(answer)) => helpers::print_answer(answer),
                (_, None) => println!("{}", "Nothing to replay yet.".dimmed()),
            },
            Input::Health => match client.health().await {
                Ok(report) => println!(
                    "  mode: {}  model: {}",
                    report.mode.to_string().cyan(),
                    report.model.as_deref().unwrap_or("-")
                ),
                Err(e) => helpers::print_error(&e.to_string()),
            },
            Input::Help => println!("{HELP}"),
            Input::Unknown(cmd) => println!("{}", format!("Unknown command {cmd}; try /help").dimmed()),
        }
    }

    if let Some(speaker) = speaker.as_mut() {
        speaker.playback.stop();
    }
    save_history(&mut editor);

    Ok(())
}

/// Create a rustyline editor with history.
fn create_editor() -> Result<Editor<(), DefaultHistory>> {
    let mut editor = DefaultEditor::new()?;
    editor.set_max_history_size(1000)?;

    let history_path = history_path();
    if history_path.exists() {
        let _ = editor.load_history(&history_path);
        debug!("loaded chat history from {}", history_path.display());
    }

    Ok(editor)
}

/// Save history to disk.
fn save_history(editor: &mut Editor<(), DefaultHistory>) {
    let path = history_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = editor.save_history(&path) {
        debug!("failed to save history: {e}");
    }
}

/// Path to the history file.
fn history_path() -> std::path::PathBuf {
    voxrelay_core::utils::get_data_path().join("history")
}

/// Check if input is an exit command.
fn is_exit_command(input: &str) -> bool {
    let lower = input.to_lowercase();
    EXIT_COMMANDS.contains(&lower.as_str())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
