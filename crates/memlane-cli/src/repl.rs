//! REPL – Read-Eval-Print Loop driving a running scene session.
//!
//! Supported slash-commands:
//!   /show            – print the current view
//!   /next, /prev     – turn the page
//!   /page N          – jump to page N (one-based)
//!   /enter ID        – point at (or gaze on) a memory
//!   /leave ID        – look away from a memory
//!   /select ID       – activate an expanded memory
//!   /retry           – reload the feed after an error
//!   /config          – show the active configuration
//!   /settings        – edit `~/.memlane/config.toml`
//!   /schema          – print the selection event JSON Schema
//!   /help            – show this list
//!   /quit | /exit    – unmount the scene and exit

use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use memlane_kernel::{InputEvent, InputSource};
use memlane_runtime::renderer::{Placement, TileImage};
use memlane_runtime::{SceneCommand, SceneView, SessionHandle, Tile};
use memlane_types::InteractionState;

use crate::config::{self, Config};

const PROGRESS_WIDTH: usize = 10;

/// A parsed REPL line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Show,
    Next,
    Prev,
    /// Zero-based page index.
    Page(usize),
    Enter(String),
    Leave(String),
    Select(String),
    Retry,
    Config,
    Settings,
    Schema,
    Help,
    Quit,
}

/// Parse one input line.  The error is a user-facing message.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let mut parts = line.split_whitespace();
    let Some(head) = parts.next() else {
        return Err("empty command".to_string());
    };
    let arg = parts.next();
    if parts.next().is_some() {
        return Err(format!("too many arguments for {head}"));
    }

    let item = |name: &str| {
        arg.map(str::to_string)
            .ok_or_else(|| format!("usage: {name} ID"))
    };

    match head {
        "/show" => Ok(Command::Show),
        "/next" => Ok(Command::Next),
        "/prev" => Ok(Command::Prev),
        "/page" => match arg.map(str::parse::<usize>) {
            Some(Ok(n)) if n > 0 => Ok(Command::Page(n - 1)),
            _ => Err("usage: /page N (N starts at 1)".to_string()),
        },
        "/enter" => item("/enter").map(Command::Enter),
        "/leave" => item("/leave").map(Command::Leave),
        "/select" => item("/select").map(Command::Select),
        "/retry" => Ok(Command::Retry),
        "/config" => Ok(Command::Config),
        "/settings" => Ok(Command::Settings),
        "/schema" => Ok(Command::Schema),
        "/help" => Ok(Command::Help),
        "/quit" | "/exit" => Ok(Command::Quit),
        other => Err(format!("Unknown command: '{other}'")),
    }
}

/// Entry point for the interactive REPL.
///
/// `shutdown` is polled each iteration; when set the REPL exits cleanly.
/// Scene commands go to `session`; the loop itself never touches the
/// composer.
pub fn run(session: SessionHandle, cfg: &Config, shutdown: Arc<AtomicBool>) {
    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            eprintln!("{}: {}", "Terminal error".red(), e);
            return;
        }
    };
    // Give the session a couple of ticks to apply a command before the view
    // is printed.
    let settle = Duration::from_millis(cfg.tick_ms.max(1) * 2);

    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        let line = match editor.readline("memlane> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                shutdown.store(true, Ordering::SeqCst);
                break;
            }
            Err(e) => {
                eprintln!("{}: {}", "Read error".red(), e);
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(line);

        let command = match parse_command(line) {
            Ok(command) => command,
            Err(msg) => {
                println!("{} Type {} for available commands.", msg.red(), "/help".bold());
                continue;
            }
        };

        let scene_command = match command {
            Command::Show => {
                println!("{}", render_view(&session.view()));
                continue;
            }
            Command::Help => {
                cmd_help();
                continue;
            }
            Command::Config => {
                println!("{:#?}", cfg);
                continue;
            }
            Command::Settings => {
                cmd_settings(&mut editor);
                continue;
            }
            Command::Schema => {
                cmd_schema();
                continue;
            }
            Command::Quit => {
                println!("{}", "Goodbye.".green());
                shutdown.store(true, Ordering::SeqCst);
                break;
            }
            Command::Next => SceneCommand::NextPage,
            Command::Prev => SceneCommand::PreviousPage,
            Command::Page(index) => SceneCommand::GoToPage(index),
            Command::Retry => SceneCommand::Retry,
            Command::Enter(item_id) => input(item_id, InputEvent::Enter),
            Command::Leave(item_id) => input(item_id, InputEvent::Leave),
            Command::Select(item_id) => input(item_id, InputEvent::Activate),
        };

        if let Err(e) = session.send_blocking(scene_command) {
            println!("{}: {}", "Session error".red(), e);
            break;
        }
        std::thread::sleep(settle);
        println!("{}", render_view(&session.view()));
    }
}

fn input(item_id: String, event: InputEvent) -> SceneCommand {
    SceneCommand::Input {
        item_id,
        event,
        source: InputSource::Pointer,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// View rendering
// ─────────────────────────────────────────────────────────────────────────────

/// Terminal rendition of a [`SceneView`].
pub fn render_view(view: &SceneView) -> String {
    match view {
        SceneView::Loading => format!("  {}", "Loading memories …".dimmed()),
        SceneView::Error { message, can_retry } => {
            let hint = if *can_retry { " – type /retry" } else { "" };
            format!("  {} {}{}", "✗".red().bold(), message.red(), hint)
        }
        SceneView::Empty => format!("  {}", "No memories to show yet.".yellow()),
        SceneView::Scene(frame) => {
            let mut out = format!(
                "  {} · {} · {} memories\n",
                frame.paginator.label().bold(),
                frame.mode.to_string().cyan(),
                frame.paginator.total_items
            );
            for tile in &frame.tiles {
                out.push_str(&render_tile(tile));
                out.push('\n');
            }
            let mut nav = Vec::new();
            if frame.paginator.has_previous {
                nav.push("/prev");
            }
            if frame.paginator.has_next {
                nav.push("/next");
            }
            if !nav.is_empty() {
                out.push_str(&format!("  {}", nav.join("  ").dimmed()));
            }
            out.trim_end().to_string()
        }
    }
}

fn render_tile(tile: &Tile) -> String {
    let marker = match tile.state {
        InteractionState::Expanded => "▶".green().bold(),
        InteractionState::SelectedCooldown => "✓".green(),
        InteractionState::Dwelling | InteractionState::Hovered => "•".yellow(),
        InteractionState::Idle => " ".normal(),
    };
    let state = if tile.state == InteractionState::Dwelling {
        format!("{} {}", tile.state, progress_bar(tile.dwell_progress))
    } else {
        tile.state.to_string()
    };
    let image = match &tile.image {
        TileImage::Url(_) => "",
        TileImage::BrokenPlaceholder => " [no image]",
    };
    let date = if tile.date_label.is_empty() { "undated" } else { tile.date_label.as_str() };
    format!(
        "  {} {:<10} {:<16} {} · {} · \"{}\"{}  {}",
        marker,
        tile.id.bold(),
        state,
        tile.era_label.magenta(),
        date,
        tile.caption,
        image,
        placement_label(&tile.placement).dimmed()
    )
}

fn placement_label(placement: &Placement) -> String {
    match placement {
        Placement::Spatial { x, y, z, yaw_deg } => {
            format!("({x:.2}, {y:.2}, {z:.2}) yaw {yaw_deg:.0}°")
        }
        Placement::Grid { row, column } => format!("row {} col {}", row + 1, column + 1),
    }
}

/// Fixed-width bar, e.g. `[████░░░░░░]`.
pub fn progress_bar(progress: f32) -> String {
    let filled = (progress.clamp(0.0, 1.0) * PROGRESS_WIDTH as f32).round() as usize;
    format!(
        "[{}{}]",
        "█".repeat(filled),
        "░".repeat(PROGRESS_WIDTH - filled)
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Command handlers
// ─────────────────────────────────────────────────────────────────────────────

fn cmd_help() {
    println!();
    println!("{}", "Memlane Commands".bold().underline());
    println!("  {}           – print the current scene", "/show".bold().cyan());
    println!("  {}    – turn the page", "/next  /prev".bold().cyan());
    println!("  {}         – jump to page N", "/page N".bold().cyan());
    println!("  {}       – look at a memory (dwell to expand)", "/enter ID".bold().cyan());
    println!("  {}       – look away from a memory", "/leave ID".bold().cyan());
    println!("  {}      – select an expanded memory", "/select ID".bold().cyan());
    println!("  {}          – reload after a feed error", "/retry".bold().cyan());
    println!("  {}         – show the active configuration", "/config".bold().cyan());
    println!("  {}       – edit ~/.memlane/config.toml", "/settings".bold().cyan());
    println!("  {}         – selection event JSON Schema", "/schema".bold().cyan());
    println!("  {}    – exit the CLI", "/quit  /exit".bold().cyan());
    println!();
}

fn cmd_schema() {
    match memlane_runtime::selection_event_schema()
        .and_then(|schema| {
            serde_json::to_string_pretty(&schema)
                .map_err(|e| memlane_types::MemlaneError::Serialization(e.to_string()))
        }) {
        Ok(text) => println!("{text}"),
        Err(e) => println!("{}: {}", "Schema error".red(), e),
    }
}

fn cmd_settings(editor: &mut DefaultEditor) {
    let mut cfg = load_config_or_default();

    println!("{}", "Settings Editor".bold().underline());
    println!("  (press Enter to keep a value; changes apply on next launch)");

    cfg.feed_url = prompt_str(editor, "Feed URL", &cfg.feed_url);
    cfg.memory_id = prompt_str(editor, "Memory id", &cfg.memory_id);
    cfg.narration_url = prompt_str(editor, "Narration URL", &cfg.narration_url);
    cfg.dwell_ms = prompt_u64(editor, "Dwell (ms)", cfg.dwell_ms);
    cfg.cooldown_ms = prompt_u64(editor, "Cooldown (ms)", cfg.cooldown_ms);
    cfg.page_size = prompt_u64(editor, "Flat page size", cfg.page_size as u64).max(1) as usize;

    match config::save(&cfg) {
        Ok(()) => println!(
            "{} {}",
            "✓ Settings saved to".green(),
            config::config_path().display().to_string().bold()
        ),
        Err(e) => println!("{}: {}", "Error saving config".red(), e),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn load_config_or_default() -> Config {
    match config::load() {
        Ok(Some(c)) => c,
        Ok(None) => Config::default(),
        Err(e) => {
            println!("{}: {} – using defaults", "Config error".red(), e);
            Config::default()
        }
    }
}

/// Prompt for a number.  Returns `default` on Enter or unparsable input.
fn prompt_u64(editor: &mut DefaultEditor, label: &str, default: u64) -> u64 {
    let raw = prompt_str(editor, label, &default.to_string());
    match raw.parse::<u64>() {
        Ok(v) => v,
        Err(_) => {
            println!(
                "  {} '{}' is not a number, keeping {}",
                "Warning:".yellow(),
                raw,
                default
            );
            default
        }
    }
}

/// Prompt for a string value.  Returns `default` when the user presses Enter.
fn prompt_str(editor: &mut DefaultEditor, label: &str, default: &str) -> String {
    match editor.readline(&format!("  {label} [{default}]: ")) {
        Ok(line) if !line.trim().is_empty() => line.trim().to_string(),
        _ => default.to_string(),
    }
}
