//! `memlane-cli` – Memlane Command Line Interface
//!
//! Terminal host for the memory-photo scene:
//!
//! 1. Loads `~/.memlane/config.toml`, writing the defaults on first run.
//! 2. Resolves the render mode once from `MEMLANE_IMMERSIVE` or the config.
//! 3. Starts a scene session fed from `FEED_FILE` (first argument) or the
//!    MemoryBridge backend.
//! 4. Drops the user into an **interactive REPL** with slash-commands.
//! 5. Intercepts **Ctrl-C** to unmount the scene and exit cleanly.

mod config;
mod repl;

use colored::Colorize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

use memlane_middleware::{BusNarrationSink, EventBus, HttpNarrationSink, NarrationSink, Topic};
use memlane_runtime::{
    FeedSnapshot, FileMemoryFeed, HttpMemoryFeed, MemoryFeed, SceneCommand, SceneComposer,
    SceneSession, StaticFeed,
};
use memlane_types::EventPayload;

fn main() {
    // RUST_LOG filters (default "info"); MEMLANE_LOG_FORMAT=json switches to
    // JSON lines.  User-facing output still goes through println!.
    let _telemetry = memlane_runtime::init_tracing("memlane");

    print_banner();

    // ── Configuration ─────────────────────────────────────────────────────
    let cfg = match config::load() {
        Ok(Some(cfg)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Ok(None) => first_run(),
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
    };

    // ── Tokio runtime ─────────────────────────────────────────────────────
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("{}: {}", "Failed to start async runtime".red(), e);
            std::process::exit(1);
        }
    };

    // ── Scene ─────────────────────────────────────────────────────────────
    let bus = EventBus::default();
    let sink: Arc<dyn NarrationSink> = if cfg.narration_url.is_empty() {
        let mut selections = bus.subscribe_to(Topic::Selection);
        runtime.spawn(async move {
            while let Some(event) = selections.next_event().await {
                if let EventPayload::Selection(selection) = event.payload {
                    println!("\n  {} {}", "🔊".bold(), selection.context_text().italic());
                }
            }
        });
        Arc::new(BusNarrationSink::new(bus.clone()).with_source("memlane-cli"))
    } else {
        Arc::new(HttpNarrationSink::new(
            cfg.narration_url.clone(),
            cfg.narration_api_key(),
        ))
    };

    let composer = match SceneComposer::new(cfg.immersive_signal(), cfg.composer_config()) {
        Ok(composer) => composer.with_narration(sink).with_bus(bus),
        Err(e) => {
            eprintln!("{}: {}", "Scene setup failed".red(), e);
            std::process::exit(1);
        }
    };
    println!("  Render mode: {}", composer.mode().to_string().bold().cyan());

    let feed = select_feed(&cfg, std::env::args().nth(1));
    println!("  Memory feed: {}", feed.describe().dimmed());

    let (session, handle) = SceneSession::new(composer, feed, cfg.session_config());
    let session_task = runtime.spawn(session.run());

    // ── Shared shutdown flag ──────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();
    let ctrlc_handle = handle.clone();

    // ── Ctrl-C handler ────────────────────────────────────────────────────
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – unmounting the scene …".yellow().bold());
        // The handler runs on its own thread, outside the runtime.
        if let Err(e) = ctrlc_handle.send_blocking(SceneCommand::Shutdown) {
            warn!(error = %e, "scene session already stopped");
        }
        shutdown_clone.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; graceful shutdown on Ctrl-C will not be available");
    }

    println!();
    println!("  Type {} for a list of commands.\n", "/help".bold().cyan());

    // ── Interactive REPL ──────────────────────────────────────────────────
    repl::run(handle.clone(), &cfg, shutdown);

    // A stopped session rejects the command; that is the state we want.
    let _ = handle.send_blocking(SceneCommand::Shutdown);
    drop(handle);
    match runtime.block_on(session_task) {
        Ok(composer) => {
            info!(layout_passes = composer.layout_passes(), "scene session finished");
            println!("{}", "  ✓ Scene unmounted.".green());
        }
        Err(e) => eprintln!("{}: {}", "Scene session aborted".red(), e),
    }
    runtime.shutdown_timeout(std::time::Duration::from_secs(1));
}

/// `FEED_FILE` wins; otherwise the backend is used when a memory id is set.
fn select_feed(cfg: &config::Config, feed_file: Option<String>) -> Arc<dyn MemoryFeed> {
    match feed_file {
        Some(path) => Arc::new(FileMemoryFeed::new(path)),
        None if !cfg.memory_id.is_empty() => {
            Arc::new(HttpMemoryFeed::new(cfg.feed_url.clone(), cfg.memory_id.clone()))
        }
        None => Arc::new(StaticFeed::new(FeedSnapshot::error(
            "No memory selected: pass a FEED_FILE or set memory_id in the config",
        ))),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// First run
// ─────────────────────────────────────────────────────────────────────────────

fn first_run() -> config::Config {
    println!();
    println!("{}", "  ╔══════════════════════════════════════╗".bold().cyan());
    println!("{}", "  ║          Memlane First Run           ║".bold().cyan());
    println!("{}", "  ╚══════════════════════════════════════╝".bold().cyan());
    println!();

    let mut cfg = config::Config::default();
    match config::save(&cfg) {
        Ok(()) => println!(
            "  {} Default config written to {}",
            "✓".green().bold(),
            config::config_path().display().to_string().bold()
        ),
        Err(e) => println!("{}: {}", "Error saving config".red(), e),
    }
    println!("  Use {} to change the backend or timings.", "/settings".bold().cyan());
    config::apply_env_overrides(&mut cfg);
    cfg
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", r#"    __  ___                __                 "#.bold().cyan());
    println!("{}", r#"   /  |/  /__  ____ ___  / /___ _____  ___    "#.bold().cyan());
    println!("{}", r#"  / /|_/ / _ \/ __ `__ \/ / __ `/ __ \/ _ \   "#.bold().cyan());
    println!("{}", r#" / /  / /  __/ / / / / / / /_/ / / / /  __/   "#.bold().cyan());
    println!("{}", r#"/_/  /_/\___/_/ /_/ /_/_/\__,_/_/ /_/\___/    "#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "Memlane".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  A walk through remembered photos");
    println!();
}
