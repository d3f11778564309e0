//! Glitchterm Host - Simulated Terminal on Stdin/Stdout
//!
//! Wires the core engine and interpreter to a real terminal: commands are
//! read line by line from stdin, screen events are rendered to stdout, and
//! logs go to stderr so they never interleave with the terminal output.
//!
//! # Usage
//!
//! ```bash
//! # Demo content, default timings
//! glitchterm
//!
//! # Custom content and a faster typewriter
//! glitchterm --content ~/tracks.toml --typing-speed-ms 20
//!
//! # Skip the boot banner, verbose logging
//! RUST_LOG=debug glitchterm --no-boot 2>glitchterm.log
//! ```
//!
//! Type `exit` or send EOF (Ctrl-D) to quit.

mod renderer;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::oneshot;
use tracing::{info, warn};

use glitchterm_core::{
    config, AnimationEngine, CommandInterpreter, ConfigOverrides, ContentProvider, ContentSnapshot,
    LineStyle, Screen, SharedRandom, StaticContent, TerminalConfig,
};

use renderer::Renderer;

/// Delay before demo content is marked ready, mimicking a remote fetch
const DEMO_LOAD_DELAY: Duration = Duration::from_millis(1500);

/// How long the renderer may take to drain after input ends
const RENDER_DRAIN_TIMEOUT: Duration = Duration::from_millis(250);

/// Glitchterm - a simulated terminal with timed text effects
#[derive(Parser, Debug)]
#[command(name = "glitchterm")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, env = "GLITCHTERM_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// TOML content file (demo content if omitted)
    #[arg(long, value_name = "FILE")]
    content: Option<PathBuf>,

    /// Interval between typed characters
    #[arg(long, value_name = "MS")]
    typing_speed_ms: Option<u64>,

    /// Command that opens the riddle dialog
    #[arg(long, value_name = "TEXT")]
    riddle_trigger: Option<String>,

    /// Seed for reproducible effects
    #[arg(long)]
    seed: Option<u64>,

    /// Skip the boot banner
    #[arg(long)]
    no_boot: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "GLITCHTERM_LOG_LEVEL", default_value = "warn")]
    log_level: String,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides::new();
        if let Some(ms) = self.typing_speed_ms {
            overrides = overrides.with_typing_speed_ms(ms);
        }
        if let Some(ref trigger) = self.riddle_trigger {
            overrides = overrides.with_riddle_trigger(trigger.clone());
        }
        if let Some(ref path) = self.content {
            overrides = overrides.with_content_path(path.clone());
        }
        if let Some(seed) = self.seed {
            overrides = overrides.with_seed(seed);
        }
        overrides
    }
}

/// Initialize logging with the specified level, writing to stderr
fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("glitchterm={level},glitchterm_core={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .init();
}

/// Resolve configuration: defaults, file, environment, then CLI
fn resolve_config(args: &Args) -> Result<TerminalConfig> {
    let path = args.config.clone().or_else(config::default_config_path);
    let mut config = config::load_config_from_path(path).context("Failed to load configuration")?;
    args.overrides()
        .apply(&mut config)
        .context("Invalid command-line override")?;
    info!(source = %config.source(), "Configuration resolved");
    Ok(config)
}

/// Load content in the background, as a remote source would
async fn load_content(path: Option<PathBuf>) -> Result<ContentSnapshot> {
    match path {
        Some(path) => {
            let text = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read content file: {}", path.display()))?;
            let snapshot = ContentSnapshot::from_toml_str(&text)
                .with_context(|| format!("Failed to parse content file: {}", path.display()))?;
            info!(path = %path.display(), items = snapshot.items.len(), "Content loaded");
            Ok(snapshot)
        }
        None => {
            tokio::time::sleep(DEMO_LOAD_DELAY).await;
            Ok(ContentSnapshot::demo())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = resolve_config(&args)?;

    let rng = config
        .seed
        .map_or_else(SharedRandom::from_entropy, SharedRandom::seeded);
    let (screen, events) = Screen::with_events();
    let engine = AnimationEngine::new(screen.shared(), rng, config.animation.clone());
    let content = Arc::new(StaticContent::pending());
    let mut terminal = CommandInterpreter::new(
        engine.clone(),
        Arc::clone(&content) as Arc<dyn ContentProvider>,
        config.interpreter.clone(),
    );

    let render_task = tokio::spawn(renderer::run(
        events,
        Renderer::new(Renderer::terminal_width()),
    ));

    let (content_tx, mut content_rx) = oneshot::channel();
    let content_path = config.content_path.clone();
    tokio::spawn(async move {
        // Receiver gone means we are already shutting down
        let _ = content_tx.send(load_content(content_path).await);
    });

    if !args.no_boot {
        terminal.boot();
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut content_pending = true;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line.context("Failed to read stdin")? {
                    Some(line) if line.trim().eq_ignore_ascii_case("exit") => break,
                    Some(line) => {
                        terminal.submit_input(&line);
                    }
                    None => break,
                }
            }
            loaded = &mut content_rx, if content_pending => {
                content_pending = false;
                match loaded {
                    Ok(Ok(snapshot)) => {
                        content.load(snapshot);
                        terminal.content_ready();
                    }
                    Ok(Err(e)) => {
                        warn!(error = %e, "Content unavailable");
                        engine.post_status("CONTENT SOURCE UNAVAILABLE", LineStyle::Warning);
                    }
                    Err(_) => warn!("Content loader dropped"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received interrupt, shutting down");
                break;
            }
        }
    }

    drop(terminal);
    drop(engine);
    if tokio::time::timeout(RENDER_DRAIN_TIMEOUT, render_task).await.is_err() {
        info!("Renderer still busy with running effects, exiting anyway");
    }
    Ok(())
}
