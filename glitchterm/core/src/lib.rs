//! Glitchterm Core - Headless Simulated Terminal
//!
//! This crate provides the logic behind a simulated computer terminal whose
//! text appears through timed effects (typing, scrolling, glitching), plus a
//! small command interpreter with a hidden riddle. It is independent of any
//! display: a host renders the [`screen::ScreenEvent`] stream however it likes.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                           Host Surface                            │
//! │        stdin lines ──► submit_input      ScreenEvent ──► render    │
//! └───────────────┬─────────────────────────────────▲────────────────┘
//!                 │                                 │
//! ┌───────────────┼─────────────────────────────────┼────────────────┐
//! │               ▼          GLITCHTERM CORE        │                │
//! │  ┌──────────────────────┐   output sink   ┌─────┴──────────────┐ │
//! │  │  CommandInterpreter  │ ──────────────► │  AnimationEngine   │ │
//! │  │  (riddle state)      │                 │  (tokio timers)    │ │
//! │  └──────────┬───────────┘                 └─────┬──────────────┘ │
//! │             │ reads / unlocks                   │ mutates        │
//! │  ┌──────────▼───────────┐                 ┌─────▼──────────────┐ │
//! │  │   ContentProvider    │                 │  Screen (panes,    │ │
//! │  │   (items, riddle)    │                 │  ticker, dialog)   │ │
//! │  └──────────────────────┘                 └────────────────────┘ │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`AnimationEngine`]: Timed text effects against a shared screen
//! - [`CommandInterpreter`]: Command dispatch and the riddle state machine
//! - [`ContentProvider`]: Source of listed items, ticker text and the riddle
//! - [`Screen`]: Display lines grouped in panes, with an event stream
//! - [`SharedRandom`]: Injectable randomness behind every effect
//! - [`TerminalConfig`]: Layered configuration (defaults, file, env, CLI)
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use glitchterm_core::{
//!     AnimationConfig, AnimationEngine, CommandInterpreter, InterpreterConfig,
//!     Screen, SharedRandom, StaticContent, ContentSnapshot,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let (screen, mut events) = Screen::with_events();
//!     let engine = AnimationEngine::new(
//!         screen.shared(),
//!         SharedRandom::from_entropy(),
//!         AnimationConfig::default(),
//!     );
//!     let content = Arc::new(StaticContent::ready(ContentSnapshot::demo()));
//!     let mut terminal = CommandInterpreter::new(engine, content, InterpreterConfig::default());
//!
//!     if let Some(boot) = terminal.boot() {
//!         boot.await.unwrap();
//!     }
//!     terminal.submit_input("list");
//!
//!     while let Ok(event) = events.try_recv() {
//!         // Render event
//!     }
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`effects`]: Stateless string effects (corruption, placeholders)
//! - [`random`]: The injectable random source
//! - [`screen`]: Output surface model and change events
//! - [`animation`]: Typing, sequences, scrolling and crash-out effects
//! - [`content`]: Content provider contract and in-memory provider
//! - [`interpreter`]: Command parsing, handlers and the riddle flow
//! - [`config`]: TOML and environment configuration

#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod animation;
pub mod config;
pub mod content;
pub mod effects;
pub mod interpreter;
pub mod random;
pub mod screen;

// Re-exports for convenience
pub use animation::{AnimationConfig, AnimationEngine, TypingOutcome};
pub use config::{
    default_config_path, load_config, load_config_from_path, ConfigError, ConfigOverrides,
    ConfigSource, TerminalConfig,
};
pub use content::{
    ContentError, ContentItem, ContentProvider, ContentSnapshot, RevealOutcome, Riddle,
    StaticContent,
};
pub use effects::{corrupt_text, placeholder_for, GLITCH_CHARS};
pub use interpreter::{
    AnswerOutcome, Command, CommandInterpreter, CommandOutcome, InterpreterConfig,
    InterpreterState, RiddlePhase, Submission, Verdict,
};
pub use random::{RandomSource, SharedRandom};
pub use screen::{
    DisplayLine, Glyph, LineId, LineState, LineStyle, LineTag, PaneId, Screen, ScreenEvent,
    SharedScreen,
};
