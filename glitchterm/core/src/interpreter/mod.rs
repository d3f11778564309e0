//! Command Interpreter - Commands and the Riddle State Machine
//!
//! Parses typed commands, dispatches them to handlers, and owns the riddle
//! flow. The interpreter uses the [`AnimationEngine`] purely as an output
//! sink and reads everything else from a [`ContentProvider`].
//!
//! # Riddle Flow
//!
//! ```text
//!            trigger (not yet activated)
//!   Idle ─────────────────────────────────► DialogOpen
//!    ▲                                          │
//!    │  correct: ACCESS GRANTED, reveal one     │
//!    ├──────────────────────────────────────────┤
//!    │  incorrect: ACCESS DENIED, allow retry   │
//!    └──────────────────────────────────────────┘
//! ```
//!
//! The activation flag stays set after a correct answer, so the trigger
//! only works once per session. An incorrect answer clears it.
//!
//! Handlers run synchronously. Where they hand work to the engine, the
//! spawned effect is returned as a [`JoinHandle`] that callers may ignore.

pub mod commands;

pub use commands::Command;

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time;

use crate::animation::AnimationEngine;
use crate::content::{ContentProvider, RevealOutcome, Riddle};
use crate::effects;
use crate::screen::{LineStyle, LineTag, PaneId};

use commands::{HELP_HINT, HELP_LINES, LOADING_NOTICE};

/// Heading of the listing rendered when content arrives
pub const TRACKLIST_HEADING: &str = "# TRACKLIST";

/// Heading of the listing rendered by `list`
pub const MEDIA_HEADING: &str = "# MEDIA";

/// Text corrupted into the celebration lines
pub const OVERRIDE_TEXT: &str = "SYSTEM OVERRIDE SUCCESSFUL";

/// Notice written before hidden content is redrawn
pub const REVEAL_NOTICE: &str = "REVEALING HIDDEN CONTENT...";

/// Interpreter timings and text
#[derive(Clone, Debug, PartialEq)]
pub struct InterpreterConfig {
    /// Command that opens the riddle dialog
    pub riddle_trigger: String,
    /// Pause before the boot banner
    pub boot_delay: Duration,
    /// Pause after a correct answer before the reveal notice
    pub reveal_delay: Duration,
    /// Pause after the reveal notice before the listing is redrawn
    pub reveal_render_delay: Duration,
    /// Number of corrupted celebration lines
    pub celebration_lines: usize,
    /// Corruption intensity of the celebration lines
    pub celebration_intensity: f64,
    /// Lines scrolled by `about`
    pub about_lines: Vec<String>,
    /// Lines scrolled at boot
    pub banner_lines: Vec<String>,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            riddle_trigger: "2006".to_string(),
            boot_delay: Duration::from_millis(500),
            reveal_delay: Duration::from_millis(1000),
            reveal_render_delay: Duration::from_millis(1500),
            celebration_lines: 3,
            celebration_intensity: 0.3,
            about_lines: commands::owned(commands::DEFAULT_ABOUT_LINES),
            banner_lines: commands::owned(commands::DEFAULT_BANNER_LINES),
        }
    }
}

/// Where the riddle flow stands
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RiddlePhase {
    /// No dialog
    #[default]
    Idle,
    /// Dialog shown, waiting for an answer
    DialogOpen,
}

/// Mutable interpreter state
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InterpreterState {
    /// Set when the dialog opens, cleared only by a wrong answer
    pub easter_egg_activated: bool,
    /// Last non-empty command, as typed
    pub last_command: String,
    /// Riddle flow phase
    pub phase: RiddlePhase,
}

/// Result of [`CommandInterpreter::process_command`]
#[derive(Debug)]
pub struct CommandOutcome {
    /// What the input parsed to
    pub command: Command,
    /// Effect still running on the engine, if any
    pub pending: Option<JoinHandle<()>>,
}

/// How an answer was judged
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Matched the riddle; carries what the unlock did
    Correct {
        /// Result of the content unlock
        revealed: RevealOutcome,
    },
    /// Did not match
    Incorrect,
    /// No dialog was open, nothing happened
    NoDialog,
}

/// Result of [`CommandInterpreter::submit_answer`]
#[derive(Debug)]
pub struct AnswerOutcome {
    /// The judgement
    pub verdict: Verdict,
    /// Delayed reveal effect, after a correct answer inside a runtime
    pub pending: Option<JoinHandle<()>>,
}

/// Result of [`CommandInterpreter::submit_input`]
#[derive(Debug)]
pub enum Submission {
    /// Input was run as a command
    Command(CommandOutcome),
    /// Input answered the open dialog
    Answer(AnswerOutcome),
}

impl Submission {
    /// Take the pending effect, whichever path produced it
    #[must_use]
    pub fn into_pending(self) -> Option<JoinHandle<()>> {
        match self {
            Self::Command(outcome) => outcome.pending,
            Self::Answer(outcome) => outcome.pending,
        }
    }
}

/// Parses commands and runs the riddle state machine
pub struct CommandInterpreter {
    engine: AnimationEngine,
    content: Arc<dyn ContentProvider>,
    config: InterpreterConfig,
    state: InterpreterState,
    /// Riddle posed by the open dialog
    posed: Option<Riddle>,
}

impl CommandInterpreter {
    /// Create an interpreter writing through `engine`
    pub fn new(
        engine: AnimationEngine,
        content: Arc<dyn ContentProvider>,
        config: InterpreterConfig,
    ) -> Self {
        Self {
            engine,
            content,
            config,
            state: InterpreterState::default(),
            posed: None,
        }
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> &InterpreterState {
        &self.state
    }

    /// The output engine
    #[must_use]
    pub fn engine(&self) -> &AnimationEngine {
        &self.engine
    }

    /// The content provider
    #[must_use]
    pub fn content(&self) -> &Arc<dyn ContentProvider> {
        &self.content
    }

    /// Interpreter configuration
    #[must_use]
    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    /// Route input to the open dialog, or run it as a command
    pub fn submit_input(&mut self, raw: &str) -> Submission {
        match self.state.phase {
            RiddlePhase::DialogOpen => Submission::Answer(self.submit_answer(raw)),
            RiddlePhase::Idle => Submission::Command(self.process_command(raw)),
        }
    }

    /// Echo and run one command
    pub fn process_command(&mut self, raw: &str) -> CommandOutcome {
        let command = Command::parse(raw, &self.config.riddle_trigger);
        if command == Command::Empty {
            return CommandOutcome {
                command,
                pending: None,
            };
        }

        let typed = raw.trim();
        self.state.last_command = typed.to_string();
        let echo = self
            .engine
            .add_scrolling_line(format!("> {typed}"), LineTag::Line);
        self.engine.set_style(echo, LineStyle::Highlight);

        tracing::debug!(command = command.name(), input = %typed, "Dispatching command");

        let pending = match &command {
            Command::Help => self.scroll_block(commands::owned(HELP_LINES)),
            Command::Clear => {
                self.clear_terminal();
                None
            }
            Command::List => {
                self.list_content();
                None
            }
            Command::About => self.scroll_block(self.config.about_lines.clone()),
            Command::Date => {
                self.show_date(chrono::Local::now().naive_local());
                None
            }
            Command::Riddle => {
                self.trigger_riddle();
                None
            }
            Command::Unknown(text) => {
                self.engine
                    .add_scrolling_line(format!("COMMAND NOT RECOGNIZED: {text}"), LineTag::Line);
                self.engine.add_scrolling_line(HELP_HINT, LineTag::Line);
                None
            }
            Command::Empty => None,
        };

        CommandOutcome { command, pending }
    }

    /// Open the riddle dialog unless the egg was already activated
    ///
    /// Returns whether the dialog opened.
    pub fn trigger_riddle(&mut self) -> bool {
        if self.state.easter_egg_activated {
            self.engine
                .add_scrolling_line("EASTER EGG ALREADY ACTIVATED", LineTag::Line);
            tracing::debug!("Riddle trigger ignored, already activated");
            return false;
        }

        let riddle = self.content.riddle();
        self.state.easter_egg_activated = true;
        self.state.phase = RiddlePhase::DialogOpen;
        self.engine.open_dialog(riddle.question.clone());
        tracing::debug!(question = %riddle.question, "Riddle dialog opened");
        self.posed = Some(riddle);
        true
    }

    /// Judge an answer to the open dialog
    ///
    /// The answer is checked against the riddle that was posed. A correct
    /// answer flips one hidden item right away and schedules the reveal
    /// notice and redraw.
    pub fn submit_answer(&mut self, answer: &str) -> AnswerOutcome {
        if self.state.phase != RiddlePhase::DialogOpen {
            tracing::debug!("Answer submitted with no dialog open");
            return AnswerOutcome {
                verdict: Verdict::NoDialog,
                pending: None,
            };
        }

        let riddle = self.posed.take().unwrap_or_else(|| self.content.riddle());
        self.state.phase = RiddlePhase::Idle;
        self.engine.close_dialog();

        if !riddle.is_correct(answer) {
            self.engine.add_scrolling_line("ACCESS DENIED", LineTag::Line);
            self.engine
                .add_scrolling_line("INCORRECT ANSWER", LineTag::Line);
            self.state.easter_egg_activated = false;
            tracing::debug!("Riddle answered incorrectly");
            return AnswerOutcome {
                verdict: Verdict::Incorrect,
                pending: None,
            };
        }

        self.engine.add_scrolling_line("ACCESS GRANTED", LineTag::Line);
        self.engine
            .add_scrolling_line(riddle.reward.clone(), LineTag::Line);
        for _ in 0..self.config.celebration_lines {
            let text = self
                .engine
                .corrupt_text(OVERRIDE_TEXT, self.config.celebration_intensity);
            let id = self.engine.add_scrolling_line(text, LineTag::Line);
            self.engine.set_style(id, LineStyle::Highlight);
        }

        let revealed = self
            .engine
            .rng()
            .with(|rng| self.content.reveal_random_hidden(rng));
        tracing::debug!(?revealed, "Riddle answered correctly");

        let pending = self.schedule_reveal(revealed.is_revealed());
        AnswerOutcome {
            verdict: Verdict::Correct { revealed },
            pending,
        }
    }

    /// Boot sequence: pause, scroll the banner, then show content or a notice
    ///
    /// Without a runtime the banner and the rest are written at once and
    /// `None` is returned.
    pub fn boot(&self) -> Option<JoinHandle<()>> {
        let engine = self.engine.clone();
        let content = Arc::clone(&self.content);
        let delay = self.config.boot_delay;
        let banner = self.config.banner_lines.clone();

        self.engine.spawn_or_else(
            async move {
                time::sleep(delay).await;
                engine.simulate_scrolling(banner).await;
                finish_boot(&engine, content.as_ref());
            },
            || {
                self.engine.scroll_now(self.config.banner_lines.clone());
                finish_boot(&self.engine, self.content.as_ref());
            },
        )
    }

    /// Redraw the listing and ticker once the provider has data
    ///
    /// Returns `false` if the provider is still not ready.
    pub fn content_ready(&self) -> bool {
        show_content(&self.engine, self.content.as_ref())
    }

    fn scroll_block(&self, lines: Vec<String>) -> Option<JoinHandle<()>> {
        let engine = self.engine.clone();
        let immediate = lines.clone();
        self.engine.spawn_or_else(
            async move {
                engine.simulate_scrolling(lines).await;
            },
            || {
                self.engine.scroll_now(immediate);
            },
        )
    }

    fn clear_terminal(&self) {
        self.engine.clear(PaneId::CONTENT);
        self.engine
            .add_scrolling_line("TERMINAL CLEARED", LineTag::Line);
        self.engine.add_scrolling_line("", LineTag::Line);
    }

    fn list_content(&self) {
        if !self.content.is_ready() {
            self.engine
                .add_scrolling_line(LOADING_NOTICE, LineTag::Line);
            return;
        }
        self.engine
            .add_scrolling_line(MEDIA_HEADING, LineTag::Heading);
        render_items(&self.engine, self.content.as_ref());
    }

    fn show_date(&self, now: chrono::NaiveDateTime) {
        for line in commands::date_lines(now) {
            self.engine.add_scrolling_line(line, LineTag::Line);
        }
    }

    fn schedule_reveal(&self, redraw: bool) -> Option<JoinHandle<()>> {
        let engine = self.engine.clone();
        let content = Arc::clone(&self.content);
        let reveal_delay = self.config.reveal_delay;
        let render_delay = self.config.reveal_render_delay;

        self.engine.spawn_or_else(
            async move {
                time::sleep(reveal_delay).await;
                engine.add_scrolling_line(REVEAL_NOTICE, LineTag::Line);
                time::sleep(render_delay).await;
                if redraw {
                    render_tracklist(&engine, content.as_ref());
                }
            },
            || {
                self.engine.add_scrolling_line(REVEAL_NOTICE, LineTag::Line);
                if redraw {
                    render_tracklist(&self.engine, self.content.as_ref());
                }
            },
        )
    }
}

impl std::fmt::Debug for CommandInterpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandInterpreter")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("content_ready", &self.content.is_ready())
            .finish_non_exhaustive()
    }
}

/// Last step of boot, once the banner is out
fn finish_boot(engine: &AnimationEngine, content: &dyn ContentProvider) {
    if content.is_ready() {
        show_content(engine, content);
    } else {
        engine.add_scrolling_line(LOADING_NOTICE, LineTag::Line);
    }
}

/// Listing plus ticker
fn show_content(engine: &AnimationEngine, content: &dyn ContentProvider) -> bool {
    if !render_tracklist(engine, content) {
        return false;
    }
    let ticker = content.ticker();
    if !ticker.is_empty() {
        engine.set_ticker(ticker);
    }
    true
}

/// Clear the content pane and draw the full listing under a heading
fn render_tracklist(engine: &AnimationEngine, content: &dyn ContentProvider) -> bool {
    if !content.is_ready() {
        tracing::warn!("Listing requested before content is ready");
        return false;
    }
    engine.clear(PaneId::CONTENT);
    engine.add_scrolling_line(TRACKLIST_HEADING, LineTag::Heading);
    render_items(engine, content);
    true
}

/// One line per item: numbered title, or a placeholder while hidden
fn render_items(engine: &AnimationEngine, content: &dyn ContentProvider) {
    for (index, item) in content.items().iter().enumerate() {
        let number = index + 1;
        if item.visible {
            let id = engine.add_scrolling_line(format!("{number}. {}", item.title), LineTag::Line);
            if let Some(href) = item.href() {
                engine.set_link(id, href);
            }
        } else {
            let text = format!("{number}. {}", effects::placeholder_for(&item.title));
            let id = engine.add_scrolling_line(text, LineTag::Line);
            engine.set_style(id, LineStyle::Placeholder);
        }
    }
}
