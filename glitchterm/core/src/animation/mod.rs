//! Animation Engine - Timed Text Effects
//!
//! Schedules timed mutations of the screen: character-by-character typing,
//! multi-line typing sequences, line insertion and removal, and scrolling
//! with random corruption.
//!
//! # Timing Model
//!
//! ```text
//! type_text        |--t--t--s--t--t--done        (t = char, s = stutter)
//! type_sequence    [line 0 typed] delay [line 1 typed] delay ... done
//! simulate_scroll  |--l--l--l--done              (fixed cadence)
//! crash_line       Removing --- grace --- detach
//! ```
//!
//! Every effect is an `async fn` driven by `tokio::time`. Awaiting one is
//! the same as waiting for its completion callback; passing it to
//! [`AnimationEngine::spawn`] makes it fire-and-forget. Within one call the
//! line order is strict. Independent calls interleave freely. Outside a
//! runtime, sync callers fall back to writing lines at once.
//!
//! There is no cancellation. A second `type_text` on a line that is still
//! being typed runs a competing session on the same line. A session ends
//! early only when its line is detached.

mod typing;

pub use typing::{SequenceSession, TypingOutcome, TypingSession, TypingStep};

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::effects;
use crate::random::SharedRandom;
use crate::screen::{Glyph, LineId, LineState, LineStyle, LineTag, PaneId, SharedScreen};

/// Shortest interval a timer is allowed to tick at
const MIN_TICK: Duration = Duration::from_millis(1);

/// Timing and probability knobs for every effect
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimationConfig {
    /// Interval between typed characters
    pub typing_speed: Duration,
    /// Pause after each line of a typing sequence
    pub line_delay: Duration,
    /// Chance that a typing tick reveals nothing
    pub stutter_probability: f64,
    /// Chance that a character of a glitching line is marked
    pub glitch_probability: f64,
    /// Grace period between a crash-out starting and the detach
    pub crash_grace: Duration,
    /// Cadence of simulated scrolling
    pub scroll_interval: Duration,
    /// Chance that a scrolled line is corrupted
    pub scroll_corruption_chance: f64,
    /// Intensity used when a scrolled line is corrupted
    pub scroll_corruption_intensity: f64,
    /// Delay before scrolling to a freshly appended line
    pub scroll_settle: Duration,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            typing_speed: Duration::from_millis(50),
            line_delay: Duration::from_millis(500),
            stutter_probability: 0.1,
            glitch_probability: 0.03,
            crash_grace: Duration::from_millis(500),
            scroll_interval: Duration::from_millis(100),
            scroll_corruption_chance: 0.2,
            scroll_corruption_intensity: effects::DEFAULT_INTENSITY,
            scroll_settle: Duration::from_millis(10),
        }
    }
}

impl AnimationConfig {
    /// Config with every random effect switched off
    ///
    /// Timings stay at their defaults, so only the randomness changes.
    #[must_use]
    pub fn deterministic() -> Self {
        Self {
            stutter_probability: 0.0,
            glitch_probability: 0.0,
            scroll_corruption_chance: 0.0,
            ..Self::default()
        }
    }
}

/// Drives timed text effects against a shared screen
///
/// Cloning is cheap; clones share the screen and random source.
#[derive(Clone, Debug)]
pub struct AnimationEngine {
    screen: SharedScreen,
    rng: SharedRandom,
    config: AnimationConfig,
}

impl AnimationEngine {
    /// Create an engine over a screen
    pub fn new(screen: SharedScreen, rng: SharedRandom, config: AnimationConfig) -> Self {
        Self {
            screen,
            rng,
            config,
        }
    }

    /// The screen this engine writes to
    #[must_use]
    pub fn screen(&self) -> &SharedScreen {
        &self.screen
    }

    /// The random source behind every effect
    #[must_use]
    pub fn rng(&self) -> &SharedRandom {
        &self.rng
    }

    /// Effect configuration
    #[must_use]
    pub fn config(&self) -> &AnimationConfig {
        &self.config
    }

    /// Run an effect without waiting for it
    ///
    /// Outside a tokio runtime nothing can drive the effect's timers, so it
    /// is dropped and `None` is returned.
    pub fn spawn<F>(&self, effect: F) -> Option<JoinHandle<()>>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.spawn_or_else(effect, || {
            tracing::warn!("No tokio runtime, timed effect dropped");
        })
    }

    /// Like [`spawn`](Self::spawn), but run `immediate` in place when there
    /// is no runtime
    pub fn spawn_or_else<F, G>(&self, effect: F, immediate: G) -> Option<JoinHandle<()>>
    where
        F: Future<Output = ()> + Send + 'static,
        G: FnOnce(),
    {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => Some(handle.spawn(effect)),
            Err(_) => {
                immediate();
                None
            }
        }
    }

    // =========================================================================
    // Typing
    // =========================================================================

    /// Type `text` into `target` at the configured speed
    pub async fn type_text(&self, target: LineId, text: &str) -> TypingOutcome {
        self.type_text_at(target, text, self.config.typing_speed)
            .await
    }

    /// Type `text` into `target`, one character per `speed` tick
    ///
    /// The target is emptied first. Each tick may stutter; completion is
    /// noticed on the first non-stutter tick after the last character, so
    /// elapsed time is only known in expectation.
    pub async fn type_text_at(&self, target: LineId, text: &str, speed: Duration) -> TypingOutcome {
        let session = TypingSession::new(target, text, speed, self.config.stutter_probability);
        self.run_session(session).await
    }

    async fn run_session(&self, mut session: TypingSession) -> TypingOutcome {
        let started = session.begin(&mut self.screen.lock());
        if !started {
            tracing::debug!(line = %session.target(), "Typing target already detached");
            return TypingOutcome::TargetDetached;
        }

        let mut ticker = periodic(session.speed());
        loop {
            ticker.tick().await;
            let stutter = self.rng.chance(session.stutter_probability());
            let step = session.tick(stutter, &mut self.screen.lock());
            match step {
                TypingStep::Typed(_) => {}
                TypingStep::Stutter => {
                    tracing::trace!(line = %session.target(), cursor = session.cursor(), "Typing stutter");
                }
                TypingStep::Finished => return TypingOutcome::Completed,
                TypingStep::Detached => {
                    tracing::debug!(
                        line = %session.target(),
                        typed = session.cursor(),
                        "Typing target detached mid-session"
                    );
                    return TypingOutcome::TargetDetached;
                }
            }
        }
    }

    /// Type `lines` into `pane` at the configured speed and line delay
    pub async fn type_sequence<I, S>(&self, pane: PaneId, lines: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.type_sequence_with(pane, lines, self.config.typing_speed, self.config.line_delay)
            .await
    }

    /// Clear `pane`, then type each line into a fresh child line
    ///
    /// Line *i + 1* is created only after line *i* has finished typing and
    /// `line_delay` has passed, including after the last line. Returns the
    /// number of lines typed.
    pub async fn type_sequence_with<I, S>(
        &self,
        pane: PaneId,
        lines: I,
        speed: Duration,
        line_delay: Duration,
    ) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lines = lines.into_iter().map(Into::into).collect();
        let mut sequence = SequenceSession::new(pane, lines, speed, line_delay);
        self.screen.lock().clear(pane);

        while let Some(text) = sequence.next_line() {
            let child = self.screen.lock().append_pending(sequence.pane());
            let session = TypingSession::new(
                child,
                &text,
                sequence.speed(),
                self.config.stutter_probability,
            );
            if self.run_session(session).await == TypingOutcome::Completed {
                self.screen.lock().set_state(child, LineState::Visible);
            }
            time::sleep(sequence.line_delay()).await;
        }

        tracing::debug!(pane = pane.0, lines = sequence.completed(), "Typing sequence complete");
        sequence.completed()
    }

    // =========================================================================
    // Lines
    // =========================================================================

    /// Append a line to the content pane and scroll to it on the next tick
    pub fn add_scrolling_line(&self, text: impl Into<String>, tag: LineTag) -> LineId {
        let id = self.screen.lock().append(PaneId::CONTENT, tag, text);
        self.schedule_scroll(PaneId::CONTENT);
        id
    }

    /// Like [`Self::add_scrolling_line`], with per-character glitch markers
    pub fn add_glitching_line(&self, text: impl AsRef<str>, tag: LineTag) -> LineId {
        let probability = self.config.glitch_probability;
        let glyphs: Vec<Glyph> = self.rng.with(|rng| {
            text.as_ref()
                .chars()
                .map(|ch| Glyph {
                    ch,
                    glitching: rng.chance(probability),
                })
                .collect()
        });
        let id = self
            .screen
            .lock()
            .append_glyphs(PaneId::CONTENT, tag, glyphs);
        self.schedule_scroll(PaneId::CONTENT);
        id
    }

    /// Post a styled status line on behalf of a side system
    pub fn post_status(&self, text: impl Into<String>, style: LineStyle) -> LineId {
        let id = self.add_scrolling_line(text, LineTag::Line);
        self.set_style(id, style);
        id
    }

    fn schedule_scroll(&self, pane: PaneId) {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let screen = self.screen.clone();
                let settle = self.config.scroll_settle;
                handle.spawn(async move {
                    time::sleep(settle).await;
                    screen.lock().scroll_to_bottom(pane);
                });
            }
            Err(_) => self.screen.lock().scroll_to_bottom(pane),
        }
    }

    /// Crash a line out: mark it, wait the grace period, then detach it
    ///
    /// Returns whether the line was still attached at detach time. A line
    /// that is already gone is not an error.
    pub async fn crash_line(&self, id: LineId) -> bool {
        let marked = self.screen.lock().set_state(id, LineState::Removing);
        if !marked {
            tracing::debug!(line = %id, "Crashing a line that is already detached");
        }
        time::sleep(self.config.crash_grace).await;
        self.screen.lock().detach(id)
    }

    /// Corrupt text with the engine's random source
    pub fn corrupt_text(&self, text: &str, intensity: f64) -> String {
        self.rng
            .with(|rng| effects::corrupt_text(text, intensity, rng))
    }

    /// Render `lines` as glitching lines on a fixed cadence
    ///
    /// Each line has a chance of being corrupted first. Resolves on the tick
    /// after the last line and returns the number of lines rendered.
    pub async fn simulate_scrolling<I, S>(&self, lines: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lines: Vec<String> = lines.into_iter().map(Into::into).collect();
        let mut ticker = periodic(self.config.scroll_interval);
        let mut index = 0;

        loop {
            ticker.tick().await;
            let Some(line) = lines.get(index) else {
                break;
            };
            self.scroll_one(line);
            index += 1;
        }

        index
    }

    /// [`simulate_scrolling`](Self::simulate_scrolling) without the cadence
    ///
    /// All lines are added at once. Used where no timer can run.
    pub fn scroll_now<I, S>(&self, lines: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        lines
            .into_iter()
            .map(|line| {
                let line: String = line.into();
                self.scroll_one(&line)
            })
            .count()
    }

    fn scroll_one(&self, line: &str) -> LineId {
        let rendered = if self.rng.chance(self.config.scroll_corruption_chance) {
            self.corrupt_text(line, self.config.scroll_corruption_intensity)
        } else {
            line.to_string()
        };
        self.add_glitching_line(rendered, LineTag::Line)
    }

    // =========================================================================
    // Output sink
    // =========================================================================

    /// Change a line's style hook
    pub fn set_style(&self, id: LineId, style: LineStyle) -> bool {
        self.screen.lock().set_style(id, style)
    }

    /// Attach a link to a line
    pub fn set_link(&self, id: LineId, link: impl Into<String>) -> bool {
        self.screen.lock().set_link(id, link)
    }

    /// Detach every line of a pane
    pub fn clear(&self, pane: PaneId) {
        self.screen.lock().clear(pane);
    }

    /// Replace the ticker text
    pub fn set_ticker(&self, text: impl Into<String>) {
        self.screen.lock().set_ticker(text);
    }

    /// Show the dialog
    pub fn open_dialog(&self, question: impl Into<String>) {
        self.screen.lock().open_dialog(question);
    }

    /// Hide the dialog
    pub fn close_dialog(&self) -> bool {
        self.screen.lock().close_dialog()
    }
}

/// Interval whose first tick lands one period from now
fn periodic(period: Duration) -> time::Interval {
    let period = period.max(MIN_TICK);
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screen::Screen;
    use pretty_assertions::assert_eq;

    fn engine(config: AnimationConfig) -> AnimationEngine {
        AnimationEngine::new(Screen::new().shared(), SharedRandom::seeded(5), config)
    }

    #[tokio::test(start_paused = true)]
    async fn test_type_text_without_stutter_takes_len_plus_one_ticks() {
        let engine = engine(AnimationConfig::deterministic());
        let id = engine.add_scrolling_line("old", LineTag::Line);

        let start = Instant::now();
        let outcome = engine.type_text(id, "HELLO").await;
        assert_eq!(outcome, TypingOutcome::Completed);
        assert_eq!(start.elapsed(), Duration::from_millis(50 * 6));
        assert_eq!(engine.screen().lock().texts(PaneId::CONTENT), vec!["HELLO"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_type_text_with_stutter_still_completes() {
        let config = AnimationConfig {
            stutter_probability: 0.5,
            ..AnimationConfig::deterministic()
        };
        let engine = engine(config);
        let id = engine.add_scrolling_line("", LineTag::Line);

        let start = Instant::now();
        engine.type_text(id, "SYSTEM READY").await;
        assert!(start.elapsed() >= Duration::from_millis(50 * 13));
        assert_eq!(
            engine.screen().lock().line(id).map(|l| l.text.clone()),
            Some("SYSTEM READY".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_type_text_on_detached_line() {
        let engine = engine(AnimationConfig::deterministic());
        let id = engine.add_scrolling_line("", LineTag::Line);
        engine.clear(PaneId::CONTENT);
        assert_eq!(engine.type_text(id, "lost").await, TypingOutcome::TargetDetached);
    }

    #[tokio::test(start_paused = true)]
    async fn test_type_sequence_clears_pane_and_types_children() {
        let engine = engine(AnimationConfig::deterministic());
        let pane = engine.screen().lock().create_pane();
        engine.screen().lock().append(pane, LineTag::Line, "leftover");

        let typed = engine
            .type_sequence_with(pane, ["AB", "C"], Duration::from_millis(10), Duration::from_millis(100))
            .await;

        assert_eq!(typed, 2);
        let screen = engine.screen().lock();
        assert_eq!(screen.texts(pane), vec!["AB", "C"]);
        assert!(screen.lines(pane).all(|l| l.state == LineState::Visible));
    }

    #[tokio::test(start_paused = true)]
    async fn test_glitching_line_markers() {
        let all = engine(AnimationConfig {
            glitch_probability: 1.0,
            ..AnimationConfig::deterministic()
        });
        let id = all.add_glitching_line("GLITCH", LineTag::Line);
        let line = all.screen().lock().line(id).cloned();
        assert_eq!(line.map(|l| l.glitch_count()), Some(6));

        let none = engine(AnimationConfig::deterministic());
        let id = none.add_glitching_line("CLEAN", LineTag::Line);
        let line = none.screen().lock().line(id).cloned();
        assert_eq!(line.as_ref().map(|l| l.glitch_count()), Some(0));
        assert_eq!(line.map(|l| l.text), Some("CLEAN".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_scrolling_line_schedules_scroll() {
        let engine = engine(AnimationConfig::deterministic());
        engine.add_scrolling_line("x", LineTag::Line);
        assert_eq!(engine.screen().lock().scroll_count(), 0);
        time::sleep(Duration::from_millis(11)).await;
        assert_eq!(engine.screen().lock().scroll_count(), 1);
    }

    #[test]
    fn test_spawn_without_runtime_runs_fallback() {
        let engine = engine(AnimationConfig::deterministic());
        assert!(engine.spawn(async {}).is_none());

        let mut ran = false;
        let handle = engine.spawn_or_else(async {}, || ran = true);
        assert!(handle.is_none());
        assert!(ran);
    }

    #[test]
    fn test_scroll_now_adds_every_line() {
        let engine = engine(AnimationConfig::deterministic());
        assert_eq!(engine.scroll_now(["ONE", "TWO", "THREE"]), 3);
        assert_eq!(
            engine.screen().lock().texts(PaneId::CONTENT),
            vec!["ONE".to_string(), "TWO".to_string(), "THREE".to_string()]
        );
    }

    #[test]
    fn test_scroll_without_runtime_is_immediate() {
        let engine = engine(AnimationConfig::deterministic());
        engine.add_scrolling_line("x", LineTag::Line);
        assert_eq!(engine.screen().lock().scroll_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_crash_line_detaches_after_grace() {
        let engine = engine(AnimationConfig::deterministic());
        let id = engine.add_scrolling_line("doomed", LineTag::Line);

        let handle = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.crash_line(id).await })
        };
        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(engine.screen().lock().state_of(id), Some(LineState::Removing));

        assert!(handle.await.unwrap());
        assert_eq!(engine.screen().lock().state_of(id), Some(LineState::Removed));
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulate_scrolling_cadence() {
        let engine = engine(AnimationConfig::deterministic());
        let start = Instant::now();
        let rendered = engine.simulate_scrolling(["A", "B", "C"]).await;
        assert_eq!(rendered, 3);
        assert_eq!(start.elapsed(), Duration::from_millis(400));
        assert_eq!(
            engine.screen().lock().texts(PaneId::CONTENT),
            vec!["A", "B", "C"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulate_scrolling_corrupts_when_forced() {
        let engine = engine(AnimationConfig {
            scroll_corruption_chance: 1.0,
            scroll_corruption_intensity: 1.0,
            ..AnimationConfig::deterministic()
        });
        engine.simulate_scrolling(["READY"]).await;
        let texts = engine.screen().lock().texts(PaneId::CONTENT);
        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0].chars().count(), 5);
        assert!(texts[0].chars().all(effects::is_glitch_char));
    }

    #[tokio::test(start_paused = true)]
    async fn test_post_status_applies_style() {
        let engine = engine(AnimationConfig::deterministic());
        let id = engine.post_status("AUDIO OFFLINE", LineStyle::Warning);
        assert_eq!(
            engine.screen().lock().line(id).map(|l| l.style),
            Some(LineStyle::Warning)
        );
    }
}
