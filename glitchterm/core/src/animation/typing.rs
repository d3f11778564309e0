//! Typewriter Sessions
//!
//! Explicit step machines for the typing effects. A session knows nothing
//! about timers: the engine calls [`TypingSession::tick`] once per interval
//! and stops when the session reports a terminal step. Keeping the step
//! function synchronous makes the ordering rules testable without a clock.

use std::time::Duration;

use crate::screen::{LineId, PaneId, Screen};

/// Result of one typing tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypingStep {
    /// Irregular pause, nothing revealed
    Stutter,
    /// One character revealed
    Typed(char),
    /// Every character is on screen
    Finished,
    /// The target line is gone
    Detached,
}

impl TypingStep {
    /// Whether the session is over after this step
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Detached)
    }
}

/// How a typing operation ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypingOutcome {
    /// The full text was revealed
    Completed,
    /// The target was removed before typing finished
    TargetDetached,
}

/// State of a single typewriter operation
#[derive(Clone, Debug)]
pub struct TypingSession {
    target: LineId,
    chars: Vec<char>,
    cursor: usize,
    speed: Duration,
    stutter_probability: f64,
}

impl TypingSession {
    /// Create a session that will type `text` into `target`
    pub fn new(target: LineId, text: &str, speed: Duration, stutter_probability: f64) -> Self {
        Self {
            target,
            chars: text.chars().collect(),
            cursor: 0,
            speed,
            stutter_probability,
        }
    }

    /// Target line
    #[must_use]
    pub fn target(&self) -> LineId {
        self.target
    }

    /// Characters revealed so far
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Total characters to reveal
    #[must_use]
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// Whether there is nothing to type
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Interval between ticks
    #[must_use]
    pub fn speed(&self) -> Duration {
        self.speed
    }

    /// Per-tick probability of a stutter
    #[must_use]
    pub fn stutter_probability(&self) -> f64 {
        self.stutter_probability
    }

    /// Reset the target to empty text before the first tick
    ///
    /// Returns `false` if the target is already gone.
    pub fn begin(&self, screen: &mut Screen) -> bool {
        screen.set_text(self.target, String::new())
    }

    /// Advance one tick
    ///
    /// `stutter` is the outcome of this tick's coin flip. The stutter check
    /// comes first, so even the completing tick can be skipped.
    pub fn tick(&mut self, stutter: bool, screen: &mut Screen) -> TypingStep {
        if stutter {
            return TypingStep::Stutter;
        }
        let Some(&ch) = self.chars.get(self.cursor) else {
            return TypingStep::Finished;
        };
        if !screen.push_char(self.target, ch) {
            return TypingStep::Detached;
        }
        self.cursor += 1;
        TypingStep::Typed(ch)
    }
}

/// State of a multi-line typing sequence
#[derive(Clone, Debug)]
pub struct SequenceSession {
    pane: PaneId,
    lines: Vec<String>,
    index: usize,
    speed: Duration,
    line_delay: Duration,
}

impl SequenceSession {
    /// Create a sequence over `lines`, typed into `pane`
    pub fn new(pane: PaneId, lines: Vec<String>, speed: Duration, line_delay: Duration) -> Self {
        Self {
            pane,
            lines,
            index: 0,
            speed,
            line_delay,
        }
    }

    /// Target pane
    #[must_use]
    pub fn pane(&self) -> PaneId {
        self.pane
    }

    /// Typing speed for every line
    #[must_use]
    pub fn speed(&self) -> Duration {
        self.speed
    }

    /// Pause after each line completes
    #[must_use]
    pub fn line_delay(&self) -> Duration {
        self.line_delay
    }

    /// Lines already handed out
    #[must_use]
    pub fn completed(&self) -> usize {
        self.index
    }

    /// Hand out the next line, strictly in order
    pub fn next_line(&mut self) -> Option<String> {
        let line = self.lines.get(self.index)?.clone();
        self.index += 1;
        Some(line)
    }
}
