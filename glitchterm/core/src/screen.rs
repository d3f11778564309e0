//! Screen Model
//!
//! The output surface the engine and interpreter write to. A screen holds
//! ordered display lines grouped into panes, a one-line ticker and an
//! optional dialog. Hosts render it by draining [`ScreenEvent`]s from the
//! channel returned by [`Screen::with_events`].
//!
//! # Design Philosophy
//!
//! The host is a thin renderer. It never decides what a line says or when
//! it disappears; it only reacts to events. Every mutation here is a single
//! synchronous step, observable as soon as the call returns.
//!
//! Operations that address a line by id report whether the line was still
//! attached. A missing line is never an error: effects racing a `clear`
//! simply stop touching it.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Shared, lockable screen handle
pub type SharedScreen = Arc<Mutex<Screen>>;

/// Line identifier, monotonically increasing in insertion order
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LineId(pub u64);

impl std::fmt::Display for LineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line#{}", self.0)
    }
}

/// Pane identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PaneId(pub u32);

impl PaneId {
    /// The main scrollback pane
    pub const CONTENT: PaneId = PaneId(0);
}

/// Structural kind of a line
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineTag {
    /// Plain text line
    #[default]
    Line,
    /// Section heading
    Heading,
}

/// Style hook consumed by the renderer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineStyle {
    /// Default foreground
    #[default]
    Normal,
    /// Echoed commands and celebratory output
    Highlight,
    /// Status warnings from side systems
    Warning,
    /// Hidden-item placeholders
    Placeholder,
}

/// Lifecycle of a display line
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineState {
    /// Created, still being typed
    Pending,
    /// Fully rendered
    Visible,
    /// Crashing out, detach scheduled
    Removing,
    /// Detached from the screen
    Removed,
}

/// One character of a glitching line
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Glyph {
    /// The character
    pub ch: char,
    /// Cosmetic glitch marker for the renderer
    pub glitching: bool,
}

impl Glyph {
    /// A glyph without the glitch marker
    #[must_use]
    pub const fn plain(ch: char) -> Self {
        Self {
            ch,
            glitching: false,
        }
    }
}

/// A rendered line
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DisplayLine {
    /// Identity and insertion order
    pub id: LineId,
    /// Owning pane
    pub pane: PaneId,
    /// Structural kind
    pub tag: LineTag,
    /// Raw text
    pub text: String,
    /// Per-character markup, present for glitching lines
    pub glyphs: Option<Vec<Glyph>>,
    /// Style hook
    pub style: LineStyle,
    /// Optional link target
    pub link: Option<String>,
    /// Lifecycle state
    pub state: LineState,
}

impl DisplayLine {
    /// Number of glyphs carrying the glitch marker
    #[must_use]
    pub fn glitch_count(&self) -> usize {
        self.glyphs
            .as_ref()
            .map_or(0, |glyphs| glyphs.iter().filter(|g| g.glitching).count())
    }
}

/// The riddle dialog
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dialog {
    /// Question shown above the answer field
    pub question: String,
}

/// Change notifications for a renderer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ScreenEvent {
    /// A line was appended
    LineAdded {
        /// Snapshot at insertion time
        line: DisplayLine,
    },
    /// A character was typed onto the end of a line
    CharTyped {
        /// Target line
        id: LineId,
        /// The new character
        ch: char,
    },
    /// A line's text, style, link or state changed
    LineUpdated {
        /// Snapshot after the change
        line: DisplayLine,
    },
    /// A line was detached
    LineRemoved {
        /// The detached line
        id: LineId,
    },
    /// Every line of a pane was detached
    PaneCleared {
        /// The cleared pane
        pane: PaneId,
    },
    /// The pane should show its last line
    ScrolledToBottom {
        /// Scrolled pane
        pane: PaneId,
    },
    /// Ticker text replaced
    TickerChanged {
        /// New ticker text
        text: String,
    },
    /// Dialog shown
    DialogOpened {
        /// Question text
        question: String,
    },
    /// Dialog hidden
    DialogClosed,
}

/// In-memory display surface
#[derive(Debug)]
pub struct Screen {
    lines: Vec<DisplayLine>,
    next_line: u64,
    next_pane: u32,
    ticker: String,
    dialog: Option<Dialog>,
    scrolls: usize,
    events: Option<mpsc::UnboundedSender<ScreenEvent>>,
}

impl Screen {
    /// Create a screen without an event listener
    #[must_use]
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            next_line: 0,
            next_pane: 1,
            ticker: String::new(),
            dialog: None,
            scrolls: 0,
            events: None,
        }
    }

    /// Create a screen that reports every change on the returned channel
    #[must_use]
    pub fn with_events() -> (Self, mpsc::UnboundedReceiver<ScreenEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut screen = Self::new();
        screen.events = Some(tx);
        (screen, rx)
    }

    /// Wrap into a shared handle
    #[must_use]
    pub fn shared(self) -> SharedScreen {
        Arc::new(Mutex::new(self))
    }

    /// Allocate an additional pane
    pub fn create_pane(&mut self) -> PaneId {
        let pane = PaneId(self.next_pane);
        self.next_pane += 1;
        pane
    }

    // =========================================================================
    // Lines
    // =========================================================================

    /// Append a plain line
    pub fn append(&mut self, pane: PaneId, tag: LineTag, text: impl Into<String>) -> LineId {
        self.insert(pane, tag, text.into(), None, LineState::Visible)
    }

    /// Append an empty line that is about to be typed
    pub fn append_pending(&mut self, pane: PaneId) -> LineId {
        self.insert(pane, LineTag::Line, String::new(), None, LineState::Pending)
    }

    /// Append a line made of individually marked glyphs
    pub fn append_glyphs(&mut self, pane: PaneId, tag: LineTag, glyphs: Vec<Glyph>) -> LineId {
        let text = glyphs.iter().map(|g| g.ch).collect();
        self.insert(pane, tag, text, Some(glyphs), LineState::Visible)
    }

    fn insert(
        &mut self,
        pane: PaneId,
        tag: LineTag,
        text: String,
        glyphs: Option<Vec<Glyph>>,
        state: LineState,
    ) -> LineId {
        let id = LineId(self.next_line);
        self.next_line += 1;
        let line = DisplayLine {
            id,
            pane,
            tag,
            text,
            glyphs,
            style: LineStyle::Normal,
            link: None,
            state,
        };
        self.emit(ScreenEvent::LineAdded { line: line.clone() });
        self.lines.push(line);
        id
    }

    /// Look up an attached line
    #[must_use]
    pub fn line(&self, id: LineId) -> Option<&DisplayLine> {
        self.lines.iter().find(|l| l.id == id)
    }

    /// Whether the line is still attached
    #[must_use]
    pub fn contains(&self, id: LineId) -> bool {
        self.line(id).is_some()
    }

    /// Lifecycle state of any line ever created here
    ///
    /// Detached ids report [`LineState::Removed`]; ids never issued by this
    /// screen report `None`.
    #[must_use]
    pub fn state_of(&self, id: LineId) -> Option<LineState> {
        match self.line(id) {
            Some(line) => Some(line.state),
            None if id.0 < self.next_line => Some(LineState::Removed),
            None => None,
        }
    }

    /// Attached lines of a pane, in insertion order
    pub fn lines(&self, pane: PaneId) -> impl Iterator<Item = &DisplayLine> {
        self.lines.iter().filter(move |l| l.pane == pane)
    }

    /// Texts of a pane's lines, in insertion order
    #[must_use]
    pub fn texts(&self, pane: PaneId) -> Vec<String> {
        self.lines(pane).map(|l| l.text.clone()).collect()
    }

    /// Number of attached lines in a pane
    #[must_use]
    pub fn line_count(&self, pane: PaneId) -> usize {
        self.lines(pane).count()
    }

    /// Replace a line's text, dropping any glyph markup
    pub fn set_text(&mut self, id: LineId, text: impl Into<String>) -> bool {
        let text = text.into();
        self.update(id, |line| {
            line.text = text;
            line.glyphs = None;
        })
    }

    /// Type one character onto the end of a line
    pub fn push_char(&mut self, id: LineId, ch: char) -> bool {
        let Some(line) = self.lines.iter_mut().find(|l| l.id == id) else {
            return false;
        };
        line.text.push(ch);
        if let Some(glyphs) = line.glyphs.as_mut() {
            glyphs.push(Glyph::plain(ch));
        }
        self.emit(ScreenEvent::CharTyped { id, ch });
        true
    }

    /// Change a line's style hook
    pub fn set_style(&mut self, id: LineId, style: LineStyle) -> bool {
        self.update(id, |line| line.style = style)
    }

    /// Attach a link target to a line
    pub fn set_link(&mut self, id: LineId, link: impl Into<String>) -> bool {
        let link = link.into();
        self.update(id, |line| line.link = Some(link))
    }

    /// Move a line through its lifecycle
    ///
    /// Use [`Screen::detach`] to reach [`LineState::Removed`].
    pub fn set_state(&mut self, id: LineId, state: LineState) -> bool {
        if state == LineState::Removed {
            return self.detach(id);
        }
        self.update(id, |line| line.state = state)
    }

    fn update(&mut self, id: LineId, f: impl FnOnce(&mut DisplayLine)) -> bool {
        let Some(line) = self.lines.iter_mut().find(|l| l.id == id) else {
            return false;
        };
        f(line);
        let snapshot = line.clone();
        self.emit(ScreenEvent::LineUpdated { line: snapshot });
        true
    }

    /// Detach a line, returning whether it was still attached
    pub fn detach(&mut self, id: LineId) -> bool {
        let Some(pos) = self.lines.iter().position(|l| l.id == id) else {
            return false;
        };
        self.lines.remove(pos);
        self.emit(ScreenEvent::LineRemoved { id });
        true
    }

    /// Detach every line of a pane
    pub fn clear(&mut self, pane: PaneId) {
        self.lines.retain(|l| l.pane != pane);
        self.emit(ScreenEvent::PaneCleared { pane });
    }

    /// Request that the pane show its newest line
    pub fn scroll_to_bottom(&mut self, pane: PaneId) {
        self.scrolls += 1;
        self.emit(ScreenEvent::ScrolledToBottom { pane });
    }

    /// How many scroll-to-bottom requests have been applied
    #[must_use]
    pub fn scroll_count(&self) -> usize {
        self.scrolls
    }

    // =========================================================================
    // Ticker and dialog
    // =========================================================================

    /// Replace the ticker text
    pub fn set_ticker(&mut self, text: impl Into<String>) {
        let text = text.into();
        if self.ticker == text {
            return;
        }
        self.ticker.clone_from(&text);
        self.emit(ScreenEvent::TickerChanged { text });
    }

    /// Current ticker text
    #[must_use]
    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    /// Show the dialog with a question
    pub fn open_dialog(&mut self, question: impl Into<String>) {
        let question = question.into();
        self.dialog = Some(Dialog {
            question: question.clone(),
        });
        self.emit(ScreenEvent::DialogOpened { question });
    }

    /// Hide the dialog, returning whether it was open
    pub fn close_dialog(&mut self) -> bool {
        if self.dialog.take().is_none() {
            return false;
        }
        self.emit(ScreenEvent::DialogClosed);
        true
    }

    /// The open dialog, if any
    #[must_use]
    pub fn dialog(&self) -> Option<&Dialog> {
        self.dialog.as_ref()
    }

    fn emit(&mut self, event: ScreenEvent) {
        if let Some(tx) = &self.events {
            if tx.send(event).is_err() {
                tracing::debug!("Screen event listener dropped, detaching");
                self.events = None;
            }
        }
    }
}

impl Default for Screen {
    fn default() -> Self {
        Self::new()
    }
}
