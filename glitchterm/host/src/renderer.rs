//! Stdout renderer for screen events
//!
//! Turns the core's [`ScreenEvent`] stream into styled terminal output.
//! Building output is synchronous and writes into a byte buffer; only
//! [`run`] touches stdout, asynchronously.
//!
//! Appended lines are staged until their scroll request arrives, so the
//! style and link set right after an append are already applied when the
//! line is printed. Lines being typed stream character by character.

use std::io;

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc::UnboundedReceiver;

use glitchterm_core::{DisplayLine, LineId, LineState, LineStyle, LineTag, PaneId, ScreenEvent};

/// Width used when the terminal size is unknown
pub const FALLBACK_WIDTH: usize = 80;

/// Builds styled output for each screen event
#[derive(Debug)]
pub struct Renderer {
    width: usize,
    staged: Vec<DisplayLine>,
    typing: Option<LineId>,
}

impl Renderer {
    /// Create a renderer wrapping at `width` columns
    pub fn new(width: usize) -> Self {
        Self {
            width: width.max(1),
            staged: Vec::new(),
            typing: None,
        }
    }

    /// Width of the current terminal, or [`FALLBACK_WIDTH`]
    pub fn terminal_width() -> usize {
        crossterm::terminal::size().map_or(FALLBACK_WIDTH, |(cols, _)| usize::from(cols))
    }

    /// Output for one event
    pub fn render(&mut self, event: &ScreenEvent) -> io::Result<Vec<u8>> {
        let mut out: Vec<u8> = Vec::new();
        match event {
            ScreenEvent::LineAdded { line } if line.state == LineState::Pending => {
                self.flush_into(&mut out)?;
                self.typing = Some(line.id);
            }
            ScreenEvent::LineAdded { line } => {
                self.staged.push(line.clone());
            }
            ScreenEvent::CharTyped { id, ch } => {
                if self.typing == Some(*id) {
                    queue!(out, Print(ch))?;
                }
            }
            ScreenEvent::LineUpdated { line } => {
                if let Some(staged) = self.staged.iter_mut().find(|l| l.id == line.id) {
                    *staged = line.clone();
                } else if self.typing == Some(line.id) && line.state == LineState::Visible {
                    queue!(out, Print("\r\n"))?;
                    self.typing = None;
                }
            }
            ScreenEvent::LineRemoved { id } => {
                self.staged.retain(|l| l.id != *id);
            }
            ScreenEvent::PaneCleared { pane } => {
                self.staged.retain(|l| l.pane != *pane);
                if *pane == PaneId::CONTENT {
                    queue!(out, Clear(ClearType::All), MoveTo(0, 0))?;
                }
            }
            ScreenEvent::ScrolledToBottom { .. } => {
                self.flush_into(&mut out)?;
            }
            ScreenEvent::TickerChanged { text } => {
                self.flush_into(&mut out)?;
                queue!(
                    out,
                    SetAttribute(Attribute::Dim),
                    Print(format!(">> {text}\r\n")),
                    SetAttribute(Attribute::Reset)
                )?;
            }
            ScreenEvent::DialogOpened { question } => {
                self.flush_into(&mut out)?;
                self.dialog(&mut out, question)?;
            }
            ScreenEvent::DialogClosed => {}
        }
        Ok(out)
    }

    /// Print whatever is still staged
    pub fn flush(&mut self) -> io::Result<Vec<u8>> {
        let mut out: Vec<u8> = Vec::new();
        self.flush_into(&mut out)?;
        Ok(out)
    }

    fn flush_into(&mut self, out: &mut Vec<u8>) -> io::Result<()> {
        for line in std::mem::take(&mut self.staged) {
            self.line(out, &line)?;
        }
        Ok(())
    }

    fn line(&self, out: &mut Vec<u8>, line: &DisplayLine) -> io::Result<()> {
        if line.tag == LineTag::Heading {
            queue!(out, SetAttribute(Attribute::Bold))?;
        }
        if let Some(color) = style_color(line.style) {
            queue!(out, SetForegroundColor(color))?;
        }

        match &line.glyphs {
            Some(glyphs) if glyphs.iter().any(|g| g.glitching) => {
                for glyph in glyphs {
                    if glyph.glitching {
                        queue!(
                            out,
                            SetForegroundColor(Color::Magenta),
                            Print(glyph.ch),
                            SetForegroundColor(style_color(line.style).unwrap_or(Color::Reset))
                        )?;
                    } else {
                        queue!(out, Print(glyph.ch))?;
                    }
                }
                queue!(out, Print("\r\n"))?;
            }
            _ if line.text.is_empty() => queue!(out, Print("\r\n"))?,
            _ => {
                for row in textwrap::wrap(&line.text, self.width) {
                    queue!(out, Print(row), Print("\r\n"))?;
                }
            }
        }

        if let Some(link) = &line.link {
            queue!(
                out,
                SetForegroundColor(Color::DarkGrey),
                Print(format!("   -> {link}\r\n"))
            )?;
        }
        queue!(out, ResetColor, SetAttribute(Attribute::Reset))?;
        Ok(())
    }

    fn dialog(&self, out: &mut Vec<u8>, question: &str) -> io::Result<()> {
        let inner = self.width.saturating_sub(4).max(1);
        let rows = textwrap::wrap(question, inner);
        let span = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        let rule = format!("+{}+\r\n", "-".repeat(span + 2));

        queue!(out, SetForegroundColor(Color::Cyan), Print(&rule))?;
        for row in &rows {
            queue!(out, Print(format!("| {row:<span$} |\r\n")))?;
        }
        queue!(out, Print(&rule), Print("ANSWER> "), ResetColor)?;
        Ok(())
    }
}

fn style_color(style: LineStyle) -> Option<Color> {
    match style {
        LineStyle::Normal => None,
        LineStyle::Highlight => Some(Color::Cyan),
        LineStyle::Warning => Some(Color::Yellow),
        LineStyle::Placeholder => Some(Color::DarkGrey),
    }
}

/// Drain events to stdout until the screen goes away
pub async fn run(
    mut events: UnboundedReceiver<ScreenEvent>,
    mut renderer: Renderer,
) -> io::Result<()> {
    let mut stdout = tokio::io::stdout();
    while let Some(event) = events.recv().await {
        let bytes = renderer.render(&event)?;
        if !bytes.is_empty() {
            stdout.write_all(&bytes).await?;
            stdout.flush().await?;
        }
    }
    let rest = renderer.flush()?;
    stdout.write_all(&rest).await?;
    stdout.flush().await
}
