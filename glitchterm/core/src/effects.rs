//! Text Effect Primitives
//!
//! Stateless helpers that transform strings. Nothing here touches the screen
//! or sleeps; the animation engine layers timing on top.

use unicode_width::UnicodeWidthStr;

use crate::random::RandomSource;

/// Characters a corrupted position may be replaced with
pub const GLITCH_CHARS: &[char] = &[
    '@', '#', '$', '%', '&', '*', '!', '?', '<', '>', '/', '\\', '|', '[', ']', '{', '}', '~', '-',
    '_', '=', '+',
];

/// Minimum width of a hidden-item placeholder
pub const MIN_PLACEHOLDER_WIDTH: usize = 5;

/// Default corruption intensity
pub const DEFAULT_INTENSITY: f64 = 0.1;

/// Whether a character belongs to the glitch set
#[must_use]
pub fn is_glitch_char(ch: char) -> bool {
    GLITCH_CHARS.contains(&ch)
}

/// Lazy corruption of a string, one character at a time
///
/// Created by [`corrupt`]. Yields exactly one output character per input
/// character, so the char length is always preserved.
pub struct Corrupt<'a> {
    chars: std::str::Chars<'a>,
    intensity: f64,
    rng: &'a mut dyn RandomSource,
}

impl Iterator for Corrupt<'_> {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        if self.rng.chance(self.intensity) {
            Some(GLITCH_CHARS[self.rng.index(GLITCH_CHARS.len())])
        } else {
            Some(ch)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chars.size_hint()
    }
}

/// Start a lazy corruption of `text`
pub fn corrupt<'a>(text: &'a str, intensity: f64, rng: &'a mut dyn RandomSource) -> Corrupt<'a> {
    Corrupt {
        chars: text.chars(),
        intensity,
        rng,
    }
}

/// Replace each character with a glitch character with probability `intensity`
pub fn corrupt_text(text: &str, intensity: f64, rng: &mut dyn RandomSource) -> String {
    corrupt(text, intensity, rng).collect()
}

/// A run of `len` underscores
#[must_use]
pub fn placeholder(len: usize) -> String {
    "_".repeat(len)
}

/// Placeholder standing in for a hidden title
///
/// Matches the title's display width, never narrower than
/// [`MIN_PLACEHOLDER_WIDTH`].
#[must_use]
pub fn placeholder_for(title: &str) -> String {
    placeholder(title.width().max(MIN_PLACEHOLDER_WIDTH))
}
