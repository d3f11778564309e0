//! Content Provider
//!
//! The terminal lists content items, shows a ticker and poses a riddle.
//! All of it comes from a [`ContentProvider`]. The provider may not be ready
//! yet (the data source is still loading), and every accessor has a defined
//! fallback for that case instead of an error.
//!
//! # Sources
//!
//! [`StaticContent`] holds a [`ContentSnapshot`] in memory. Snapshots can be
//! built from:
//! - a TOML content file ([`ContentSnapshot::from_toml_str`])
//! - a spreadsheet-style value grid: a header row, then rows tagged by a
//!   `type` column of `track`, `ticker` or `riddle`
//!   ([`ContentSnapshot::from_sheet_values`], [`ContentSnapshot::from_sheet_json`])
//!
//! Fetching the grid from a remote sheet is left to the host.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::random::RandomSource;

/// Link value meaning "no link"
pub const NO_LINK: &str = "#";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while loading content
#[derive(Debug, Error)]
pub enum ContentError {
    /// Failed to read a content file
    #[error("Failed to read content file at {path}: {source}")]
    Read {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML content
    #[error("Failed to parse TOML content: {0}")]
    Toml(#[from] toml::de::Error),

    /// Failed to parse sheet JSON
    #[error("Failed to parse sheet JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The sheet header lacks a required column
    #[error("Sheet header is missing the '{0}' column")]
    MissingColumn(&'static str),
}

// =============================================================================
// Data Types
// =============================================================================

/// One listed item
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Display title
    pub title: String,
    /// URL, or `#` for none
    #[serde(default)]
    pub link: Option<String>,
    /// Whether the title is shown or replaced by a placeholder
    #[serde(default)]
    pub visible: bool,
}

impl ContentItem {
    /// Create an item
    pub fn new(title: impl Into<String>, link: Option<&str>, visible: bool) -> Self {
        Self {
            title: title.into(),
            link: link.map(str::to_string),
            visible,
        }
    }

    /// The link, unless it is empty or the `#` placeholder
    #[must_use]
    pub fn href(&self) -> Option<&str> {
        self.link
            .as_deref()
            .filter(|link| !link.is_empty() && *link != NO_LINK)
    }
}

/// The hidden riddle
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Riddle {
    /// Question shown in the dialog
    pub question: String,
    /// Expected answer, compared case- and whitespace-insensitively
    pub answer: String,
    /// Line shown after a correct answer
    pub reward: String,
}

impl Riddle {
    /// Riddle used when the provider has none
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            question: "WHAT IS YOUR FAVORITE COLOR?".to_string(),
            answer: "blue".to_string(),
            reward: "ACCESS GRANTED".to_string(),
        }
    }

    /// Whether `answer` matches, ignoring case and surrounding whitespace
    #[must_use]
    pub fn is_correct(&self, answer: &str) -> bool {
        normalize(answer) == normalize(&self.answer)
    }

    /// A riddle needs both a question and an answer to be posed
    #[must_use]
    pub fn is_usable(&self) -> bool {
        !self.question.trim().is_empty() && !self.answer.trim().is_empty()
    }
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Everything a ready provider knows
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentSnapshot {
    /// Ordered items
    pub items: Vec<ContentItem>,
    /// Ticker text
    pub ticker: String,
    /// Riddle, if the source defines one
    pub riddle: Option<Riddle>,
}

impl ContentSnapshot {
    /// Number of visible items
    #[must_use]
    pub fn visible_count(&self) -> usize {
        self.items.iter().filter(|item| item.visible).count()
    }

    /// Parse a TOML content document
    ///
    /// ```toml
    /// ticker = "WELCOME TO THE TERMINAL //"
    ///
    /// [[items]]
    /// title = "STATIC NOISE"
    /// link = "#"
    /// visible = true
    ///
    /// [riddle]
    /// question = "WHAT GETS BIGGER THE MORE YOU TAKE AWAY?"
    /// answer = "hole"
    /// reward = "UNLOCKING HIDDEN TRACK: EVENT HORIZON"
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::Toml`] if the document is malformed.
    pub fn from_toml_str(text: &str) -> Result<Self, ContentError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a TOML content file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ContentError> {
        let text = std::fs::read_to_string(path).map_err(|e| ContentError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let snapshot = Self::from_toml_str(&text)?;
        tracing::info!(
            path = %path.display(),
            items = snapshot.items.len(),
            "Loaded content file"
        );
        Ok(snapshot)
    }

    /// Parse a value grid: header row first, one record per following row
    ///
    /// Rows are routed by their `type` cell. Unknown types are skipped.
    /// Missing cells read as empty; `visible` is true only for `TRUE`.
    /// The last `ticker` and `riddle` rows win.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::MissingColumn`] if the header has no `type`.
    pub fn from_sheet_values(values: &[Vec<String>]) -> Result<Self, ContentError> {
        let mut snapshot = Self::default();
        let Some((header, rows)) = values.split_first() else {
            return Ok(snapshot);
        };
        if !header.iter().any(|h| h == "type") {
            return Err(ContentError::MissingColumn("type"));
        }

        for row in rows {
            let record: HashMap<&str, &str> = header
                .iter()
                .zip(row.iter())
                .map(|(h, v)| (h.as_str(), v.as_str()))
                .collect();
            let cell = |key: &str| record.get(key).copied().unwrap_or_default().to_string();

            match record.get("type").copied() {
                Some("track") => snapshot.items.push(ContentItem {
                    title: cell("title"),
                    link: Some(record.get("url").copied().unwrap_or(NO_LINK).to_string()),
                    visible: record.get("visible").copied() == Some("TRUE"),
                }),
                Some("ticker") => snapshot.ticker = cell("content"),
                Some("riddle") => {
                    snapshot.riddle = Some(Riddle {
                        question: cell("question"),
                        answer: cell("answer"),
                        reward: cell("reward"),
                    });
                }
                other => {
                    tracing::debug!(row_type = ?other, "Skipping sheet row");
                }
            }
        }

        Ok(snapshot)
    }

    /// Parse a sheets-style JSON response: `{"values": [[...], ...]}`
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the header is incomplete.
    pub fn from_sheet_json(json: &str) -> Result<Self, ContentError> {
        #[derive(Deserialize)]
        struct SheetResponse {
            #[serde(default)]
            values: Vec<Vec<String>>,
        }

        let response: SheetResponse = serde_json::from_str(json)?;
        Self::from_sheet_values(&response.values)
    }

    /// Built-in demo catalogue
    #[must_use]
    pub fn demo() -> Self {
        let items = vec![
            ContentItem::new("STATIC NOISE", Some(NO_LINK), true),
            ContentItem::new("MIDNIGHT DRIVE", Some("https://example.com"), true),
            ContentItem::new("DARK MATTER", Some("https://example.com"), false),
            ContentItem::new("ECHO CHAMBER", Some("https://example.com"), true),
            ContentItem::new("DIGITAL DREAMS", Some("https://example.com"), true),
            ContentItem::new("VOID WALKER", Some(NO_LINK), false),
            ContentItem::new("SYSTEM FAILURE", Some("https://example.com"), true),
            ContentItem::new("LOST SIGNAL", Some("https://example.com"), false),
        ];
        Self {
            items,
            ticker: "WELCOME TO THE TERMINAL // MUSIC STREAMING LIVE 24/7 // USE HEADPHONES FOR BEST EXPERIENCE // EXPLORE THE SYSTEM // FIND THE HIDDEN TRACKS // STAY TUNED // SYSTEM ONLINE SINCE 2006 //".to_string(),
            riddle: Some(Riddle {
                question: "WHAT GETS BIGGER THE MORE YOU TAKE AWAY?".to_string(),
                answer: "hole".to_string(),
                reward: "UNLOCKING HIDDEN TRACK: EVENT HORIZON".to_string(),
            }),
        }
    }
}

// =============================================================================
// Provider Contract
// =============================================================================

/// Result of revealing a hidden item
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RevealOutcome {
    /// An item was flipped to visible
    Revealed {
        /// Position in the item list
        index: usize,
        /// Title of the revealed item
        title: String,
    },
    /// Every item is already visible
    NothingHidden,
    /// The provider has no data yet
    NotReady,
}

impl RevealOutcome {
    /// Whether an item changed
    #[must_use]
    pub fn is_revealed(&self) -> bool {
        matches!(self, Self::Revealed { .. })
    }
}

/// Source of listed items, ticker text and the riddle
///
/// Only [`snapshot`](Self::snapshot) and
/// [`reveal_random_hidden`](Self::reveal_random_hidden) are required. The
/// remaining accessors bake in the fallbacks used before data is ready.
pub trait ContentProvider: Send + Sync {
    /// Current data, or `None` while loading
    fn snapshot(&self) -> Option<ContentSnapshot>;

    /// Flip one hidden item, chosen uniformly, to visible
    fn reveal_random_hidden(&self, rng: &mut dyn RandomSource) -> RevealOutcome;

    /// Whether data has arrived
    fn is_ready(&self) -> bool {
        self.snapshot().is_some()
    }

    /// Items in order, empty while loading
    fn items(&self) -> Vec<ContentItem> {
        self.snapshot().map(|s| s.items).unwrap_or_default()
    }

    /// Ticker text, empty while loading
    fn ticker(&self) -> String {
        self.snapshot().map(|s| s.ticker).unwrap_or_default()
    }

    /// The riddle, or [`Riddle::fallback`] if there is no usable one
    fn riddle(&self) -> Riddle {
        match self.snapshot().and_then(|s| s.riddle) {
            Some(riddle) if riddle.is_usable() => riddle,
            _ => {
                tracing::warn!("No usable riddle from content provider, using fallback");
                Riddle::fallback()
            }
        }
    }
}

/// In-memory provider
#[derive(Debug, Default)]
pub struct StaticContent {
    data: RwLock<Option<ContentSnapshot>>,
}

impl StaticContent {
    /// A provider that is still loading
    #[must_use]
    pub fn pending() -> Self {
        Self::default()
    }

    /// A provider that is ready with `snapshot`
    #[must_use]
    pub fn ready(snapshot: ContentSnapshot) -> Self {
        Self {
            data: RwLock::new(Some(snapshot)),
        }
    }

    /// Deliver data, making the provider ready
    pub fn load(&self, snapshot: ContentSnapshot) {
        tracing::debug!(items = snapshot.items.len(), "Content provider ready");
        *self.data.write() = Some(snapshot);
    }
}

impl ContentProvider for StaticContent {
    fn snapshot(&self) -> Option<ContentSnapshot> {
        self.data.read().clone()
    }

    fn is_ready(&self) -> bool {
        self.data.read().is_some()
    }

    fn reveal_random_hidden(&self, rng: &mut dyn RandomSource) -> RevealOutcome {
        let mut guard = self.data.write();
        let Some(snapshot) = guard.as_mut() else {
            return RevealOutcome::NotReady;
        };

        let hidden: Vec<usize> = snapshot
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| !item.visible)
            .map(|(index, _)| index)
            .collect();
        if hidden.is_empty() {
            return RevealOutcome::NothingHidden;
        }

        let index = hidden[rng.index(hidden.len())];
        let item = &mut snapshot.items[index];
        item.visible = true;
        tracing::info!(index, title = %item.title, "Revealed hidden item");
        RevealOutcome::Revealed {
            index,
            title: item.title.clone(),
        }
    }
}
