//! Command parsing and fixed command text

use chrono::NaiveDateTime;

/// Hint shown after an unrecognized command
pub const HELP_HINT: &str = "TYPE \"HELP\" FOR AVAILABLE COMMANDS";

/// Notice shown when content is not ready yet
pub const LOADING_NOTICE: &str = "LOADING DATA...";

/// Lines scrolled by `help`
pub const HELP_LINES: &[&str] = &[
    "AVAILABLE COMMANDS:",
    "-------------------",
    "HELP - Display this help message",
    "CLEAR - Clear the terminal",
    "LIST - Show available content",
    "ABOUT - Display information about the artist",
    "DATE - Show current date and time",
    "",
    "MORE COMMANDS MAY BE AVAILABLE...",
];

/// Default lines scrolled by `about`
pub const DEFAULT_ABOUT_LINES: &[&str] = &[
    "ARTIST INFORMATION",
    "-----------------",
    "NAME: [ARTIST NAME]",
    "GENRE: ELECTRONIC / EXPERIMENTAL",
    "ESTABLISHED: 2006",
    "",
    "FIND MORE INFORMATION AT:",
    "INSTAGRAM: @[HANDLE]",
    "TWITTER: @[HANDLE]",
    "",
    "STREAMING 24/7 - NEW RELEASES MONTHLY",
];

/// Default lines scrolled at boot
pub const DEFAULT_BANNER_LINES: &[&str] = &[
    "TERMINAL v2.3.1 (c) 1993-2025",
    "SYSTEM READY",
    HELP_HINT,
    "-----------------------------------",
    "",
];

/// A parsed command
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Show the command list
    Help,
    /// Empty the content pane
    Clear,
    /// Show the content listing
    List,
    /// Show the about block
    About,
    /// Show the local date and time
    Date,
    /// Pose the hidden riddle
    Riddle,
    /// Anything else, as typed
    Unknown(String),
    /// Blank input
    Empty,
}

impl Command {
    /// Parse trimmed, case-insensitive input
    ///
    /// `riddle_trigger` is matched the same way and wins over every other
    /// command.
    #[must_use]
    pub fn parse(input: &str, riddle_trigger: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Self::Empty;
        }

        let cmd = trimmed.to_lowercase();
        if cmd == riddle_trigger.trim().to_lowercase() {
            return Self::Riddle;
        }

        match cmd.as_str() {
            "help" => Self::Help,
            "clear" => Self::Clear,
            "list" | "ls" => Self::List,
            "about" => Self::About,
            "date" | "time" => Self::Date,
            _ => Self::Unknown(trimmed.to_string()),
        }
    }

    /// Short name for logging
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::Clear => "clear",
            Self::List => "list",
            Self::About => "about",
            Self::Date => "date",
            Self::Riddle => "riddle",
            Self::Unknown(_) => "unknown",
            Self::Empty => "empty",
        }
    }
}

/// The two lines printed by `date`
#[must_use]
pub fn date_lines(now: NaiveDateTime) -> [String; 2] {
    [
        format!("CURRENT DATE: {}", now.format("%a, %b %-d, %Y")),
        format!("CURRENT TIME: {}", now.format("%I:%M:%S %p")),
    ]
}

/// Owned copy of a fixed line block
pub(crate) fn owned(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|line| (*line).to_string()).collect()
}
