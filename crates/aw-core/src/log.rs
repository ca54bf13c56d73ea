//! Append-only game log and export.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What kind of event a log entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    /// Something a character did.
    Action,
    /// Something a character said.
    Dialogue,
    /// Engine notices.
    System,
    /// Check rolls and damage.
    Combat,
    /// Items gained or used.
    Loot,
    /// A new scene description.
    Scene,
    /// The player picked a choice.
    Choice,
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Action => "action",
            Self::Dialogue => "dialogue",
            Self::System => "system",
            Self::Combat => "combat",
            Self::Loot => "loot",
            Self::Scene => "scene",
            Self::Choice => "choice",
        };
        f.pad(s)
    }
}

/// One timestamped line of the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Category.
    #[serde(rename = "type")]
    pub kind: LogKind,
    /// Display text.
    pub content: String,
    /// When it was appended.
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    /// An entry stamped with the current time.
    pub fn now(kind: LogKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// The chronological record of a session. Entries are never edited or removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameLog {
    entries: Vec<LogEntry>,
}

impl GameLog {
    /// An empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry stamped now.
    pub fn append(&mut self, kind: LogKind, content: impl Into<String>) {
        self.entries.push(LogEntry::now(kind, content));
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The last `n` entries, oldest first.
    pub fn recent(&self, n: usize) -> &[LogEntry] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }

    /// Export the log as markdown.
    pub fn export_markdown(&self) -> String {
        let mut out = String::from("# Adventure Log\n\n");
        for entry in &self.entries {
            let time = entry.timestamp.format("%H:%M:%S");
            match entry.kind {
                LogKind::Scene => {
                    out.push_str(&format!("---\n\n{}\n\n", entry.content));
                }
                LogKind::Dialogue => {
                    out.push_str(&format!("> {}\n\n", entry.content));
                }
                LogKind::System => {
                    out.push_str(&format!("*{}* `{time}`\n\n", entry.content));
                }
                LogKind::Combat | LogKind::Loot => {
                    out.push_str(&format!("**{}**: {} `{time}`\n\n", entry.kind, entry.content));
                }
                LogKind::Action | LogKind::Choice => {
                    out.push_str(&format!("- {} `{time}`\n\n", entry.content));
                }
            }
        }
        out
    }

    /// Export the log as plain text.
    pub fn export_text(&self) -> String {
        let mut out = String::from("Adventure Log\n=============\n\n");
        for entry in &self.entries {
            let time = entry.timestamp.format("%H:%M:%S");
            out.push_str(&format!("[{time}] {:<8} {}\n", entry.kind, entry.content));
        }
        out
    }
}
