//! Timestamped activity log shown after each action.

use std::collections::VecDeque;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, ResultExt};

const DEFAULT_CAPACITY: usize = 200;

/// Lines kept in the persisted activity file.
pub const PERSISTED_LINES: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub at: DateTime<Local>,
    pub level: ActivityLevel,
    pub message: String,
}

impl fmt::Display for ActivityEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.at.format("%H:%M:%S"), self.message)
    }
}

/// Bounded list of recent entries, oldest first.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    entries: VecDeque<ActivityEntry>,
    capacity: usize,
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push_at(Local::now(), ActivityLevel::Info, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push_at(Local::now(), ActivityLevel::Error, message);
    }

    pub fn push_at(&mut self, at: DateTime<Local>, level: ActivityLevel, message: impl Into<String>) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(ActivityEntry {
            at,
            level,
            message: message.into(),
        });
    }

    pub fn entries(&self) -> impl Iterator<Item = &ActivityEntry> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&ActivityEntry> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rendered `[HH:MM:SS] message` lines.
    pub fn lines(&self) -> Vec<String> {
        self.entries.iter().map(ToString::to_string).collect()
    }

    /// Append all entries to a JSON-lines file, keeping its newest
    /// [`PERSISTED_LINES`] lines.
    pub fn append_to(&self, path: &Path) -> Result<()> {
        self.append_bounded(path, PERSISTED_LINES)
    }

    /// Append all entries, then drop the oldest lines beyond `max_lines`.
    ///
    /// The trimmed file replaces the old one through a rename.
    pub fn append_bounded(&self, path: &Path, max_lines: usize) -> Result<()> {
        if self.entries.is_empty() {
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        let existing = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };
        let mut lines: Vec<String> = existing
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(str::to_string)
            .collect();
        for entry in &self.entries {
            lines.push(serde_json::to_string(entry)?);
        }
        let dropped = lines.len().saturating_sub(max_lines.max(1));
        lines.drain(..dropped);

        let tmp = path.with_extension("jsonl.tmp");
        let mut file = fs::File::create(&tmp).with_context(|| format!("creating {}", tmp.display()))?;
        for line in &lines {
            writeln!(file, "{line}").with_context(|| format!("writing {}", tmp.display()))?;
        }
        drop(file);
        fs::rename(&tmp, path).with_context(|| format!("replacing {}", path.display()))?;
        debug!(
            path = %path.display(),
            count = self.entries.len(),
            dropped,
            "Activity appended"
        );
        Ok(())
    }

    /// The last `limit` entries of a file written by [`append_to`](Self::append_to).
    ///
    /// Unparseable lines are skipped; a missing file is an empty log.
    pub fn read_recent(path: &Path, limit: usize) -> Result<Vec<ActivityEntry>> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut entries: Vec<ActivityEntry> = text
            .lines()
            .filter(|l| !l.trim().is_empty())
            .filter_map(|l| match serde_json::from_str(l) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "Skipping malformed activity line");
                    None
                }
            })
            .collect();
        let skip = entries.len().saturating_sub(limit);
        entries.drain(..skip);
        Ok(entries)
    }
}
