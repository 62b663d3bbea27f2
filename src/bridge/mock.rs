//! Mock command bridge for unit and integration testing.
//!
//! Emulates the handful of commands the shell backend issues (`cat`,
//! `printf '%s' … > path`, `chcon`, `mkdir -p`) over an in-memory file map and
//! records every command for assertions.
//!
//! # Example
//!
//! ```rust,ignore
//! use copg::bridge::mock::MockExecutor;
//!
//! let mock = MockExecutor::new().with_file("/data/adb/COPG.json", "{}\n");
//! mock.fail_matching("chcon", "chcon: Operation not permitted");
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::trace;

use super::CommandExecutor;
use crate::error::{CopgError, Result};

#[derive(Debug, Default)]
struct MockState {
    files: HashMap<String, String>,
    commands: Vec<String>,
    fail_next: Option<String>,
    fail_matching: Vec<(String, String)>,
    unavailable: bool,
}

/// In-memory stand-in for the privileged shell.
///
/// Clones share state, so a test can keep one handle while the store owns
/// another.
#[derive(Debug, Clone, Default)]
pub struct MockExecutor {
    state: Arc<Mutex<MockState>>,
}

impl MockExecutor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file.
    #[must_use]
    pub fn with_file(self, path: &str, contents: &str) -> Self {
        self.set_file(path, contents);
        self
    }

    pub fn set_file(&self, path: &str, contents: &str) {
        self.lock().files.insert(path.to_string(), contents.to_string());
    }

    /// Current contents of an emulated file.
    #[must_use]
    pub fn file(&self, path: &str) -> Option<String> {
        self.lock().files.get(path).cloned()
    }

    /// Paths of all emulated files, sorted.
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.lock().files.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Fail the next command with the given stderr.
    pub fn fail_next(&self, stderr: &str) {
        self.lock().fail_next = Some(stderr.to_string());
    }

    /// Fail every command containing `needle` until [`clear_failures`](Self::clear_failures).
    pub fn fail_matching(&self, needle: &str, stderr: &str) {
        self.lock()
            .fail_matching
            .push((needle.to_string(), stderr.to_string()));
    }

    pub fn clear_failures(&self) {
        let mut state = self.lock();
        state.fail_next = None;
        state.fail_matching.clear();
    }

    /// Behave as if the host bridge is missing entirely.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    /// All commands received so far.
    #[must_use]
    pub fn commands(&self) -> Vec<String> {
        self.lock().commands.clone()
    }

    pub fn clear_commands(&self) {
        self.lock().commands.clear();
    }

    /// Assert a command starting with `prefix` was executed.
    ///
    /// # Panics
    ///
    /// Panics if no recorded command matches.
    pub fn assert_ran(&self, prefix: &str) {
        let commands = self.commands();
        assert!(
            commands.iter().any(|c| c.starts_with(prefix)),
            "Expected a command starting with {prefix:?} in: {commands:#?}",
        );
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn failed(command: &str, stderr: String) -> CopgError {
        CopgError::CommandFailed {
            command: command.to_string(),
            code: "1".to_string(),
            stderr,
        }
    }

    fn run(&self, command: &str) -> Result<String> {
        let mut state = self.lock();
        state.commands.push(command.to_string());

        if state.unavailable {
            return Err(CopgError::BridgeUnavailable(
                "mock bridge disabled".to_string(),
            ));
        }
        if let Some(stderr) = state.fail_next.take() {
            return Err(Self::failed(command, stderr));
        }
        if let Some((_, stderr)) = state
            .fail_matching
            .iter()
            .find(|(needle, _)| command.contains(needle.as_str()))
        {
            return Err(Self::failed(command, stderr.clone()));
        }

        let words = split_words(command)
            .ok_or_else(|| Self::failed(command, "syntax error: unterminated quote".into()))?;
        trace!(?words, "Mock command");

        match words.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
            ["cat", path] => state
                .files
                .get(*path)
                .cloned()
                .ok_or_else(|| Self::failed(command, format!("cat: {path}: No such file or directory"))),
            ["printf", "%s", content, ">", path] => {
                state.files.insert((*path).to_string(), (*content).to_string());
                Ok(String::new())
            }
            ["chcon", _context, path] => {
                if state.files.contains_key(*path) {
                    Ok(String::new())
                } else {
                    Err(Self::failed(command, format!("chcon: {path}: No such file or directory")))
                }
            }
            // mkdir -p and anything else succeed silently
            _ => Ok(String::new()),
        }
    }
}

impl CommandExecutor for MockExecutor {
    async fn execute(&self, command: &str) -> Result<String> {
        self.run(command)
    }
}

/// Split a command line into words, honouring single quotes and backslash escapes.
///
/// Returns `None` for an unterminated quote.
fn split_words(command: &str) -> Option<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = command.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '\'' => {
                in_word = true;
                loop {
                    match chars.next()? {
                        '\'' => break,
                        c => current.push(c),
                    }
                }
            }
            '\\' => {
                in_word = true;
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                in_word = true;
                current.push(c);
            }
        }
    }
    if in_word {
        words.push(current);
    }
    Some(words)
}
