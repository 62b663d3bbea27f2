//! Command bridge: the privileged "run a shell command, get stdout" capability.
//!
//! The host (root manager WebView, `su`, or a plain shell) is abstracted behind
//! [`CommandExecutor`] so the store can be tested against [`mock::MockExecutor`]
//! without a rooted device.

pub mod mock;
mod process;

pub use process::ProcessExecutor;

use crate::error::Result;

/// Asynchronous shell execution.
///
/// Implementations return stdout on a zero exit status and
/// [`CopgError::CommandFailed`](crate::error::CopgError::CommandFailed) otherwise.
/// Commands are opaque: every interpolated value must already be quoted with
/// [`shell_quote`]. Executors never quote again.
///
/// There is no cancellation and no timeout; a hung bridge hangs the caller.
#[allow(async_fn_in_trait)]
pub trait CommandExecutor {
    /// Run `command` and return its standard output.
    async fn execute(&self, command: &str) -> Result<String>;
}

impl<E: CommandExecutor> CommandExecutor for &E {
    async fn execute(&self, command: &str) -> Result<String> {
        (**self).execute(command).await
    }
}

/// Quote a value for a POSIX shell.
///
/// The value is wrapped in single quotes and embedded quotes become `'\''`.
pub fn shell_quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for ch in value.chars() {
        if ch == '\'' {
            quoted.push_str("'\\''");
        } else {
            quoted.push(ch);
        }
    }
    quoted.push('\'');
    quoted
}

/// Shorten a command for log output.
pub(crate) fn preview(command: &str) -> String {
    const MAX: usize = 96;
    if command.chars().count() <= MAX {
        return command.to_string();
    }
    let head: String = command.chars().take(MAX).collect();
    format!("{head}…")
}
