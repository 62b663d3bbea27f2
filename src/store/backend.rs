//! Read/write capability for the persisted config file.
//!
//! [`ShellBackend`] goes through the privileged command bridge the way the
//! module's WebUI does; [`FileBackend`] talks to the filesystem directly and
//! is used for local files and tests.

use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, warn};

use crate::bridge::{CommandExecutor, ProcessExecutor, shell_quote};
use crate::error::{CopgError, Result};

/// Whole-file text storage keyed by path.
///
/// `read` returns the exact bytes written by `write`. A missing file is
/// reported as [`CopgError::ConfigMissing`].
#[allow(async_fn_in_trait)]
pub trait ConfigBackend {
    async fn read(&self, path: &str) -> Result<String>;

    async fn write(&self, path: &str, contents: &str) -> Result<()>;

    /// Short name for logs and robot output.
    fn name(&self) -> &'static str;
}

/// Persists through shell commands run by a [`CommandExecutor`].
///
/// Reads with `cat`, writes with `printf '%s'` (no escape processing, unlike
/// `echo` on some shells) and optionally relabels the file with `chcon`.
#[derive(Debug, Clone)]
pub struct ShellBackend<E> {
    executor: E,
    selinux_context: Option<String>,
}

impl<E: CommandExecutor> ShellBackend<E> {
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            selinux_context: None,
        }
    }

    /// Relabel written files with this SELinux context.
    #[must_use]
    pub fn with_selinux_context(mut self, context: impl Into<String>) -> Self {
        self.selinux_context = Some(context.into());
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    async fn relabel(&self, path: &str) {
        let Some(context) = &self.selinux_context else {
            return;
        };
        let command = format!("chcon {} {}", shell_quote(context), shell_quote(path));
        // The content is already on disk; a failed relabel is not fatal.
        if let Err(e) = self.executor.execute(&command).await {
            warn!(path = %path, context = %context, error = %e, "Failed to set SELinux context");
        }
    }
}

impl<E: CommandExecutor> ConfigBackend for ShellBackend<E> {
    async fn read(&self, path: &str) -> Result<String> {
        let command = format!("cat {}", shell_quote(path));
        match self.executor.execute(&command).await {
            Ok(text) => Ok(text),
            Err(CopgError::CommandFailed { stderr, .. }) if stderr.contains("No such file") => {
                Err(CopgError::ConfigMissing {
                    path: path.to_string(),
                })
            }
            Err(CopgError::CommandFailed { stderr, .. }) => Err(CopgError::Persistence(format!(
                "failed to read {path}: {stderr}"
            ))),
            Err(e) => Err(e),
        }
    }

    async fn write(&self, path: &str, contents: &str) -> Result<()> {
        if let Some(parent) = Path::new(path).parent().and_then(Path::to_str) {
            if !parent.is_empty() {
                let mkdir = format!("mkdir -p {}", shell_quote(parent));
                if let Err(e) = self.executor.execute(&mkdir).await {
                    debug!(parent = %parent, error = %e, "mkdir failed, trying the write anyway");
                }
            }
        }

        let command = format!(
            "printf '%s' {} > {}",
            shell_quote(contents),
            shell_quote(path)
        );
        self.executor
            .execute(&command)
            .await
            .map_err(|e| match e {
                CopgError::CommandFailed { stderr, .. } => {
                    CopgError::Persistence(format!("failed to write {path}: {stderr}"))
                }
                other => other,
            })?;

        self.relabel(path).await;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "shell"
    }
}

/// Direct filesystem access.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileBackend;

impl ConfigBackend for FileBackend {
    async fn read(&self, path: &str) -> Result<String> {
        tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                CopgError::ConfigMissing {
                    path: path.to_string(),
                }
            } else {
                CopgError::Persistence(format!("failed to read {path}: {e}"))
            }
        })
    }

    async fn write(&self, path: &str, contents: &str) -> Result<()> {
        let target = Path::new(path);
        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                CopgError::Persistence(format!("failed to create {}: {e}", parent.display()))
            })?;
        }

        // Write-then-rename so a crash never leaves a truncated config.
        let staging = target.with_extension("json.tmp");
        tokio::fs::write(&staging, contents)
            .await
            .map_err(|e| CopgError::Persistence(format!("failed to write {path}: {e}")))?;
        tokio::fs::rename(&staging, target)
            .await
            .map_err(|e| CopgError::Persistence(format!("failed to replace {path}: {e}")))?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

/// Backend chosen at runtime from settings.
#[derive(Debug, Clone)]
pub enum AnyBackend {
    Shell(ShellBackend<ProcessExecutor>),
    File(FileBackend),
}

impl ConfigBackend for AnyBackend {
    async fn read(&self, path: &str) -> Result<String> {
        match self {
            Self::Shell(b) => b.read(path).await,
            Self::File(b) => b.read(path).await,
        }
    }

    async fn write(&self, path: &str, contents: &str) -> Result<()> {
        match self {
            Self::Shell(b) => b.write(path, contents).await,
            Self::File(b) => b.write(path, contents).await,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Shell(b) => b.name(),
            Self::File(b) => b.name(),
        }
    }
}
