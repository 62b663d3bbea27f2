//! Config Store: the single source of truth for the config file.
//!
//! The store owns the in-memory [`ConfigDocument`] and the backend used to
//! persist it. Every mutation goes through [`ConfigStore::commit`], which
//! saves the whole file and rolls memory back if the save fails, so memory
//! never runs ahead of disk.

mod backend;
mod document;

pub use backend::{AnyBackend, ConfigBackend, FileBackend, ShellBackend};
pub use document::{ConfigDocument, RemovedEntry};

use tracing::{debug, info, warn};

use crate::error::Result;

/// Owns the ordered config mapping and its persistence path.
#[derive(Debug)]
pub struct ConfigStore<B> {
    backend: B,
    path: String,
    doc: ConfigDocument,
}

impl<B: ConfigBackend> ConfigStore<B> {
    /// Create an empty store; call [`load`](Self::load) to read the file.
    pub fn new(backend: B, path: impl Into<String>) -> Self {
        Self {
            backend,
            path: path.into(),
            doc: ConfigDocument::new(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn document(&self) -> &ConfigDocument {
        &self.doc
    }

    /// Read and parse the file, replacing the in-memory document.
    ///
    /// On any failure the document is reset to empty and the error returned;
    /// a half-parsed state is never kept.
    pub async fn load(&mut self) -> Result<()> {
        debug!(path = %self.path, backend = self.backend.name(), "Loading config");
        let parsed = match self.backend.read(&self.path).await {
            Ok(text) => ConfigDocument::from_json_str(&text),
            Err(e) => Err(e),
        };

        match parsed {
            Ok(doc) => {
                info!(path = %self.path, keys = doc.len(), "Config loaded");
                self.doc = doc;
                Ok(())
            }
            Err(e) => {
                warn!(path = %self.path, error = %e, "Config load failed, starting empty");
                self.doc = ConfigDocument::new();
                Err(e)
            }
        }
    }

    /// Serialized file contents for the current document.
    pub fn render(&self) -> Result<String> {
        let mut text = self.doc.to_json_pretty()?;
        text.push('\n');
        Ok(text)
    }

    /// Write the whole document back to the file.
    pub async fn save(&mut self) -> Result<()> {
        self.doc.normalize_order();
        let text = self.render()?;
        self.backend.write(&self.path, &text).await?;
        info!(path = %self.path, keys = self.doc.len(), bytes = text.len(), "Config saved");
        Ok(())
    }

    /// Copy of the current document, for rollback.
    pub fn snapshot(&self) -> ConfigDocument {
        self.doc.clone()
    }

    /// Replace the in-memory document without persisting.
    pub fn restore(&mut self, doc: ConfigDocument) {
        self.doc = doc;
    }

    /// Apply `mutate` and persist; roll back memory if either step fails.
    ///
    /// Validation inside `mutate` that returns `Err` leaves the document
    /// untouched and never reaches the backend.
    pub async fn commit<T, F>(&mut self, mutate: F) -> Result<T>
    where
        F: FnOnce(&mut ConfigDocument) -> Result<T>,
    {
        let before = self.snapshot();
        let value = match mutate(&mut self.doc) {
            Ok(value) => value,
            Err(e) => {
                self.doc = before;
                return Err(e);
            }
        };

        if let Err(e) = self.save().await {
            warn!(error = %e, "Save failed, reverting in-memory change");
            self.doc = before;
            return Err(e);
        }
        Ok(value)
    }

    /// Apply `mutate` and persist, keeping the in-memory change even if the
    /// save fails (best effort, used by undo).
    pub async fn apply_best_effort<T, F>(&mut self, mutate: F) -> Result<T>
    where
        F: FnOnce(&mut ConfigDocument) -> Result<T>,
    {
        let before = self.snapshot();
        let value = match mutate(&mut self.doc) {
            Ok(value) => value,
            Err(e) => {
                self.doc = before;
                return Err(e);
            }
        };
        self.save().await?;
        Ok(value)
    }
}
