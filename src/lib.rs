//! COPG config manager library.
//!
//! Edits the JSON config of the COPG Magisk module: device profiles that
//! spoof build properties, and the game packages mapped to each profile.
//! Exposes the core of the `copg` CLI for use in tests.
//!
//! # Modules
//!
//! - `store`: ordered config document and the backends that read and write it
//! - `profile`: device profiles, config key layouts, Android release lookup
//! - `manager`: device and game mutations, consistency checks
//! - `undo`: time-limited undo of deletions
//! - `backup`: timestamped backups and restore
//! - `session`: one editing session tying the above together
//! - `output`: output mode abstraction (robot/human)
#![forbid(unsafe_code)]

pub mod activity;
pub mod backup;
pub mod bridge;
pub mod cli;
pub mod error;
pub mod logging;
pub mod manager;
pub mod output;
pub mod profile;
pub mod session;
pub mod settings;
pub mod store;
pub mod theme;
pub mod undo;
