//! Environment variable helpers for tests.
#![allow(dead_code)]

use env_lock::{EnvGuard as LockedEnvGuard, lock_env};
use tracing::{instrument, trace};

/// Variables read by `Settings::apply_env`.
pub const COPG_VARS: [&str; 4] = ["COPG_CONFIG", "COPG_SCHEME", "COPG_BACKEND", "COPG_SHELL"];

/// RAII guard to restore environment variables on drop.
pub struct EnvGuard<'a> {
    _guard: LockedEnvGuard<'a>,
}

impl<'a> EnvGuard<'a> {
    #[must_use]
    #[instrument]
    pub fn set(key: &'a str, value: &str) -> Self {
        trace!(key, value, "Setting env var");
        let guard = lock_env([(key, Some(value))]);
        Self { _guard: guard }
    }

    /// Set several variables at once; `None` removes one.
    #[must_use]
    pub fn set_all<const N: usize>(vars: [(&'a str, Option<&str>); N]) -> Self {
        trace!(count = N, "Setting env vars");
        let guard = lock_env(vars);
        Self { _guard: guard }
    }
}

/// Clear every `COPG_*` override for the duration of the guard.
#[must_use]
pub fn without_copg_env() -> EnvGuard<'static> {
    EnvGuard::set_all(COPG_VARS.map(|key| (key, None)))
}
