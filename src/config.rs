//! Browse configuration.
//!
//! Layered loading: built-in defaults, then an optional TOML file, then
//! `SHELF_*` environment overrides.

use crate::error::ShelfError;
use crate::types::Phase;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

/// Default bounded wait before returning a loading placeholder.
pub const DEFAULT_WAIT_WINDOW_MS: u64 = 100;

/// Tunables for caching, fetching, and phase eligibility
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowseConfig {
    /// Bounded synchronous wait for a background fetch, in milliseconds
    #[serde(default = "default_wait_window_ms")]
    pub wait_window_ms: u64,

    /// Non-pinned listing slots retained per source
    #[serde(default = "default_slots_per_source")]
    pub slots_per_source: usize,

    /// Phases eligible in this session; empty means all
    #[serde(default)]
    pub phases: HashSet<Phase>,

    /// Start with background fetching disabled
    #[serde(default)]
    pub offline: bool,
}

fn default_wait_window_ms() -> u64 {
    DEFAULT_WAIT_WINDOW_MS
}

fn default_slots_per_source() -> usize {
    crate::cache::DEFAULT_SLOTS_PER_SOURCE
}

impl Default for BrowseConfig {
    fn default() -> Self {
        Self {
            wait_window_ms: default_wait_window_ms(),
            slots_per_source: default_slots_per_source(),
            phases: HashSet::new(),
            offline: false,
        }
    }
}

impl BrowseConfig {
    pub fn wait_window(&self) -> Duration {
        Duration::from_millis(self.wait_window_ms)
    }

    /// Load configuration from an optional file with `SHELF_*` environment
    /// overrides applied on top.
    pub fn load(path: Option<&Path>) -> Result<Self, ShelfError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        builder
            .add_source(config::Environment::with_prefix("SHELF"))
            .build()
            .and_then(|loaded| loaded.try_deserialize())
            .map_err(|e| ShelfError::Config(e.to_string()))
    }
}
