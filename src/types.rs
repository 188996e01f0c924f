//! Core identifier and phase types shared across the crate.

use serde::{Deserialize, Serialize};

/// Identity of a registered source (its declared name). Cache keys are
/// built from this value, never from source object identity, so registry
/// reloads cannot leak slots.
pub type SourceId = String;

/// Usage-context tag restricting which sources are eligible in a given
/// browsing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Build,
    Run,
    Test,
}
