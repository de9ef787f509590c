//! Entries of the scheduler's cumulative result sequence.

use serde::{Deserialize, Serialize};

use crate::core::host::Host;

/// One entry in the cumulative result sequence.
///
/// Besides real hosts, the scheduler can append marker entries so that
/// consumers can distinguish "scanned, nothing found" and "scan failed"
/// from "not scanned at all" (see the `save_not_found_to_results` and
/// `save_errors_to_results` policy flags).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScanRecord {
    /// A host discovered by a completed invocation.
    Found {
        /// The discovered host.
        host: Host,
    },

    /// A completed invocation reported zero hosts for this target.
    NotFound {
        /// The target that yielded no hosts.
        target: String,
    },

    /// An invocation failed or timed out on this target.
    Failed {
        /// The target whose scan failed.
        target: String,
        /// Human-readable failure reason.
        reason: String,
    },
}

impl ScanRecord {
    /// Wraps a discovered host.
    pub fn found(host: Host) -> Self {
        Self::Found { host }
    }

    /// Creates a not-found marker for a target.
    pub fn not_found(target: impl Into<String>) -> Self {
        Self::NotFound {
            target: target.into(),
        }
    }

    /// Creates an error marker for a target.
    pub fn failed(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Failed {
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` for a real host entry.
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }

    /// Returns `true` for an error marker.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Returns the host, for a `Found` entry.
    pub fn host(&self) -> Option<&Host> {
        match self {
            Self::Found { host } => Some(host),
            _ => None,
        }
    }

    /// Returns the target a marker entry refers to.
    ///
    /// `Found` entries identify themselves by host address instead.
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Found { .. } => None,
            Self::NotFound { target } | Self::Failed { target, .. } => Some(target),
        }
    }
}

impl From<Host> for ScanRecord {
    fn from(host: Host) -> Self {
        Self::Found { host }
    }
}
