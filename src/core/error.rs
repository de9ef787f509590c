//! Error types for the scanqueue library.
//!
//! This module provides structured, typed errors for all failure scenarios.
//! The library never panics; all errors are returned as `Result` values.

use std::time::Duration;
use thiserror::Error;

/// The main error type for scan operations.
///
/// Variants carry enough context (engine name, target, reason) for the
/// scheduler to log them and for callers to decide on re-queuing.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The external scan process exited abnormally or could not be spawned.
    #[error("engine '{engine}' failed on '{target}': {reason}")]
    EngineFailure {
        /// Name of the engine that failed.
        engine: String,
        /// Target range the engine was scanning.
        target: String,
        /// Human-readable reason (exit status, stderr tail, spawn error).
        reason: String,
    },

    /// The engine produced output the configured parser could not interpret.
    #[error("unparseable engine output: {reason}")]
    UnparseableOutput {
        /// Description of what could not be parsed.
        reason: String,
    },

    /// The scan did not resolve within the caller-imposed timeout.
    #[error("scan of '{target}' timed out after {elapsed:?}")]
    Timeout {
        /// Target range that timed out.
        target: String,
        /// How long the invocation ran before it was terminated.
        elapsed: Duration,
    },

    /// The scan was cancelled by the caller.
    #[error("scan was cancelled")]
    Cancelled,

    /// Configuration error.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScanError {
    /// Returns `true` if this error can be tolerated by a scheduler
    /// configured to run past per-entry failures.
    ///
    /// Cancellation and configuration errors are never tolerated: the
    /// former is a caller decision, the latter would fail every entry
    /// the same way.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::EngineFailure { .. }
                | Self::UnparseableOutput { .. }
                | Self::Timeout { .. }
                | Self::Io(_)
        )
    }

    /// Returns the target range this error is associated with, if any.
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::EngineFailure { target, .. } | Self::Timeout { target, .. } => Some(target),
            _ => None,
        }
    }

    /// Creates an `EngineFailure` error.
    pub fn engine_failure(
        engine: impl Into<String>,
        target: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::EngineFailure {
            engine: engine.into(),
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Creates an `UnparseableOutput` error.
    pub fn unparseable_output(reason: impl Into<String>) -> Self {
        Self::UnparseableOutput {
            reason: reason.into(),
        }
    }

    /// Creates a `Timeout` error.
    pub fn timeout(target: impl Into<String>, elapsed: Duration) -> Self {
        Self::Timeout {
            target: target.into(),
            elapsed,
        }
    }

    /// Creates a `Configuration` error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}
