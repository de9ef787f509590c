//! Core traits for the scanqueue library.
//!
//! This module defines the `ScanEngine` trait (the boundary to the external
//! scanning collaborator) and the `OutputParser` seam that keeps native
//! output parsing outside the crate.

use async_trait::async_trait;
use std::sync::Arc;

use crate::core::error::ScanError;
use crate::core::host::HostList;

/// The boundary to an external scan engine.
///
/// An engine, given a target range and an opaque option string,
/// asynchronously reports the discovered hosts or fails. Implementations
/// must reject on failure rather than hang indefinitely where they can tell;
/// the hard stop is always imposed by the caller ([`ScanInvocation`]'s
/// timeout), so `run` may take arbitrarily long.
///
/// # Implementation Notes
///
/// - Implementations must be `Send + Sync` for use in async contexts.
/// - `run` must drive exactly one scan operation per call.
/// - Implementations should never panic; all errors are returned as
///   `ScanError`.
/// - An implementation whose future is dropped mid-flight must not leak the
///   underlying operation (the process engine uses `kill_on_drop` for this).
///
/// [`ScanInvocation`]: crate::scheduler::ScanInvocation
#[async_trait]
pub trait ScanEngine: Send + Sync {
    /// Returns the name of this engine.
    ///
    /// A stable, human-readable identifier like "nmap" or "mock"; used in
    /// error messages and log fields.
    fn name(&self) -> &str;

    /// Scans the given target range with the given option string.
    ///
    /// # Arguments
    ///
    /// * `target` - The target range, typically a single host address after
    ///   queue expansion.
    /// * `options` - Engine-specific option string, passed through opaquely.
    ///
    /// # Errors
    ///
    /// * `EngineFailure` - The external operation exited abnormally.
    /// * `UnparseableOutput` - The engine's output could not be interpreted.
    async fn run(&self, target: &str, options: &str) -> Result<HostList, ScanError>;
}

/// An arc-wrapped engine for shared ownership.
pub type ArcScanEngine = Arc<dyn ScanEngine>;

/// Converts an engine's raw output into structured host records.
///
/// Parsing of a scan engine's native output format is outside this crate's
/// scope; the process engine hands its captured stdout to a caller-supplied
/// implementation of this trait.
pub trait OutputParser: Send + Sync {
    /// Parses raw engine output into a host list.
    ///
    /// # Errors
    ///
    /// Returns `UnparseableOutput` when the raw bytes cannot be interpreted.
    fn parse(&self, raw: &[u8]) -> Result<HostList, ScanError>;
}

impl<F> OutputParser for F
where
    F: Fn(&[u8]) -> Result<HostList, ScanError> + Send + Sync,
{
    fn parse(&self, raw: &[u8]) -> Result<HostList, ScanError> {
        self(raw)
    }
}
