//! Fixed option profiles layered over invocations and schedulers.
//!
//! Presets only fix the option string; they construct through the public
//! constructors and carry no behaviour of their own.

use crate::core::{ArcScanEngine, ScanRecord};
use crate::scheduler::{QueuedScanScheduler, ScanInvocation};

/// Host-discovery-only profile: fast, no port or service probing.
pub const QUICK_SCAN_OPTIONS: &str = "-sn";

/// OS- and service-fingerprinting profile.
pub const OS_AND_PORT_SCAN_OPTIONS: &str = "-O -sV";

/// A single host-discovery invocation over `target`.
pub fn quick_scan(engine: ArcScanEngine, target: &str) -> ScanInvocation {
    ScanInvocation::new(engine, target, QUICK_SCAN_OPTIONS)
}

/// A single OS-and-port invocation over `target`.
pub fn os_and_port_scan(engine: ArcScanEngine, target: &str) -> ScanInvocation {
    ScanInvocation::new(engine, target, OS_AND_PORT_SCAN_OPTIONS)
}

/// A queued scan over `range` with a caller-supplied option string.
pub fn queued_scan<R, F>(
    engine: ArcScanEngine,
    range: &str,
    options: &str,
    action: F,
) -> QueuedScanScheduler<R>
where
    R: Send + 'static,
    F: FnMut(&[ScanRecord]) -> R + Send + 'static,
{
    QueuedScanScheduler::new(engine, range, options, action)
}

/// A queued host-discovery scan over `range`.
pub fn queued_quick_scan<R, F>(
    engine: ArcScanEngine,
    range: &str,
    action: F,
) -> QueuedScanScheduler<R>
where
    R: Send + 'static,
    F: FnMut(&[ScanRecord]) -> R + Send + 'static,
{
    QueuedScanScheduler::new(engine, range, QUICK_SCAN_OPTIONS, action)
}

/// A queued OS-and-port scan over `range`.
pub fn queued_os_and_port_scan<R, F>(
    engine: ArcScanEngine,
    range: &str,
    action: F,
) -> QueuedScanScheduler<R>
where
    R: Send + 'static,
    F: FnMut(&[ScanRecord]) -> R + Send + 'static,
{
    QueuedScanScheduler::new(engine, range, OS_AND_PORT_SCAN_OPTIONS, action)
}
