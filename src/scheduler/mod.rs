//! The queued-scan scheduler and its supporting pieces.
//!
//! [`QueuedScanScheduler`] drives a queue of targets through one
//! [`ScanInvocation`] at a time, applying the configured policy flags to
//! each outcome and exposing pause/resume/cancel plus the dual
//! non-destructive (`next`) and destructive (`shift`) consumer accessors.

mod cancel;
mod invocation;
mod queue;
mod scheduler;

pub use cancel::CancelToken;
pub use invocation::{InvocationOutcome, ScanInvocation};
pub use queue::QueueEntry;
pub use scheduler::{
    QueuedScanScheduler, SchedulerConfig, SchedulerEvent, SchedulerState,
};
