//! # Scanqueue
//!
//! Queued, pausable orchestration of external network scan engines.
//!
//! ## Overview
//!
//! Scanqueue turns a sequence of scan targets into a single controllable
//! stream of structured results. It lets you:
//!
//! - Drive an external scan engine (nmap or compatible) one target at a time
//! - Expand a range into per-host queue entries with deterministic ordering
//! - Apply a per-result action callback as entries complete
//! - Pause, resume, and cancel a run without leaking scanner processes
//! - Enforce a per-invocation timeout
//! - Pull results destructively (`shift`) or read them in place (`next`)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use scanqueue::engine::{ProcessEngineConfig, ProcessScanEngine};
//! use scanqueue::scheduler::QueuedScanScheduler;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ProcessEngineConfig::new("/usr/bin/nmap")
//!         .with_base_args(["-oX", "-"]);
//!     let engine = Arc::new(ProcessScanEngine::new(config, my_parser)?);
//!
//!     let scheduler = QueuedScanScheduler::collecting(engine, "192.168.1.0/28", "-sn");
//!     scheduler.start_run_scan();
//!     scheduler.join().await;
//!
//!     for record in scheduler.results() {
//!         println!("{record:?}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `default` - Includes the external-process engine
//! - `process-engine` - The `tokio::process`-backed engine
//!
//! ## Architecture
//!
//! The library is organized into three layers:
//!
//! - **Core**: The host/port/certificate data model, error taxonomy, the
//!   `ScanEngine` boundary, and target-range expansion
//! - **Engine**: Implementations of the boundary (external process, mock)
//! - **Scheduler**: The queued-scan state machine with its invocation,
//!   queue, and cancellation pieces, plus preset option profiles

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod engine;
pub mod presets;
pub mod scheduler;

// Re-export commonly used types at the crate root
pub use crate::core::{
    expand_targets, ArcScanEngine, Certificate, Host, HostAddress, HostList, OutputParser, Port,
    ScanEngine, ScanError, ScanRecord, Transport,
};

pub use crate::engine::{MockResponse, MockScanEngine};
pub use crate::scheduler::{
    CancelToken, InvocationOutcome, QueuedScanScheduler, ScanInvocation, SchedulerConfig,
    SchedulerEvent, SchedulerState,
};

#[cfg(feature = "process-engine")]
pub use crate::engine::{ProcessEngineConfig, ProcessScanEngine};

/// Prelude module for convenient imports.
///
/// ```rust
/// use scanqueue::prelude::*;
/// ```
pub mod prelude {
    pub use crate::core::{
        ArcScanEngine, Certificate, Host, HostAddress, HostList, OutputParser, Port, ScanEngine,
        ScanError, ScanRecord, Transport,
    };
    pub use crate::engine::{MockResponse, MockScanEngine};
    pub use crate::scheduler::{
        CancelToken, InvocationOutcome, QueuedScanScheduler, ScanInvocation, SchedulerConfig,
        SchedulerEvent, SchedulerState,
    };

    #[cfg(feature = "process-engine")]
    pub use crate::engine::{ProcessEngineConfig, ProcessScanEngine};
}
