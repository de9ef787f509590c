//! Scan engine implementations.
//!
//! This module contains implementations of the [`ScanEngine`] trait.
//!
//! ## Available Engines
//!
//! - [`mock`] - A scripted mock engine for testing
//! - [`process`] - An external-process engine (requires the
//!   `process-engine` feature, on by default)
//!
//! ## Implementing a Custom Engine
//!
//! To drive a different scanner, implement the trait:
//!
//! ```rust,ignore
//! use scanqueue::core::{HostList, ScanEngine, ScanError};
//! use async_trait::async_trait;
//!
//! struct MyEngine;
//!
//! #[async_trait]
//! impl ScanEngine for MyEngine {
//!     fn name(&self) -> &str {
//!         "my-engine"
//!     }
//!
//!     async fn run(&self, target: &str, options: &str) -> Result<HostList, ScanError> {
//!         // Drive the scanner and return the discovered hosts
//!         todo!()
//!     }
//! }
//! ```
//!
//! [`ScanEngine`]: crate::core::ScanEngine

pub mod mock;

#[cfg(feature = "process-engine")]
pub mod process;

// Re-exports
pub use mock::{MockResponse, MockScanEngine};

#[cfg(feature = "process-engine")]
pub use process::{ProcessEngineConfig, ProcessScanEngine};
