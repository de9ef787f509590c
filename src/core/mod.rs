//! Core types and traits for the scanqueue library.
//!
//! This module provides the fundamental building blocks used throughout
//! the library:
//!
//! - [`host`] - The structured result model (`Host`, `Port`, `Certificate`)
//! - [`record`] - Entries of the cumulative result sequence
//! - [`error`] - Structured error types
//! - [`traits`] - The `ScanEngine` boundary and the `OutputParser` seam
//! - [`target`] - Target-range expansion

pub mod error;
pub mod host;
pub mod record;
pub mod target;
pub mod traits;

// Re-export commonly used types at the core level
pub use error::ScanError;
pub use host::{
    Certificate, CertificateOrganization, CertificatePublicKey, CertificateValidity, Host,
    HostAddress, HostList, Port, Transport,
};
pub use record::ScanRecord;
pub use target::expand_targets;
pub use traits::{ArcScanEngine, OutputParser, ScanEngine};
