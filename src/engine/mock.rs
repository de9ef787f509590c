//! Mock scan engine for testing.
//!
//! This module provides a configurable mock engine that can be used in
//! tests to simulate scan outcomes without spawning a real scanner.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use crate::core::{Host, HostList, ScanEngine, ScanError};

/// A scripted response for one target.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Resolve with the given hosts.
    Hosts(HostList),

    /// Fail with the given reason.
    Fail(String),

    /// Never resolve. Useful for timeout and cancellation tests.
    Hang,
}

/// A mock scan engine for testing purposes.
///
/// Responses are scripted per target, with a default for targets not in the
/// response map. A `Hang` response never resolves, which exercises the
/// caller's timeout and cancellation paths.
///
/// # Examples
///
/// ```rust
/// use scanqueue::engine::{MockResponse, MockScanEngine};
/// use scanqueue::core::Host;
///
/// let engine = MockScanEngine::new()
///     .with_response("10.0.0.1", MockResponse::Hosts(vec![Host::ipv4("10.0.0.1".parse().unwrap())]))
///     .with_response("10.0.0.2", MockResponse::Fail("host unreachable".into()));
/// ```
#[derive(Debug)]
pub struct MockScanEngine {
    /// Name of this engine instance.
    name: String,
    /// Responses keyed by target.
    responses: RwLock<HashMap<String, MockResponse>>,
    /// Default response for targets not in the map.
    default_response: MockResponse,
    /// Simulated latency per run.
    latency: Option<Duration>,
    /// Counter of run operations.
    run_count: AtomicU64,
}

impl MockScanEngine {
    /// Creates a mock engine whose default response is an empty host list.
    pub fn new() -> Self {
        Self {
            name: "mock".to_string(),
            responses: RwLock::new(HashMap::new()),
            default_response: MockResponse::Hosts(Vec::new()),
            latency: None,
            run_count: AtomicU64::new(0),
        }
    }

    /// Sets the name of this engine.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the default response for targets not in the response map.
    pub fn with_default_response(mut self, response: MockResponse) -> Self {
        self.default_response = response;
        self
    }

    /// Adds a response for a specific target.
    pub fn with_response(self, target: impl Into<String>, response: MockResponse) -> Self {
        self.responses
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(target.into(), response);
        self
    }

    /// Scripts a single-host result for a target.
    pub fn with_host(self, target: impl Into<String>, host: Host) -> Self {
        self.with_response(target, MockResponse::Hosts(vec![host]))
    }

    /// Sets the simulated latency per run.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Returns the number of runs performed.
    pub fn run_count(&self) -> u64 {
        self.run_count.load(Ordering::Relaxed)
    }

    /// Adds a response after construction.
    pub fn add_response(&self, target: impl Into<String>, response: MockResponse) {
        self.responses
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(target.into(), response);
    }

    fn response_for(&self, target: &str) -> MockResponse {
        self.responses
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(target)
            .cloned()
            .unwrap_or_else(|| self.default_response.clone())
    }
}

impl Default for MockScanEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScanEngine for MockScanEngine {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, target: &str, _options: &str) -> Result<HostList, ScanError> {
        self.run_count.fetch_add(1, Ordering::Relaxed);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        match self.response_for(target) {
            MockResponse::Hosts(hosts) => Ok(hosts),
            MockResponse::Fail(reason) => {
                Err(ScanError::engine_failure(self.name.as_str(), target, reason))
            }
            MockResponse::Hang => std::future::pending().await,
        }
    }
}
