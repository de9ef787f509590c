//! A single scan invocation with timeout and cancellation.

use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

use crate::core::{ArcScanEngine, HostList, ScanError};
use crate::scheduler::cancel::CancelToken;

/// How one scan invocation resolved.
#[derive(Debug)]
pub enum InvocationOutcome {
    /// The engine resolved with a (possibly empty) host list.
    Completed(HostList),

    /// The engine rejected.
    Failed(ScanError),

    /// The engine did not resolve within the invocation's timeout.
    TimedOut,

    /// The invocation was cancelled before the engine resolved.
    Cancelled,
}

impl InvocationOutcome {
    /// Returns `true` for a `Completed` outcome.
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// Returns the host list, for a `Completed` outcome.
    pub fn hosts(&self) -> Option<&HostList> {
        match self {
            Self::Completed(hosts) => Some(hosts),
            _ => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Completed(_) => "completed",
            Self::Failed(_) => "failed",
            Self::TimedOut => "timed_out",
            Self::Cancelled => "cancelled",
        }
    }
}

/// One call to the external scan engine for one target.
///
/// The invocation owns its timeout and cancellation: the engine future is
/// raced against both, and losing the race drops it, which terminates the
/// underlying operation (the process engine spawns with `kill_on_drop`, so
/// no still-running process is ever leaked). Exactly one engine operation is
/// driven per invocation.
pub struct ScanInvocation {
    id: Uuid,
    engine: ArcScanEngine,
    target: String,
    options: String,
    timeout: Duration,
    cancel: CancelToken,
    elapsed: Duration,
}

impl std::fmt::Debug for ScanInvocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanInvocation")
            .field("id", &self.id)
            .field("engine", &self.engine.name())
            .field("target", &self.target)
            .field("options", &self.options)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ScanInvocation {
    /// Creates an invocation for one target.
    ///
    /// The default timeout is zero, meaning unlimited: the engine runs
    /// until it resolves or the invocation is cancelled.
    pub fn new(
        engine: ArcScanEngine,
        target: impl Into<String>,
        options: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            engine,
            target: target.into(),
            options: options.into(),
            timeout: Duration::ZERO,
            cancel: CancelToken::new(),
            elapsed: Duration::ZERO,
        }
    }

    /// Sets the timeout. Zero disables it.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Shares an externally owned cancellation token.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Returns a token that cancels this invocation when fired.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Unique id of this invocation, carried through log fields.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The target this invocation scans.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// How long the last `run` took.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Drives the engine once and resolves the outcome.
    ///
    /// Cancellation may arrive at any time before resolution and always
    /// yields `Cancelled`, even if the token fired before `run` was called.
    pub async fn run(&mut self) -> InvocationOutcome {
        let started = Instant::now();
        tracing::debug!(
            invocation = %self.id,
            engine = self.engine.name(),
            target = %self.target,
            timeout_ms = self.timeout.as_millis() as u64,
            "scan invocation started"
        );

        let outcome = {
            let scan = self.engine.run(&self.target, &self.options);
            tokio::pin!(scan);
            let cancel = self.cancel.clone();

            tokio::select! {
                result = &mut scan => match result {
                    Ok(hosts) => InvocationOutcome::Completed(hosts),
                    Err(ScanError::Cancelled) => InvocationOutcome::Cancelled,
                    Err(err) => InvocationOutcome::Failed(err),
                },
                _ = cancel.cancelled() => InvocationOutcome::Cancelled,
                _ = deadline(self.timeout) => InvocationOutcome::TimedOut,
            }
        };

        self.elapsed = started.elapsed();
        tracing::debug!(
            invocation = %self.id,
            target = %self.target,
            outcome = outcome.label(),
            elapsed_ms = self.elapsed.as_millis() as u64,
            "scan invocation resolved"
        );
        outcome
    }
}

/// Sleeps for `timeout`, or forever when it is zero.
async fn deadline(timeout: Duration) {
    if timeout.is_zero() {
        std::future::pending::<()>().await
    } else {
        tokio::time::sleep(timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Host;
    use crate::engine::{MockResponse, MockScanEngine};
    use std::net::Ipv4Addr;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_completed() {
        let engine = Arc::new(
            MockScanEngine::new().with_host("10.0.0.1", Host::ipv4(Ipv4Addr::new(10, 0, 0, 1))),
        );
        let mut invocation = ScanInvocation::new(engine, "10.0.0.1", "-sn");

        let outcome = invocation.run().await;
        assert!(outcome.is_completed());
        assert_eq!(outcome.hosts().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed() {
        let engine = Arc::new(
            MockScanEngine::new().with_response("10.0.0.1", MockResponse::Fail("boom".into())),
        );
        let mut invocation = ScanInvocation::new(engine, "10.0.0.1", "");

        let outcome = invocation.run().await;
        assert!(matches!(outcome, InvocationOutcome::Failed(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out() {
        let engine =
            Arc::new(MockScanEngine::new().with_response("10.0.0.1", MockResponse::Hang));
        let mut invocation = ScanInvocation::new(engine, "10.0.0.1", "")
            .with_timeout(Duration::from_secs(60));

        let outcome = invocation.run().await;
        assert!(matches!(outcome, InvocationOutcome::TimedOut));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_timeout_is_unlimited() {
        let engine = Arc::new(
            MockScanEngine::new()
                .with_latency(Duration::from_secs(3600))
                .with_host("10.0.0.1", Host::ipv4(Ipv4Addr::new(10, 0, 0, 1))),
        );
        let mut invocation = ScanInvocation::new(engine, "10.0.0.1", "");

        let outcome = invocation.run().await;
        assert!(outcome.is_completed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_mid_flight() {
        let engine =
            Arc::new(MockScanEngine::new().with_response("10.0.0.1", MockResponse::Hang));
        let mut invocation = ScanInvocation::new(engine, "10.0.0.1", "");
        let token = invocation.cancel_token();

        let handle = tokio::spawn(async move { invocation.run().await });
        tokio::task::yield_now().await;
        token.cancel();

        let outcome = handle.await.unwrap();
        assert!(matches!(outcome, InvocationOutcome::Cancelled));
    }

    #[tokio::test]
    async fn test_cancelled_before_run() {
        let engine =
            Arc::new(MockScanEngine::new().with_response("10.0.0.1", MockResponse::Hang));
        let mut invocation = ScanInvocation::new(engine, "10.0.0.1", "");
        invocation.cancel_token().cancel();

        let outcome = invocation.run().await;
        assert!(matches!(outcome, InvocationOutcome::Cancelled));
    }
}
