//! The queued-scan scheduler.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::core::{expand_targets, ArcScanEngine, ScanError, ScanRecord};
use crate::scheduler::cancel::CancelToken;
use crate::scheduler::invocation::{InvocationOutcome, ScanInvocation};
use crate::scheduler::queue::{QueueEntry, ResultBuffer};

/// Observable state of a scheduler.
///
/// `Completed`, `Errored`, and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Queue populated, nothing started.
    Idle,
    /// The run loop is dequeuing entries.
    Running,
    /// Dequeuing is suspended; an in-flight invocation still finishes.
    Paused,
    /// The queue drained with no untolerated failure.
    Completed,
    /// An invocation failed and failures are not tolerated.
    Errored,
    /// The run was cancelled; remaining entries were abandoned.
    Cancelled,
}

impl SchedulerState {
    /// Returns `true` once the scheduler can make no further progress.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Errored | Self::Cancelled)
    }
}

/// Events emitted by the run loop.
#[derive(Debug, Clone)]
pub enum SchedulerEvent {
    /// The queue drained. Delivered at most once.
    Complete {
        /// The full cumulative sequence at completion.
        records: Vec<ScanRecord>,
        /// Total elapsed scan time.
        scan_time: Duration,
    },

    /// An invocation failed and failures are not tolerated.
    Error {
        /// Human-readable failure reason.
        reason: String,
    },
}

/// Configuration flags for a scheduler.
///
/// All flags default to off; the per-invocation timeout defaults to one
/// minute.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Invoke the action and continue past per-entry failures instead of
    /// halting.
    pub run_action_on_error: bool,

    /// Append an error marker to the cumulative sequence when an entry
    /// fails, whether or not the failure is tolerated.
    pub save_errors_to_results: bool,

    /// Append a not-found marker when a scan yields zero hosts, so callers
    /// can tell "scanned, nothing found" from "not scanned".
    pub save_not_found_to_results: bool,

    /// Per-invocation timeout. Zero disables it.
    pub single_scan_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            run_action_on_error: false,
            save_errors_to_results: false,
            save_not_found_to_results: false,
            single_scan_timeout: Duration::from_secs(60),
        }
    }
}

impl SchedulerConfig {
    /// Creates a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tolerates per-entry failures.
    pub fn with_run_action_on_error(mut self, enabled: bool) -> Self {
        self.run_action_on_error = enabled;
        self
    }

    /// Appends error markers to the cumulative sequence.
    pub fn with_save_errors_to_results(mut self, enabled: bool) -> Self {
        self.save_errors_to_results = enabled;
        self
    }

    /// Appends not-found markers for empty result sets.
    pub fn with_save_not_found_to_results(mut self, enabled: bool) -> Self {
        self.save_not_found_to_results = enabled;
        self
    }

    /// Sets the per-invocation timeout.
    pub fn with_single_scan_timeout(mut self, timeout: Duration) -> Self {
        self.single_scan_timeout = timeout;
        self
    }
}

/// Selects what the action receives per handled entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanMode {
    /// The full cumulative sequence after each merge.
    Run,
    /// Only the records the entry appended.
    Shift,
}

type Action<R> = Box<dyn FnMut(&[ScanRecord]) -> R + Send>;

/// Scheduler state shared with the run loop.
struct Inner {
    queue: VecDeque<QueueEntry>,
    total_enqueued: usize,
    processed: usize,
    buffer: ResultBuffer,
    state: SchedulerState,
    scan_time: Duration,
    current_target: Option<String>,
}

/// Drives a queue of scan targets through one invocation at a time.
///
/// The scheduler expands its target range into one queue entry per
/// sub-target at construction, then, once started, dequeues entries
/// strictly in order, never running two invocations concurrently. Each
/// handled entry feeds the user action; consumers can additionally read
/// accumulated records non-destructively (`next`, `results`) or consume
/// them (`shift`, `shift_results`).
///
/// `R` is the action's return type: `next` and `shift` apply the action to
/// the records they yield and return its value. Use
/// [`collecting`](QueuedScanScheduler::collecting) when no transform is
/// wanted.
///
/// The action is called from the run loop and from consumer accessors; it
/// must not call back into the scheduler.
pub struct QueuedScanScheduler<R = Vec<ScanRecord>> {
    engine: ArcScanEngine,
    options: String,
    config: SchedulerConfig,
    inner: Arc<Mutex<Inner>>,
    action: Arc<Mutex<Action<R>>>,
    pause_tx: watch::Sender<bool>,
    pause_rx: watch::Receiver<bool>,
    cancel: CancelToken,
    event_tx: mpsc::UnboundedSender<SchedulerEvent>,
    event_rx: Mutex<Option<mpsc::UnboundedReceiver<SchedulerEvent>>>,
    run_handle: Mutex<Option<JoinHandle<()>>>,
}

impl<R: Send + 'static> QueuedScanScheduler<R> {
    /// Creates a scheduler over the expanded `range`, passing `options` to
    /// every invocation and `action` every batch of handled records.
    pub fn new<F>(
        engine: ArcScanEngine,
        range: &str,
        options: impl Into<String>,
        action: F,
    ) -> Self
    where
        F: FnMut(&[ScanRecord]) -> R + Send + 'static,
    {
        let options = options.into();
        let queue: VecDeque<QueueEntry> = expand_targets(range)
            .into_iter()
            .map(|target| QueueEntry::new(target, options.clone()))
            .collect();
        let total_enqueued = queue.len();

        let (pause_tx, pause_rx) = watch::channel(false);
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        Self {
            engine,
            options,
            config: SchedulerConfig::default(),
            inner: Arc::new(Mutex::new(Inner {
                queue,
                total_enqueued,
                processed: 0,
                buffer: ResultBuffer::default(),
                state: SchedulerState::Idle,
                scan_time: Duration::ZERO,
                current_target: None,
            })),
            action: Arc::new(Mutex::new(Box::new(action))),
            pause_tx,
            pause_rx,
            cancel: CancelToken::new(),
            event_tx,
            event_rx: Mutex::new(Some(event_rx)),
            run_handle: Mutex::new(None),
        }
    }

    /// Replaces the configuration. Only meaningful before starting.
    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// Starts the run loop in action-driven mode: the action receives the
    /// full cumulative sequence after each merge.
    ///
    /// Must be called from within a tokio runtime. Starting an already
    /// started or finished scheduler is a no-op.
    pub fn start_run_scan(&self) {
        self.start(ScanMode::Run);
    }

    /// Starts the run loop in shift mode: the action receives only each
    /// entry's newly appended records, for callers that consume results via
    /// [`shift`](QueuedScanScheduler::shift).
    ///
    /// Must be called from within a tokio runtime. Starting an already
    /// started or finished scheduler is a no-op.
    pub fn start_shift_scan(&self) {
        self.start(ScanMode::Shift);
    }

    fn start(&self, mode: ScanMode) {
        {
            let mut inner = lock(&self.inner);
            if inner.state != SchedulerState::Idle {
                tracing::debug!(state = ?inner.state, "start ignored; scheduler already driven");
                return;
            }
            inner.state = SchedulerState::Running;
        }

        let ctx = RunContext {
            engine: Arc::clone(&self.engine),
            config: self.config.clone(),
            mode,
            inner: Arc::clone(&self.inner),
            action: Arc::clone(&self.action),
            pause: self.pause_rx.clone(),
            cancel: self.cancel.clone(),
            event_tx: self.event_tx.clone(),
        };
        *lock(&self.run_handle) = Some(tokio::spawn(run_loop(ctx)));
    }

    /// Suspends dequeuing. The in-flight invocation, if any, still runs to
    /// its own outcome. No-op unless currently `Running`.
    pub fn pause(&self) {
        let mut inner = lock(&self.inner);
        if inner.state == SchedulerState::Running {
            inner.state = SchedulerState::Paused;
            let _ = self.pause_tx.send(true);
            tracing::debug!("scan queue paused");
        }
    }

    /// Resumes dequeuing. No-op unless currently `Paused`.
    pub fn resume(&self) {
        let mut inner = lock(&self.inner);
        if inner.state == SchedulerState::Paused {
            inner.state = SchedulerState::Running;
            let _ = self.pause_tx.send(false);
            tracing::debug!("scan queue resumed");
        }
    }

    /// Cancels the run: terminates the in-flight invocation (including its
    /// external process) and abandons the remaining queue. Accumulated
    /// records are retained.
    pub fn cancel_scan(&self) {
        tracing::debug!("scan queue cancellation requested");
        self.cancel.cancel();
    }

    /// Appends a target to the queue, scanned with the scheduler's option
    /// string. Ignored once the scheduler is in a terminal state.
    pub fn enqueue(&self, target: impl Into<String>) {
        let mut inner = lock(&self.inner);
        if inner.state.is_terminal() {
            tracing::warn!("enqueue ignored; scheduler already finished");
            return;
        }
        inner
            .queue
            .push_back(QueueEntry::new(target, self.options.clone()));
        inner.total_enqueued += 1;
    }

    /// Reads up to `count` records at the read cursor, advances it, and
    /// returns the action applied to them. Does not remove anything.
    pub fn next(&self, count: usize) -> R {
        let records = lock(&self.inner).buffer.next(count);
        self.apply_action(&records)
    }

    /// Removes up to `count` records from the front of the cumulative
    /// sequence and returns the action applied to them. Two consecutive
    /// calls never return overlapping records.
    pub fn shift(&self, count: usize) -> R {
        let removed = lock(&self.inner).buffer.shift(count);
        self.apply_action(&removed)
    }

    /// Clones the entire cumulative sequence as of now. Unaffected by any
    /// cursor; only actual removal (`shift`) changes what this returns.
    pub fn results(&self) -> Vec<ScanRecord> {
        lock(&self.inner).buffer.snapshot()
    }

    /// Removes and returns the front record, or `None` when none is
    /// available.
    pub fn shift_results(&self) -> Option<ScanRecord> {
        lock(&self.inner).buffer.shift_one()
    }

    /// Current read-cursor position.
    pub fn index(&self) -> usize {
        lock(&self.inner).buffer.read_cursor()
    }

    /// Total records consumed by `shift` so far.
    pub fn shifted(&self) -> usize {
        lock(&self.inner).buffer.shifted()
    }

    /// Progress as a 0–100 value: fully processed entries over total
    /// enqueued entries. Monotonically non-decreasing for a fixed queue;
    /// exactly 100 when the scheduler completed.
    pub fn percent_complete(&self) -> f64 {
        let inner = lock(&self.inner);
        if inner.total_enqueued == 0 {
            return if inner.state == SchedulerState::Completed {
                100.0
            } else {
                0.0
            };
        }
        inner.processed as f64 * 100.0 / inner.total_enqueued as f64
    }

    /// Elapsed scan time, updated per handled entry and at termination.
    pub fn scan_time(&self) -> Duration {
        lock(&self.inner).scan_time
    }

    /// Current observable state.
    pub fn state(&self) -> SchedulerState {
        lock(&self.inner).state
    }

    /// Target of the in-flight invocation, if one is running.
    pub fn current_target(&self) -> Option<String> {
        lock(&self.inner).current_target.clone()
    }

    /// Number of entries still queued (excluding the in-flight one).
    pub fn queue_len(&self) -> usize {
        lock(&self.inner).queue.len()
    }

    /// Takes the event receiver. Yields `Some` exactly once.
    pub fn events(&self) -> Option<mpsc::UnboundedReceiver<SchedulerEvent>> {
        lock(&self.event_rx).take()
    }

    /// Waits for the run loop to terminate. Returns immediately when the
    /// scheduler was never started or was already joined.
    pub async fn join(&self) {
        let handle = lock(&self.run_handle).take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    fn apply_action(&self, records: &[ScanRecord]) -> R {
        let mut action = lock(&self.action);
        (action)(records)
    }
}

impl QueuedScanScheduler<Vec<ScanRecord>> {
    /// Creates a scheduler with the identity action: `next` and `shift`
    /// return the raw records.
    pub fn collecting(engine: ArcScanEngine, range: &str, options: impl Into<String>) -> Self {
        Self::new(engine, range, options, |records: &[ScanRecord]| {
            records.to_vec()
        })
    }
}

impl<R> std::fmt::Debug for QueuedScanScheduler<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = lock(&self.inner);
        f.debug_struct("QueuedScanScheduler")
            .field("engine", &self.engine.name())
            .field("state", &inner.state)
            .field("queue_len", &inner.queue.len())
            .field("records", &inner.buffer.len())
            .finish_non_exhaustive()
    }
}

/// Everything the run loop needs, detached from the scheduler handle.
struct RunContext<R> {
    engine: ArcScanEngine,
    config: SchedulerConfig,
    mode: ScanMode,
    inner: Arc<Mutex<Inner>>,
    action: Arc<Mutex<Action<R>>>,
    pause: watch::Receiver<bool>,
    cancel: CancelToken,
    event_tx: mpsc::UnboundedSender<SchedulerEvent>,
}

async fn run_loop<R: Send + 'static>(ctx: RunContext<R>) {
    let started = Instant::now();
    let total = lock(&ctx.inner).total_enqueued;
    tracing::info!(total, mode = ?ctx.mode, "scan queue started");

    loop {
        // Park while paused; cancellation wins over resumption.
        let parked = async {
            let mut pause = ctx.pause.clone();
            let _ = pause.wait_for(|paused| !*paused).await;
        };
        tokio::select! {
            _ = ctx.cancel.cancelled() => {
                finish_cancelled(&ctx, started);
                return;
            }
            _ = parked => {}
        }

        let entry = lock(&ctx.inner).queue.pop_front();
        let Some(entry) = entry else {
            let (records, scan_time) = {
                let mut inner = lock(&ctx.inner);
                inner.state = SchedulerState::Completed;
                inner.scan_time = started.elapsed();
                (inner.buffer.snapshot(), inner.scan_time)
            };
            tracing::info!(
                records = records.len(),
                elapsed_ms = scan_time.as_millis() as u64,
                "scan queue completed"
            );
            let _ = ctx.event_tx.send(SchedulerEvent::Complete { records, scan_time });
            return;
        };

        lock(&ctx.inner).current_target = Some(entry.target.clone());
        tracing::debug!(entry = %entry.id, target = %entry.target, "dispatching queue entry");

        let mut invocation = ScanInvocation::new(
            Arc::clone(&ctx.engine),
            entry.target.clone(),
            entry.options.clone(),
        )
        .with_timeout(ctx.config.single_scan_timeout)
        .with_cancel_token(ctx.cancel.clone());
        let outcome = invocation.run().await;

        {
            let mut inner = lock(&ctx.inner);
            inner.current_target = None;
            inner.scan_time = started.elapsed();
        }

        match outcome {
            InvocationOutcome::Completed(hosts) => {
                let appended: Vec<ScanRecord> = if hosts.is_empty() {
                    if ctx.config.save_not_found_to_results {
                        vec![ScanRecord::not_found(entry.target.as_str())]
                    } else {
                        Vec::new()
                    }
                } else {
                    hosts.into_iter().map(ScanRecord::from).collect()
                };

                tracing::debug!(
                    target = %entry.target,
                    hosts = appended.iter().filter(|r| r.is_found()).count(),
                    "queue entry completed"
                );

                let input = {
                    let mut inner = lock(&ctx.inner);
                    inner.buffer.append(appended.iter().cloned());
                    inner.processed += 1;
                    match ctx.mode {
                        ScanMode::Run => inner.buffer.snapshot(),
                        ScanMode::Shift => appended,
                    }
                };
                run_action(&ctx.action, &input);
            }

            failure @ (InvocationOutcome::Failed(_) | InvocationOutcome::TimedOut) => {
                let reason = match failure {
                    InvocationOutcome::Failed(err) => err.to_string(),
                    _ => {
                        ScanError::timeout(entry.target.as_str(), ctx.config.single_scan_timeout)
                            .to_string()
                    }
                };
                tracing::warn!(target = %entry.target, %reason, "queue entry failed");

                let marker = ScanRecord::failed(entry.target.as_str(), reason.as_str());
                let tolerated = ctx.config.run_action_on_error;
                {
                    let mut inner = lock(&ctx.inner);
                    if ctx.config.save_errors_to_results {
                        inner.buffer.push(marker.clone());
                    }
                    if tolerated {
                        inner.processed += 1;
                    } else {
                        inner.state = SchedulerState::Errored;
                        inner.scan_time = started.elapsed();
                    }
                }

                if tolerated {
                    // The marker is the error indicator the action sees,
                    // whether or not it was saved to the results.
                    let input: Vec<ScanRecord> = {
                        let inner = lock(&ctx.inner);
                        match ctx.mode {
                            ScanMode::Run => {
                                let mut records = inner.buffer.snapshot();
                                if !ctx.config.save_errors_to_results {
                                    records.push(marker.clone());
                                }
                                records
                            }
                            ScanMode::Shift => vec![marker.clone()],
                        }
                    };
                    run_action(&ctx.action, &input);
                } else {
                    tracing::error!(%reason, "scan queue halted on error");
                    let _ = ctx.event_tx.send(SchedulerEvent::Error { reason });
                    return;
                }
            }

            InvocationOutcome::Cancelled => {
                finish_cancelled(&ctx, started);
                return;
            }
        }
    }
}

fn finish_cancelled<R>(ctx: &RunContext<R>, started: Instant) {
    let mut inner = lock(&ctx.inner);
    inner.state = SchedulerState::Cancelled;
    inner.current_target = None;
    inner.scan_time = started.elapsed();
    drop(inner);
    tracing::info!("scan queue cancelled");
}

fn run_action<R>(action: &Arc<Mutex<Action<R>>>, records: &[ScanRecord]) {
    let mut action = lock(action);
    let _ = (action)(records);
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Host;
    use crate::engine::{MockResponse, MockScanEngine};
    use std::net::Ipv4Addr;

    fn host(n: u8) -> Host {
        Host::ipv4(Ipv4Addr::new(10, 0, 0, n))
    }

    fn target(n: u8) -> String {
        format!("10.0.0.{n}")
    }

    #[tokio::test]
    async fn test_run_to_completion_preserves_order() {
        let engine = Arc::new(
            MockScanEngine::new()
                .with_host(target(1), host(1))
                .with_host(target(2), host(2))
                .with_host(target(3), host(3)),
        );
        let scheduler = QueuedScanScheduler::collecting(
            engine.clone(),
            "10.0.0.1 10.0.0.2 10.0.0.3",
            "-sn",
        );
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert_eq!(scheduler.percent_complete(), 0.0);
        assert_eq!(scheduler.queue_len(), 3);

        scheduler.start_run_scan();
        scheduler.join().await;

        assert_eq!(scheduler.state(), SchedulerState::Completed);
        assert_eq!(scheduler.percent_complete(), 100.0);
        assert_eq!(engine.run_count(), 3);
        assert_eq!(
            scheduler.results(),
            vec![
                ScanRecord::found(host(1)),
                ScanRecord::found(host(2)),
                ScanRecord::found(host(3)),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_range_completes_immediately() {
        let engine = Arc::new(MockScanEngine::new());
        let scheduler = QueuedScanScheduler::collecting(engine, "", "");
        let mut events = scheduler.events().unwrap();

        scheduler.start_run_scan();
        scheduler.join().await;

        assert_eq!(scheduler.state(), SchedulerState::Completed);
        assert_eq!(scheduler.percent_complete(), 100.0);
        match events.recv().await.unwrap() {
            SchedulerEvent::Complete { records, .. } => assert!(records.is_empty()),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_pause_resume_before_start_is_noop() {
        let engine = Arc::new(MockScanEngine::new());
        let scheduler = QueuedScanScheduler::collecting(engine, "10.0.0.1 10.0.0.2", "");

        scheduler.pause();
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        scheduler.resume();
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert_eq!(scheduler.queue_len(), 2);
        assert!(scheduler.results().is_empty());
        assert_eq!(scheduler.index(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_resume_mid_run() {
        let engine = Arc::new(
            MockScanEngine::new()
                .with_latency(Duration::from_millis(100))
                .with_host(target(1), host(1))
                .with_host(target(2), host(2)),
        );
        let scheduler = QueuedScanScheduler::collecting(engine, "10.0.0.1 10.0.0.2", "");

        scheduler.start_run_scan();
        scheduler.pause();
        assert_eq!(scheduler.state(), SchedulerState::Paused);
        scheduler.resume();
        assert_eq!(scheduler.state(), SchedulerState::Running);
        scheduler.join().await;

        assert_eq!(scheduler.state(), SchedulerState::Completed);
        assert_eq!(scheduler.results().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_defers_next_dispatch() {
        let engine = Arc::new(
            MockScanEngine::new()
                .with_latency(Duration::from_millis(50))
                .with_host(target(1), host(1))
                .with_host(target(2), host(2)),
        );
        let scheduler =
            QueuedScanScheduler::collecting(engine.clone(), "10.0.0.1 10.0.0.2", "");

        scheduler.start_run_scan();
        for _ in 0..100 {
            if scheduler.current_target().is_some() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(scheduler.current_target().as_deref(), Some("10.0.0.1"));
        scheduler.pause();

        // The in-flight entry finishes, but the second is never dequeued
        // while paused.
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(scheduler.state(), SchedulerState::Paused);
        assert_eq!(engine.run_count(), 1);
        assert_eq!(scheduler.results().len(), 1);

        scheduler.resume();
        scheduler.join().await;
        assert_eq!(scheduler.state(), SchedulerState::Completed);
        assert_eq!(engine.run_count(), 2);
    }

    #[tokio::test]
    async fn test_not_found_marker_policy() {
        // default engine response is an empty host list
        let engine = Arc::new(MockScanEngine::new());
        let scheduler = QueuedScanScheduler::collecting(engine, "10.0.0.1 10.0.0.2", "")
            .with_config(SchedulerConfig::new().with_save_not_found_to_results(true));

        scheduler.start_run_scan();
        scheduler.join().await;

        assert_eq!(
            scheduler.results(),
            vec![
                ScanRecord::not_found("10.0.0.1"),
                ScanRecord::not_found("10.0.0.2"),
            ]
        );

        // with the flag off, nothing is appended
        let engine = Arc::new(MockScanEngine::new());
        let scheduler = QueuedScanScheduler::collecting(engine, "10.0.0.1 10.0.0.2", "");
        scheduler.start_run_scan();
        scheduler.join().await;
        assert!(scheduler.results().is_empty());
        assert_eq!(scheduler.state(), SchedulerState::Completed);
    }

    #[tokio::test]
    async fn test_untolerated_failure_halts_queue() {
        let engine = Arc::new(
            MockScanEngine::new()
                .with_response(target(1), MockResponse::Fail("no route".into()))
                .with_host(target(2), host(2)),
        );
        let scheduler =
            QueuedScanScheduler::collecting(engine.clone(), "10.0.0.1 10.0.0.2", "");
        let mut events = scheduler.events().unwrap();

        scheduler.start_run_scan();
        scheduler.join().await;

        assert_eq!(scheduler.state(), SchedulerState::Errored);
        // the second entry was never started
        assert_eq!(engine.run_count(), 1);
        assert_eq!(scheduler.queue_len(), 1);
        assert!(scheduler.results().is_empty());
        assert!(scheduler.percent_complete() < 100.0);

        match events.recv().await.unwrap() {
            SchedulerEvent::Error { reason } => assert!(reason.contains("no route")),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_error_marker_saved_even_when_fatal() {
        let engine = Arc::new(
            MockScanEngine::new().with_response(target(1), MockResponse::Fail("boom".into())),
        );
        let scheduler = QueuedScanScheduler::collecting(engine, "10.0.0.1", "")
            .with_config(SchedulerConfig::new().with_save_errors_to_results(true));

        scheduler.start_run_scan();
        scheduler.join().await;

        assert_eq!(scheduler.state(), SchedulerState::Errored);
        let results = scheduler.results();
        assert_eq!(results.len(), 1);
        assert!(results[0].is_failed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tolerated_timeout_keeps_going() {
        let ports_host = host(1).with_ports(vec![
            crate::core::Port::new(22, crate::core::Transport::Tcp).with_service("ssh"),
            crate::core::Port::new(80, crate::core::Transport::Tcp).with_service("http"),
        ]);
        let engine = Arc::new(
            MockScanEngine::new()
                .with_host(target(1), ports_host.clone())
                .with_response(target(2), MockResponse::Hang),
        );
        let scheduler = QueuedScanScheduler::collecting(engine, "10.0.0.1 10.0.0.2", "").with_config(
            SchedulerConfig::new()
                .with_run_action_on_error(true)
                .with_save_errors_to_results(true)
                .with_single_scan_timeout(Duration::from_secs(60)),
        );

        scheduler.start_run_scan();
        scheduler.join().await;

        assert_eq!(scheduler.state(), SchedulerState::Completed);
        assert_eq!(scheduler.percent_complete(), 100.0);

        let results = scheduler.results();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0], ScanRecord::found(ports_host));
        assert!(results[1].is_failed());
        assert_eq!(results[1].target(), Some("10.0.0.2"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_retains_partial_results() {
        let engine = Arc::new(
            MockScanEngine::new()
                .with_host(target(1), host(1))
                .with_response(target(2), MockResponse::Hang)
                .with_host(target(3), host(3)),
        );
        let scheduler = QueuedScanScheduler::collecting(
            engine.clone(),
            "10.0.0.1 10.0.0.2 10.0.0.3",
            "",
        );

        scheduler.start_run_scan();
        for _ in 0..100 {
            if scheduler.current_target().as_deref() == Some("10.0.0.2") {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(scheduler.current_target().as_deref(), Some("10.0.0.2"));

        scheduler.cancel_scan();
        scheduler.join().await;

        assert_eq!(scheduler.state(), SchedulerState::Cancelled);
        assert_eq!(scheduler.results(), vec![ScanRecord::found(host(1))]);
        // the third entry was abandoned, not run
        assert_eq!(engine.run_count(), 2);
        assert_eq!(scheduler.queue_len(), 1);
        assert_eq!(scheduler.current_target(), None);
    }

    #[tokio::test]
    async fn test_shift_mode_action_sees_each_batch_once() {
        let seen: Arc<Mutex<Vec<Vec<ScanRecord>>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let engine = Arc::new(
            MockScanEngine::new()
                .with_host(target(1), host(1))
                .with_host(target(2), host(2)),
        );
        let scheduler = QueuedScanScheduler::new(
            engine,
            "10.0.0.1 10.0.0.2",
            "",
            move |records: &[ScanRecord]| {
                sink.lock().unwrap().push(records.to_vec());
                records.len()
            },
        );

        scheduler.start_shift_scan();
        scheduler.join().await;

        let batches = seen.lock().unwrap().clone();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0], vec![ScanRecord::found(host(1))]);
        assert_eq!(batches[1], vec![ScanRecord::found(host(2))]);
    }

    #[tokio::test]
    async fn test_run_mode_action_sees_cumulative_results() {
        let seen: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let engine = Arc::new(
            MockScanEngine::new()
                .with_host(target(1), host(1))
                .with_host(target(2), host(2)),
        );
        let scheduler = QueuedScanScheduler::new(
            engine,
            "10.0.0.1 10.0.0.2",
            "",
            move |records: &[ScanRecord]| {
                sink.lock().unwrap().push(records.len());
                records.len()
            },
        );

        scheduler.start_run_scan();
        scheduler.join().await;

        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_next_and_shift_cursors() {
        let engine = Arc::new(
            MockScanEngine::new()
                .with_host(target(1), host(1))
                .with_host(target(2), host(2))
                .with_host(target(3), host(3)),
        );
        let scheduler = QueuedScanScheduler::collecting(
            engine,
            "10.0.0.1 10.0.0.2 10.0.0.3",
            "",
        );
        scheduler.start_shift_scan();
        scheduler.join().await;

        // non-destructive reads advance only the read cursor
        assert_eq!(scheduler.next(2).len(), 2);
        assert_eq!(scheduler.index(), 2);
        assert_eq!(scheduler.results().len(), 3);

        // destructive reads never overlap and rebase the read cursor
        let first = scheduler.shift(2);
        assert_eq!(first, vec![ScanRecord::found(host(1)), ScanRecord::found(host(2))]);
        assert_eq!(scheduler.index(), 0);
        assert_eq!(scheduler.shifted(), 2);
        assert_eq!(scheduler.results().len(), 1);

        assert_eq!(scheduler.shift_results(), Some(ScanRecord::found(host(3))));
        assert_eq!(scheduler.shift_results(), None);
        assert!(scheduler.results().is_empty());

        // misuse returns empty rather than failing
        assert!(scheduler.shift(0).is_empty());
        assert!(scheduler.next(0).is_empty());
    }

    #[tokio::test]
    async fn test_complete_event_fires_once() {
        let engine = Arc::new(MockScanEngine::new().with_host(target(1), host(1)));
        let scheduler = QueuedScanScheduler::collecting(engine, "10.0.0.1", "");
        let mut events = scheduler.events().unwrap();
        assert!(scheduler.events().is_none());

        scheduler.start_run_scan();
        scheduler.join().await;

        match events.recv().await.unwrap() {
            SchedulerEvent::Complete { records, .. } => assert_eq!(records.len(), 1),
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_double_start_is_ignored() {
        let engine = Arc::new(MockScanEngine::new().with_host(target(1), host(1)));
        let scheduler = QueuedScanScheduler::collecting(engine.clone(), "10.0.0.1", "");

        scheduler.start_run_scan();
        scheduler.start_run_scan();
        scheduler.join().await;

        assert_eq!(scheduler.state(), SchedulerState::Completed);
        assert_eq!(engine.run_count(), 1);

        // restarting a finished scheduler is also a no-op
        scheduler.start_run_scan();
        scheduler.join().await;
        assert_eq!(engine.run_count(), 1);
    }

    #[tokio::test]
    async fn test_enqueue() {
        let engine = Arc::new(
            MockScanEngine::new()
                .with_host(target(1), host(1))
                .with_host(target(2), host(2)),
        );
        let scheduler = QueuedScanScheduler::collecting(engine, "10.0.0.1", "");
        scheduler.enqueue("10.0.0.2");
        assert_eq!(scheduler.queue_len(), 2);

        scheduler.start_run_scan();
        scheduler.join().await;
        assert_eq!(scheduler.results().len(), 2);

        // ignored after termination
        scheduler.enqueue("10.0.0.3");
        assert_eq!(scheduler.queue_len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_time_is_recorded() {
        let engine = Arc::new(
            MockScanEngine::new()
                .with_latency(Duration::from_millis(100))
                .with_host(target(1), host(1)),
        );
        let scheduler = QueuedScanScheduler::collecting(engine, "10.0.0.1", "");
        assert_eq!(scheduler.scan_time(), Duration::ZERO);

        scheduler.start_run_scan();
        scheduler.join().await;
        assert!(scheduler.scan_time() >= Duration::from_millis(100));
    }
}
