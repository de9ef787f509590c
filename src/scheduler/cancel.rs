//! Cancellation signalling.

use tokio::sync::watch;

/// A clonable cancellation flag.
///
/// Cancelling is idempotent and sticky: once fired, every clone observes it
/// and every pending or future [`cancelled`](CancelToken::cancelled) call
/// resolves immediately.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: std::sync::Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// Creates a fresh, un-fired token.
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: std::sync::Arc::new(tx),
            rx,
        }
    }

    /// Fires the token.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }

    /// Returns `true` once the token has been fired.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves when the token fires; immediately if it already has.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            // Sender gone without firing; this token can never cancel.
            std::future::pending::<()>().await;
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}
