//! Cooperative cancellation for long-running downloads (\S5).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cancellation flag shared between a caller and an in-flight download.
///
/// Cheap to clone (an `Arc` underneath); [`CancellationToken::cancel`]
/// takes effect on the next chunk boundary the download checks, per \S5's
/// "implementations MAY check a cancellation handle at tensor [or chunk]
/// boundaries only".
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// A fresh, not-yet-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Signals cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether [`CancellationToken::cancel`] has been called.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
