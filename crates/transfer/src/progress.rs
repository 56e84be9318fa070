use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

/// Callback invoked with an integer upload percentage (0-100).
pub type ProgressCallback = Arc<dyn Fn(u8) + Send + Sync>;

/// Converts a byte count into a rounded percentage of `total`.
///
/// An empty total counts as complete. The result never exceeds 100.
pub fn percent_of(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let pct = (sent as f64 / total as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

/// Accumulates sent bytes and notifies a callback whenever the integer
/// percentage increases.
///
/// Notifications are monotonic: a percentage is reported at most once and
/// never lower than a previous one, even when several threads advance the
/// reporter concurrently.
pub struct ProgressReporter {
    total: u64,
    sent: AtomicU64,
    last: AtomicU8,
    callback: ProgressCallback,
}

impl ProgressReporter {
    /// Creates a reporter for a transfer of `total` bytes.
    pub fn new(total: u64, callback: ProgressCallback) -> Self {
        Self {
            total,
            sent: AtomicU64::new(0),
            last: AtomicU8::new(0),
            callback,
        }
    }

    /// Records `bytes` more bytes as sent.
    pub fn advance(&self, bytes: u64) {
        let sent = self.sent.fetch_add(bytes, Ordering::Relaxed) + bytes;
        self.report(percent_of(sent.min(self.total), self.total));
    }

    /// Reports completion (100%).
    pub fn finish(&self) {
        self.report(100);
    }

    /// Bytes recorded so far.
    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    fn report(&self, pct: u8) {
        let prev = self.last.fetch_max(pct, Ordering::AcqRel);
        if pct > prev {
            (self.callback)(pct);
        }
    }
}
