//! Operation timing.
//!
//! ```rust
//! use folio_util::timing::TimingGuard;
//!
//! fn create_snapshot() {
//!     let _timing = TimingGuard::snapshot("create");
//!     // duration is logged when _timing is dropped
//! }
//! # create_snapshot();
//! ```

use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Durations at or above this are logged at info.
const INFO_THRESHOLD: Duration = Duration::from_millis(100);

/// Durations at or above this are logged as slow.
const WARN_THRESHOLD: Duration = Duration::from_secs(5);

/// Logs how long a store operation took when dropped.
pub struct TimingGuard {
    operation: &'static str,
    start: Instant,
}

impl TimingGuard {
    /// Time a snapshot store operation such as `create` or `squash`.
    pub fn snapshot(operation: &'static str) -> Self {
        debug!(operation, "Starting snapshot operation");
        Self {
            operation,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

fn format_duration(duration: Duration) -> String {
    let ms = duration.as_millis();
    if ms < 1000 {
        format!("{ms}ms")
    } else {
        format!("{:.2}s", duration.as_secs_f64())
    }
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        let elapsed = self.elapsed();
        let duration = format_duration(elapsed);

        if elapsed >= WARN_THRESHOLD {
            warn!(operation = self.operation, %duration, "Slow snapshot operation");
        } else if elapsed >= INFO_THRESHOLD {
            info!(operation = self.operation, %duration, "Snapshot operation completed");
        } else {
            debug!(operation = self.operation, %duration, "Snapshot operation completed");
        }
    }
}
