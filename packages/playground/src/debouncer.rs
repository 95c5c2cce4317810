use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Debug)]
struct Pending {
    handle: JoinHandle<()>,
    /// Taken either by the task when it wakes, or by `cancel`. Whoever
    /// takes it first decides whether the call runs.
    claimed: Arc<AtomicBool>,
}

impl Pending {
    fn is_waiting(&self) -> bool {
        !self.claimed.load(Ordering::Acquire)
    }

    fn claim(&self) -> bool {
        !self.claimed.swap(true, Ordering::AcqRel)
    }
}

/// Trailing-edge debounce: only the last of a burst of calls runs, once the
/// interval has passed without a new call.
///
/// Must be used from within a tokio runtime.
#[derive(Debug)]
pub struct Debouncer {
    interval: Duration,
    pending: Option<Pending>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INTERVAL)
    }
}

impl Debouncer {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(200);

    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            pending: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Cancel any pending call and run `f` after the interval
    pub fn schedule<F>(&mut self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();
        let interval = self.interval;
        let claimed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&claimed);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(interval).await;
            if !flag.swap(true, Ordering::AcqRel) {
                f();
            }
        });
        self.pending = Some(Pending { handle, claimed });
    }

    /// Returns whether a call was still waiting. A call that has already
    /// started is left to finish and reported as not waiting.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                let waiting = pending.claim();
                pending.handle.abort();
                waiting
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(Pending::is_waiting)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
