//! Debounce for search-as-you-type.
//!
//! Every call waits for the delay and only runs if no newer call was made in
//! the meantime. In-flight requests are not cancelled, so completions can
//! still arrive out of order.

// Use 3rd party
use log::debug;
use tokio::time::sleep;

// Use built-in library
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_DELAY: Duration = Duration::from_millis(300);

#[derive(Clone, Debug)]
pub struct Debouncer {
    delay: Duration,
    generation: Arc<AtomicU64>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DELAY)
    }
}

impl Debouncer {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Runs `task` after the delay, or returns `None` if a newer call
    /// superseded this one while it was waiting.
    pub async fn run<F, Fut, T>(&self, task: F) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        sleep(self.delay).await;

        if self.generation.load(Ordering::SeqCst) != ticket {
            debug!("debounced call {} superseded", ticket);
            return None;
        }
        Some(task().await)
    }
}
