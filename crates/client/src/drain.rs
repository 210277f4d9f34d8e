//! In-flight send tracking for bounded-time drains.
//!
//! Every spawned delivery task holds an [`InFlightGuard`]; `flush`/`close`
//! wait for the live count to reach zero or for the timeout to elapse,
//! whichever comes first. A timeout only races the wait — it never aborts
//! the tracked tasks.

use std::time::Duration;
use tokio::sync::watch;

/// Counter of live delivery tasks.
pub(crate) struct InFlight {
    counter: watch::Sender<usize>,
}

/// RAII token for one tracked task; decrements on drop, so a panicking
/// task still releases its slot.
pub(crate) struct InFlightGuard {
    counter: watch::Sender<usize>,
}

impl InFlight {
    pub fn new() -> Self {
        let (counter, _) = watch::channel(0);
        Self { counter }
    }

    /// Register one task.
    pub fn begin(&self) -> InFlightGuard {
        self.counter.send_modify(|n| *n += 1);
        InFlightGuard {
            counter: self.counter.clone(),
        }
    }

    /// Live task count.
    pub fn count(&self) -> usize {
        *self.counter.borrow()
    }

    /// Wait until the count reaches zero.
    ///
    /// Returns `true` once drained, `false` if `timeout` elapsed first.
    /// With no timeout the wait is unbounded. Zero pending resolves
    /// immediately.
    pub async fn drained(&self, timeout: Option<Duration>) -> bool {
        let mut rx = self.counter.subscribe();
        let wait = rx.wait_for(|n| *n == 0);
        match timeout {
            Some(limit) => matches!(tokio::time::timeout(limit, wait).await, Ok(Ok(_))),
            None => {
                // The sender lives in self, so the wait cannot error.
                let _ = wait.await;
                true
            }
        }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.counter.send_modify(|n| *n -= 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn drained_is_immediate_with_nothing_pending() {
        let tracker = InFlight::new();
        assert!(tracker.drained(Some(Duration::ZERO)).await);
        assert!(tracker.drained(None).await);
    }

    #[tokio::test(start_paused = true)]
    async fn drained_times_out_while_tasks_live() {
        let tracker = InFlight::new();
        let guard = tracker.begin();
        assert_eq!(tracker.count(), 1);

        assert!(!tracker.drained(Some(Duration::from_millis(10))).await);

        drop(guard);
        assert!(tracker.drained(Some(Duration::from_millis(10))).await);
    }

    #[tokio::test(start_paused = true)]
    async fn guard_drop_wakes_waiters() {
        let tracker = InFlight::new();
        let guard = tracker.begin();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            drop(guard);
        });

        assert!(tracker.drained(Some(Duration::from_secs(1))).await);
        assert_eq!(tracker.count(), 0);
    }

    #[tokio::test]
    async fn panicking_task_still_releases_its_slot() {
        let tracker = InFlight::new();
        let guard = tracker.begin();

        let handle = tokio::spawn(async move {
            let _guard = guard;
            panic!("send task died");
        });
        assert!(handle.await.is_err());

        assert!(tracker.drained(Some(Duration::from_millis(10))).await);
    }
}
