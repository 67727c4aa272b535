//! Single-slot debounce for deferred refresh work.
//!
//! This module provides `RefreshCoordinator`, which holds at most one
//! pending deferred task. Triggering while a task is pending cancels the
//! occupant and waits for its teardown to finish before installing the
//! replacement, so two deferred actions never run interleaved against
//! shared downstream state.

use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Debounces one source of high-frequency events into at most one
/// outstanding deferred task.
///
/// The coordinator knows nothing about the work it defers. Create one
/// instance per independent event source; two sources sharing a slot
/// would cancel each other.
#[derive(Debug, Default)]
pub struct RefreshCoordinator {
    slot: Mutex<Option<JoinHandle<()>>>,
}

impl RefreshCoordinator {
    /// Create an idle coordinator.
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Cancel any pending task, wait for it to actually terminate, then
    /// schedule `work` to run once `delay` has elapsed.
    ///
    /// Returns as soon as the replacement is installed; the deferred
    /// work runs on a background task. A burst of triggers spaced closer
    /// than `delay` therefore collapses into the single task scheduled
    /// by the last trigger.
    pub async fn trigger<F, Fut>(&self, delay: Duration, work: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut slot = self.slot.lock().await;
        if let Some(task) = slot.take() {
            Self::reap(task).await;
        }
        *slot = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            work().await;
        }));
    }

    /// Cancel and tear down the pending task, if any. Idle coordinators
    /// are a no-op.
    pub async fn cancel(&self) {
        if let Some(task) = self.slot.lock().await.take() {
            Self::reap(task).await;
        }
    }

    /// Whether a scheduled task is still outstanding. A task that ran to
    /// completion without being superseded counts as no longer pending.
    pub async fn is_pending(&self) -> bool {
        let slot = self.slot.lock().await;
        slot.as_ref().map(|task| !task.is_finished()).unwrap_or(false)
    }

    /// Abort `task` and block until its termination is observed.
    /// Cancellation is the expected outcome; anything else worth noting
    /// goes to the log.
    async fn reap(task: JoinHandle<()>) {
        task.abort();
        match task.await {
            Ok(()) => {}
            Err(e) if e.is_cancelled() => {
                tracing::debug!("Superseded pending refresh task");
            }
            Err(e) => {
                tracing::warn!("Deferred refresh task panicked: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::time::sleep;

    /// Flips a flag when dropped, which for an aborted task happens only
    /// once its teardown has completed.
    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_work_runs_after_delay() {
        let coordinator = RefreshCoordinator::new();
        let runs = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&runs);
        coordinator
            .trigger(Duration::from_millis(10), move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .await;

        assert_eq!(runs.load(Ordering::SeqCst), 0);
        sleep(Duration::from_millis(100)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(!coordinator.is_pending().await);
    }

    #[tokio::test]
    async fn test_burst_collapses_to_last_trigger() {
        let coordinator = RefreshCoordinator::new();
        let observed = Arc::new(std::sync::Mutex::new(Vec::new()));

        for i in 0..5 {
            let observed = Arc::clone(&observed);
            coordinator
                .trigger(Duration::from_millis(40), move || async move {
                    observed.lock().unwrap().push(i);
                })
                .await;
        }
        sleep(Duration::from_millis(200)).await;

        assert_eq!(*observed.lock().unwrap(), vec![4]);
    }

    #[tokio::test]
    async fn test_supersession_waits_for_teardown() {
        let coordinator = RefreshCoordinator::new();
        let torn_down = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));
        let (started_tx, started_rx) = tokio::sync::oneshot::channel::<()>();

        let flag = DropFlag(Arc::clone(&torn_down));
        let first_finished = Arc::clone(&finished);
        coordinator
            .trigger(Duration::ZERO, move || async move {
                let _flag = flag;
                let _ = started_tx.send(());
                sleep(Duration::from_secs(60)).await;
                first_finished.store(true, Ordering::SeqCst);
            })
            .await;
        started_rx.await.unwrap();

        // The first task is mid-flight; supersede it.
        coordinator
            .trigger(Duration::from_millis(10), || async {})
            .await;

        assert!(torn_down.load(Ordering::SeqCst));
        assert!(!finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_cancel_discards_pending_work() {
        let coordinator = RefreshCoordinator::new();
        let runs = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&runs);
        coordinator
            .trigger(Duration::from_millis(40), move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .await;
        assert!(coordinator.is_pending().await);

        coordinator.cancel().await;
        sleep(Duration::from_millis(100)).await;

        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert!(!coordinator.is_pending().await);
    }

    #[tokio::test]
    async fn test_cancel_on_idle_coordinator_is_a_noop() {
        let coordinator = RefreshCoordinator::new();
        coordinator.cancel().await;
        assert!(!coordinator.is_pending().await);
    }

    #[tokio::test]
    async fn test_triggers_after_completion_run_again() {
        let coordinator = RefreshCoordinator::new();
        let runs = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let counter = Arc::clone(&runs);
            coordinator
                .trigger(Duration::from_millis(5), move || async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .await;
            sleep(Duration::from_millis(80)).await;
        }

        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }
}
