//! Background expiry sweep scheduler.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, warn};

use super::SweepState;
use crate::MemoStore;

/// Configuration for the sweep scheduler.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Interval between sweeps. The first sweep runs one interval after start.
    pub interval: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60 * 60),
        }
    }
}

impl SweepConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Handle for controlling a running sweep scheduler.
pub struct SweepHandle {
    /// Sender to signal shutdown.
    shutdown_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl SweepHandle {
    /// Signals the scheduler to stop. A sweep already in flight finishes.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Signals the scheduler to stop and waits for the loop to exit.
    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            warn!(error = %e, "Sweep task ended abnormally");
        }
    }
}

impl Drop for SweepHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Runs [`MemoStore::cleanup`] on a fixed interval.
///
/// Sweeps never overlap: the next tick is not awaited until the current
/// sweep returns, and ticks missed meanwhile are skipped.
pub struct SweepScheduler {
    store: MemoStore,
    state: Arc<SweepState>,
    config: SweepConfig,
}

impl SweepScheduler {
    pub fn new(store: MemoStore, state: Arc<SweepState>, config: SweepConfig) -> Self {
        Self {
            store,
            state,
            config,
        }
    }

    /// Starts the background sweep task.
    ///
    /// Returns a handle that can be used to stop the scheduler.
    pub fn start(self) -> SweepHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(shutdown_rx));

        SweepHandle {
            shutdown_tx,
            task: Some(task),
        }
    }

    /// Runs the scheduler loop until shutdown is signalled.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        let period = self.config.interval;
        let mut timer = interval_at(Instant::now() + period, period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(interval = ?period, "Starting expiry sweep scheduler");

        loop {
            // Shutdown wins over a tick that became due during a long sweep.
            tokio::select! {
                biased;

                result = shutdown_rx.changed() => {
                    if result.is_err() || *shutdown_rx.borrow() {
                        info!("Expiry sweep scheduler shutting down");
                        break;
                    }
                }
                _ = timer.tick() => {
                    self.do_sweep().await;
                }
            }
        }
    }

    async fn do_sweep(&self) {
        debug!("Starting scheduled sweep");

        let report = self.store.cleanup().await;
        self.store.cache().run_pending_tasks().await;

        if !report.is_clean() {
            warn!(failures = ?report.failures, "Sweep finished with failures");
        }
        self.state.record_run(report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use memo_core::{ExpiryPolicy, Memo, NewMemo, Page, Result};

    use crate::cache::MemoCache;
    use crate::table::{InMemoryTable, MemoTable};

    const PERIOD: Duration = Duration::from_secs(60);

    fn scheduler() -> (SweepScheduler, Arc<SweepState>, Arc<InMemoryTable>) {
        let table = Arc::new(InMemoryTable::new());
        let store = MemoStore::new(table.clone(), MemoCache::default(), ExpiryPolicy::default());
        let state = Arc::new(SweepState::new());
        let config = SweepConfig::default().with_interval(PERIOD);
        (SweepScheduler::new(store, state.clone(), config), state, table)
    }

    /// Delegates to an `InMemoryTable`, stalling the delivered-grace delete.
    struct SlowTable {
        inner: InMemoryTable,
        delay: Duration,
        entered: AtomicBool,
    }

    impl SlowTable {
        fn new(delay: Duration) -> Self {
            Self {
                inner: InMemoryTable::new(),
                delay,
                entered: AtomicBool::new(false),
            }
        }

        fn entered(&self) -> bool {
            self.entered.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MemoTable for SlowTable {
        async fn insert(&self, memo: Memo) -> Result<()> {
            self.inner.insert(memo).await
        }

        async fn find(&self, id: &str) -> Result<Option<Memo>> {
            self.inner.find(id).await
        }

        async fn list_sent(&self, user: &str, page: Page) -> Result<Vec<Memo>> {
            self.inner.list_sent(user, page).await
        }

        async fn list_received(&self, user: &str, page: Page) -> Result<Vec<Memo>> {
            self.inner.list_received(user, page).await
        }

        async fn mark_delivered(&self, id: &str, at: DateTime<Utc>) -> Result<Option<Memo>> {
            self.inner.mark_delivered(id, at).await
        }

        async fn delete(&self, id: &str) -> Result<Option<Memo>> {
            self.inner.delete(id).await
        }

        async fn delete_sent(&self, id: &str) -> Result<Option<Memo>> {
            self.inner.delete_sent(id).await
        }

        async fn delete_delivered_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<Memo>> {
            self.entered.store(true, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.inner.delete_delivered_before(cutoff).await
        }

        async fn find_sent_with_ttl(&self) -> Result<Vec<Memo>> {
            self.inner.find_sent_with_ttl().await
        }

        async fn delete_sent_without_ttl_before(
            &self,
            cutoff: DateTime<Utc>,
        ) -> Result<Vec<Memo>> {
            self.inner.delete_sent_without_ttl_before(cutoff).await
        }

        async fn participants(&self) -> Result<Vec<String>> {
            self.inner.participants().await
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    fn slow_scheduler(delay: Duration) -> (SweepScheduler, Arc<SweepState>, Arc<SlowTable>) {
        let table = Arc::new(SlowTable::new(delay));
        let store = MemoStore::new(table.clone(), MemoCache::default(), ExpiryPolicy::default());
        let state = Arc::new(SweepState::new());
        let config = SweepConfig::default().with_interval(PERIOD);
        (SweepScheduler::new(store, state.clone(), config), state, table)
    }

    #[test]
    fn test_sweep_config_default() {
        assert_eq!(SweepConfig::default().interval, Duration::from_secs(3600));
    }

    #[test]
    fn test_sweep_handle_stop() {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = SweepHandle {
            shutdown_tx,
            task: None,
        };

        assert!(!*shutdown_rx.borrow());
        handle.stop();
        assert!(*shutdown_rx.borrow());
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_sweep_waits_one_interval() {
        let (scheduler, state, _) = scheduler();
        let handle = scheduler.start();

        tokio::time::sleep(PERIOD / 2).await;
        assert_eq!(state.total_runs(), 0);

        tokio::time::sleep(PERIOD).await;
        assert_eq!(state.total_runs(), 1);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_sweep_per_interval() {
        let (scheduler, state, _) = scheduler();
        let handle = scheduler.start();

        tokio::time::sleep(PERIOD * 3 + PERIOD / 2).await;
        assert_eq!(state.total_runs(), 3);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_sweeps_after_shutdown() {
        let (scheduler, state, _) = scheduler();
        let handle = scheduler.start();

        tokio::time::sleep(PERIOD + PERIOD / 2).await;
        handle.shutdown().await;
        assert_eq!(state.total_runs(), 1);

        tokio::time::sleep(PERIOD * 5).await;
        assert_eq!(state.total_runs(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduled_sweep_deletes_expired() {
        let (scheduler, state, table) = scheduler();
        table
            .insert(Memo::create(
                NewMemo::new("alice", "bob", "s", "m").with_id("old"),
                Utc::now() - chrono::Duration::hours(25),
            ))
            .await
            .unwrap();
        let handle = scheduler.start();

        tokio::time::sleep(PERIOD + PERIOD / 2).await;
        handle.shutdown().await;

        assert!(table.is_empty());
        let report = state.last_report().unwrap();
        assert_eq!(report.default_window, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_before_first_tick_runs_nothing() {
        let (scheduler, state, _) = scheduler();
        let handle = scheduler.start();

        tokio::time::sleep(PERIOD / 2).await;
        handle.shutdown().await;

        assert_eq!(state.total_runs(), 0);
        assert!(state.last_report().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_lets_in_flight_sweep_finish() {
        let (scheduler, state, table) = slow_scheduler(Duration::from_secs(30));
        table
            .insert(Memo::create(
                NewMemo::new("alice", "bob", "s", "m").with_id("old"),
                Utc::now() - chrono::Duration::hours(25),
            ))
            .await
            .unwrap();
        let handle = scheduler.start();

        tokio::time::sleep(PERIOD + Duration::from_secs(1)).await;
        assert!(table.entered());
        assert_eq!(state.total_runs(), 0);

        handle.shutdown().await;

        assert_eq!(state.total_runs(), 1);
        let report = state.last_report().unwrap();
        assert_eq!(report.default_window, 1);
        assert!(table.inner.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_wins_over_tick_missed_during_sweep() {
        // The sweep outlasts the period, so a tick is due when it returns.
        let (scheduler, state, table) = slow_scheduler(PERIOD + PERIOD / 2);
        let handle = scheduler.start();

        tokio::time::sleep(PERIOD + Duration::from_secs(1)).await;
        assert!(table.entered());

        handle.shutdown().await;
        assert_eq!(state.total_runs(), 1);
    }
}
