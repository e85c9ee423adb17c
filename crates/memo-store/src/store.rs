//! The memo store: durable table plus read cache plus expiry sweep.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use memo_core::{
    Direction, ExpiryPolicy, ExpiryRule, Memo, MemoError, MemoStatus, NewMemo, Page, Result,
};
use tracing::{debug, info, warn};

use crate::cache::MemoCache;
use crate::metrics::{record_sweep_deleted, record_sweep_duration};
use crate::sweep::SweepReport;
use crate::table::{InMemoryTable, MemoTable};

/// The only authoritative reader and writer of memo state.
///
/// Reads go through the cache (read-populated). Writes go to the table
/// first, then invalidate every cache entry that could have included the
/// affected rows (write-invalidated, never write-through). The table stays
/// the source of truth, so a cache entry vanishing at any time is harmless.
///
/// Cloning is cheap; clones share the same table and cache.
///
/// # Example
///
/// ```no_run
/// use memo_core::{NewMemo, Page};
/// use memo_store::MemoStore;
///
/// # #[tokio::main]
/// # async fn main() -> memo_core::Result<()> {
/// let store = MemoStore::in_memory();
///
/// let id = store
///     .add(NewMemo::new("ann@example.com", "ben@example.com", "hi", "lunch?"))
///     .await?;
///
/// let inbox = store.get_received_memos("ben@example.com", Page::default()).await?;
/// assert_eq!(inbox[0].id(), id);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct MemoStore {
    table: Arc<dyn MemoTable>,
    cache: MemoCache,
    policy: ExpiryPolicy,
}

impl MemoStore {
    pub fn new(table: Arc<dyn MemoTable>, cache: MemoCache, policy: ExpiryPolicy) -> Self {
        Self {
            table,
            cache,
            policy,
        }
    }

    /// A store over an [`InMemoryTable`] with default cache and policy.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryTable::new()),
            MemoCache::default(),
            ExpiryPolicy::default(),
        )
    }

    pub fn cache(&self) -> &MemoCache {
        &self.cache
    }

    pub fn policy(&self) -> &ExpiryPolicy {
        &self.policy
    }

    pub fn table_name(&self) -> &str {
        self.table.name()
    }

    /// Persists a new memo and returns its id.
    ///
    /// The memo is stored as `sent` with `created_at = now`. The cache is
    /// not populated; the next read does that.
    ///
    /// # Errors
    ///
    /// - `MemoError::ValidationFailed` if the draft is malformed
    /// - `MemoError::Persistence` if the insert fails. The memo must then
    ///   be assumed not to exist.
    pub async fn add(&self, draft: NewMemo) -> Result<String> {
        draft.validate()?;

        let memo = Memo::create(draft, Utc::now());
        let id = memo.id().to_string();

        self.table.insert(memo.clone()).await?;

        self.cache.invalidate_for_memo(&memo).await;
        self.cache.invalidate_users().await;

        debug!(
            id = %id,
            from = %memo.from(),
            to = %memo.to(),
            broadcast = memo.is_broadcast(),
            ttl_days = ?memo.ttl_days().map(|t| t.days()),
            "Memo stored"
        );

        Ok(id)
    }

    /// Reads a memo, cache first.
    ///
    /// Misses are never cached.
    ///
    /// # Errors
    ///
    /// - `MemoError::NotFound` if the memo does not exist
    /// - `MemoError::Persistence` if the table read fails
    pub async fn get(&self, id: &str) -> Result<Memo> {
        if let Some(cached) = self.cache.get_memo(id).await {
            return Ok((*cached).clone());
        }

        let token = self.cache.begin_fill();
        match self.table.find(id).await? {
            Some(memo) => {
                self.cache.set_memo_if_current(token, memo.clone()).await;
                Ok(memo)
            },
            None => Err(MemoError::not_found(id)),
        }
    }

    /// Memos sent by `user`, newest first.
    pub async fn get_sent_memos(&self, user: &str, page: Page) -> Result<Vec<Memo>> {
        self.list(Direction::Sent, user, page).await
    }

    /// Memos `user` received: direct memos still `sent`, plus every broadcast.
    pub async fn get_received_memos(&self, user: &str, page: Page) -> Result<Vec<Memo>> {
        self.list(Direction::Received, user, page).await
    }

    async fn list(&self, direction: Direction, user: &str, page: Page) -> Result<Vec<Memo>> {
        if let Some(cached) = self.cache.get_list(direction, user, page).await {
            return Ok((*cached).clone());
        }

        let token = self.cache.begin_fill();
        let memos = match direction {
            Direction::Sent => self.table.list_sent(user, page).await?,
            Direction::Received => self.table.list_received(user, page).await?,
        };

        self.cache
            .set_list_if_current(token, direction, user, page, memos.clone())
            .await;
        Ok(memos)
    }

    /// Applies `sent -> delivered` and stamps `delivered_at`.
    ///
    /// Returns false if the memo does not exist or was already delivered.
    /// Concurrent callers on the same id see exactly one `true`.
    ///
    /// # Errors
    ///
    /// - `MemoError::InvalidTransition` if `status` is not `delivered`
    /// - `MemoError::Persistence` if the table update fails
    pub async fn update_status(&self, id: &str, status: MemoStatus) -> Result<bool> {
        if status != MemoStatus::Delivered {
            return Err(MemoError::invalid_transition(MemoStatus::Delivered, status));
        }

        match self.table.mark_delivered(id, Utc::now()).await? {
            Some(updated) => {
                self.cache.invalidate_for_memo(&updated).await;
                debug!(id = %id, status = %status, "Memo status updated");
                Ok(true)
            },
            None => Ok(false),
        }
    }

    /// Removes a memo. Returns false if nothing was deleted.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        match self.table.delete(id).await? {
            Some(removed) => {
                self.cache.invalidate_for_memo(&removed).await;
                self.cache.invalidate_users().await;
                debug!(id = %id, "Memo deleted");
                Ok(true)
            },
            None => Ok(false),
        }
    }

    /// Every identity that has sent or directly received a memo, sorted.
    pub async fn active_users(&self) -> Result<Vec<String>> {
        if let Some(cached) = self.cache.get_users().await {
            return Ok((*cached).clone());
        }

        let token = self.cache.begin_fill();
        let users = self.table.participants().await?;
        self.cache.set_users_if_current(token, users.clone()).await;
        Ok(users)
    }

    /// Runs one expiry sweep against the current time.
    pub async fn cleanup(&self) -> SweepReport {
        self.cleanup_at(Utc::now()).await
    }

    /// Runs one expiry sweep as if the current time were `now`.
    ///
    /// The three rules run as independent passes. Each pass invalidates the
    /// cache for its own deletions before the next starts, and a failing
    /// pass is recorded in the report without stopping the others.
    pub async fn cleanup_at(&self, now: DateTime<Utc>) -> SweepReport {
        let start = Instant::now();
        let mut report = SweepReport::default();

        self.sweep_delivered(now, &mut report).await;
        self.sweep_custom_ttl(now, &mut report).await;
        self.sweep_default_window(now, &mut report).await;

        record_sweep_duration(start.elapsed());

        if report.total_deleted() > 0 || !report.is_clean() {
            info!(
                delivered_grace = report.delivered_grace,
                custom_ttl = report.custom_ttl,
                default_window = report.default_window,
                failures = report.failures.len(),
                "Expiry sweep finished"
            );
        }

        report
    }

    async fn sweep_delivered(&self, now: DateTime<Utc>, report: &mut SweepReport) {
        let rule = ExpiryRule::DeliveredGrace;
        let cutoff = self.policy.delivered_cutoff(now);

        match self.table.delete_delivered_before(cutoff).await {
            Ok(removed) => {
                if !removed.is_empty() {
                    info!(
                        count = removed.len(),
                        grace = %self.policy.delivered_grace(),
                        "Cleaned up delivered memos past grace period"
                    );
                }
                self.finish_pass(rule, &removed, report).await;
            },
            Err(e) => {
                warn!(rule = rule.as_str(), error = %e, "Sweep pass failed");
                report.add_failure(rule, e);
            },
        }
    }

    async fn sweep_custom_ttl(&self, now: DateTime<Utc>, report: &mut SweepReport) {
        let rule = ExpiryRule::CustomTtl;

        let candidates = match self.table.find_sent_with_ttl().await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(rule = rule.as_str(), error = %e, "Sweep pass failed");
                report.add_failure(rule, e);
                return;
            },
        };

        let mut removed = Vec::new();
        for memo in candidates
            .iter()
            .filter(|m| self.policy.is_expired(m, now))
        {
            // Rows delivered since the scan belong to the delivered rule now.
            match self.table.delete_sent(memo.id()).await {
                Ok(Some(row)) => removed.push(row),
                Ok(None) => {},
                Err(e) => {
                    warn!(id = %memo.id(), error = %e, "Failed to delete expired memo");
                    report.add_failure(rule, format!("{}: {}", memo.id(), e));
                },
            }
        }

        if !removed.is_empty() {
            info!(count = removed.len(), "Cleaned up memos with expired custom TTL");
        }
        self.finish_pass(rule, &removed, report).await;
    }

    async fn sweep_default_window(&self, now: DateTime<Utc>, report: &mut SweepReport) {
        let rule = ExpiryRule::DefaultWindow;
        let cutoff = self.policy.default_cutoff(now);

        match self.table.delete_sent_without_ttl_before(cutoff).await {
            Ok(removed) => {
                if !removed.is_empty() {
                    info!(
                        count = removed.len(),
                        window = %self.policy.default_window(),
                        "Cleaned up sent memos past default window"
                    );
                }
                self.finish_pass(rule, &removed, report).await;
            },
            Err(e) => {
                warn!(rule = rule.as_str(), error = %e, "Sweep pass failed");
                report.add_failure(rule, e);
            },
        }
    }

    async fn finish_pass(&self, rule: ExpiryRule, removed: &[Memo], report: &mut SweepReport) {
        report.add_deleted(rule, removed.len());
        record_sweep_deleted(rule, removed.len());
        report.invalidated += self.invalidate_removed(removed).await;
    }

    /// Invalidates cache entries for a batch of deleted rows, once per
    /// affected user rather than once per row.
    async fn invalidate_removed(&self, removed: &[Memo]) -> usize {
        if removed.is_empty() {
            return 0;
        }

        let mut count = 0;
        let mut users = BTreeSet::new();
        let mut any_broadcast = false;

        for memo in removed {
            self.cache.invalidate_memo(memo.id()).await;
            count += 1;

            users.insert(memo.from());
            if memo.is_broadcast() {
                any_broadcast = true;
            } else {
                users.insert(memo.to());
            }
        }

        for user in users {
            count += self.cache.invalidate_user_lists(user).await.count;
        }
        if any_broadcast {
            count += self.cache.invalidate_all_received().await.count;
        }
        self.cache.invalidate_users().await;

        count
    }
}
