//! Memo read cache using Moka.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use memo_core::{Direction, Memo, Page};
use moka::future::Cache;

use crate::cache::keys::{CacheKey, CacheValue};
use crate::metrics::CacheMetrics;

/// Cache configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Uniform TTL for every entry, in seconds (default: 300 = 5 minutes)
    pub ttl_seconds: u64,
    /// Maximum number of entries (default: 10000)
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 300,
            max_capacity: 10_000,
        }
    }
}

impl CacheConfig {
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl_seconds = ttl.as_secs();
        self
    }

    pub fn with_max_capacity(mut self, max_capacity: u64) -> Self {
        self.max_capacity = max_capacity;
        self
    }
}

/// Snapshot of the invalidation generation, taken before a read-through
/// load and checked before the loaded value is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillToken(u64);

/// Volatile projection of the memo table.
///
/// Thread-safe and async-friendly. Values are only ever written through the
/// typed `set_*` methods, so every key variant always holds its matching
/// value variant. Nothing here can fail: a missing or evicted entry is just
/// a miss.
///
/// # Examples
///
/// ```no_run
/// use memo_store::cache::{CacheConfig, MemoCache};
///
/// # #[tokio::main]
/// # async fn main() {
/// let cache = MemoCache::new(CacheConfig::default());
/// if cache.get_memo("0193-abc").await.is_none() {
///     println!("miss, read the table");
/// }
/// # }
/// ```
#[derive(Clone)]
pub struct MemoCache {
    inner: Cache<CacheKey, CacheValue>,
    generation: Arc<AtomicU64>,
    metrics: CacheMetrics,
}

impl MemoCache {
    pub fn new(config: CacheConfig) -> Self {
        let metrics = CacheMetrics::new();

        let eviction_metrics = metrics.clone();
        let inner = Cache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(Duration::from_secs(config.ttl_seconds))
            .eviction_listener(move |_key, _value, cause| {
                let reason = match cause {
                    moka::notification::RemovalCause::Expired => "ttl",
                    moka::notification::RemovalCause::Size => "capacity",
                    moka::notification::RemovalCause::Explicit => "manual",
                    moka::notification::RemovalCause::Replaced => "replaced",
                };
                eviction_metrics.record_eviction(reason);
            })
            .build();

        Self {
            inner,
            generation: Arc::new(AtomicU64::new(0)),
            metrics,
        }
    }

    /// Looks up any entry. `None` on miss or expiration.
    pub async fn get(&self, key: &CacheKey) -> Option<CacheValue> {
        let start = Instant::now();
        let result = self.inner.get(key).await;

        if result.is_some() {
            self.metrics.record_hit();
        } else {
            self.metrics.record_miss();
        }

        self.metrics
            .record_operation_duration("get", start.elapsed());
        result
    }

    /// Removes one entry. Idempotent.
    pub async fn invalidate(&self, key: &CacheKey) {
        self.bump_generation();
        self.inner.invalidate(key).await;
    }

    /// Removes every entry.
    pub fn invalidate_all(&self) {
        self.bump_generation();
        self.inner.invalidate_all();
    }

    /// Starts a read-through load. Pass the token to a `set_*_if_current`
    /// method once the table read returns.
    pub fn begin_fill(&self) -> FillToken {
        FillToken(self.generation.load(Ordering::Acquire))
    }

    /// True if no invalidation ran since `token` was taken.
    pub fn is_current(&self, token: FillToken) -> bool {
        self.generation.load(Ordering::Acquire) == token.0
    }

    pub(crate) fn bump_generation(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    pub async fn get_memo(&self, id: &str) -> Option<Arc<Memo>> {
        match self.get(&CacheKey::memo(id)).await {
            Some(CacheValue::Memo(memo)) => Some(memo),
            _ => None,
        }
    }

    pub async fn set_memo(&self, memo: Memo) {
        let key = CacheKey::memo(memo.id());
        self.insert(key, CacheValue::Memo(Arc::new(memo))).await;
    }

    /// Stores `memo` unless an invalidation raced the load behind `token`.
    pub async fn set_memo_if_current(&self, token: FillToken, memo: Memo) -> bool {
        if !self.is_current(token) {
            return false;
        }
        self.set_memo(memo).await;
        true
    }

    pub async fn get_list(
        &self,
        direction: Direction,
        user: &str,
        page: Page,
    ) -> Option<Arc<Vec<Memo>>> {
        match self.get(&CacheKey::list(direction, user, page)).await {
            Some(CacheValue::List(memos)) => Some(memos),
            _ => None,
        }
    }

    pub async fn set_list(&self, direction: Direction, user: &str, page: Page, memos: Vec<Memo>) {
        let key = CacheKey::list(direction, user, page);
        self.insert(key, CacheValue::List(Arc::new(memos))).await;
    }

    pub async fn set_list_if_current(
        &self,
        token: FillToken,
        direction: Direction,
        user: &str,
        page: Page,
        memos: Vec<Memo>,
    ) -> bool {
        if !self.is_current(token) {
            return false;
        }
        self.set_list(direction, user, page, memos).await;
        true
    }

    pub async fn get_users(&self) -> Option<Arc<Vec<String>>> {
        match self.get(&CacheKey::Users).await {
            Some(CacheValue::Users(users)) => Some(users),
            _ => None,
        }
    }

    pub async fn set_users(&self, users: Vec<String>) {
        self.insert(CacheKey::Users, CacheValue::Users(Arc::new(users)))
            .await;
    }

    pub async fn set_users_if_current(&self, token: FillToken, users: Vec<String>) -> bool {
        if !self.is_current(token) {
            return false;
        }
        self.set_users(users).await;
        true
    }

    pub async fn invalidate_memo(&self, id: &str) {
        self.invalidate(&CacheKey::memo(id)).await;
    }

    pub async fn invalidate_users(&self) {
        self.invalidate(&CacheKey::Users).await;
    }

    async fn insert(&self, key: CacheKey, value: CacheValue) {
        let start = Instant::now();
        self.inner.insert(key, value).await;
        self.metrics
            .record_operation_duration("insert", start.elapsed());
        self.update_entry_gauge();
    }

    /// Approximate number of live entries.
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }

    /// Iterates a snapshot of live entries. Expired entries are never yielded.
    pub fn iter(&self) -> impl Iterator<Item = (Arc<CacheKey>, CacheValue)> + '_ {
        self.inner.iter()
    }

    /// Runs Moka's pending maintenance: evicts expired entries and settles
    /// the entry count.
    pub async fn run_pending_tasks(&self) {
        self.inner.run_pending_tasks().await;
        self.update_entry_gauge();
    }

    fn update_entry_gauge(&self) {
        self.metrics.update_entry_count(self.inner.entry_count());
    }

    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }
}

impl Default for MemoCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}
