//! Prefix-based bulk invalidation.

use memo_core::{Direction, Memo};
use tracing::debug;

use crate::cache::{CacheKey, MemoCache};

/// Result of an invalidation pass.
#[derive(Debug, Clone, Default)]
pub struct InvalidationResult {
    /// Number of entries invalidated.
    pub count: usize,
    /// Prefixes applied.
    pub prefixes: Vec<String>,
}

impl InvalidationResult {
    fn merge(&mut self, other: InvalidationResult) {
        self.count += other.count;
        self.prefixes.extend(other.prefixes);
    }
}

impl MemoCache {
    /// Invalidates every live entry whose rendered key starts with `prefix`.
    ///
    /// Only live entries are enumerated. Entries whose TTL already elapsed
    /// are skipped, never resurrected.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use memo_store::cache::{CacheConfig, MemoCache};
    /// # #[tokio::main]
    /// # async fn main() {
    /// # let cache = MemoCache::new(CacheConfig::default());
    /// let result = cache.invalidate_by_prefix("received:").await;
    /// println!("Invalidated {} entries", result.count);
    /// # }
    /// ```
    pub async fn invalidate_by_prefix(&self, prefix: &str) -> InvalidationResult {
        // Loads started before this point must not land in cleared keys.
        self.bump_generation();

        let matched: Vec<CacheKey> = self
            .iter()
            .filter(|(key, _)| key.to_string().starts_with(prefix))
            .map(|(key, _)| (*key).clone())
            .collect();

        let count = matched.len();
        for key in matched {
            self.invalidate(&key).await;
        }

        debug!(prefix = %prefix, count = count, "Cache entries invalidated by prefix");

        InvalidationResult {
            count,
            prefixes: vec![prefix.to_string()],
        }
    }

    /// Invalidates every page of `user`'s sent and received lists.
    pub async fn invalidate_user_lists(&self, user: &str) -> InvalidationResult {
        let mut result = self
            .invalidate_by_prefix(&CacheKey::user_list_prefix(Direction::Sent, user))
            .await;
        result.merge(
            self.invalidate_by_prefix(&CacheKey::user_list_prefix(Direction::Received, user))
                .await,
        );
        result
    }

    /// Invalidates every user's received lists. Used for broadcast changes.
    pub async fn invalidate_all_received(&self) -> InvalidationResult {
        self.invalidate_by_prefix(&CacheKey::direction_prefix(Direction::Received))
            .await
    }

    /// Invalidates everything that could hold `memo`: its own entry, the
    /// sender's lists, and the recipient's lists (all received lists for a
    /// broadcast).
    pub async fn invalidate_for_memo(&self, memo: &Memo) -> InvalidationResult {
        self.invalidate_memo(memo.id()).await;

        let mut result = InvalidationResult {
            count: 1,
            prefixes: vec![CacheKey::memo(memo.id()).to_string()],
        };
        result.merge(self.invalidate_user_lists(memo.from()).await);

        if memo.is_broadcast() {
            result.merge(self.invalidate_all_received().await);
        } else if memo.to() != memo.from() {
            result.merge(self.invalidate_user_lists(memo.to()).await);
        }

        result
    }
}
