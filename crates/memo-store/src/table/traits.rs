//! Durable memo table trait definition.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use memo_core::{Memo, Page, Result};

/// The authoritative memo table.
///
/// This trait abstracts over the relational storage behind the store
/// (MySQL, Postgres, SQLite, or the bundled [`InMemoryTable`]). Implementors
/// own any atomicity the store relies on. The store itself takes no locks
/// around durable writes.
///
/// Mutating methods return the affected rows so the caller can invalidate
/// exactly the cache entries that could have contained them.
///
/// [`InMemoryTable`]: crate::table::InMemoryTable
///
/// # Example
///
/// ```ignore
/// use memo_store::{MemoTable, InMemoryTable};
///
/// let table = InMemoryTable::new();
/// table.insert(memo).await?;
/// let found = table.find("0193...").await?;
/// ```
#[async_trait]
pub trait MemoTable: Send + Sync {
    /// Inserts a new row.
    ///
    /// # Errors
    ///
    /// - `MemoError::Persistence` if the write fails or the id already exists
    async fn insert(&self, memo: Memo) -> Result<()>;

    /// Reads a row by id.
    async fn find(&self, id: &str) -> Result<Option<Memo>>;

    /// Memos whose `from` is `user`, newest first.
    async fn list_sent(&self, user: &str, page: Page) -> Result<Vec<Memo>>;

    /// Memos where `(to = user AND status = sent) OR is_broadcast`, newest first.
    async fn list_received(&self, user: &str, page: Page) -> Result<Vec<Memo>>;

    /// Conditional update `sent -> delivered`, stamping `delivered_at = at`.
    ///
    /// Must only match rows whose current status is `sent`, so concurrent
    /// callers observe a single transition. Returns the updated row, or
    /// `None` if no row matched.
    async fn mark_delivered(&self, id: &str, at: DateTime<Utc>) -> Result<Option<Memo>>;

    /// Deletes a row by id, returning it if it existed.
    async fn delete(&self, id: &str) -> Result<Option<Memo>>;

    /// Deletes a row only while its status is still `sent`.
    async fn delete_sent(&self, id: &str) -> Result<Option<Memo>>;

    /// Bulk-deletes delivered rows with `delivered_at < cutoff`.
    async fn delete_delivered_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<Memo>>;

    /// Sent rows carrying a custom TTL.
    async fn find_sent_with_ttl(&self) -> Result<Vec<Memo>>;

    /// Bulk-deletes sent rows without TTL and with `created_at < cutoff`.
    async fn delete_sent_without_ttl_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<Memo>>;

    /// Distinct identities appearing as sender or direct recipient.
    ///
    /// The broadcast sentinel is excluded.
    async fn participants(&self) -> Result<Vec<String>>;

    /// Returns the name of this table backend, for logging.
    fn name(&self) -> &str;
}
