//! In-process memo table.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use memo_core::{BROADCAST_RECIPIENT, Memo, MemoError, MemoStatus, Page, Result};
use parking_lot::RwLock;

use super::MemoTable;

/// A [`MemoTable`] backed by a `HashMap` behind a `RwLock`.
///
/// Every mutation runs under the write lock, which gives the conditional
/// update in [`MemoTable::mark_delivered`] the same all-or-nothing behaviour
/// a `UPDATE ... WHERE status = 'sent'` has in a relational database.
#[derive(Debug, Default)]
pub struct InMemoryTable {
    rows: RwLock<HashMap<String, Memo>>,
}

impl InMemoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently stored.
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    fn page_of<F>(&self, page: Page, filter: F) -> Vec<Memo>
    where
        F: Fn(&Memo) -> bool,
    {
        let rows = self.rows.read();
        let mut matched: Vec<&Memo> = rows.values().filter(|m| filter(m)).collect();

        // created_at DESC, id as a stable tiebreaker
        matched.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| a.id().cmp(b.id()))
        });

        matched
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .cloned()
            .collect()
    }

    fn delete_where<F>(&self, predicate: F) -> Vec<Memo>
    where
        F: Fn(&Memo) -> bool,
    {
        let mut rows = self.rows.write();
        let ids: Vec<String> = rows
            .values()
            .filter(|m| predicate(m))
            .map(|m| m.id().to_string())
            .collect();

        ids.iter().filter_map(|id| rows.remove(id)).collect()
    }
}

#[async_trait]
impl MemoTable for InMemoryTable {
    async fn insert(&self, memo: Memo) -> Result<()> {
        let mut rows = self.rows.write();
        if rows.contains_key(memo.id()) {
            return Err(MemoError::persistence(
                "insert",
                format!("duplicate primary key '{}'", memo.id()),
            ));
        }
        rows.insert(memo.id().to_string(), memo);
        Ok(())
    }

    async fn find(&self, id: &str) -> Result<Option<Memo>> {
        Ok(self.rows.read().get(id).cloned())
    }

    async fn list_sent(&self, user: &str, page: Page) -> Result<Vec<Memo>> {
        Ok(self.page_of(page, |m| m.from() == user))
    }

    async fn list_received(&self, user: &str, page: Page) -> Result<Vec<Memo>> {
        Ok(self.page_of(page, |m| m.is_received_by(user)))
    }

    async fn mark_delivered(&self, id: &str, at: DateTime<Utc>) -> Result<Option<Memo>> {
        let mut rows = self.rows.write();
        match rows.get_mut(id) {
            Some(memo) => Ok(memo.mark_delivered(at).then(|| memo.clone())),
            None => Ok(None),
        }
    }

    async fn delete(&self, id: &str) -> Result<Option<Memo>> {
        Ok(self.rows.write().remove(id))
    }

    async fn delete_sent(&self, id: &str) -> Result<Option<Memo>> {
        let mut rows = self.rows.write();
        match rows.get(id) {
            Some(memo) if memo.status() == MemoStatus::Sent => Ok(rows.remove(id)),
            _ => Ok(None),
        }
    }

    async fn delete_delivered_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<Memo>> {
        Ok(self.delete_where(|m| {
            m.status() == MemoStatus::Delivered && m.delivered_at().is_some_and(|at| at < cutoff)
        }))
    }

    async fn find_sent_with_ttl(&self) -> Result<Vec<Memo>> {
        Ok(self
            .rows
            .read()
            .values()
            .filter(|m| m.status() == MemoStatus::Sent && m.ttl_days().is_some())
            .cloned()
            .collect())
    }

    async fn delete_sent_without_ttl_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<Memo>> {
        Ok(self.delete_where(|m| {
            m.status() == MemoStatus::Sent && m.ttl_days().is_none() && m.created_at() < cutoff
        }))
    }

    async fn participants(&self) -> Result<Vec<String>> {
        let rows = self.rows.read();
        let mut users = BTreeSet::new();

        for memo in rows.values() {
            users.insert(memo.from().to_string());
            if !memo.is_broadcast() && memo.to() != BROADCAST_RECIPIENT {
                users.insert(memo.to().to_string());
            }
        }

        users.retain(|u| !u.is_empty());
        Ok(users.into_iter().collect())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
