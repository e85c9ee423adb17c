//! Outcome of a single expiry sweep.

use memo_core::ExpiryRule;

/// What one sweep removed, per rule, and what went wrong.
///
/// A failure in one rule never stops the others, so a report can carry
/// deletions and failures at the same time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Delivered memos past the grace period.
    pub delivered_grace: usize,
    /// Unread memos past their custom TTL.
    pub custom_ttl: usize,
    /// Unread memos without TTL past the default window.
    pub default_window: usize,
    /// Cache entries invalidated because of the deletions.
    pub invalidated: usize,
    /// One message per failed table operation.
    pub failures: Vec<String>,
}

impl SweepReport {
    pub fn deleted(&self, rule: ExpiryRule) -> usize {
        match rule {
            ExpiryRule::DeliveredGrace => self.delivered_grace,
            ExpiryRule::CustomTtl => self.custom_ttl,
            ExpiryRule::DefaultWindow => self.default_window,
        }
    }

    pub(crate) fn add_deleted(&mut self, rule: ExpiryRule, count: usize) {
        match rule {
            ExpiryRule::DeliveredGrace => self.delivered_grace += count,
            ExpiryRule::CustomTtl => self.custom_ttl += count,
            ExpiryRule::DefaultWindow => self.default_window += count,
        }
    }

    pub(crate) fn add_failure(&mut self, rule: ExpiryRule, message: impl std::fmt::Display) {
        self.failures.push(format!("{}: {}", rule.as_str(), message));
    }

    /// Total memos deleted across all rules.
    pub fn total_deleted(&self) -> usize {
        self.delivered_grace + self.custom_ttl + self.default_window
    }

    /// True if every table operation succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
