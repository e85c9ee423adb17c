//! Expiry policy: decides when a persisted memo may be swept.
//!
//! Status and TTL presence partition memos into exactly one rule:
//!
//! | status      | ttl_days | rule                         |
//! |-------------|----------|------------------------------|
//! | `delivered` | any      | [`ExpiryRule::DeliveredGrace`] |
//! | `sent`      | `Some`   | [`ExpiryRule::CustomTtl`]      |
//! | `sent`      | `None`   | [`ExpiryRule::DefaultWindow`]  |

use chrono::{DateTime, Duration, Utc};

use crate::types::{Memo, MemoStatus};

/// Which retention rule governs a memo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpiryRule {
    /// Delivered memos linger for a short grace period after `delivered_at`.
    DeliveredGrace,
    /// Unread memos with a custom TTL live `ttl_days` past `created_at`.
    CustomTtl,
    /// Unread memos without a TTL live for the default window.
    DefaultWindow,
}

impl ExpiryRule {
    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DeliveredGrace => "delivered_grace",
            Self::CustomTtl => "custom_ttl",
            Self::DefaultWindow => "default_window",
        }
    }
}

/// Retention windows for the sweep.
///
/// # Example
///
/// ```
/// use chrono::Duration;
/// use memo_core::ExpiryPolicy;
///
/// let policy = ExpiryPolicy::default()
///     .with_delivered_grace(Duration::minutes(30));
/// assert_eq!(policy.default_window(), Duration::hours(24));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    delivered_grace: Duration,
    default_window: Duration,
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self {
            delivered_grace: Duration::hours(1),
            default_window: Duration::hours(24),
        }
    }
}

impl ExpiryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how long a delivered memo survives after delivery.
    pub fn with_delivered_grace(mut self, grace: Duration) -> Self {
        self.delivered_grace = grace;
        self
    }

    /// Sets the retention window for unread memos without a TTL.
    pub fn with_default_window(mut self, window: Duration) -> Self {
        self.default_window = window;
        self
    }

    pub fn delivered_grace(&self) -> Duration {
        self.delivered_grace
    }

    pub fn default_window(&self) -> Duration {
        self.default_window
    }

    /// Delivered memos with `delivered_at` before this instant are expired.
    pub fn delivered_cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.delivered_grace
    }

    /// Unread memos without TTL created before this instant are expired.
    pub fn default_cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.default_window
    }

    /// Returns the rule that governs `memo`.
    pub fn rule_for(&self, memo: &Memo) -> ExpiryRule {
        match (memo.status(), memo.ttl_days()) {
            (MemoStatus::Delivered, _) => ExpiryRule::DeliveredGrace,
            (MemoStatus::Sent, Some(_)) => ExpiryRule::CustomTtl,
            (MemoStatus::Sent, None) => ExpiryRule::DefaultWindow,
        }
    }

    /// Returns the instant after which `memo` becomes eligible for deletion.
    ///
    /// A delivered memo missing `delivered_at` (which the type invariants
    /// rule out) falls back to `created_at`.
    pub fn expires_at(&self, memo: &Memo) -> DateTime<Utc> {
        match self.rule_for(memo) {
            ExpiryRule::DeliveredGrace => {
                memo.delivered_at().unwrap_or_else(|| memo.created_at()) + self.delivered_grace
            },
            ExpiryRule::CustomTtl => {
                let ttl = memo
                    .ttl_days()
                    .map(|t| t.as_duration())
                    .unwrap_or(self.default_window);
                memo.created_at() + ttl
            },
            ExpiryRule::DefaultWindow => memo.created_at() + self.default_window,
        }
    }

    /// True if `memo` may be deleted at `now`.
    pub fn is_expired(&self, memo: &Memo, now: DateTime<Utc>) -> bool {
        now > self.expires_at(memo)
    }
}
