//! Memo domain types.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{MemoError, Result};

/// Reserved `to` value meaning "all users".
pub const BROADCAST_RECIPIENT: &str = "broadcast";

/// Largest custom TTL accepted, in days.
pub const MAX_TTL_DAYS: u16 = 365;

/// Delivery status of a memo. Moves `sent -> delivered` once and never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoStatus {
    /// Stored but not yet read by the recipient.
    Sent,
    /// Read by the recipient.
    Delivered,
}

impl MemoStatus {
    /// Returns the wire/storage name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Delivered => "delivered",
        }
    }
}

impl fmt::Display for MemoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Custom time-to-live in whole days, always within `1..=MAX_TTL_DAYS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u16")]
pub struct TtlDays(u16);

impl TtlDays {
    /// Validates a raw day count.
    ///
    /// # Examples
    ///
    /// ```
    /// use memo_core::TtlDays;
    ///
    /// assert_eq!(TtlDays::new(5).unwrap().days(), 5);
    /// assert!(TtlDays::new(0).is_err());
    /// assert!(TtlDays::new(366).is_err());
    /// ```
    pub fn new(days: i64) -> Result<Self> {
        if days < 1 {
            return Err(MemoError::validation("ttlDays", "must be at least 1 day"));
        }
        if days > i64::from(MAX_TTL_DAYS) {
            return Err(MemoError::validation(
                "ttlDays",
                format!("must be at most {} days", MAX_TTL_DAYS),
            ));
        }
        Ok(Self(days as u16))
    }

    /// Returns the number of days.
    pub fn days(&self) -> u16 {
        self.0
    }

    /// Returns the TTL as a duration.
    pub fn as_duration(&self) -> Duration {
        Duration::days(i64::from(self.0))
    }
}

impl TryFrom<i64> for TtlDays {
    type Error = MemoError;

    fn try_from(days: i64) -> Result<Self> {
        Self::new(days)
    }
}

impl From<TtlDays> for u16 {
    fn from(ttl: TtlDays) -> Self {
        ttl.0
    }
}

/// A memo as the caller submits it, before the store assigns id and timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMemo {
    id: Option<String>,
    from: String,
    to: String,
    subject: String,
    message: String,
    broadcast: bool,
    ttl_days: Option<TtlDays>,
}

impl NewMemo {
    /// Creates a direct memo draft.
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            from: from.into(),
            to: to.into(),
            subject: subject.into(),
            message: message.into(),
            broadcast: false,
            ttl_days: None,
        }
    }

    /// Uses a caller-chosen id instead of a generated one.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Requests delivery to every user.
    pub fn broadcast(mut self, broadcast: bool) -> Self {
        self.broadcast = broadcast;
        self
    }

    /// Sets a custom TTL. `None` keeps the default retention window.
    pub fn ttl_days(mut self, ttl: Option<TtlDays>) -> Self {
        self.ttl_days = ttl;
        self
    }

    /// Returns the sender identity.
    pub fn from(&self) -> &str {
        &self.from
    }

    /// True if the draft targets every user, explicitly or via the sentinel.
    pub fn is_broadcast(&self) -> bool {
        self.broadcast || self.to == BROADCAST_RECIPIENT
    }

    /// Returns the recipient after broadcast normalisation.
    pub fn recipient(&self) -> &str {
        if self.is_broadcast() {
            BROADCAST_RECIPIENT
        } else {
            &self.to
        }
    }

    /// Checks the preconditions a draft must meet before storage.
    pub fn validate(&self) -> Result<()> {
        if self.from.trim().is_empty() {
            return Err(MemoError::validation("from", "sender identity is required"));
        }
        if !self.is_broadcast() && self.to.trim().is_empty() {
            return Err(MemoError::validation("to", "recipient is required"));
        }
        if self.subject.trim().is_empty() {
            return Err(MemoError::validation("subject", "subject is required"));
        }
        if self.message.trim().is_empty() {
            return Err(MemoError::validation("message", "message is required"));
        }
        if let Some(id) = &self.id
            && id.trim().is_empty()
        {
            return Err(MemoError::validation("id", "id cannot be blank"));
        }
        Ok(())
    }
}

/// The durable unit: a message between two identities, or from one to all.
///
/// Deserialization rejects rows where `deliveredAt` disagrees with `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "MemoRecord")]
pub struct Memo {
    id: String,
    from: String,
    to: String,
    subject: String,
    message: String,
    status: MemoStatus,
    is_broadcast: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    ttl_days: Option<TtlDays>,
    created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    delivered_at: Option<DateTime<Utc>>,
}

/// Wire shape of a [`Memo`] before its invariants are checked.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MemoRecord {
    id: String,
    from: String,
    to: String,
    subject: String,
    message: String,
    status: MemoStatus,
    is_broadcast: bool,
    #[serde(default)]
    ttl_days: Option<TtlDays>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    delivered_at: Option<DateTime<Utc>>,
}

impl TryFrom<MemoRecord> for Memo {
    type Error = MemoError;

    fn try_from(record: MemoRecord) -> Result<Self> {
        let delivered = record.status == MemoStatus::Delivered;
        if delivered != record.delivered_at.is_some() {
            return Err(MemoError::validation(
                "deliveredAt",
                "must be set if and only if status is delivered",
            ));
        }
        if record.id.trim().is_empty() {
            return Err(MemoError::validation("id", "id cannot be blank"));
        }

        Ok(Self {
            id: record.id,
            from: record.from,
            to: record.to,
            subject: record.subject,
            message: record.message,
            status: record.status,
            is_broadcast: record.is_broadcast,
            ttl_days: record.ttl_days,
            created_at: record.created_at,
            delivered_at: record.delivered_at,
        })
    }
}

impl Memo {
    /// Materialises a draft: assigns an id if absent, forces `sent`, stamps
    /// `created_at`, and normalises broadcast recipients.
    pub fn create(draft: NewMemo, created_at: DateTime<Utc>) -> Self {
        let is_broadcast = draft.is_broadcast();
        let to = draft.recipient().to_string();

        Self {
            id: draft.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            from: draft.from,
            to,
            subject: draft.subject,
            message: draft.message,
            status: MemoStatus::Sent,
            is_broadcast,
            ttl_days: draft.ttl_days,
            created_at,
            delivered_at: None,
        }
    }

    /// Applies `sent -> delivered`, stamping `delivered_at`.
    ///
    /// Returns false, leaving the memo untouched, if it was already delivered.
    pub fn mark_delivered(&mut self, at: DateTime<Utc>) -> bool {
        if self.status != MemoStatus::Sent {
            return false;
        }
        self.status = MemoStatus::Delivered;
        self.delivered_at = Some(at);
        true
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn from(&self) -> &str {
        &self.from
    }

    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> MemoStatus {
        self.status
    }

    pub fn is_broadcast(&self) -> bool {
        self.is_broadcast
    }

    pub fn ttl_days(&self) -> Option<TtlDays> {
        self.ttl_days
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn delivered_at(&self) -> Option<DateTime<Utc>> {
        self.delivered_at
    }

    /// True if the memo shows up in `user`'s received list.
    ///
    /// Broadcasts stay visible after delivery because status is shared by
    /// every recipient.
    pub fn is_received_by(&self, user: &str) -> bool {
        self.is_broadcast || (self.to == user && self.status == MemoStatus::Sent)
    }
}

/// Which list a user is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Sent,
    Received,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Received => "received",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pagination window for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Page {
    limit: u32,
    offset: u32,
}

impl Page {
    pub const DEFAULT_LIMIT: u32 = 20;
    pub const MAX_LIMIT: u32 = 100;

    /// Creates a page, clamping `limit` into `1..=MAX_LIMIT`.
    pub fn new(limit: u32, offset: u32) -> Self {
        Self {
            limit: limit.clamp(1, Self::MAX_LIMIT),
            offset,
        }
    }

    /// Builds a page from raw query values.
    ///
    /// Out-of-range values fall back to the defaults instead of failing.
    ///
    /// # Examples
    ///
    /// ```
    /// use memo_core::Page;
    ///
    /// assert_eq!(Page::from_query(Some(50), Some(10)), Page::new(50, 10));
    /// assert_eq!(Page::from_query(Some(500), Some(-3)), Page::default());
    /// ```
    pub fn from_query(limit: Option<i64>, offset: Option<i64>) -> Self {
        let limit = limit
            .filter(|l| *l > 0 && *l <= i64::from(Self::MAX_LIMIT))
            .map(|l| l as u32)
            .unwrap_or(Self::DEFAULT_LIMIT);
        let offset = offset
            .filter(|o| *o >= 0 && *o <= i64::from(u32::MAX))
            .map(|o| o as u32)
            .unwrap_or(0);

        Self { limit, offset }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: Self::DEFAULT_LIMIT,
            offset: 0,
        }
    }
}
