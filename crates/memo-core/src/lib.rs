//! Memo Core - Domain types, errors and the expiry policy
//!
//! This crate holds everything about memos that does not touch storage or
//! caching: the `Memo` record and its drafts, pagination, the error
//! taxonomy, and the pure rules deciding when a memo may be swept.

pub mod error;
pub mod expiry;
pub mod types;

pub use error::{MemoError, Result};
pub use expiry::{ExpiryPolicy, ExpiryRule};
pub use types::{
    BROADCAST_RECIPIENT, Direction, MAX_TTL_DAYS, Memo, MemoStatus, NewMemo, Page, TtlDays,
};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
