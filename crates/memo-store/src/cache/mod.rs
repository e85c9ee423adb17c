//! Cache module for the memo store.
//!
//! A volatile, read-populated and write-invalidated projection of the memo
//! table, built on Moka. Supports uniform TTL expiration, prefix-based bulk
//! invalidation and metrics.

pub mod invalidation;
pub mod keys;
pub mod memo_cache;

// Re-exports
pub use invalidation::InvalidationResult;
pub use keys::{CacheKey, CacheValue};
pub use memo_cache::{CacheConfig, FillToken, MemoCache};
