//! Expiring memo storage.
//!
//! This crate provides:
//! - A [`MemoTable`](table::MemoTable) trait for durable storage, plus an
//!   in-process implementation
//! - A Moka-backed read cache with prefix invalidation
//! - [`MemoStore`], which keeps the two coherent
//! - A background sweep that deletes expired memos

pub mod cache;
pub mod metrics;
pub mod store;
pub mod sweep;
pub mod table;

pub use cache::{CacheConfig, MemoCache};
pub use store::MemoStore;
pub use sweep::{SweepConfig, SweepHandle, SweepReport, SweepScheduler, SweepState};
pub use table::{InMemoryTable, MemoTable};
