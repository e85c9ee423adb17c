//! Durable memo storage.
//!
//! The store only talks to storage through the [`MemoTable`] trait. An
//! in-process implementation ships with the crate for embedding and tests.

mod memory;
mod traits;

pub use memory::InMemoryTable;
pub use traits::MemoTable;
