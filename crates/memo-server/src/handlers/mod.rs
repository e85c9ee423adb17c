//! HTTP request handlers.

pub mod health;
pub mod memos;
pub mod metrics;
pub mod users;
