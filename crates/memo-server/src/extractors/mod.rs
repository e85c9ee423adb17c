//! Request extractors.

pub mod identity;
pub mod query;

pub use identity::{USER_EMAIL_HEADER, UserEmail};
pub use query::PageQuery;
