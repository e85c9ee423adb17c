//! Background expiry sweep.
//!
//! [`SweepScheduler`] calls [`crate::MemoStore::cleanup`] on a fixed
//! interval and records each [`SweepReport`] in a shared [`SweepState`].

mod report;
mod scheduler;
mod state;

pub use report::SweepReport;
pub use scheduler::{SweepConfig, SweepHandle, SweepScheduler};
pub use state::SweepState;
