//! Memo Relay Server - HTTP front for the memo store.
//!
//! A thin Axum layer over [`memo_store::MemoStore`]: it extracts the caller
//! identity and request parameters, delegates, and maps errors to status
//! codes. The background expiry sweep is started by the binary.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod server;
pub mod settings;
pub mod state;

pub use error::AppError;
pub use handlers::health::HealthResponse;
pub use server::{create_router, run_server, shutdown_signal};
pub use settings::Settings;
pub use state::AppState;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
