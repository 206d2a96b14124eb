//! HTTP API for the steadyload engine.
//!
//! Exposes a single [`LoadGenerator`](steadyload::LoadGenerator) over axum, keeps the history of
//! completed runs, and exports that history as JSON or CSV.
pub mod runtime;

mod error;
mod export;
mod history;
mod server;

pub use crate::error::ServerError;
pub use crate::export::export_csv;
pub use crate::history::ResultHistory;
pub use crate::runtime::LoadTestServer;
pub use crate::server::{router, ServerState};
