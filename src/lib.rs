//! Payment monitor: live success-rate charts and alerts from a WebSocket feed.
//!
//! Library crate shared by the binary and the integration tests in `tests/`.

pub mod api;
pub mod config;
pub mod engine;
pub mod errors;
pub mod feed;
pub mod metrics;
pub mod models;
pub mod replay;
