#![deny(missing_docs)]

//! Memo server and retrying HTTP client for the Memos v1 REST API.

/// HTTP routing and REST handlers.
pub mod api;
/// Command-line interface.
pub mod cli;
/// Async and blocking API clients.
pub mod client;
/// Environment-driven configuration.
pub mod config;
/// Structured logging and tracing setup.
pub mod logging;
/// Resource records shared by server and client.
pub mod models;
/// In-memory resource storage.
pub mod storage;

pub use client::{MemosClient, MemosError, SyncMemosClient, quick_memo, quick_memo_sync};
pub use config::ClientConfig;
