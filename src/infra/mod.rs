//! Infrastructure adapters and runtime bootstrap.

pub mod cache_backend;
pub mod comment_client;
pub mod db;
pub mod error;
pub mod http;
pub mod snapshot_refresher;
pub mod telemetry;
