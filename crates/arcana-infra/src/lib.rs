//! Infrastructure implementations for Arcana.
//!
//! Concrete backends for the trait seams defined in arcana-core: the
//! reqwest HTTP client for the session REST API, SQLite persistence for the
//! offline queue, config loading, and connectivity probing.

pub mod config;
pub mod connectivity;
pub mod http;
pub mod sqlite;
