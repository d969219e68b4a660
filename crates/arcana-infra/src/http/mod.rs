//! HTTP client for the session REST API.

mod client;
mod types;

pub use client::HttpSessionApi;
