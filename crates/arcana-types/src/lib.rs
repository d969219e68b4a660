//! Shared domain types for Arcana.
//!
//! This crate contains the core domain types used across the Arcana sync
//! engine: Session, SessionPatch, Reading, the offline-queue types, and
//! their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod error;
pub mod event;
pub mod patch;
pub mod session;
pub mod sync;
