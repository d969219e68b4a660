//! Observability setup for Arcana.

pub mod tracing_setup;
