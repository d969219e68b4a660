//! SQLite persistence for the offline mutation queue.

pub mod mutations;
pub mod pool;

pub use mutations::SqliteMutationStore;
pub use pool::DatabasePool;
