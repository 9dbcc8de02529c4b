//! Local persistence for the Loop Social client core.
//!
//! This crate provides:
//! - [`KeyValueStore`], the synchronous string store used for every locally
//!   persisted value, with in-memory and JSON-file backends
//! - [`ActorSession`], the actor identity mirror
//! - [`SessionLifecycle`], the single owner of the actor session

mod file;
mod keys;
mod lifecycle;
mod memory;
mod session;
mod traits;

pub use file::FileStore;
pub use keys::StorageKeys;
pub use lifecycle::SessionLifecycle;
pub use memory::MemoryStore;
pub use session::ActorSession;
pub use traits::KeyValueStore;

use thiserror::Error;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Backend-specific failure
    #[error("Platform storage error: {0}")]
    Platform(String),

    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
