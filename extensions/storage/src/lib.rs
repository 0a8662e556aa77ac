//! # Trailhead Storage
//!
//! A single-item store for client state (preferences, the last username),
//! configured at runtime:
//!
//! - `memory`: process-local
//! - `datastore`: a JSON file under the client's base directory, optionally
//!   fronted by a [`CacheStrategy`]
//! - `encrypted`: rejected; encryption at rest is not provided here

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod store;
pub mod typed;

pub use cache::{CacheStrategy, Cached};
pub use client::{Item, StorageClient};
pub use config::{StorageConfig, StorageKind};
pub use error::{StorageError, StorageResult};
pub use store::{FileStorage, MemoryStorage, Storage};
pub use typed::TypedStorage;
