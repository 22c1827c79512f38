//! Storage backends for the snip URL shortener.
//!
//! - [`InMemoryRepository`]: DashMap-backed store, optionally persisted to a
//!   [`Journal`] file.
//! - [`PostgresRepository`]: transactional store with an asynchronous
//!   [`DeletionQueue`] for soft deletes.
//!
//! [`StorageKind::select`] decides which one a deployment uses.

pub mod backend;
pub mod deletion;
pub mod journal;
pub mod memory;
pub mod postgres;

pub use backend::StorageKind;
pub use deletion::{DeletionHandler, DeletionQueue, DEFAULT_QUEUE_CAPACITY};
pub use journal::Journal;
pub use memory::InMemoryRepository;
pub use postgres::PostgresRepository;
pub use snip_core::{ReadRepository, Repository, StorageError};
