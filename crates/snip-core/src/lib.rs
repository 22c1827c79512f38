//! Core types and traits for the snip URL shortener.
//!
//! This crate provides the link model, the short code derivation and the
//! traits shared by the storage backends, the link engine and the gateway.

pub mod error;
pub mod link;
pub mod repository;
pub mod shortcode;
pub mod shortener;

pub use error::{ShortenerError, StorageError};
pub use link::{DeletionRequest, Link, ShortenedLink, StoredLink, UserLink};
pub use repository::{ReadRepository, Repository};
pub use shortcode::ShortCode;
pub use shortener::Shortener;
