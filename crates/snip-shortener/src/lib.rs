//! The snip link engine.
//!
//! [`ShortenerService`] implements [`snip_core::Shortener`] on top of any
//! [`snip_core::Repository`]: it derives short codes, saves batches, resolves
//! codes and forwards deletion requests. It holds no state of its own.

pub mod service;

pub use service::ShortenerService;
