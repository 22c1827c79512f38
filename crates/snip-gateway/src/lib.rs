//! HTTP gateway for the snip URL shortener.
//!
//! Exposes the link engine over axum: plain and JSON shortening, batch
//! shortening, redirects, per-user listing and deletion. Callers are
//! identified by a signed `auth` cookie issued on first contact.

pub mod app;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod model;
pub mod state;

pub use app::App;
pub use auth::{JwtIdentity, UserId};
pub use state::AppState;
