use std::sync::Arc;

use snip_core::Shortener;

use crate::auth::JwtIdentity;

#[derive(Clone)]
pub struct AppState {
    shortener: Arc<dyn Shortener>,
    base_url: String,
    identity: Arc<JwtIdentity>,
}

impl AppState {
    pub fn new(
        shortener: Arc<dyn Shortener>,
        public_base_url: impl Into<String>,
        identity: JwtIdentity,
    ) -> Self {
        Self {
            shortener,
            base_url: public_base_url.into(),
            identity: Arc::new(identity),
        }
    }

    pub fn shortener(&self) -> &dyn Shortener {
        self.shortener.as_ref()
    }

    /// Base that short URLs are built on, e.g. `http://localhost:8080`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn identity(&self) -> &JwtIdentity {
        &self.identity
    }
}
