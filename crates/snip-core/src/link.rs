use crate::shortcode::ShortCode;
use serde::{Deserialize, Serialize};

/// A URL submitted for shortening.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub original_url: String,
    /// Opaque caller value, echoed back to pair batch inputs with outputs.
    #[serde(default)]
    pub correlation_id: String,
}

impl Link {
    pub fn new(original_url: impl Into<String>) -> Self {
        Self {
            original_url: original_url.into(),
            correlation_id: String::new(),
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = correlation_id.into();
        self
    }

    /// Builds the record to persist for this link on behalf of `owner_id`.
    pub fn into_stored(self, owner_id: impl Into<String>) -> StoredLink {
        StoredLink {
            hash: ShortCode::from_url(&self.original_url),
            original_url: self.original_url,
            correlation_id: self.correlation_id,
            owner_id: owner_id.into(),
            is_deleted: false,
        }
    }
}

/// A persisted link.
///
/// The serialized form is the journal line format. Fields other than
/// `hash` and `original_url` default when absent so that journals written
/// before ownership existed still replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredLink {
    pub hash: ShortCode,
    pub original_url: String,
    #[serde(default)]
    pub correlation_id: String,
    #[serde(default, rename = "user_id")]
    pub owner_id: String,
    #[serde(default)]
    pub is_deleted: bool,
}

impl StoredLink {
    /// Projects the record into a shortening result. `saved` starts as `false`
    /// and is filled in from the backend's save outcome.
    pub fn shortened(&self, base_url: &str) -> ShortenedLink {
        ShortenedLink {
            correlation_id: self.correlation_id.clone(),
            short_url: self.hash.to_url(base_url),
            saved: false,
        }
    }

    pub fn user_link(&self, base_url: &str) -> UserLink {
        UserLink {
            original_url: self.original_url.clone(),
            short_url: self.hash.to_url(base_url),
        }
    }
}

/// The outcome of shortening one [`Link`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShortenedLink {
    pub correlation_id: String,
    pub short_url: String,
    /// `false` when the code already existed before this request.
    #[serde(skip)]
    pub saved: bool,
}

/// A live link as listed for its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserLink {
    pub original_url: String,
    pub short_url: String,
}

/// Request to soft-delete `codes` owned by `owner_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionRequest {
    pub codes: Vec<ShortCode>,
    pub owner_id: String,
}

impl DeletionRequest {
    pub fn new(codes: Vec<ShortCode>, owner_id: impl Into<String>) -> Self {
        Self {
            codes,
            owner_id: owner_id.into(),
        }
    }
}
