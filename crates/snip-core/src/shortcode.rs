use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::Display;

/// Number of hex characters kept from the URL digest.
pub const CODE_LENGTH: usize = 6;

/// The short code identifying a stored link.
///
/// Codes derived with [`ShortCode::from_url`] are the first [`CODE_LENGTH`]
/// lowercase hex characters of the SHA-256 digest of the URL. Truncation makes
/// collisions possible; they are not detected, a colliding URL simply resolves
/// to the record saved first under that code.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShortCode(String);

impl ShortCode {
    /// Derives the short code for `url`.
    ///
    /// # Examples
    ///
    /// ```
    /// use snip_core::ShortCode;
    ///
    /// let code = ShortCode::from_url("https://google.com");
    /// assert_eq!(code.as_str(), "05046f");
    /// ```
    pub fn from_url(url: &str) -> Self {
        let digest = Sha256::digest(url.as_bytes());
        let mut code = hex::encode(&digest[..CODE_LENGTH.div_ceil(2)]);
        code.truncate(CODE_LENGTH);
        Self(code)
    }

    /// Wraps a code received from a caller, e.g. a request path segment.
    ///
    /// No validation is done; an unknown code simply resolves to nothing.
    pub fn new_unchecked(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Generates the full shortened URL based on the provided base URL.
    pub fn to_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.0)
    }

    /// Returns the short code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ShortCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
