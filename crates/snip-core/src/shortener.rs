use crate::link::{Link, ShortenedLink, UserLink};
use crate::shortcode::ShortCode;
use async_trait::async_trait;

type Result<T> = std::result::Result<T, crate::error::ShortenerError>;

/// The link engine: the one entry point outer layers call.
#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Shortens a batch of links on behalf of `owner_id`.
    ///
    /// Outputs are in input order. Fails as a whole if the backend save fails.
    async fn shorten(
        &self,
        links: Vec<Link>,
        base_url: &str,
        owner_id: &str,
    ) -> Result<Vec<ShortenedLink>>;

    /// Resolves a short code to its original URL.
    ///
    /// Fails with `NotFound` for unknown codes and `Deleted` for soft-deleted ones.
    async fn resolve(&self, code: &ShortCode) -> Result<String>;

    /// Lists the live links created by `owner_id`.
    async fn user_links(&self, base_url: &str, owner_id: &str) -> Result<Vec<UserLink>>;

    /// Requests deletion of `codes` owned by `owner_id`.
    ///
    /// Returns once the request is accepted, not once it is applied.
    async fn delete_user_links(&self, codes: Vec<ShortCode>, owner_id: &str) -> Result<()>;

    /// Checks that the store is reachable.
    async fn ping(&self) -> Result<()>;
}
