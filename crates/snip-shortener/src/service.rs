use async_trait::async_trait;
use snip_core::{
    DeletionRequest, Link, Repository, ShortCode, ShortenedLink, Shortener, ShortenerError,
    StoredLink, UserLink,
};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// A concrete implementation of the `Shortener` trait.
///
/// This service wraps a `Repository` to handle:
/// - Short code derivation for batches of links
/// - Resolution with soft-delete awareness
/// - Owner-scoped listing and deletion
///
/// Backend failures are returned as-is; nothing is retried.
#[derive(Debug)]
pub struct ShortenerService<R> {
    repository: Arc<R>,
}

impl<R> Clone for ShortenerService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<R: Repository> ShortenerService<R> {
    /// Creates a new `ShortenerService` owning `repository`.
    pub fn new(repository: R) -> Self {
        Self::from_shared(Arc::new(repository))
    }

    /// Creates a service over a repository that is also held elsewhere,
    /// typically so the caller can close it at shutdown.
    pub fn from_shared(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Returns the underlying repository.
    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }
}

#[async_trait]
impl<R: Repository> Shortener for ShortenerService<R> {
    async fn shorten(
        &self,
        links: Vec<Link>,
        base_url: &str,
        owner_id: &str,
    ) -> Result<Vec<ShortenedLink>, ShortenerError> {
        let stored: Vec<StoredLink> = links
            .into_iter()
            .map(|link| link.into_stored(owner_id))
            .collect();

        let saved = self.repository.save_links(&stored).await?;

        let shortened: Vec<ShortenedLink> = stored
            .iter()
            .zip(saved)
            .map(|(link, saved)| ShortenedLink {
                saved,
                ..link.shortened(base_url)
            })
            .collect();

        debug!(
            owner_id,
            batch = shortened.len(),
            created = shortened.iter().filter(|link| link.saved).count(),
            "shortened links"
        );
        Ok(shortened)
    }

    async fn resolve(&self, code: &ShortCode) -> Result<String, ShortenerError> {
        trace!(code = %code, "resolving short code");

        match self.repository.get_link(code).await? {
            Some(link) if link.is_deleted => {
                debug!(code = %code, "short code is deleted");
                Err(ShortenerError::Deleted(code.to_string()))
            }
            Some(link) => {
                debug!(code = %code, url = %link.original_url, "resolved short code");
                Ok(link.original_url)
            }
            None => {
                trace!(code = %code, "short code not found");
                Err(ShortenerError::NotFound(code.to_string()))
            }
        }
    }

    async fn user_links(
        &self,
        base_url: &str,
        owner_id: &str,
    ) -> Result<Vec<UserLink>, ShortenerError> {
        let links = self.repository.user_links(owner_id).await?;

        Ok(links
            .iter()
            .filter(|link| !link.is_deleted)
            .map(|link| link.user_link(base_url))
            .collect())
    }

    async fn delete_user_links(
        &self,
        codes: Vec<ShortCode>,
        owner_id: &str,
    ) -> Result<(), ShortenerError> {
        debug!(owner_id, requested = codes.len(), "queueing link deletion");

        self.repository
            .mark_for_deletion(DeletionRequest::new(codes, owner_id))
            .await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), ShortenerError> {
        self.repository.ping().await.map_err(|err| {
            warn!(error = %err, "store ping failed");
            ShortenerError::Unavailable(err.to_string())
        })
    }
}
