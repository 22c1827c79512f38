use crate::error::Result;
use crate::link::{DeletionRequest, StoredLink};
use crate::shortcode::ShortCode;
use async_trait::async_trait;

/// A read-only view of a repository.
#[async_trait]
pub trait ReadRepository: Send + Sync + 'static {
    /// Retrieves the stored link for a given short code.
    /// Returns `None` if the code does not exist.
    ///
    /// Soft-deleted links are returned with `is_deleted` set.
    async fn get_link(&self, code: &ShortCode) -> Result<Option<StoredLink>>;

    /// Lists every link created by `owner_id`, deleted ones included,
    /// in creation order. An unknown owner yields an empty list.
    async fn user_links(&self, owner_id: &str) -> Result<Vec<StoredLink>>;

    /// Checks that the backend is reachable.
    async fn ping(&self) -> Result<()>;
}

#[async_trait]
pub trait Repository: ReadRepository {
    /// Prepares the backend before first use (journal replay, schema creation).
    async fn init(&self) -> Result<()>;

    /// Saves a batch of links.
    ///
    /// The result is aligned with `links`: `true` when the link was created by
    /// this call, `false` when a link with the same code already existed. An
    /// existing link is never overwritten.
    async fn save_links(&self, links: &[StoredLink]) -> Result<Vec<bool>>;

    /// Queues a soft deletion and returns once it has been accepted.
    ///
    /// Completion is not awaited; only links owned by `request.owner_id` are
    /// ever marked.
    async fn mark_for_deletion(&self, request: DeletionRequest) -> Result<()>;

    /// Releases the backend's resources.
    async fn close(&self) -> Result<()>;
}
