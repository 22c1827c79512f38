use crate::journal::Journal;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use snip_core::error::Result;
use snip_core::{DeletionRequest, ReadRepository, Repository, ShortCode, StoredLink};
use tracing::{debug, info, trace};

/// In-memory implementation of the Repository trait using DashMap.
///
/// DashMap provides better concurrency than RwLock<HashMap> because it
/// uses sharded locks, allowing concurrent reads and writes to different
/// buckets without blocking.
///
/// With a [`Journal`] attached, every newly created link is appended to it
/// and [`Repository::init`] rebuilds the maps from it. Without one the
/// repository is volatile.
///
/// Soft deletion is not supported here: [`Repository::mark_for_deletion`]
/// accepts and discards requests.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    links: DashMap<ShortCode, StoredLink>,
    owners: DashMap<String, Vec<StoredLink>>,
    journal: Option<Journal>,
}

impl InMemoryRepository {
    /// Creates a new volatile in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository persisted to `journal`.
    ///
    /// Call [`Repository::init`] before use to load the journal's records.
    pub fn with_journal(journal: Journal) -> Self {
        Self {
            journal: Some(journal),
            ..Self::default()
        }
    }

    /// Number of distinct links held.
    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Inserts `link` unless its code is taken. Returns whether it was inserted.
    ///
    /// The existence check and the insert happen under the same shard lock,
    /// so of several concurrent inserts of one code exactly one wins.
    fn insert_if_absent(&self, link: &StoredLink) -> bool {
        match self.links.entry(link.hash.clone()) {
            Entry::Occupied(_) => return false,
            Entry::Vacant(slot) => {
                slot.insert(link.clone());
            }
        }

        self.owners
            .entry(link.owner_id.clone())
            .or_default()
            .push(link.clone());
        true
    }
}

#[async_trait]
impl ReadRepository for InMemoryRepository {
    async fn get_link(&self, code: &ShortCode) -> Result<Option<StoredLink>> {
        Ok(self.links.get(code).map(|entry| entry.value().clone()))
    }

    async fn user_links(&self, owner_id: &str) -> Result<Vec<StoredLink>> {
        match self.owners.get(owner_id) {
            Some(links) => Ok(links.value().clone()),
            None => {
                trace!(owner_id, "no links for owner");
                Ok(Vec::new())
            }
        }
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn init(&self) -> Result<()> {
        let Some(journal) = &self.journal else {
            info!("initialized volatile in-memory repository");
            return Ok(());
        };

        let records = journal.replay().await?;
        let total = records.len();
        let loaded = records
            .iter()
            .filter(|record| self.insert_if_absent(record))
            .count();

        info!(
            records = total,
            links = loaded,
            "initialized in-memory repository from journal"
        );
        Ok(())
    }

    async fn save_links(&self, links: &[StoredLink]) -> Result<Vec<bool>> {
        let mut results = Vec::with_capacity(links.len());

        for link in links {
            let link = &StoredLink {
                is_deleted: false,
                ..link.clone()
            };
            let created = self.insert_if_absent(link);

            if created {
                debug!(
                    code = %link.hash,
                    original_url = %link.original_url,
                    correlation_id = %link.correlation_id,
                    owner_id = %link.owner_id,
                    "saved link to memory"
                );

                if let Some(journal) = &self.journal {
                    journal.append(link).await?;
                }
            } else {
                trace!(code = %link.hash, "link already exists");
            }

            results.push(created);
        }

        Ok(results)
    }

    async fn mark_for_deletion(&self, request: DeletionRequest) -> Result<()> {
        debug!(
            owner_id = %request.owner_id,
            requested = request.codes.len(),
            "in-memory repository ignores deletion requests"
        );
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        if let Some(journal) = &self.journal {
            journal.flush().await?;
        }
        Ok(())
    }
}
