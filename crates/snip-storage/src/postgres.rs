use crate::deletion::{DeletionHandler, DeletionQueue};
use async_trait::async_trait;
use snip_core::error::{Result, StorageError};
use snip_core::{DeletionRequest, ReadRepository, Repository, ShortCode, StoredLink};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::{debug, info};

/// Idempotent schema for the `links` table.
pub const SCHEMA: &str = include_str!("../ddl/postgres/links.sql");

/// PostgreSQL implementation of the repository contract.
///
/// A batch save runs in a single transaction using
/// `INSERT ... ON CONFLICT (hash) DO NOTHING`, so it is all-or-nothing and two
/// concurrent inserts of one code never both report creation. Dropping an
/// in-flight save before it commits rolls the transaction back.
///
/// Soft deletes are applied asynchronously by a [`DeletionQueue`] whose
/// update is scoped to the requesting owner.
#[derive(Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    deletions: DeletionQueue,
}

impl PostgresRepository {
    /// Creates a repository from an existing pool and starts its deletion worker.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(pool: PgPool, deletion_queue_capacity: usize) -> Self {
        let handler = PgDeletionHandler { pool: pool.clone() };
        Self {
            deletions: DeletionQueue::spawn(handler, deletion_queue_capacity),
            pool,
        }
    }

    /// Creates a repository by opening a new connection pool.
    pub async fn connect(database_url: &str, deletion_queue_capacity: usize) -> Result<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool, deletion_queue_capacity))
    }
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_) => StorageError::Decode(message),
        _ => StorageError::Query(message),
    }
}

fn link_from_row(row: &PgRow) -> Result<StoredLink> {
    let hash: String = row.try_get("hash").map_err(map_sqlx_error)?;

    Ok(StoredLink {
        hash: ShortCode::new_unchecked(hash),
        original_url: row.try_get("original_url").map_err(map_sqlx_error)?,
        correlation_id: row.try_get("correlation_id").map_err(map_sqlx_error)?,
        owner_id: row.try_get("user_id").map_err(map_sqlx_error)?,
        is_deleted: row.try_get("is_deleted").map_err(map_sqlx_error)?,
    })
}

#[async_trait]
impl ReadRepository for PostgresRepository {
    async fn get_link(&self, code: &ShortCode) -> Result<Option<StoredLink>> {
        let row = sqlx::query(
            r#"
            SELECT hash, original_url, correlation_id, user_id, is_deleted
            FROM links
            WHERE hash = $1
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(link_from_row).transpose()
    }

    async fn user_links(&self, owner_id: &str) -> Result<Vec<StoredLink>> {
        let rows = sqlx::query(
            r#"
            SELECT hash, original_url, correlation_id, user_id, is_deleted
            FROM links
            WHERE user_id = $1
            ORDER BY seq
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.iter().map(link_from_row).collect()
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn init(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        info!("initialized postgres repository");
        Ok(())
    }

    async fn save_links(&self, links: &[StoredLink]) -> Result<Vec<bool>> {
        let mut results = Vec::with_capacity(links.len());
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        for link in links {
            let inserted = sqlx::query(
                r#"
                INSERT INTO links (hash, original_url, correlation_id, user_id, is_deleted)
                VALUES ($1, $2, $3, $4, FALSE)
                ON CONFLICT (hash) DO NOTHING
                "#,
            )
            .bind(link.hash.as_str())
            .bind(link.original_url.as_str())
            .bind(link.correlation_id.as_str())
            .bind(link.owner_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

            results.push(inserted.rows_affected() > 0);
        }

        tx.commit().await.map_err(map_sqlx_error)?;

        debug!(
            batch = links.len(),
            created = results.iter().filter(|created| **created).count(),
            "saved links to postgres"
        );
        Ok(results)
    }

    async fn mark_for_deletion(&self, request: DeletionRequest) -> Result<()> {
        self.deletions.enqueue(request).await
    }

    async fn close(&self) -> Result<()> {
        self.deletions.close().await;
        self.pool.close().await;
        info!("closed postgres repository");
        Ok(())
    }
}

/// Applies deletion requests with one owner-scoped `UPDATE` each.
struct PgDeletionHandler {
    pool: PgPool,
}

#[async_trait]
impl DeletionHandler for PgDeletionHandler {
    async fn apply(&self, request: &DeletionRequest) -> Result<u64> {
        let codes: Vec<String> = request
            .codes
            .iter()
            .map(|code| code.as_str().to_owned())
            .collect();

        let result = sqlx::query(
            r#"
            UPDATE links
            SET is_deleted = TRUE
            WHERE hash = ANY($1)
              AND user_id = $2
            "#,
        )
        .bind(codes)
        .bind(request.owner_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}
