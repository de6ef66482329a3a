//! Metadata repository for ingested images
//!
//! Owns the `images` table. The repository knows nothing about blobs; keeping
//! the two stores consistent is the ingestion pipeline's job.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use imgvault_common::{ImageRecord, NewImageRecord};
use sqlx::PgPool;
use tracing::{debug, instrument};

/// SQLSTATE class for integrity constraint violations.
const INTEGRITY_CONSTRAINT_CLASS: &str = "23";

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// The statement ran but reported that no row was written.
    #[error("insert completed without persisting a record")]
    NotPersisted,

    /// The database refused the row (unique, not-null, check, ...).
    #[error("record rejected by the database: {message}")]
    Rejected {
        constraint: Option<String>,
        message: String,
    },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl RepositoryError {
    fn classify(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            let is_constraint = db
                .code()
                .map(|code| code.starts_with(INTEGRITY_CONSTRAINT_CLASS))
                .unwrap_or(false);
            if is_constraint {
                return RepositoryError::Rejected {
                    constraint: db.constraint().map(str::to_string),
                    message: db.message().to_string(),
                };
            }
        }
        RepositoryError::Database(err)
    }
}

#[async_trait]
pub trait ImageRepository: Send + Sync {
    /// Persist a record; `id` and `created_at` are assigned here.
    async fn insert(&self, record: NewImageRecord) -> Result<ImageRecord, RepositoryError>;

    /// Every record, newest first.
    async fn list_all(&self) -> Result<Vec<ImageRecord>, RepositoryError>;

    /// Reachability of the backing store, reported by `/health`.
    async fn health_check(&self) -> Result<(), RepositoryError>;
}

#[derive(Debug, Clone)]
pub struct PgImageRepository {
    pool: PgPool,
}

impl PgImageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ImageRow {
    id: i64,
    url: String,
    name: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ImageRow> for ImageRecord {
    fn from(row: ImageRow) -> Self {
        ImageRecord {
            id: row.id,
            url: row.url,
            name: row.name,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl ImageRepository for PgImageRepository {
    #[instrument(skip(self, record), fields(name = %record.name))]
    async fn insert(&self, record: NewImageRecord) -> Result<ImageRecord, RepositoryError> {
        let row = sqlx::query_as::<_, ImageRow>(
            r#"
            INSERT INTO images (url, name, description)
            VALUES ($1, $2, $3)
            RETURNING id, url, name, description, created_at
            "#,
        )
        .bind(&record.url)
        .bind(&record.name)
        .bind(&record.description)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepositoryError::classify)?;

        let row = row.ok_or(RepositoryError::NotPersisted)?;
        debug!(id = row.id, "Inserted image record");
        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn list_all(&self) -> Result<Vec<ImageRecord>, RepositoryError> {
        let rows = sqlx::query_as::<_, ImageRow>(
            r#"
            SELECT id, url, name, description, created_at
            FROM images
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Listed image records");
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn health_check(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_errors_stay_database_errors() {
        let err = RepositoryError::classify(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, RepositoryError::Database(sqlx::Error::PoolTimedOut)));
    }

    #[test]
    fn test_row_conversion() {
        let now = Utc::now();
        let record: ImageRecord = ImageRow {
            id: 3,
            url: "http://cdn/images/1-a.png".to_string(),
            name: "a.png".to_string(),
            description: Some("A thing".to_string()),
            created_at: now,
        }
        .into();

        assert_eq!(record.id, 3);
        assert_eq!(record.description.as_deref(), Some("A thing"));
        assert_eq!(record.created_at, now);
    }
}
