//! Image ingestion pipeline
//!
//! One call to [`IngestPipeline::ingest`] drives a single attempt through
//! upload, read-back, describe and persist, strictly in that order:
//!
//! | Stage     | On failure          | Compensated       | Surfaced                     |
//! |-----------|---------------------|-------------------|------------------------------|
//! | upload    | abort               | no                | [`IngestError::StoreWrite`]  |
//! | read-back | abort               | delete blob       | [`IngestError::Readback`]    |
//! | describe  | sentinel caption    | n/a               | no                           |
//! | persist   | abort               | delete blob       | [`IngestError::Persistence`] or [`IngestError::Rejected`] |
//!
//! No step is retried. A metadata row therefore only survives when its blob
//! does.

use imgvault_common::{ImageRecord, NewImageRecord};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

use super::key::{StampSource, StoreKey};
use super::saga::{Compensation, Saga, SagaState};
use crate::db::{ImageRepository, RepositoryError};
use crate::describe::{Description, DescriptionGenerator};
use crate::storage::{BlobReader, ObjectStore, ReadbackError, StoreError};

/// Content type assumed when the uploader does not declare one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// A single file handed to the pipeline.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(filename: impl Into<String>, content_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type,
            bytes,
        }
    }

    pub fn validate(&self) -> Result<(), IngestError> {
        if self.filename.trim().is_empty() {
            return Err(IngestError::InvalidInput("filename is required".to_string()));
        }
        if self.bytes.is_empty() {
            return Err(IngestError::InvalidInput("file content is empty".to_string()));
        }
        Ok(())
    }

    fn content_type(&self) -> String {
        self.content_type
            .as_deref()
            .map(str::trim)
            .filter(|ct| !ct.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string()
    }
}

/// Result of a committed ingestion.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReceipt {
    pub key: String,
    pub record: ImageRecord,
    pub description_generated: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("invalid upload: {0}")]
    InvalidInput(String),

    #[error("failed to upload image: {0}")]
    StoreWrite(#[source] StoreError),

    #[error("failed to process uploaded image: {0}")]
    Readback(#[source] ReadbackError),

    #[error("failed to save image metadata: {0}")]
    Persistence(#[source] RepositoryError),

    /// The database refused the record; resubmitting the same input will not help.
    #[error("image metadata rejected: {0}")]
    Rejected(String),
}

impl IngestError {
    fn from_repository(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Rejected { message, .. } => IngestError::Rejected(message),
            other => IngestError::Persistence(other),
        }
    }

    /// Whether the failure happened after the blob was written, so the blob
    /// was deleted again.
    pub fn is_compensated(&self) -> bool {
        matches!(
            self,
            IngestError::Readback(_) | IngestError::Persistence(_) | IngestError::Rejected(_)
        )
    }
}

/// Orchestrates blob storage, captioning and metadata persistence.
#[derive(Clone)]
pub struct IngestPipeline {
    store: Arc<dyn ObjectStore>,
    reader: Arc<dyn BlobReader>,
    describer: Arc<dyn DescriptionGenerator>,
    repository: Arc<dyn ImageRepository>,
    stamps: Arc<dyn StampSource>,
}

impl IngestPipeline {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        reader: Arc<dyn BlobReader>,
        describer: Arc<dyn DescriptionGenerator>,
        repository: Arc<dyn ImageRepository>,
        stamps: Arc<dyn StampSource>,
    ) -> Self {
        Self {
            store,
            reader,
            describer,
            repository,
            stamps,
        }
    }

    pub fn repository(&self) -> Arc<dyn ImageRepository> {
        Arc::clone(&self.repository)
    }

    #[instrument(
        name = "ingest",
        skip(self, upload),
        fields(filename = %upload.filename, size = upload.bytes.len())
    )]
    pub async fn ingest(&self, upload: ImageUpload) -> Result<IngestReceipt, IngestError> {
        upload.validate()?;

        let content_type = upload.content_type();
        let ImageUpload {
            filename, bytes, ..
        } = upload;

        let key = StoreKey::derive(self.stamps.next_stamp(), &filename);
        let mut saga = Saga::new(key.clone());

        if let Err(e) = self.store.put(key.as_str(), bytes, &content_type).await {
            saga.abort(self.store.as_ref()).await;
            return Err(IngestError::StoreWrite(e));
        }
        saga.register(Compensation::DeleteBlob(key.clone()));
        saga.advance(SagaState::BlobWritten);

        let url = self.store.public_url(key.as_str());

        let fetched = match self.reader.fetch(&url).await {
            Ok(bytes) => bytes,
            Err(e) => return self.roll_back(&mut saga, IngestError::Readback(e)).await,
        };

        let description =
            Description::from_result(self.describer.describe(&fetched, &content_type).await);
        let description_generated = description.is_generated();
        saga.advance(SagaState::Described);

        let new_record = NewImageRecord::new(url, filename, Some(description.into_text()));
        let record = match self.repository.insert(new_record).await {
            Ok(record) => record,
            Err(e) => {
                return self
                    .roll_back(&mut saga, IngestError::from_repository(e))
                    .await
            },
        };
        saga.advance(SagaState::Persisted);
        saga.commit();

        info!(
            key = %key,
            id = record.id,
            description_generated,
            "Image ingested"
        );

        Ok(IngestReceipt {
            key: key.to_string(),
            record,
            description_generated,
        })
    }

    async fn roll_back<T>(&self, saga: &mut Saga, err: IngestError) -> Result<T, IngestError> {
        tracing::warn!(error = %err, "Ingestion step failed, compensating");
        // Compensation failures are already logged by the saga.
        let _ = saga.abort(self.store.as_ref()).await;
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_empty_input() {
        let upload = ImageUpload::new("  ", None, vec![1]);
        assert!(matches!(upload.validate(), Err(IngestError::InvalidInput(_))));

        let upload = ImageUpload::new("cat.png", None, Vec::new());
        assert!(matches!(upload.validate(), Err(IngestError::InvalidInput(_))));

        let upload = ImageUpload::new("cat.png", Some("image/png".into()), vec![1]);
        assert!(upload.validate().is_ok());
    }

    #[test]
    fn test_content_type_defaults() {
        assert_eq!(ImageUpload::new("a", None, vec![1]).content_type(), DEFAULT_CONTENT_TYPE);
        assert_eq!(
            ImageUpload::new("a", Some(" ".into()), vec![1]).content_type(),
            DEFAULT_CONTENT_TYPE
        );
        assert_eq!(
            ImageUpload::new("a", Some("image/webp".into()), vec![1]).content_type(),
            "image/webp"
        );
    }

    #[test]
    fn test_repository_errors_are_classified() {
        let rejected = IngestError::from_repository(RepositoryError::Rejected {
            constraint: Some("images_name_check".into()),
            message: "new row violates check constraint".into(),
        });
        assert!(matches!(rejected, IngestError::Rejected(_)));
        assert!(rejected.is_compensated());

        let soft = IngestError::from_repository(RepositoryError::NotPersisted);
        assert!(matches!(soft, IngestError::Persistence(RepositoryError::NotPersisted)));

        assert!(!IngestError::InvalidInput("x".into()).is_compensated());
    }
}
