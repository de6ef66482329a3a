use imgvault_common::ImageRecord;
use serde::{Deserialize, Serialize};

use crate::db::{ImageRepository, RepositoryError};

/// Message shown alongside an empty gallery when the listing failed.
pub const GALLERY_UNAVAILABLE_MESSAGE: &str = "Unable to load images right now";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListImagesQuery;

#[derive(Debug, thiserror::Error)]
pub enum ListImagesError {
    #[error("Failed to list images: {0}")]
    Repository(#[from] RepositoryError),
}

/// Every image, newest first.
#[tracing::instrument(skip(repository, _query))]
pub async fn handle(
    repository: &dyn ImageRepository,
    _query: ListImagesQuery,
) -> Result<Vec<ImageRecord>, ListImagesError> {
    let images = repository.list_all().await?;
    tracing::debug!(count = images.len(), "Listed images");
    Ok(images)
}

/// What a caller renders: always a list, plus a message when it is degraded.
#[derive(Debug, Clone, Serialize)]
pub struct ImageGallery {
    pub images: Vec<ImageRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ImageGallery {
    pub fn from_result(result: Result<Vec<ImageRecord>, ListImagesError>) -> Self {
        match result {
            Ok(images) => Self {
                images,
                message: None,
            },
            Err(e) => {
                tracing::error!(error = %e, "Image listing failed, serving empty gallery");
                Self {
                    images: Vec::new(),
                    message: Some(GALLERY_UNAVAILABLE_MESSAGE.to_string()),
                }
            },
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.message.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_gallery_from_success() {
        let record = ImageRecord {
            id: 1,
            url: "http://localhost:9000/imgvault-images/images/1-cat.png".to_string(),
            name: "cat.png".to_string(),
            description: Some("A cat".to_string()),
            created_at: Utc::now(),
        };

        let gallery = ImageGallery::from_result(Ok(vec![record]));
        assert_eq!(gallery.images.len(), 1);
        assert!(!gallery.is_degraded());
    }

    #[test]
    fn test_gallery_degrades_on_error() {
        let gallery = ImageGallery::from_result(Err(ListImagesError::Repository(
            RepositoryError::NotPersisted,
        )));
        assert!(gallery.images.is_empty());
        assert_eq!(gallery.message.as_deref(), Some(GALLERY_UNAVAILABLE_MESSAGE));
    }
}
