//! Image metadata records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder stored when no caption could be generated.
pub const DESCRIPTION_UNAVAILABLE: &str = "Description unavailable";

/// One ingested image as persisted by the metadata repository.
///
/// `id` and `created_at` are assigned by the repository on insert and never
/// change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: i64,
    pub url: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied by the caller of `insert`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewImageRecord {
    pub url: String,
    pub name: String,
    pub description: Option<String>,
}

impl NewImageRecord {
    pub fn new(url: impl Into<String>, name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
            description,
        }
    }

    /// Materialize the record the way the repository would.
    pub fn into_record(self, id: i64, created_at: DateTime<Utc>) -> ImageRecord {
        ImageRecord {
            id,
            url: self.url,
            name: self.name,
            description: self.description,
            created_at,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_into_record_keeps_fields() {
        let now = Utc::now();
        let record = NewImageRecord::new("http://cdn/images/1-cat.png", "cat.png", None)
            .into_record(7, now);

        assert_eq!(record.id, 7);
        assert_eq!(record.url, "http://cdn/images/1-cat.png");
        assert_eq!(record.name, "cat.png");
        assert_eq!(record.description, None);
        assert_eq!(record.created_at, now);
    }

    #[test]
    fn test_missing_description_is_omitted_from_json() {
        let record = NewImageRecord::new("u", "n", None).into_record(1, Utc::now());
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("description").is_none());
        assert_eq!(json["name"], "n");
    }
}
