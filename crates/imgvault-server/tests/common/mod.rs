//! In-memory doubles shared by the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use imgvault_common::{ImageRecord, NewImageRecord};
use imgvault_server::{
    db::{ImageRepository, RepositoryError},
    describe::{DescribeError, DescriptionGenerator},
    features::FeatureState,
    ingest::{IngestPipeline, StampSource},
    storage::{BlobReader, ObjectStore, ReadbackError, StoreError},
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

pub const PUBLIC_BASE: &str = "http://blobs.test/imgvault-images";

// ============================================================================
// Object store
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Put { key: String, size: usize, content_type: String },
    Delete { key: String },
}

/// Records every call; `put` and `delete` can be told to fail.
#[derive(Default)]
pub struct MemoryStore {
    pub blobs: Mutex<HashMap<String, Vec<u8>>>,
    pub calls: Mutex<Vec<StoreCall>>,
    pub fail_put: bool,
    pub fail_delete: bool,
}

impl MemoryStore {
    pub fn failing_put() -> Self {
        Self {
            fail_put: true,
            ..Self::default()
        }
    }

    pub fn failing_delete() -> Self {
        Self {
            fail_delete: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                StoreCall::Delete { key } => Some(key),
                StoreCall::Put { .. } => None,
            })
            .collect()
    }

    pub fn blob_count(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(&self, key: &str, content: Vec<u8>, content_type: &str) -> Result<(), StoreError> {
        self.calls.lock().unwrap().push(StoreCall::Put {
            key: key.to_string(),
            size: content.len(),
            content_type: content_type.to_string(),
        });
        if self.fail_put {
            return Err(StoreError::new("put", key, "bucket unavailable"));
        }
        self.blobs.lock().unwrap().insert(key.to_string(), content);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.calls.lock().unwrap().push(StoreCall::Delete {
            key: key.to_string(),
        });
        if self.fail_delete {
            return Err(StoreError::new("delete", key, "bucket unavailable"));
        }
        self.blobs.lock().unwrap().remove(key);
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{PUBLIC_BASE}/{key}")
    }
}

// ============================================================================
// Read-back
// ============================================================================

/// Serves blobs straight out of a [`MemoryStore`], or fails every fetch.
pub struct StoreReader {
    store: Arc<MemoryStore>,
    fail: bool,
    pub fetched: Mutex<Vec<String>>,
}

impl StoreReader {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self {
            store,
            fail: false,
            fetched: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(store: Arc<MemoryStore>) -> Self {
        Self {
            fail: true,
            ..Self::new(store)
        }
    }
}

#[async_trait]
impl BlobReader for StoreReader {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ReadbackError> {
        self.fetched.lock().unwrap().push(url.to_string());
        if self.fail {
            return Err(ReadbackError::Status {
                url: url.to_string(),
                status: 403,
            });
        }

        let key = url.trim_start_matches(PUBLIC_BASE).trim_start_matches('/');
        self.store
            .blobs
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| ReadbackError::Status {
                url: url.to_string(),
                status: 404,
            })
    }
}

// ============================================================================
// Description generator
// ============================================================================

pub struct FixedDescriber {
    reply: Result<String, String>,
    pub seen: Mutex<Vec<(usize, String)>>,
}

impl FixedDescriber {
    pub fn caption(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: Err("model overloaded".to_string()),
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl DescriptionGenerator for FixedDescriber {
    async fn describe(&self, image: &[u8], content_type: &str) -> Result<String, DescribeError> {
        self.seen
            .lock()
            .unwrap()
            .push((image.len(), content_type.to_string()));
        self.reply.clone().map_err(DescribeError::Api)
    }
}

// ============================================================================
// Repository
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoFailure {
    NotPersisted,
    Rejected,
    Database,
}

fn injected(failure: RepoFailure) -> RepositoryError {
    match failure {
        RepoFailure::NotPersisted => RepositoryError::NotPersisted,
        RepoFailure::Rejected => RepositoryError::Rejected {
            constraint: Some("images_name_check".to_string()),
            message: "new row violates check constraint".to_string(),
        },
        RepoFailure::Database => RepositoryError::Database(sqlx::Error::PoolTimedOut),
    }
}

/// Assigns ids and timestamps like the `images` table; each insert lands
/// one second after the previous one.
pub struct MemoryRepository {
    pub records: Mutex<Vec<ImageRecord>>,
    pub inserts: Mutex<Vec<NewImageRecord>>,
    pub insert_failure: Option<RepoFailure>,
    pub list_failure: Option<RepoFailure>,
    pub healthy: bool,
    next_id: AtomicU64,
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            inserts: Mutex::new(Vec::new()),
            insert_failure: None,
            list_failure: None,
            healthy: true,
            next_id: AtomicU64::new(1),
        }
    }
}

impl MemoryRepository {
    pub fn failing_insert(failure: RepoFailure) -> Self {
        Self {
            insert_failure: Some(failure),
            ..Self::default()
        }
    }

    pub fn failing_list(failure: RepoFailure) -> Self {
        Self {
            list_failure: Some(failure),
            healthy: false,
            ..Self::default()
        }
    }

    /// Records inserted out of chronological order.
    pub fn seeded(offsets_secs: &[i64]) -> Self {
        let repo = Self::default();
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        {
            let mut records = repo.records.lock().unwrap();
            for (i, offset) in offsets_secs.iter().enumerate() {
                let id = repo.next_id.fetch_add(1, Ordering::SeqCst) as i64;
                records.push(
                    NewImageRecord::new(
                        format!("{PUBLIC_BASE}/images/{i}-seed.png"),
                        format!("seed-{i}.png"),
                        Some("seed".to_string()),
                    )
                    .into_record(id, base + Duration::seconds(*offset)),
                );
            }
        }
        repo
    }

    pub fn inserts(&self) -> Vec<NewImageRecord> {
        self.inserts.lock().unwrap().clone()
    }

    pub fn record_count(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

#[async_trait]
impl ImageRepository for MemoryRepository {
    async fn insert(&self, record: NewImageRecord) -> Result<ImageRecord, RepositoryError> {
        self.inserts.lock().unwrap().push(record.clone());
        if let Some(failure) = self.insert_failure {
            return Err(injected(failure));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) as i64;
        let created_at = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap() + Duration::seconds(id);
        let record = record.into_record(id, created_at);
        self.records.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn list_all(&self) -> Result<Vec<ImageRecord>, RepositoryError> {
        if let Some(failure) = self.list_failure {
            return Err(injected(failure));
        }
        let mut records = self.records.lock().unwrap().clone();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(records)
    }

    async fn health_check(&self) -> Result<(), RepositoryError> {
        if self.healthy {
            Ok(())
        } else {
            Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
        }
    }
}

// ============================================================================
// Stamps
// ============================================================================

/// Hands out `start`, `start + 1`, ...
pub struct SequenceStamps(AtomicU64);

impl SequenceStamps {
    pub fn starting_at(start: u64) -> Self {
        Self(AtomicU64::new(start))
    }
}

impl StampSource for SequenceStamps {
    fn next_stamp(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst)
    }
}

// ============================================================================
// Wiring
// ============================================================================

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub reader: Arc<StoreReader>,
    pub describer: Arc<FixedDescriber>,
    pub repository: Arc<MemoryRepository>,
    pub pipeline: IngestPipeline,
}

impl Harness {
    pub fn new(store: MemoryStore, describer: FixedDescriber, repository: MemoryRepository) -> Self {
        let store = Arc::new(store);
        let reader = Arc::new(StoreReader::new(Arc::clone(&store)));
        Self::assemble(store, reader, describer, repository)
    }

    pub fn with_failing_reader(describer: FixedDescriber, repository: MemoryRepository) -> Self {
        let store = Arc::new(MemoryStore::default());
        let reader = Arc::new(StoreReader::failing(Arc::clone(&store)));
        Self::assemble(store, reader, describer, repository)
    }

    pub fn healthy() -> Self {
        Self::new(
            MemoryStore::default(),
            FixedDescriber::caption("A cat sitting on a windowsill"),
            MemoryRepository::default(),
        )
    }

    fn assemble(
        store: Arc<MemoryStore>,
        reader: Arc<StoreReader>,
        describer: FixedDescriber,
        repository: MemoryRepository,
    ) -> Self {
        let describer = Arc::new(describer);
        let repository = Arc::new(repository);
        let pipeline = IngestPipeline::new(
            store.clone(),
            reader.clone(),
            describer.clone(),
            repository.clone(),
            Arc::new(SequenceStamps::starting_at(1_700_000_000_000)),
        );

        Self {
            store,
            reader,
            describer,
            repository,
            pipeline,
        }
    }

    pub fn feature_state(&self) -> FeatureState {
        FeatureState::new(self.pipeline.clone())
    }
}
