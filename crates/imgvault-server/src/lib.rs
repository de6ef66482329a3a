//! imgvault server library
//!
//! Accepts image uploads, stores the bytes in an S3-compatible bucket,
//! captions them through a vision model and records the metadata in
//! PostgreSQL.
//!
//! # Architecture
//!
//! - **ingest**: the upload saga. Every attempt either commits both the blob
//!   and its metadata row or deletes the blob again.
//! - **storage**: S3 gateway plus the HTTP read-back used to verify uploads
//! - **describe**: best-effort caption generation
//! - **db**: the `images` repository
//! - **features**: HTTP slices (`commands/`, `queries/`, `routes.rs`)
//! - **api**, **middleware**, **error**: router assembly, CORS/tracing layers
//!   and the JSON error envelope
//!
//! Every external dependency sits behind a trait (`ObjectStore`,
//! `BlobReader`, `DescriptionGenerator`, `ImageRepository`, `StampSource`),
//! so the pipeline and router can be driven with in-memory doubles.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use imgvault_server::{
//!     api, config::Config, db, describe::UnconfiguredDescriptionGenerator,
//!     features::FeatureState, ingest::{IngestPipeline, MonotonicStamps},
//!     storage::{config::StorageConfig, HttpBlobReader, Storage},
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let pool = db::create_pool(&config.database).await?;
//!     let storage_config = StorageConfig::from_env()?;
//!     let reader = HttpBlobReader::new(storage_config.readback_timeout_secs)?;
//!
//!     let pipeline = IngestPipeline::new(
//!         Arc::new(Storage::new(storage_config)),
//!         Arc::new(reader),
//!         Arc::new(UnconfiguredDescriptionGenerator),
//!         Arc::new(db::PgImageRepository::new(pool)),
//!         Arc::new(MonotonicStamps::new()),
//!     );
//!
//!     let app = api::create_router(FeatureState::new(pipeline), &config);
//!     api::serve(app, &config, std::future::pending()).await
//! }
//! ```

pub mod api;
pub mod config;
pub mod db;
pub mod describe;
pub mod error;
pub mod features;
pub mod ingest;
pub mod middleware;
pub mod storage;

pub use error::{ApiResult, AppError};
