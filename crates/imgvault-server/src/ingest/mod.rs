//! Image ingestion
//!
//! - `key`: store key derivation and the injectable stamp source
//! - `saga`: per-attempt state machine and compensation stack
//! - `pipeline`: the upload → read-back → describe → persist sequence

pub mod key;
pub mod pipeline;
pub mod saga;

pub use key::{MonotonicStamps, StampSource, StoreKey};
pub use pipeline::{ImageUpload, IngestError, IngestPipeline, IngestReceipt, DEFAULT_CONTENT_TYPE};
pub use saga::{Compensation, CompensationError, Saga, SagaState};
