//! imgvault Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types and logging setup for the imgvault workspace.
//!
//! - **Logging**: `tracing` subscriber configuration (console, rolling file, JSON)
//! - **Types**: the image metadata records exchanged between the pipeline,
//!   the repository and the HTTP layer
//!
//! # Example
//!
//! ```no_run
//! use imgvault_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let _guard = init_logging(&LogConfig::from_env()?)?;
//!     tracing::info!("ready");
//!     Ok(())
//! }
//! ```

pub mod logging;
pub mod types;

pub use types::{ImageRecord, NewImageRecord, DESCRIPTION_UNAVAILABLE};
