//! Image upload and gallery listing
//!
//! - `POST /images` accepts a multipart `file` field and runs it through the
//!   ingestion pipeline
//! - `GET /images` lists every image, newest first

pub mod commands;
pub mod queries;
pub mod routes;

pub use routes::images_routes;
