pub mod upload;

pub use upload::UploadImageCommand;
