pub mod list;

pub use list::{ImageGallery, ListImagesError, ListImagesQuery};
