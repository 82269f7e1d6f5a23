//! Local media storage

mod media;

pub use media::{MediaStorage, UploadedImage, MAX_POST_IMAGES, MAX_UPLOAD_BYTES};
