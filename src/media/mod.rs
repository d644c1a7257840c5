//! Media Host: where dish and post images live.
//!
//! An upload takes the raw bytes of an image the admin picked and returns a
//! public URL. The URL is what gets stored on the record; the site never
//! serves image bytes itself.
//!
//! | Module | Role |
//! |--------|------|
//! | [`cloudinary`] | Unsigned uploads to Cloudinary, signed deletes |
//! | [`memory`] | Placeholder URLs for local development and tests |
//!
//! ## Before upload
//!
//! [`check_upload`] runs as part of form validation, before any network
//! call: files over the configured cap are rejected, and so is anything
//! that is not an image. "Is an image" means both that the declared content
//! type (if the browser sent one) is `image/*` and that the bytes start with
//! a known image signature.
//!
//! ## After a failed save
//!
//! If the document write fails after an upload succeeded, the content
//! service calls [`MediaHost::discard`] so the image does not linger
//! unreferenced. Discarding is best effort: a host that cannot delete
//! (e.g. no signed credentials) logs the orphan and returns `Ok`.

pub mod cloudinary;
pub mod memory;

pub use cloudinary::CloudinaryHost;
pub use memory::MemoryMedia;

use crate::config::{MediaBackend, MediaConfig};
use crate::validate::ValidationError;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("upload request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("media host rejected the upload ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// An image picked in an admin form.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaFile {
    pub file_name: String,
    /// Content type as declared by the browser, if any.
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedMedia {
    /// Public URL stored on the record.
    pub url: String,
    /// Host-side identifier, needed to delete the asset again.
    pub public_id: Option<String>,
}

#[async_trait]
pub trait MediaHost: Send + Sync {
    /// Upload one image into the configured folder.
    async fn upload(&self, file: &MediaFile) -> Result<UploadedMedia, MediaError>;

    /// Delete a previously uploaded image.
    async fn discard(&self, media: &UploadedMedia) -> Result<(), MediaError>;
}

/// Reject files that are too large or are not images.
pub fn check_upload(file: &MediaFile, max_bytes: usize) -> Result<(), ValidationError> {
    if file.bytes.len() > max_bytes {
        return Err(ValidationError::ImageTooLarge {
            size: file.bytes.len(),
            max: max_bytes,
        });
    }
    if let Some(declared) = file.content_type.as_deref()
        && !declared.starts_with("image/")
    {
        return Err(ValidationError::NotAnImage(declared.to_string()));
    }
    image::guess_format(&file.bytes)
        .map_err(|_| ValidationError::NotAnImage(format!("{} is not a known image", file.file_name)))?;
    Ok(())
}

/// Construct the backend selected in config.
pub fn connect(config: &MediaConfig) -> Result<Arc<dyn MediaHost>, MediaError> {
    Ok(match config.backend {
        MediaBackend::Memory => Arc::new(MemoryMedia::new(&config.folder)),
        MediaBackend::Cloudinary => Arc::new(CloudinaryHost::from_config(config)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{png_file, png_bytes};

    #[test]
    fn accepts_small_png() {
        assert!(check_upload(&png_file("suya.png"), 1024).is_ok());
    }

    #[test]
    fn rejects_oversized_file() {
        let mut file = png_file("big.png");
        file.bytes.resize(2048, 0);
        assert_eq!(
            check_upload(&file, 1024),
            Err(ValidationError::ImageTooLarge {
                size: 2048,
                max: 1024
            })
        );
    }

    #[test]
    fn rejects_declared_non_image() {
        let file = MediaFile {
            file_name: "menu.pdf".to_string(),
            content_type: Some("application/pdf".to_string()),
            bytes: png_bytes(),
        };
        assert_eq!(
            check_upload(&file, 1024),
            Err(ValidationError::NotAnImage("application/pdf".to_string()))
        );
    }

    #[test]
    fn rejects_bytes_that_are_not_an_image() {
        let file = MediaFile {
            file_name: "fake.png".to_string(),
            content_type: Some("image/png".to_string()),
            bytes: b"just some text".to_vec(),
        };
        assert!(matches!(
            check_upload(&file, 1024),
            Err(ValidationError::NotAnImage(_))
        ));
    }

    #[test]
    fn missing_content_type_falls_back_to_sniffing() {
        let mut file = png_file("suya.png");
        file.content_type = None;
        assert!(check_upload(&file, 1024).is_ok());
    }

    #[test]
    fn connect_memory_backend() {
        assert!(connect(&MediaConfig::default()).is_ok());
    }
}
