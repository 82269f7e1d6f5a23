//! Media storage on local disk
//!
//! Accepted uploads are written to a configured directory that the server
//! serves statically, and referenced by absolute URL in responses.

use std::path::PathBuf;

use chrono::Utc;

use crate::config::{MediaStorageConfig, ServerConfig};
use crate::error::AppError;

/// Per-file upload cap (5 MB)
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Maximum images attached to a single post
pub const MAX_POST_IMAGES: usize = 10;

const ALLOWED_CONTENT_TYPES: [&str; 3] = ["image/jpeg", "image/jpg", "image/png"];

/// An image read out of a multipart request, not yet persisted
#[derive(Debug)]
pub struct UploadedImage {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Media storage service
///
/// Validates and persists uploads, returning public URLs.
pub struct MediaStorage {
    root: PathBuf,
    /// URL prefix the root directory is served under,
    /// e.g. "http://localhost:3000/uploads"
    public_base: String,
}

impl MediaStorage {
    /// Create new media storage, ensuring the upload directory exists
    pub fn new(config: &MediaStorageConfig, server: &ServerConfig) -> Result<Self, AppError> {
        std::fs::create_dir_all(&config.root)
            .map_err(|e| AppError::Storage(format!("failed to create upload dir: {}", e)))?;

        Ok(Self {
            root: config.root.clone(),
            public_base: format!(
                "{}{}",
                server.base_url(),
                config.public_path.trim_end_matches('/')
            ),
        })
    }

    /// Directory uploads are written to
    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    /// Validate and persist one uploaded image
    ///
    /// # Errors
    /// `Validation` if the file exceeds 5 MB or is not JPEG/PNG.
    ///
    /// # Returns
    /// Public URL for the stored file.
    pub async fn save_image(&self, upload: UploadedImage) -> Result<String, AppError> {
        if upload.data.len() > MAX_UPLOAD_BYTES {
            return Err(AppError::Validation(format!(
                "file exceeds the {} MB upload limit",
                MAX_UPLOAD_BYTES / (1024 * 1024)
            )));
        }

        if !ALLOWED_CONTENT_TYPES.contains(&upload.content_type.as_str()) {
            return Err(AppError::Validation(
                "only .jpg, .jpeg and .png images are accepted".to_string(),
            ));
        }

        let file_name = format!(
            "{}-{}",
            Utc::now().timestamp_millis(),
            sanitize_file_name(&upload.file_name)
        );
        let path = self.root.join(&file_name);

        tokio::fs::write(&path, &upload.data)
            .await
            .map_err(|e| AppError::Storage(format!("failed to write upload: {}", e)))?;

        Ok(format!("{}/{}", self.public_base, file_name))
    }

    /// Delete a stored file by the public URL [`save_image`](Self::save_image)
    /// returned for it
    ///
    /// URLs outside this storage's public base and already-missing files are
    /// ignored.
    pub async fn remove_image(&self, url: &str) -> Result<(), AppError> {
        let Some(file_name) = url
            .strip_prefix(&self.public_base)
            .and_then(|rest| rest.strip_prefix('/'))
        else {
            return Ok(());
        };
        if file_name.is_empty() || file_name.contains(['/', '\\']) {
            return Ok(());
        }

        match tokio::fs::remove_file(self.root.join(file_name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!("failed to remove upload: {}", e))),
        }
    }
}

/// Reduce a client-supplied file name to a safe basename
fn sanitize_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    let cleaned: String = base
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '_') {
                ch
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.trim_matches(['_', '.']).is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn storage(dir: &TempDir) -> MediaStorage {
        let media = MediaStorageConfig {
            root: dir.path().to_path_buf(),
            public_path: "/uploads".to_string(),
        };
        let server = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            domain: "localhost:3000".to_string(),
            protocol: "http".to_string(),
        };
        MediaStorage::new(&media, &server).unwrap()
    }

    #[test]
    fn sanitize_strips_path_components() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("photo of me.png"), "photo_of_me.png");
        assert_eq!(sanitize_file_name("///"), "upload");
    }

    #[tokio::test]
    async fn save_image_writes_file_and_returns_public_url() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);

        let url = storage
            .save_image(UploadedImage {
                file_name: "cat.png".to_string(),
                content_type: "image/png".to_string(),
                data: vec![0u8; 128],
            })
            .await
            .unwrap();

        assert!(url.starts_with("http://localhost:3000/uploads/"));
        assert!(url.ends_with("-cat.png"));

        let file_name = url.rsplit('/').next().unwrap();
        assert!(dir.path().join(file_name).exists());
    }

    #[tokio::test]
    async fn remove_image_deletes_only_stored_files() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);

        let url = storage
            .save_image(UploadedImage {
                file_name: "cat.png".to_string(),
                content_type: "image/png".to_string(),
                data: vec![0u8; 128],
            })
            .await
            .unwrap();
        let file_name = url.rsplit('/').next().unwrap().to_string();
        assert!(dir.path().join(&file_name).exists());

        storage.remove_image(&url).await.unwrap();
        assert!(!dir.path().join(&file_name).exists());

        // Missing files and foreign URLs are no-ops
        storage.remove_image(&url).await.unwrap();
        storage
            .remove_image("https://elsewhere.example.com/uploads/x.png")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn save_image_rejects_oversized_files() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);

        let result = storage
            .save_image(UploadedImage {
                file_name: "big.png".to_string(),
                content_type: "image/png".to_string(),
                data: vec![0u8; MAX_UPLOAD_BYTES + 1],
            })
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn save_image_rejects_unsupported_content_types() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);

        let result = storage
            .save_image(UploadedImage {
                file_name: "clip.gif".to_string(),
                content_type: "image/gif".to_string(),
                data: vec![0u8; 16],
            })
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
