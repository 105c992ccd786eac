use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::{error::ApiError, IMAGE_UPLOAD_DIR};

/// Recipe images on local disk, addressed by their path relative to `root`.
#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
    url: String,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>, url: &str) -> Self {
        Self {
            root: root.into(),
            url: url.to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Decodes a `data:image/<ext>;base64,<payload>` url and stores it under a fresh name.
    /// Returns the stored path relative to the media root.
    pub async fn save_base64_image(&self, data_url: &str) -> Result<String, ApiError> {
        let image = DecodedImage::parse(data_url)?;

        let directory = self.root.join(IMAGE_UPLOAD_DIR);
        tokio::fs::create_dir_all(&directory).await.map_err(|e| {
            log::error!("Failed to create {}: {e}", directory.display());
            ApiError::Internal(e.to_string())
        })?;

        let name = format!("{}.{}", uuid::Uuid::new_v4(), image.extension);
        tokio::fs::write(directory.join(&name), &image.bytes)
            .await
            .map_err(|e| {
                log::error!("Failed to write image {name}: {e}");
                ApiError::Internal(e.to_string())
            })?;

        log::debug!("Stored image {name} ({} bytes)", image.bytes.len());
        Ok(format!("{IMAGE_UPLOAD_DIR}/{name}"))
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.url, path.trim_start_matches('/'))
    }

    /// Best effort; a missing file is not an error.
    pub async fn remove(&self, path: &str) {
        if path.is_empty() {
            return;
        }
        if let Err(e) = tokio::fs::remove_file(self.root.join(path)).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("Failed to remove image {path}: {e}");
            }
        }
    }
}

#[derive(Debug)]
struct DecodedImage {
    extension: String,
    bytes: Vec<u8>,
}

impl DecodedImage {
    fn parse(data_url: &str) -> Result<Self, ApiError> {
        let invalid = || ApiError::Validation(String::from("'image': Invalid image data."));

        let (header, payload) = data_url
            .trim()
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(";base64,"))
            .ok_or_else(invalid)?;

        let extension = header
            .strip_prefix("image/")
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .ok_or_else(invalid)?
            .to_ascii_lowercase();

        let bytes = STANDARD.decode(payload.trim()).map_err(|_e| invalid())?;
        if bytes.is_empty() {
            return Err(invalid());
        }

        Ok(Self { extension, bytes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PIXEL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    #[test]
    fn data_urls_are_decoded() {
        let image = DecodedImage::parse(PIXEL).unwrap();

        assert_eq!(image.extension, "png");
        assert_eq!(&image.bytes[1..4], b"PNG");
    }

    #[test]
    fn malformed_data_urls_are_rejected() {
        assert!(DecodedImage::parse("iVBORw0KGgo=").is_err());
        assert!(DecodedImage::parse("data:text/plain;base64,aGVsbG8=").is_err());
        assert!(DecodedImage::parse("data:image/png;base64,***").is_err());
    }

    #[tokio::test]
    async fn saved_images_land_under_the_upload_dir() {
        let dir = tempfile::tempdir().unwrap();
        let media = MediaStorage::new(dir.path(), "/media/");

        let path = media.save_base64_image(PIXEL).await.unwrap();
        assert!(path.starts_with("recipes/images/"));
        assert!(path.ends_with(".png"));
        assert!(dir.path().join(&path).exists());
        assert_eq!(media.url(&path), format!("/media/{path}"));

        media.remove(&path).await;
        assert!(!dir.path().join(&path).exists());
    }
}
