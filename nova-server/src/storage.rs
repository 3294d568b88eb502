//! Local image storage
//!
//! Uploads are decoded, re-encoded to JPEG and stored under
//! `{upload_dir}/{sha256}.jpg`. Identical content maps to the same file.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use sha2::{Digest, Sha256};
use shared::error::{AppError, ErrorCode};

/// JPEG quality for stored images
const JPEG_QUALITY: u8 = 85;

/// Accepted upload extensions
pub const SUPPORTED_FORMATS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// Public URL prefix of stored files
pub const PUBLIC_PREFIX: &str = "/api/uploads";

#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await
    }

    /// Validate, compress and store an uploaded image. Returns the file name.
    pub async fn save(&self, filename: &str, data: &[u8], max_bytes: usize) -> Result<String, AppError> {
        if data.is_empty() {
            return Err(AppError::with_message(ErrorCode::InvalidRequest, "Empty file"));
        }
        if data.len() > max_bytes {
            return Err(AppError::with_message(
                ErrorCode::PayloadTooLarge,
                format!("File too large: {} bytes (max {max_bytes})", data.len()),
            ));
        }
        check_extension(filename)?;

        let jpeg = compress_to_jpeg(data)?;
        let name = format!("{}.jpg", content_hash(&jpeg));
        let path = self.root.join(&name);

        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::debug!(file = %name, "Image already stored");
            return Ok(name);
        }

        self.ensure_dir().await.map_err(storage_error)?;
        // Write to a temp file first so readers never see a partial image
        let tmp = self.root.join(format!(".{}.tmp", uuid::Uuid::new_v4()));
        tokio::fs::write(&tmp, &jpeg).await.map_err(storage_error)?;
        tokio::fs::rename(&tmp, &path).await.map_err(storage_error)?;

        tracing::info!(file = %name, bytes = jpeg.len(), "Image stored");
        Ok(name)
    }

    /// Read a stored file. Only plain `{hash}.{ext}` names are accepted.
    pub async fn read(&self, filename: &str) -> Result<Vec<u8>, AppError> {
        if !is_safe_filename(filename) {
            return Err(AppError::not_found("File"));
        }
        match tokio::fs::read(self.root.join(filename)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AppError::not_found("File")),
            Err(e) => Err(storage_error(e)),
        }
    }
}

/// Public URL for a stored file name
pub fn public_url(name: &str) -> String {
    format!("{PUBLIC_PREFIX}/{name}")
}

fn check_extension(filename: &str) -> Result<(), AppError> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    if !SUPPORTED_FORMATS.contains(&ext.as_str()) {
        return Err(AppError::with_message(
            ErrorCode::InvalidRequest,
            format!("Unsupported format: {ext}. Supported: png, jpg, jpeg, webp"),
        ));
    }
    Ok(())
}

fn compress_to_jpeg(data: &[u8]) -> Result<Vec<u8>, AppError> {
    let img = image::load_from_memory(data).map_err(|e| {
        AppError::with_message(ErrorCode::InvalidRequest, format!("Invalid image: {e}"))
    })?;

    let mut buffer = Vec::new();
    let mut cursor = Cursor::new(&mut buffer);
    let encoder = JpegEncoder::new_with_quality(&mut cursor, JPEG_QUALITY);
    img.to_rgb8().write_with_encoder(encoder).map_err(|e| {
        AppError::with_message(
            ErrorCode::StorageError,
            format!("Image compression failed: {e}"),
        )
    })?;
    Ok(buffer)
}

fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn is_safe_filename(name: &str) -> bool {
    let Some((stem, ext)) = name.split_once('.') else {
        return false;
    };
    !stem.is_empty()
        && stem.chars().all(|c| c.is_ascii_hexdigit())
        && SUPPORTED_FORMATS.contains(&ext)
}

fn storage_error(e: std::io::Error) -> AppError {
    tracing::error!(error = %e, "Image storage I/O failed");
    AppError::new(ErrorCode::StorageError)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(4, 4, image::Rgb([200, 30, 30]));
        let mut out = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn rejects_traversal_names() {
        assert!(is_safe_filename("ab12.jpg"));
        assert!(!is_safe_filename("../etc/passwd"));
        assert!(!is_safe_filename("..%2f.jpg"));
        assert!(!is_safe_filename("ab12.jpg/../x"));
        assert!(!is_safe_filename("ab12"));
        assert!(!is_safe_filename(".jpg"));
    }

    #[test]
    fn extension_allow_list() {
        assert!(check_extension("logo.PNG").is_ok());
        assert!(check_extension("photo.webp").is_ok());
        assert!(check_extension("script.svg").is_err());
        assert!(check_extension("noext").is_err());
    }

    #[tokio::test]
    async fn identical_content_is_stored_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path());
        let data = png_bytes();

        let a = store.save("a.png", &data, 1024 * 1024).await.unwrap();
        let b = store.save("b.png", &data, 1024 * 1024).await.unwrap();
        assert_eq!(a, b);
        assert!(a.ends_with(".jpg"));
        assert_eq!(a.len(), 64 + 4);

        let stored = store.read(&a).await.unwrap();
        assert!(image::load_from_memory(&stored).is_ok());
    }

    #[tokio::test]
    async fn oversize_and_garbage_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path());
        let data = png_bytes();

        let err = store.save("a.png", &data, 8).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PayloadTooLarge);

        let err = store.save("a.png", b"not an image", 1024).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidRequest);

        let err = store.read("deadbeef.jpg").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
