//! Multipart forms with an optional image part, stored under the uploads
//! directory as `<uuid>.<ext>`.

use crate::error::{ApiError, ApiResult};
use actix_multipart::Multipart;
use actix_web::web;
use futures_util::TryStreamExt;
use std::{collections::HashMap, path::PathBuf};
use tracing::{debug, error, warn};
use uuid::Uuid;

const MAX_TEXT_FIELD_BYTES: usize = 1024;

/// Image formats accepted for photos and logos, detected from content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
    Gif,
    Webp,
}

impl ImageKind {
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(ImageKind::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageKind::Jpeg)
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(ImageKind::Gif)
        } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some(ImageKind::Webp)
        } else {
            None
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ImageKind::Png => "png",
            ImageKind::Jpeg => "jpg",
            ImageKind::Gif => "gif",
            ImageKind::Webp => "webp",
        }
    }
}

#[derive(Debug, Default)]
pub struct UploadForm {
    pub fields: HashMap<String, String>,
    pub file: Option<Vec<u8>>,
}

impl UploadForm {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|v| v.trim())
    }
}

fn too_large() -> ApiError {
    ApiError::bad_request("File too large")
}

/// Drains the form. `file_field` is buffered up to `max_bytes`, other parts
/// are read as short text values.
pub async fn read_form(mut payload: Multipart, file_field: &str, max_bytes: usize) -> ApiResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(mut field) = payload.try_next().await.map_err(|e| {
        debug!(error = %e, "Malformed multipart body");
        ApiError::invalid_payload()
    })? {
        let name = field.name().to_string();
        let limit = if name == file_field { max_bytes } else { MAX_TEXT_FIELD_BYTES };

        let mut buf = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(|_| ApiError::invalid_payload())? {
            if buf.len() + chunk.len() > limit {
                return Err(if name == file_field { too_large() } else { ApiError::invalid_payload() });
            }
            buf.extend_from_slice(&chunk);
        }

        if name == file_field {
            // Browsers send an empty part when no file was picked.
            if !buf.is_empty() {
                form.file = Some(buf);
            }
        } else {
            let text = String::from_utf8(buf).map_err(|_| ApiError::invalid_payload())?;
            form.fields.insert(name, text);
        }
    }

    Ok(form)
}

/// Writes an image and returns its stored file name.
pub async fn save_image(dir: &str, bytes: Vec<u8>) -> ApiResult<String> {
    let kind = ImageKind::sniff(&bytes).ok_or_else(|| ApiError::bad_request("Only image uploads are allowed"))?;
    let filename = format!("{}.{}", Uuid::new_v4(), kind.extension());
    let path: PathBuf = [dir, filename.as_str()].iter().collect();

    web::block(move || std::fs::write(&path, &bytes))
        .await?
        .map_err(|e| {
            error!(error = %e, "Failed to store upload");
            ApiError::Internal
        })?;

    Ok(filename)
}

/// Removes a stored image whose database row was never written. Failures are
/// logged only.
pub async fn discard_image(dir: &str, filename: &str) {
    let path: PathBuf = [dir, filename].iter().collect();
    match web::block(move || std::fs::remove_file(&path)).await {
        Ok(Ok(())) => debug!(filename, "Discarded unused upload"),
        Ok(Err(e)) => warn!(error = %e, filename, "Failed to discard upload"),
        Err(e) => warn!(error = %e, filename, "Failed to discard upload"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_common_image_formats() {
        assert_eq!(ImageKind::sniff(b"\x89PNG\r\n\x1a\n rest"), Some(ImageKind::Png));
        assert_eq!(ImageKind::sniff(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00]), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::sniff(b"GIF89a...."), Some(ImageKind::Gif));
        assert_eq!(ImageKind::sniff(b"RIFF\x00\x00\x00\x00WEBPVP8 "), Some(ImageKind::Webp));
    }

    #[test]
    fn rejects_non_images() {
        assert_eq!(ImageKind::sniff(b"%PDF-1.7"), None);
        assert_eq!(ImageKind::sniff(b"<svg xmlns=..."), None);
        assert_eq!(ImageKind::sniff(b"RIFF"), None);
        assert_eq!(ImageKind::sniff(&[]), None);
    }

    #[test]
    fn extensions() {
        assert_eq!(ImageKind::Jpeg.extension(), "jpg");
        assert_eq!(ImageKind::Webp.extension(), "webp");
    }

    #[actix_web::test]
    async fn saves_with_generated_name() {
        let dir = std::env::temp_dir().join(format!("geoattend-upload-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let dir_str = dir.to_str().unwrap().to_string();

        let name = save_image(&dir_str, b"GIF89a-body".to_vec()).await.unwrap();
        assert!(name.ends_with(".gif"));
        assert_eq!(std::fs::read(dir.join(&name)).unwrap(), b"GIF89a-body");

        let err = save_image(&dir_str, b"plain text".to_vec()).await.unwrap_err();
        assert_eq!(err.to_string(), "Only image uploads are allowed");

        discard_image(&dir_str, &name).await;
        assert!(!dir.join(&name).exists());
        // Already gone: only logged.
        discard_image(&dir_str, &name).await;

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
