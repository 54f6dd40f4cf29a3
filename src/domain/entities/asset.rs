use std::path::Path;

use actix_multipart::form::{tempfile::TempFile, MultipartForm};
use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::{
    constants::{PENDING_PREFIX, PROCESSED_PREFIX},
    errors::{AppError, PipelineError},
};

// ───── Upload Form ────────────────────────────────────────────────────

#[derive(Debug, MultipartForm)]
pub struct MaterialUploadForm {
    #[multipart(rename = "image", limit = "10MB")]
    pub image: TempFile,
}

// ───── Domain Models ──────────────────────────────────────────────────

/// A user-selected file as received: raw bytes, declared media type, and the
/// original filename. Consumed by the encode stage; never outlives it.
#[derive(Debug)]
pub struct UploadedAsset {
    pub bytes: Vec<u8>,
    pub media_type: String,
    pub file_name: String,
}

impl UploadedAsset {
    /// Builds an asset from multipart parts, sniffing the real content type.
    ///
    /// The sniffed type wins over the client-declared one: browsers routinely
    /// send `application/octet-stream` for drag-and-drop files.
    pub fn from_parts(
        bytes: Vec<u8>,
        declared_type: Option<String>,
        file_name: Option<String>,
    ) -> Result<Self, AppError> {
        if bytes.is_empty() {
            return Err(AppError::InvalidInput("No image file provided".to_string()));
        }

        let sniffed = infer::get(&bytes);
        let media_type = match sniffed {
            Some(kind) if kind.matcher_type() == infer::MatcherType::Image => {
                kind.mime_type().to_string()
            }
            _ => {
                return Err(AppError::InvalidInput(
                    "Uploaded file is not a supported image".to_string(),
                ));
            }
        };

        // Declared type is advisory only; log the mismatch and move on.
        if let Some(declared) = declared_type {
            if declared != media_type {
                tracing::debug!(declared = %declared, sniffed = %media_type, "Declared media type differs from sniffed type");
            }
        }

        let file_name = sanitize_file_name(file_name.as_deref().unwrap_or("upload"));

        Ok(UploadedAsset { bytes, media_type, file_name })
    }
}

/// Text-safe encoding of an asset: media-type prefix plus base64 payload.
/// Derived deterministically; doubles as the preview (data URL) and the
/// analysis-request body.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedImage {
    pub media_type: String,
    pub data: String,
}

impl EncodedImage {
    pub fn from_asset(asset: &UploadedAsset) -> Self {
        EncodedImage {
            media_type: asset.media_type.clone(),
            data: STANDARD.encode(&asset.bytes),
        }
    }

    /// Renders as a browser-previewable data URL.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }

    /// Recovers the original asset bytes for the persistence stage.
    pub fn decode_bytes(&self) -> Result<Vec<u8>, PipelineError> {
        STANDARD
            .decode(&self.data)
            .map_err(|e| PipelineError::Persistence(format!("Corrupt encoded payload: {}", e)))
    }
}

// ───── Storage Key Naming ─────────────────────────────────────────────

/// Reduces a client-supplied filename to a safe basename. Path components
/// and shell-hostile characters never reach a storage key.
pub fn sanitize_file_name(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload");

    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();

    if cleaned.trim_matches('_').is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

/// Key for a freshly uploaded asset: `uploads/{unixMillis}-{filename}`.
pub fn pending_key(unix_millis: i64, file_name: &str) -> String {
    format!("{}/{}-{}", PENDING_PREFIX, unix_millis, file_name)
}

/// Key for an asset whose pipeline run completed: `processed/{unixMillis}-{filename}`.
pub fn processed_key(unix_millis: i64, file_name: &str) -> String {
    format!("{}/{}-{}", PROCESSED_PREFIX, unix_millis, file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimal valid JPEG header; infer only needs the magic bytes.
    fn jpeg_bytes() -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
        bytes.extend_from_slice(&[0x00, 0x10, b'J', b'F', b'I', b'F', 0x00]);
        bytes.extend_from_slice(&[0u8; 64]);
        bytes
    }

    #[test]
    fn builds_asset_from_valid_jpeg() {
        let asset = UploadedAsset::from_parts(
            jpeg_bytes(),
            Some("image/jpeg".into()),
            Some("photo.jpg".into()),
        )
        .unwrap();

        assert_eq!(asset.media_type, "image/jpeg");
        assert_eq!(asset.file_name, "photo.jpg");
    }

    #[test]
    fn rejects_empty_payload() {
        let result = UploadedAsset::from_parts(vec![], None, Some("photo.jpg".into()));
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn rejects_non_image_payload() {
        let result = UploadedAsset::from_parts(
            b"%PDF-1.4 not an image".to_vec(),
            Some("image/jpeg".into()),
            Some("doc.jpg".into()),
        );
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn encoding_is_deterministic_and_reversible() {
        let asset = UploadedAsset::from_parts(jpeg_bytes(), None, Some("a.jpg".into())).unwrap();
        let first = EncodedImage::from_asset(&asset);
        let second = EncodedImage::from_asset(&asset);

        assert_eq!(first, second);
        assert_eq!(first.decode_bytes().unwrap(), asset.bytes);
    }

    #[test]
    fn data_url_carries_media_type_prefix() {
        let encoded = EncodedImage { media_type: "image/png".into(), data: "aGk=".into() };
        assert_eq!(encoded.to_data_url(), "data:image/png;base64,aGk=");
    }

    #[test]
    fn sanitizes_path_traversal_and_odd_characters() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("my photo (1).jpg"), "my_photo__1_.jpg");
        assert_eq!(sanitize_file_name("///"), "upload");
    }

    #[test]
    fn storage_keys_follow_stage_prefix_convention() {
        assert_eq!(pending_key(1700000000000, "photo.jpg"), "uploads/1700000000000-photo.jpg");
        assert_eq!(processed_key(1700000000000, "photo.jpg"), "processed/1700000000000-photo.jpg");
    }
}
