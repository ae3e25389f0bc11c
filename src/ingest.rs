//! Image ingestion: turning a user-supplied file into an [`ImageAsset`].

use std::io::Cursor;
use std::path::Path;

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::EditError;

/// MIME type declared for files with an unrecognized extension.
const FALLBACK_MIME: &str = "application/octet-stream";

/// Extension to declared MIME type.
const EXTENSIONS: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("webp", "image/webp"),
    ("gif", "image/gif"),
    ("bmp", "image/bmp"),
    ("heic", "image/heic"),
    ("heif", "image/heif"),
    ("txt", "text/plain"),
    ("md", "text/markdown"),
    ("json", "application/json"),
    ("pdf", "application/pdf"),
];

/// An uploaded image held in memory.
///
/// `data` never carries a `data:` prefix; `display_url` always does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAsset {
    /// Raw bytes as standard base64.
    pub data: String,
    /// Declared MIME type (e.g. `"image/png"`).
    pub mime_type: String,
    /// `data:<mime>;base64,<data>`, ready to render.
    pub display_url: String,
    /// Pixel width, when the format could be probed.
    pub width: Option<u32>,
    /// Pixel height, when the format could be probed.
    pub height: Option<u32>,
}

impl ImageAsset {
    /// Rebuild an asset from a display data URL.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::Decode`] if the string is not a base64 image data URL.
    pub fn from_data_url(url: &str) -> Result<Self, EditError> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| EditError::Decode("not a data URL".into()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| EditError::Decode("data URL has no payload".into()))?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| EditError::Decode("data URL is not base64-encoded".into()))?;
        if !is_image_mime(mime_type) {
            return Err(EditError::UnsupportedInput { mime_type: mime_type.to_string() });
        }

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| EditError::Decode(format!("invalid base64 payload: {e}")))?;
        let (width, height) = probe_dimensions(&bytes);

        Ok(Self {
            data: payload.to_string(),
            mime_type: mime_type.to_string(),
            display_url: url.to_string(),
            width,
            height,
        })
    }
}

/// Build the display data URL for a MIME type and base64 payload.
#[must_use]
pub fn data_url(mime_type: &str, data: &str) -> String {
    format!("data:{mime_type};base64,{data}")
}

/// The content type a file declares through its extension.
#[must_use]
pub fn declared_mime_type(path: &Path) -> &'static str {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return FALLBACK_MIME;
    };
    let ext = ext.to_ascii_lowercase();
    EXTENSIONS.iter().find(|(e, _)| *e == ext).map_or(FALLBACK_MIME, |&(_, mime)| mime)
}

fn is_image_mime(mime: &str) -> bool {
    mime.starts_with("image/")
}

/// Encode raw bytes into an [`ImageAsset`].
///
/// # Errors
///
/// Returns [`EditError::UnsupportedInput`] if `declared_mime` is not an image type.
pub fn ingest_bytes(bytes: &[u8], declared_mime: &str) -> Result<ImageAsset, EditError> {
    if !is_image_mime(declared_mime) {
        return Err(EditError::UnsupportedInput { mime_type: declared_mime.to_string() });
    }

    let data = base64::engine::general_purpose::STANDARD.encode(bytes);
    let (width, height) = probe_dimensions(bytes);

    Ok(ImageAsset {
        display_url: data_url(declared_mime, &data),
        data,
        mime_type: declared_mime.to_string(),
        width,
        height,
    })
}

/// Read an image file from disk into an [`ImageAsset`].
///
/// The declared type is checked before the file is opened.
///
/// # Errors
///
/// Returns [`EditError::UnsupportedInput`] for non-image files and
/// [`EditError::Decode`] if the file cannot be read.
pub async fn ingest_file(path: &Path) -> Result<ImageAsset, EditError> {
    let declared = declared_mime_type(path);
    if !is_image_mime(declared) {
        return Err(EditError::UnsupportedInput { mime_type: declared.to_string() });
    }

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| EditError::Decode(format!("Failed to read {}: {e}", path.display())))?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), mime = declared, "ingested image");
    ingest_bytes(&bytes, declared)
}

/// Best-effort pixel dimensions. Formats the `image` crate cannot read yield `None`.
fn probe_dimensions(bytes: &[u8]) -> (Option<u32>, Option<u32>) {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()
        .and_then(|reader| reader.into_dimensions().ok())
        .map_or((None, None), |(w, h)| (Some(w), Some(h)))
}
