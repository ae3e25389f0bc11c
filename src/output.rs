//! Output naming and saving edited images as PNG.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::EditError;

/// Prefix of auto-generated output file names.
const FILE_PREFIX: &str = "pixelperfect-edit";

/// Generate an output filename from a prompt.
///
/// `pixelperfect-edit-<kebab prompt>-<unix timestamp>.png`
#[must_use]
pub fn auto_filename(prompt: &str) -> String {
    let sanitized = sanitize_for_filename(prompt, 40);
    let timestamp = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
    format!("{FILE_PREFIX}-{sanitized}-{timestamp}.png")
}

/// Sanitize a string for use in a filename.
///
/// Lowercases ASCII alphanumerics, turns every other run of characters into a
/// single hyphen, and trims to `max_len`.
#[must_use]
pub fn sanitize_for_filename(input: &str, max_len: usize) -> String {
    let mut result = String::with_capacity(max_len);
    let mut last_was_hyphen = true;

    for ch in input.chars() {
        if result.len() >= max_len {
            break;
        }
        if ch.is_ascii_alphanumeric() {
            result.push(ch.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            result.push('-');
            last_was_hyphen = true;
        }
    }

    while result.ends_with('-') {
        result.pop();
    }

    if result.is_empty() {
        "image".to_string()
    } else {
        result
    }
}

/// Resolve the output path: use explicit path or auto-generate.
#[must_use]
pub fn resolve_output_path(explicit: Option<&Path>, prompt: &str) -> PathBuf {
    explicit.map_or_else(|| PathBuf::from(auto_filename(prompt)), Path::to_path_buf)
}

/// Write edited image bytes to `output_path` as PNG.
///
/// The service labels every edit as PNG; bytes in any other format are
/// re-encoded.
///
/// # Errors
///
/// Returns an error if the bytes cannot be decoded or the file cannot be written.
pub fn save_png(data: &[u8], output_path: &Path) -> Result<(), EditError> {
    if is_png(data) {
        return std::fs::write(output_path, data).map_err(EditError::Io);
    }

    tracing::debug!("edited image is not PNG, converting");
    let img = image::load_from_memory(data)
        .map_err(|e| EditError::ImageConversion(format!("Failed to decode image: {e}")))?;
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .map_err(|e| EditError::ImageConversion(format!("Failed to encode PNG: {e}")))?;
    std::fs::write(output_path, buf.into_inner()).map_err(EditError::Io)
}

fn is_png(data: &[u8]) -> bool {
    matches!(image::guess_format(data), Ok(image::ImageFormat::Png))
}
