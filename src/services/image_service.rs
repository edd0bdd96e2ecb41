//! Recipe images arrive as base64 data URLs and are stored under the media
//! directory. Only the path relative to that directory is persisted.

use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::web::error::AppError;

const IMAGE_SUBDIR: &str = "recipes/images";

fn extension_for(mime: &str) -> Option<&'static str> {
    match mime {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Splits `data:<mime>;base64,<payload>` and decodes the payload.
pub fn decode_data_url(data_url: &str) -> Result<(&'static str, Vec<u8>), AppError> {
    let invalid = || AppError::InvalidInput("Image must be a base64 data URL.".to_string());

    let rest = data_url.trim().strip_prefix("data:").ok_or_else(invalid)?;
    let (header, payload) = rest.split_once(',').ok_or_else(invalid)?;
    let mime = header.strip_suffix(";base64").ok_or_else(invalid)?;
    let extension = extension_for(&mime.to_ascii_lowercase()).ok_or_else(|| {
        AppError::InvalidInput(format!("Unsupported image type '{mime}'."))
    })?;

    let bytes = STANDARD.decode(payload.trim()).map_err(|_| invalid())?;
    if bytes.is_empty() {
        return Err(AppError::InvalidInput("Image must not be empty.".to_string()));
    }
    Ok((extension, bytes))
}

/// Writes the image to `<media_dir>/recipes/images/<uuid>.<ext>` and returns
/// the relative path.
pub async fn save_base64_image(media_dir: &str, data_url: &str) -> Result<String, AppError> {
    let (extension, bytes) = decode_data_url(data_url)?;

    let relative = format!("{IMAGE_SUBDIR}/{}.{extension}", Uuid::new_v4());
    let target: PathBuf = Path::new(media_dir).join(&relative);
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| AppError::InternalServerError(format!("Failed to create media directory: {e}")))?;
    }
    tokio::fs::write(&target, &bytes)
        .await
        .map_err(|e| AppError::InternalServerError(format!("Failed to store image: {e}")))?;

    debug!(path = %relative, size = bytes.len(), "Image stored.");
    Ok(relative)
}

/// Best-effort removal of a stored image.
pub async fn remove_image(media_dir: &str, relative: &str) {
    let target = Path::new(media_dir).join(relative);
    if let Err(e) = tokio::fs::remove_file(&target).await {
        warn!(path = %target.display(), error = %e, "Failed to remove image.");
    }
}
