use std::path::{Path, PathBuf};

use axum::extract::Multipart;
use chrono::Local;
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};

pub const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];
pub const UPLOAD_FIELD: &str = "images";
pub const PUBLIC_PREFIX: &str = "/uploads";

pub fn allowed_file(filename: &str) -> bool {
    match filename.rsplit_once('.') {
        Some((_, ext)) => ALLOWED_EXTENSIONS.contains(&ext.to_lowercase().as_str()),
        None => false,
    }
}

/// Reduce a client-supplied name to a safe, flat file name.
pub fn secure_filename(filename: &str) -> String {
    let base = filename.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    cleaned.trim_matches(|c: char| c == '.' || c == '_').to_string()
}

/// Store every acceptable file of the `images` field under `upload_dir` and
/// return their public paths. Files with other extensions are skipped.
pub async fn save_images(upload_dir: &Path, mut multipart: Multipart) -> ApiResult<Vec<String>> {
    let mut saw_field = false;
    let mut stored = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidInput(format!("Malformed upload: {}", e)))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        saw_field = true;

        let original = field.file_name().unwrap_or_default().to_string();
        let filename = secure_filename(&original);
        if filename.is_empty() || !allowed_file(&filename) {
            warn!("Skipping upload with disallowed name: {:?}", original);
            continue;
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::InvalidInput(format!("Malformed upload: {}", e)))?;

        let new_filename = format!("{}_{}", Local::now().format("%Y%m%d_%H%M%S"), filename);
        let path: PathBuf = upload_dir.join(&new_filename);
        tokio::fs::write(&path, &data)
            .await
            .map_err(|e| ApiError::Internal(e.into()))?;

        info!("Stored upload {} ({} bytes)", path.display(), data.len());
        stored.push(format!("{}/{}", PUBLIC_PREFIX, new_filename));
    }

    if !saw_field {
        return Err(ApiError::InvalidInput("No file part".to_string()));
    }
    Ok(stored)
}
