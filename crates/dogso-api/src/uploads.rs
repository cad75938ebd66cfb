use std::path::Path;

use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{error, info, warn};
use uuid::Uuid;

use dogso_types::api::UploadResponse;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::extract::AuthUser;

/// 50 MB upload limit for media
pub const MAX_UPLOAD_SIZE: usize = 50 * 1024 * 1024;

/// URL prefix under which stored blobs are served.
pub const UPLOAD_URL_PREFIX: &str = "/uploads";

/// `"image/png"` -> `("image", "png")`. Only images and video are accepted.
fn classify(content_type: &str) -> Option<(&'static str, String)> {
    let mime = content_type.split(';').next()?.trim().to_ascii_lowercase();
    let (top, sub) = mime.split_once('/')?;
    let kind = match top {
        // served from our own origin, so no scriptable images
        "image" if sub.starts_with("svg") => return None,
        "image" => "image",
        "video" => "video",
        _ => return None,
    };
    // "x-msvideo" -> "xmsvideo"; anything odd falls back to "bin"
    let ext: String = sub
        .split('+')
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(8)
        .collect();
    let ext = if ext.is_empty() { "bin".to_string() } else { ext };
    Some((kind, ext))
}

/// Write the whole blob, removing `path` if the write fails so a truncated
/// file is never served.
async fn write_or_discard<W>(mut file: W, path: &Path, bytes: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let written = async {
        file.write_all(bytes).await?;
        file.flush().await
    }
    .await;

    if written.is_err() {
        drop(file);
        if let Err(cleanup) = tokio::fs::remove_file(path).await {
            warn!("Failed to remove partial upload {}: {}", path.display(), cleanup);
        }
    }
    written
}

/// POST /upload: multipart form with a `file` field. Writes the blob to the
/// upload directory and returns its public URL and media kind.
pub async fn upload_media(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let mut multipart = multipart.map_err(|r| ApiError::validation(r.body_text()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let (kind, ext) = field
            .content_type()
            .and_then(classify)
            .ok_or_else(|| ApiError::validation("only image and video uploads are accepted"))?;

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation(e.body_text()))?;
        if bytes.is_empty() {
            return Err(ApiError::validation("uploaded file is empty"));
        }
        if bytes.len() > MAX_UPLOAD_SIZE {
            return Err(ApiError::validation("uploaded file exceeds 50 MB"));
        }

        let dir = &state.settings.upload_dir;
        tokio::fs::create_dir_all(dir).await.map_err(|e| {
            error!("Failed to create upload directory {}: {}", dir.display(), e);
            ApiError::Internal(e.into())
        })?;

        let file_name = format!("{}.{}", Uuid::new_v4(), ext);
        let path = dir.join(&file_name);
        let file = tokio::fs::File::create(&path).await.map_err(|e| {
            error!("Failed to create file {}: {}", path.display(), e);
            ApiError::Internal(e.into())
        })?;
        write_or_discard(file, &path, &bytes).await.map_err(|e| {
            error!("Failed to write file {}: {}", path.display(), e);
            ApiError::Internal(e.into())
        })?;

        info!("User {} uploaded {} ({} bytes)", claims.sub, file_name, bytes.len());

        return Ok((
            StatusCode::CREATED,
            Json(UploadResponse {
                url: format!("{}/{}", UPLOAD_URL_PREFIX, file_name),
                media_type: kind.to_string(),
            }),
        ));
    }

    Err(ApiError::validation("multipart field 'file' is required"))
}
