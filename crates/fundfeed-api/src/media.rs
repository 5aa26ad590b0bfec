use std::path::PathBuf;

use anyhow::Result;
use axum::{Extension, Json, body::Bytes, extract::State, http::StatusCode, response::IntoResponse};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::info;
use uuid::Uuid;

use fundfeed_types::api::Claims;

use crate::AppState;
use crate::error::ApiError;

/// 50 MB upload limit for media files (pitch videos dominate).
pub const MAX_MEDIA_SIZE: usize = 50 * 1024 * 1024;

/// On-disk media storage. Files land at `{dir}/{subdir}/{name}` and are
/// served statically under `/media/`; the stored URL is the public path.
pub struct MediaStore {
    dir: PathBuf,
}

impl MediaStore {
    pub async fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Media storage directory: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn root(&self) -> &PathBuf {
        &self.dir
    }

    /// Write bytes under a generated name; returns the public URL path.
    pub async fn save(&self, subdir: &str, name: &str, bytes: &[u8]) -> Result<String> {
        let target_dir = self.dir.join(subdir);
        fs::create_dir_all(&target_dir).await?;

        let path = target_dir.join(name);
        let mut file = fs::File::create(&path).await?;
        file.write_all(bytes).await?;
        file.flush().await?;

        Ok(format!("/media/{}/{}", subdir, name))
    }
}

#[derive(Debug, serde::Serialize)]
pub struct UploadResponse {
    pub url: String,
    pub size: u64,
}

/// POST /uploads — accepts raw bytes (video, thumbnail, logo), stores
/// them under a fresh id, returns the public URL to reference from
/// listings.
pub async fn upload_media(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    bytes: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    if bytes.is_empty() {
        return Err(ApiError::validation("body", "upload body is empty"));
    }
    if bytes.len() > MAX_MEDIA_SIZE {
        return Err(ApiError::BadRequest("upload exceeds 50 MB limit".into()));
    }

    let name = format!("{}-{}", claims.sub, Uuid::new_v4());
    let url = state
        .media
        .save("uploads", &name, &bytes)
        .await
        .map_err(ApiError::Internal)?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            url,
            size: bytes.len() as u64,
        }),
    ))
}
