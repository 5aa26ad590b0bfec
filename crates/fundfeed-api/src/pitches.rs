use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use fundfeed_db::models::PitchRow;
use fundfeed_db::pitches::PitchFilter;
use fundfeed_types::api::{
    Claims, CreatePitchRequest, PitchResponse, SavedPitchResponse, UpdatePitchRequest,
};
use fundfeed_types::models::Role;

use crate::AppState;
use crate::error::ApiError;
use crate::responses::{parse_ts, pitch_response};

#[derive(Debug, Deserialize)]
pub struct PitchQuery {
    pub search: Option<String>,
    pub tags: Option<String>,
    pub stage: Option<String>,
    /// Developer id, or `me` for the caller's own pitches.
    pub developer: Option<String>,
}

pub async fn list_pitches(
    State(state): State<AppState>,
    Query(query): Query<PitchQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = PitchFilter {
        search: query.search,
        tag: query.tags,
        stage: query.stage,
        developer_id: query.developer.map(|d| {
            if d == "me" { claims.sub.clone() } else { d }
        }),
    };

    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.list_pitches(&filter))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??;

    let pitches: Vec<PitchResponse> = rows
        .iter()
        .map(|(pitch, developer)| pitch_response(pitch, developer))
        .collect();

    Ok(Json(pitches))
}

pub async fn create_pitch(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreatePitchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if claims.role != Role::Developer {
        return Err(ApiError::Forbidden("only developers can create pitches".into()));
    }
    if req.title.trim().is_empty() {
        return Err(ApiError::validation("title", "title is required"));
    }
    if req.description.trim().is_empty() {
        return Err(ApiError::validation("description", "description is required"));
    }

    let pitch = PitchRow {
        id: Uuid::new_v4().to_string(),
        developer_id: claims.sub.clone(),
        title: req.title,
        description: req.description,
        tags: serde_json::to_string(&req.tags).map_err(anyhow::Error::from)?,
        funding_stage: req.funding_stage,
        ask: req.ask,
        video_url: req.video_url,
        thumbnail_url: req.thumbnail_url,
        views: 0,
        saves: 0,
        created_at: Utc::now().to_rfc3339(),
    };

    let db = state.clone();
    let row = pitch.clone();
    let developer = tokio::task::spawn_blocking(move || {
        db.db.insert_pitch(&row)?;
        db.db
            .get_user_by_id(&row.developer_id)?
            .ok_or_else(|| anyhow::anyhow!("authenticated user {} missing", row.developer_id))
    })
    .await
    .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??;

    Ok((StatusCode::CREATED, Json(pitch_response(&pitch, &developer))))
}

pub async fn get_pitch(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let pitch_id = id.clone();
    let (pitch, developer) = tokio::task::spawn_blocking(move || db.db.get_pitch(&pitch_id))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??
        .ok_or_else(|| ApiError::NotFound("pitch not found".into()))?;

    Ok(Json(pitch_response(&pitch, &developer)))
}

pub async fn update_pitch(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdatePitchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let pitch_id = id.clone();
    let (mut pitch, developer) = tokio::task::spawn_blocking(move || db.db.get_pitch(&pitch_id))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??
        .ok_or_else(|| ApiError::NotFound("pitch not found".into()))?;

    if pitch.developer_id != claims.sub {
        return Err(ApiError::Forbidden("only the owner can edit this pitch".into()));
    }

    if let Some(title) = req.title {
        if title.trim().is_empty() {
            return Err(ApiError::validation("title", "title cannot be empty"));
        }
        pitch.title = title;
    }
    if let Some(description) = req.description {
        pitch.description = description;
    }
    if let Some(tags) = req.tags {
        pitch.tags = serde_json::to_string(&tags).map_err(anyhow::Error::from)?;
    }
    if let Some(funding_stage) = req.funding_stage {
        pitch.funding_stage = funding_stage;
    }
    if let Some(ask) = req.ask {
        pitch.ask = ask;
    }
    if let Some(video_url) = req.video_url {
        pitch.video_url = Some(video_url);
    }
    if let Some(thumbnail_url) = req.thumbnail_url {
        pitch.thumbnail_url = Some(thumbnail_url);
    }

    let db = state.clone();
    let row = pitch.clone();
    tokio::task::spawn_blocking(move || db.db.update_pitch(&row))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??;

    Ok(Json(pitch_response(&pitch, &developer)))
}

pub async fn delete_pitch(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let pitch_id = id.clone();
    let (pitch, _) = tokio::task::spawn_blocking(move || db.db.get_pitch(&pitch_id))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??
        .ok_or_else(|| ApiError::NotFound("pitch not found".into()))?;

    if pitch.developer_id != claims.sub {
        return Err(ApiError::Forbidden("only the owner can delete this pitch".into()));
    }

    let db = state.clone();
    tokio::task::spawn_blocking(move || db.db.delete_pitch(&id))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /pitches/{id}/add_view — explicit counter bump, not tied to
/// fetches.
pub async fn add_view(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let views = state
        .db
        .add_pitch_view(&id)?
        .ok_or_else(|| ApiError::NotFound("pitch not found".into()))?;

    Ok(Json(serde_json::json!({ "views": views })))
}

/// POST /pitches/{id}/save — idempotent bookmark.
pub async fn save_pitch(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let (pitch, developer) = state
        .db
        .get_pitch(&id)?
        .ok_or_else(|| ApiError::NotFound("pitch not found".into()))?;

    let saved_id = Uuid::new_v4().to_string();
    let saved_at = Utc::now().to_rfc3339();
    let created = state
        .db
        .save_pitch(&saved_id, &claims.sub, &id, &saved_at)?;

    if !created {
        return Ok((
            StatusCode::OK,
            Json(serde_json::json!({ "detail": "Already saved", "saved": true })),
        ));
    }

    // The bookmark just landed; reflect it without a re-read.
    let mut pitch = pitch;
    pitch.saves += 1;
    let item = SavedPitchResponse {
        id: saved_id,
        investor: claims.sub.clone(),
        pitch: pitch_response(&pitch, &developer),
        saved_at: parse_ts(&saved_at),
    };

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "detail": "Saved", "saved": true, "item": item })),
    ))
}

/// DELETE /pitches/{id}/unsave — removing an absent bookmark is a
/// no-op, not an error.
pub async fn unsave_pitch(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .db
        .get_pitch(&id)?
        .ok_or_else(|| ApiError::NotFound("pitch not found".into()))?;

    let removed = state.db.unsave_pitch(&claims.sub, &id)?;
    let detail = if removed { "Removed" } else { "Not saved" };

    Ok(Json(serde_json::json!({ "detail": detail, "saved": false })))
}

/// GET /pitches/saved — the caller's bookmarks, newest first.
pub async fn saved_pitches(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let investor_id = claims.sub.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.list_saved_pitches(&investor_id))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??;

    let saved: Vec<SavedPitchResponse> = rows
        .iter()
        .map(|(saved, pitch, developer)| SavedPitchResponse {
            id: saved.id.clone(),
            investor: saved.investor_id.clone(),
            pitch: pitch_response(pitch, developer),
            saved_at: parse_ts(&saved.saved_at),
        })
        .collect();

    Ok(Json(saved))
}
