use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use fundfeed_db::models::InvestorPostRow;
use fundfeed_db::posts::PostFilter;
use fundfeed_types::api::{
    Claims, CreateInvestorPostRequest, InvestorPostResponse, SavedInvestorPostResponse,
    UpdateInvestorPostRequest,
};
use fundfeed_types::models::Role;

use crate::AppState;
use crate::error::ApiError;
use crate::responses::{parse_ts, post_response};

#[derive(Debug, Deserialize)]
pub struct PostQuery {
    pub search: Option<String>,
    pub tags: Option<String>,
    pub stage: Option<String>,
    pub location: Option<String>,
    /// Investor id, or `me` for the caller's own posts.
    pub investor: Option<String>,
}

pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<PostQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = PostFilter {
        search: query.search,
        tag: query.tags,
        stage: query.stage,
        location: query.location,
        investor_id: query.investor.map(|i| {
            if i == "me" { claims.sub.clone() } else { i }
        }),
    };

    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.list_investor_posts(&filter))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??;

    let posts: Vec<InvestorPostResponse> = rows
        .iter()
        .map(|(post, investor)| post_response(post, investor))
        .collect();

    Ok(Json(posts))
}

pub async fn create_post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateInvestorPostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if claims.role != Role::Investor {
        return Err(ApiError::Forbidden("only investors can create posts".into()));
    }
    if req.title.trim().is_empty() {
        return Err(ApiError::validation("title", "title is required"));
    }
    if req.description.trim().is_empty() {
        return Err(ApiError::validation("description", "description is required"));
    }

    let post = InvestorPostRow {
        id: Uuid::new_v4().to_string(),
        investor_id: claims.sub.clone(),
        title: req.title,
        description: req.description,
        tags: serde_json::to_string(&req.tags).map_err(anyhow::Error::from)?,
        stages: serde_json::to_string(&req.stages).map_err(anyhow::Error::from)?,
        amount_range: req.amount_range,
        location: req.location,
        contact_preference: req.contact_preference,
        logo_url: req.logo_url,
        status: "approved".to_string(),
        views: 0,
        saved_count: 0,
        created_at: Utc::now().to_rfc3339(),
    };

    let db = state.clone();
    let row = post.clone();
    let investor = tokio::task::spawn_blocking(move || {
        db.db.insert_investor_post(&row)?;
        db.db
            .get_user_by_id(&row.investor_id)?
            .ok_or_else(|| anyhow::anyhow!("authenticated user {} missing", row.investor_id))
    })
    .await
    .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??;

    Ok((StatusCode::CREATED, Json(post_response(&post, &investor))))
}

pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let post_id = id.clone();
    let (post, investor) = tokio::task::spawn_blocking(move || db.db.get_investor_post(&post_id))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??
        .ok_or_else(|| ApiError::NotFound("post not found".into()))?;

    Ok(Json(post_response(&post, &investor)))
}

pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateInvestorPostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let post_id = id.clone();
    let (mut post, investor) = tokio::task::spawn_blocking(move || db.db.get_investor_post(&post_id))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??
        .ok_or_else(|| ApiError::NotFound("post not found".into()))?;

    if post.investor_id != claims.sub {
        return Err(ApiError::Forbidden("only the owner can edit this post".into()));
    }

    if let Some(title) = req.title {
        if title.trim().is_empty() {
            return Err(ApiError::validation("title", "title cannot be empty"));
        }
        post.title = title;
    }
    if let Some(description) = req.description {
        post.description = description;
    }
    if let Some(tags) = req.tags {
        post.tags = serde_json::to_string(&tags).map_err(anyhow::Error::from)?;
    }
    if let Some(stages) = req.stages {
        post.stages = serde_json::to_string(&stages).map_err(anyhow::Error::from)?;
    }
    if let Some(amount_range) = req.amount_range {
        post.amount_range = amount_range;
    }
    if let Some(location) = req.location {
        post.location = location;
    }
    if let Some(contact_preference) = req.contact_preference {
        post.contact_preference = contact_preference;
    }
    if let Some(logo_url) = req.logo_url {
        post.logo_url = Some(logo_url);
    }

    let db = state.clone();
    let row = post.clone();
    tokio::task::spawn_blocking(move || db.db.update_investor_post(&row))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??;

    Ok(Json(post_response(&post, &investor)))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let post_id = id.clone();
    let (post, _) = tokio::task::spawn_blocking(move || db.db.get_investor_post(&post_id))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??
        .ok_or_else(|| ApiError::NotFound("post not found".into()))?;

    if post.investor_id != claims.sub {
        return Err(ApiError::Forbidden("only the owner can delete this post".into()));
    }

    let db = state.clone();
    tokio::task::spawn_blocking(move || db.db.delete_investor_post(&id))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_view(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let views = state
        .db
        .add_investor_post_view(&id)?
        .ok_or_else(|| ApiError::NotFound("post not found".into()))?;

    Ok(Json(serde_json::json!({ "views": views })))
}

/// POST /investor-posts/{id}/save — idempotent; saved_count moves with
/// the bookmark row inside one transaction.
pub async fn save_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .db
        .get_investor_post(&id)?
        .ok_or_else(|| ApiError::NotFound("post not found".into()))?;

    let created = state.db.save_investor_post(
        &Uuid::new_v4().to_string(),
        &claims.sub,
        &id,
        &Utc::now().to_rfc3339(),
    )?;

    if created {
        Ok((
            StatusCode::CREATED,
            Json(serde_json::json!({ "detail": "Post saved." })),
        ))
    } else {
        Ok((
            StatusCode::OK,
            Json(serde_json::json!({ "detail": "Already saved." })),
        ))
    }
}

/// DELETE /investor-posts/{id}/unsave — absent bookmarks are a no-op.
pub async fn unsave_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<axum::response::Response, ApiError> {
    state
        .db
        .get_investor_post(&id)?
        .ok_or_else(|| ApiError::NotFound("post not found".into()))?;

    let removed = state.db.unsave_investor_post(&claims.sub, &id)?;

    if removed {
        Ok(StatusCode::NO_CONTENT.into_response())
    } else {
        Ok(Json(serde_json::json!({ "detail": "Not saved." })).into_response())
    }
}

pub async fn saved_posts(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let developer_id = claims.sub.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.list_saved_investor_posts(&developer_id))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??;

    let saved: Vec<SavedInvestorPostResponse> = rows
        .iter()
        .map(|(saved, post, investor)| SavedInvestorPostResponse {
            id: saved.id.clone(),
            developer: saved.developer_id.clone(),
            post: post_response(post, investor),
            saved_at: parse_ts(&saved.saved_at),
        })
        .collect();

    Ok(Json(saved))
}
