use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use fundfeed_db::Database;
use fundfeed_db::models::ContactRequestRow;
use fundfeed_db::requests::RequestBox;
use fundfeed_types::api::{
    Claims, ContactRequestResponse, CreateContactRequest, UpdateContactRequest,
};
use fundfeed_types::models::MeetingStatus;

use crate::AppState;
use crate::error::ApiError;
use crate::notify;
use crate::responses::{pitch_response, post_response, request_response};

#[derive(Debug, Deserialize)]
pub struct RequestQuery {
    /// `inbox` (default) or `sent`.
    #[serde(rename = "box")]
    pub box_: Option<String>,
}

/// A request's participants are its developer and its investor; the
/// sender is whichever of them the referenced listing implies.
pub(crate) fn is_participant(req: &ContactRequestRow, user_id: &str) -> bool {
    req.developer_id == user_id || req.investor_id == user_id
}

pub(crate) fn is_sender(req: &ContactRequestRow, user_id: &str) -> bool {
    if req.pitch_id.is_some() {
        req.investor_id == user_id
    } else {
        req.developer_id == user_id
    }
}

/// Assemble the full response payload for one request: both parties
/// plus the referenced listing. Blocking; call under spawn_blocking.
pub(crate) fn load_request_payload(
    db: &Database,
    req: &ContactRequestRow,
) -> anyhow::Result<ContactRequestResponse> {
    let developer = db
        .get_user_by_id(&req.developer_id)?
        .ok_or_else(|| anyhow::anyhow!("developer {} missing on request {}", req.developer_id, req.id))?;
    let investor = db
        .get_user_by_id(&req.investor_id)?
        .ok_or_else(|| anyhow::anyhow!("investor {} missing on request {}", req.investor_id, req.id))?;

    let pitch = match &req.pitch_id {
        Some(id) => db.get_pitch(id)?.map(|(p, u)| pitch_response(&p, &u)),
        None => None,
    };
    let investor_post = match &req.investor_post_id {
        Some(id) => db.get_investor_post(id)?.map(|(p, u)| post_response(&p, &u)),
        None => None,
    };

    Ok(request_response(req, &developer, &investor, pitch, investor_post))
}

pub async fn list_requests(
    State(state): State<AppState>,
    Query(query): Query<RequestQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let box_ = match query.box_.as_deref() {
        None | Some("inbox") => RequestBox::Inbox,
        Some("sent") => RequestBox::Sent,
        Some(other) => {
            return Err(ApiError::validation(
                "box",
                format!("unknown box '{}', expected inbox or sent", other),
            ));
        }
    };

    let db = state.clone();
    let user_id = claims.sub.clone();
    let responses = tokio::task::spawn_blocking(move || {
        let rows = db.db.list_contact_requests(&user_id, box_)?;

        // Batch-fetch both parties for every row, then attach listings.
        let mut user_ids: Vec<String> = Vec::new();
        for row in &rows {
            user_ids.push(row.developer_id.clone());
            user_ids.push(row.investor_id.clone());
        }
        user_ids.sort();
        user_ids.dedup();
        let users: HashMap<String, _> = db
            .db
            .get_users_by_ids(&user_ids)?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        let mut responses = Vec::with_capacity(rows.len());
        for row in &rows {
            let (Some(developer), Some(investor)) =
                (users.get(&row.developer_id), users.get(&row.investor_id))
            else {
                tracing::warn!("request {} references a missing user", row.id);
                continue;
            };
            let pitch = match &row.pitch_id {
                Some(id) => db.db.get_pitch(id)?.map(|(p, u)| pitch_response(&p, &u)),
                None => None,
            };
            let investor_post = match &row.investor_post_id {
                Some(id) => db.db.get_investor_post(id)?.map(|(p, u)| post_response(&p, &u)),
                None => None,
            };
            responses.push(request_response(row, developer, investor, pitch, investor_post));
        }
        Ok::<_, anyhow::Error>(responses)
    })
    .await
    .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??;

    Ok(Json(responses))
}

pub async fn create_request(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateContactRequest>,
) -> Result<impl IntoResponse, ApiError> {
    match (&req.pitch, &req.investor_post) {
        (Some(_), Some(_)) => {
            return Err(ApiError::validation(
                "pitch",
                "provide either pitch or investor_post, not both",
            ));
        }
        (None, None) => {
            return Err(ApiError::validation(
                "pitch",
                "one of pitch or investor_post is required",
            ));
        }
        _ => {}
    }
    if req.message.trim().is_empty() {
        return Err(ApiError::validation("message", "message is required"));
    }

    let db = state.clone();
    let caller = claims.sub.clone();
    let (row, payload) = tokio::task::spawn_blocking(move || {
        // The referenced listing decides who is developer and who is
        // investor: a pitch is contacted by an investor, a post by a
        // developer.
        let (developer_id, investor_id) = if let Some(pitch_id) = &req.pitch {
            let (pitch, _) = db
                .db
                .get_pitch(pitch_id)?
                .ok_or(NotFoundListing::Pitch)?;
            (pitch.developer_id, caller.clone())
        } else {
            let post_id = req.investor_post.as_ref().expect("validated above");
            let (post, _) = db
                .db
                .get_investor_post(post_id)?
                .ok_or(NotFoundListing::Post)?;
            (caller.clone(), post.investor_id)
        };

        let row = ContactRequestRow {
            id: Uuid::new_v4().to_string(),
            developer_id,
            investor_id,
            pitch_id: req.pitch.clone(),
            investor_post_id: req.investor_post.clone(),
            message: req.message.clone(),
            meeting_link: req.meeting_link.clone(),
            preference: req
                .preference
                .map(|p| p.as_str().to_string())
                .unwrap_or_else(|| "email".to_string()),
            viewed: false,
            created_at: Utc::now().to_rfc3339(),
            scheduled_start_time: req.scheduled_start_time.map(|t| t.to_rfc3339()),
            scheduled_end_time: req.scheduled_end_time.map(|t| t.to_rfc3339()),
            timezone: req.timezone.clone().unwrap_or_else(|| "UTC".to_string()),
            meeting_platform: req
                .meeting_platform
                .map(|p| p.as_str().to_string())
                .unwrap_or_else(|| "google-meet".to_string()),
            agenda: req.agenda.clone(),
            meeting_status: "scheduled".to_string(),
            meeting_started_at: None,
            meeting_ended_at: None,
            meeting_summary: None,
        };
        db.db.insert_contact_request(&row)?;
        let payload = load_request_payload(&db.db, &row)?;
        Ok::<_, anyhow::Error>((row, payload))
    })
    .await
    .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))?
    .map_err(map_listing_not_found)?;

    // Side effect only: failures are logged inside, never surfaced.
    notify::contact_request_created(&state, &row).await;

    Ok((StatusCode::CREATED, Json(payload)))
}

/// Sentinel threaded through anyhow so the handler can answer 404 for
/// a missing listing without flattening every other error to 404.
#[derive(Debug, thiserror::Error)]
enum NotFoundListing {
    #[error("pitch not found")]
    Pitch,
    #[error("post not found")]
    Post,
}

fn map_listing_not_found(e: anyhow::Error) -> ApiError {
    match e.downcast_ref::<NotFoundListing>() {
        Some(sentinel) => ApiError::NotFound(sentinel.to_string()),
        None => ApiError::Internal(e),
    }
}

pub async fn get_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let request_id = id.clone();
    let result = tokio::task::spawn_blocking(move || {
        let Some(row) = db.db.get_contact_request(&request_id)? else {
            return Ok(None);
        };
        let payload = load_request_payload(&db.db, &row)?;
        Ok::<_, anyhow::Error>(Some((row, payload)))
    })
    .await
    .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??;

    let (row, payload) = result.ok_or_else(|| ApiError::NotFound("request not found".into()))?;
    if !is_participant(&row, &claims.sub) {
        return Err(ApiError::Forbidden("not a participant in this request".into()));
    }

    Ok(Json(payload))
}

pub async fn update_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateContactRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // The transition endpoints own the rest of the state machine; a
    // direct edit may only cancel.
    if let Some(status) = req.meeting_status {
        if status != MeetingStatus::Cancelled {
            return Err(ApiError::validation(
                "meeting_status",
                "only cancellation is allowed here; use the meeting endpoints",
            ));
        }
    }

    let db = state.clone();
    let request_id = id.clone();
    let mut row = tokio::task::spawn_blocking(move || db.db.get_contact_request(&request_id))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??
        .ok_or_else(|| ApiError::NotFound("request not found".into()))?;

    if !is_participant(&row, &claims.sub) {
        return Err(ApiError::Forbidden("not a participant in this request".into()));
    }

    if let Some(message) = req.message {
        row.message = message;
    }
    if let Some(meeting_link) = req.meeting_link {
        row.meeting_link = Some(meeting_link);
    }
    if let Some(preference) = req.preference {
        row.preference = preference.as_str().to_string();
    }
    if let Some(start) = req.scheduled_start_time {
        row.scheduled_start_time = Some(start.to_rfc3339());
    }
    if let Some(end) = req.scheduled_end_time {
        row.scheduled_end_time = Some(end.to_rfc3339());
    }
    if let Some(timezone) = req.timezone {
        row.timezone = timezone;
    }
    if let Some(platform) = req.meeting_platform {
        row.meeting_platform = platform.as_str().to_string();
    }
    if let Some(agenda) = req.agenda {
        row.agenda = Some(agenda);
    }
    if let Some(status) = req.meeting_status {
        row.meeting_status = status.as_str().to_string();
    }

    let db = state.clone();
    let updated = row.clone();
    let payload = tokio::task::spawn_blocking(move || {
        db.db.update_contact_request(&updated)?;
        load_request_payload(&db.db, &updated)
    })
    .await
    .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??;

    Ok(Json(payload))
}

pub async fn delete_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let request_id = id.clone();
    let row = tokio::task::spawn_blocking(move || db.db.get_contact_request(&request_id))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??
        .ok_or_else(|| ApiError::NotFound("request not found".into()))?;

    if !is_sender(&row, &claims.sub) {
        return Err(ApiError::Forbidden("only the sender can withdraw a request".into()));
    }

    let db = state.clone();
    tokio::task::spawn_blocking(move || db.db.delete_contact_request(&id))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /requests/{id}/mark_viewed — any participant may flag it.
pub async fn mark_viewed(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_contact_request(&id)?
        .ok_or_else(|| ApiError::NotFound("request not found".into()))?;

    if !is_participant(&row, &claims.sub) {
        return Err(ApiError::Forbidden("not a participant in this request".into()));
    }

    state.db.mark_request_viewed(&id)?;
    Ok(Json(serde_json::json!({ "status": "marked as viewed" })))
}
