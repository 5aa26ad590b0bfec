use axum::{
    Extension, Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use fundfeed_db::Database;
use fundfeed_db::models::{ContactRequestRow, MeetingSummaryRow, UserRow};
use fundfeed_types::api::{Claims, GenerateSummaryRequest, StructuredSummaryRequest};

use crate::AppState;
use crate::error::ApiError;
use crate::pdf;
use crate::requests::{is_participant, load_request_payload};
use crate::responses::{parse_ts, summary_response};

/// Check the scheduled window, when one is set. Returns the violated
/// bound's description on failure.
fn check_time_window(req: &ContactRequestRow, now: DateTime<Utc>) -> Result<(), String> {
    if let Some(start) = &req.scheduled_start_time {
        if now < parse_ts(start) {
            return Err("meeting cannot start before its scheduled start time".into());
        }
    }
    if let Some(end) = &req.scheduled_end_time {
        if now > parse_ts(end) {
            return Err("meeting cannot start after its scheduled end time".into());
        }
    }
    Ok(())
}

/// Fallback summary when the caller supplies no text.
fn synthesize_summary(
    developer: &UserRow,
    investor: &UserRow,
    context_title: &str,
    started_at: Option<&str>,
    ended_at: Option<&str>,
) -> String {
    let developer_name = display_name(developer);
    let investor_name = display_name(investor);
    let started = started_at.unwrap_or("unknown");
    let ended = ended_at.unwrap_or("unknown");

    format!(
        "Meeting between {} and {} regarding \"{}\".\n\n\
         Started: {}\nEnded: {}\n\n\
         Both parties discussed the opportunity and agreed to follow up \
         through the platform.",
        developer_name, investor_name, context_title, started, ended
    )
}

fn display_name(user: &UserRow) -> &str {
    if user.username.is_empty() {
        &user.email
    } else {
        &user.username
    }
}

/// Title of whichever listing the request references.
fn context_title(db: &Database, req: &ContactRequestRow) -> anyhow::Result<String> {
    if let Some(pitch_id) = &req.pitch_id {
        if let Some((pitch, _)) = db.get_pitch(pitch_id)? {
            return Ok(pitch.title);
        }
    }
    if let Some(post_id) = &req.investor_post_id {
        if let Some((post, _)) = db.get_investor_post(post_id)? {
            return Ok(post.title);
        }
    }
    Ok("(listing removed)".to_string())
}

async fn load_participant_request(
    state: &AppState,
    id: &str,
    user_id: &str,
) -> Result<ContactRequestRow, ApiError> {
    let db = state.clone();
    let request_id = id.to_string();
    let row = tokio::task::spawn_blocking(move || db.db.get_contact_request(&request_id))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??
        .ok_or_else(|| ApiError::NotFound("request not found".into()))?;

    if !is_participant(&row, user_id) {
        return Err(ApiError::Forbidden("not a participant in this request".into()));
    }
    Ok(row)
}

/// POST /requests/{id}/start_meeting
pub async fn start_meeting(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let row = load_participant_request(&state, &id, &claims.sub).await?;

    if row.meeting_link.as_deref().unwrap_or("").trim().is_empty() {
        return Err(ApiError::validation(
            "meeting_link",
            "a meeting link is required before starting",
        ));
    }
    check_time_window(&row, Utc::now()).map_err(ApiError::BadRequest)?;

    let db = state.clone();
    let request_id = id.clone();
    let payload = tokio::task::spawn_blocking(move || {
        // Guarded flip; a concurrent start loses here, not at read time.
        if !db.db.start_meeting(&request_id, &Utc::now().to_rfc3339())? {
            return Ok(None);
        }
        let row = db
            .db
            .get_contact_request(&request_id)?
            .ok_or_else(|| anyhow::anyhow!("request {} vanished mid-transition", request_id))?;
        Ok::<_, anyhow::Error>(Some(load_request_payload(&db.db, &row)?))
    })
    .await
    .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??
    .ok_or_else(|| ApiError::BadRequest("meeting is not in scheduled state".into()))?;

    Ok(Json(payload))
}

/// POST /requests/{id}/end_meeting
pub async fn end_meeting(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    load_participant_request(&state, &id, &claims.sub).await?;

    let db = state.clone();
    let request_id = id.clone();
    let payload = tokio::task::spawn_blocking(move || {
        if !db.db.end_meeting(&request_id, &Utc::now().to_rfc3339())? {
            return Ok(None);
        }
        let row = db
            .db
            .get_contact_request(&request_id)?
            .ok_or_else(|| anyhow::anyhow!("request {} vanished mid-transition", request_id))?;
        Ok::<_, anyhow::Error>(Some(load_request_payload(&db.db, &row)?))
    })
    .await
    .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??
    .ok_or_else(|| ApiError::BadRequest("meeting is not in progress".into()))?;

    Ok(Json(payload))
}

/// POST /requests/{id}/generate_summary — caller text, or a synthesized
/// template over participants, context and actual times.
pub async fn generate_summary(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<GenerateSummaryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let row = load_participant_request(&state, &id, &claims.sub).await?;

    if row.meeting_status != "completed" {
        return Err(ApiError::BadRequest(
            "summary can only be generated for a completed meeting".into(),
        ));
    }

    let db = state.clone();
    let summary = tokio::task::spawn_blocking(move || {
        let text = match req.summary {
            Some(text) if !text.trim().is_empty() => text,
            _ => {
                let developer = db
                    .db
                    .get_user_by_id(&row.developer_id)?
                    .ok_or_else(|| anyhow::anyhow!("developer missing on request {}", row.id))?;
                let investor = db
                    .db
                    .get_user_by_id(&row.investor_id)?
                    .ok_or_else(|| anyhow::anyhow!("investor missing on request {}", row.id))?;
                let title = context_title(&db.db, &row)?;
                synthesize_summary(
                    &developer,
                    &investor,
                    &title,
                    row.meeting_started_at.as_deref(),
                    row.meeting_ended_at.as_deref(),
                )
            }
        };
        if !db.db.set_meeting_summary(&row.id, &text)? {
            anyhow::bail!("meeting left completed state mid-summary");
        }
        Ok::<_, anyhow::Error>(text)
    })
    .await
    .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??;

    Ok(Json(serde_json::json!({ "meeting_summary": summary })))
}

/// PUT /requests/{id}/structured_summary — create or replace the
/// one-to-one structured record.
pub async fn put_structured_summary(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<StructuredSummaryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    load_participant_request(&state, &id, &claims.sub).await?;

    let db = state.clone();
    let request_id = id.clone();
    let stored = tokio::task::spawn_blocking(move || {
        let now = Utc::now().to_rfc3339();
        let row = MeetingSummaryRow {
            id: Uuid::new_v4().to_string(),
            contact_request_id: request_id.clone(),
            discussion_points: serde_json::to_string(&req.discussion_points)?,
            action_items: serde_json::to_string(&req.action_items)?,
            decisions_made: serde_json::to_string(&req.decisions_made)?,
            next_steps: req.next_steps,
            needs_followup: req.needs_followup,
            followup_date: req.followup_date.map(|d| d.to_rfc3339()),
            additional_notes: req.additional_notes,
            created_at: now.clone(),
            updated_at: now,
        };
        db.db.upsert_meeting_summary(&row)?;
        // Re-read: an earlier record keeps its id and created_at.
        db.db
            .get_meeting_summary(&request_id)?
            .ok_or_else(|| anyhow::anyhow!("summary for {} vanished after upsert", request_id))
    })
    .await
    .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??;

    Ok(Json(summary_response(&stored)))
}

/// GET /requests/{id}/structured_summary
pub async fn get_structured_summary(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    load_participant_request(&state, &id, &claims.sub).await?;

    let db = state.clone();
    let request_id = id.clone();
    let row = tokio::task::spawn_blocking(move || db.db.get_meeting_summary(&request_id))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??
        .ok_or_else(|| ApiError::NotFound("no structured summary for this request".into()))?;

    Ok(Json(summary_response(&row)))
}

/// GET /requests/{id}/download_summary_pdf — binary attachment.
pub async fn download_summary_pdf(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let row = load_participant_request(&state, &id, &claims.sub).await?;

    let summary = row
        .meeting_summary
        .clone()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| {
            ApiError::BadRequest("no meeting summary to export; generate one first".into())
        })?;

    let db = state.clone();
    let bytes = tokio::task::spawn_blocking(move || {
        let developer = db
            .db
            .get_user_by_id(&row.developer_id)?
            .ok_or_else(|| anyhow::anyhow!("developer missing on request {}", row.id))?;
        let investor = db
            .db
            .get_user_by_id(&row.investor_id)?
            .ok_or_else(|| anyhow::anyhow!("investor missing on request {}", row.id))?;
        let title = context_title(&db.db, &row)?;

        pdf::render_summary(&pdf::SummaryDocument {
            developer: display_name(&developer).to_string(),
            investor: display_name(&investor).to_string(),
            context_title: title,
            scheduled_start: row.scheduled_start_time.clone(),
            scheduled_end: row.scheduled_end_time.clone(),
            started_at: row.meeting_started_at.clone(),
            ended_at: row.meeting_ended_at.clone(),
            status: row.meeting_status.clone(),
            body: summary,
        })
    })
    .await
    .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??;

    let filename = format!("attachment; filename=\"meeting-summary-{}.pdf\"", id);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, filename),
        ],
        bytes,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn request_with_window(
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> ContactRequestRow {
        ContactRequestRow {
            id: "r1".to_string(),
            developer_id: "d1".to_string(),
            investor_id: "i1".to_string(),
            pitch_id: Some("p1".to_string()),
            investor_post_id: None,
            message: "hi".to_string(),
            meeting_link: Some("https://meet.example/x".to_string()),
            preference: "email".to_string(),
            viewed: false,
            created_at: Utc::now().to_rfc3339(),
            scheduled_start_time: start.map(|t| t.to_rfc3339()),
            scheduled_end_time: end.map(|t| t.to_rfc3339()),
            timezone: "UTC".to_string(),
            meeting_platform: "zoom".to_string(),
            agenda: None,
            meeting_status: "scheduled".to_string(),
            meeting_started_at: None,
            meeting_ended_at: None,
            meeting_summary: None,
        }
    }

    #[test]
    fn window_bounds_are_enforced_when_set() {
        let now = Utc::now();

        // No window at all: always startable.
        assert!(check_time_window(&request_with_window(None, None), now).is_ok());

        // Inside the window.
        let req = request_with_window(
            Some(now - Duration::minutes(5)),
            Some(now + Duration::minutes(55)),
        );
        assert!(check_time_window(&req, now).is_ok());

        // Too early.
        let req = request_with_window(Some(now + Duration::minutes(10)), None);
        let err = check_time_window(&req, now).unwrap_err();
        assert!(err.contains("before its scheduled start"));

        // Too late.
        let req = request_with_window(None, Some(now - Duration::minutes(1)));
        let err = check_time_window(&req, now).unwrap_err();
        assert!(err.contains("after its scheduled end"));
    }

    #[test]
    fn synthesized_summary_names_participants_and_context() {
        let developer = UserRow {
            id: "d1".to_string(),
            email: "dev@x.com".to_string(),
            username: "ada".to_string(),
            password: String::new(),
            role: "developer".to_string(),
            status: "approved".to_string(),
            avatar_url: None,
            location: None,
            created_at: Utc::now().to_rfc3339(),
        };
        let investor = UserRow {
            username: String::new(),
            email: "inv@x.com".to_string(),
            role: "investor".to_string(),
            ..developer.clone()
        };

        let text = synthesize_summary(
            &developer,
            &investor,
            "Foo",
            Some("2026-03-01T10:00:00+00:00"),
            None,
        );
        assert!(text.contains("ada"));
        // Falls back to the email when the username is blank.
        assert!(text.contains("inv@x.com"));
        assert!(text.contains("\"Foo\""));
        assert!(text.contains("2026-03-01T10:00:00+00:00"));
        assert!(text.contains("Ended: unknown"));
    }
}
