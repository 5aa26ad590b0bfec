//! Row -> API payload conversion. Rows keep SQLite text (RFC 3339
//! timestamps, JSON lists); everything is parsed once here so handlers
//! stay declarative.

use chrono::{DateTime, Utc};
use tracing::warn;

use fundfeed_db::models::{
    ContactRequestRow, InvestorPostRow, MeetingSummaryRow, PitchRow, UserRow,
};
use fundfeed_types::api::{
    ContactRequestResponse, InvestorPostResponse, PitchResponse, StructuredSummaryResponse,
    SummaryItem, UserResponse,
};
use fundfeed_types::models::{
    ContactPreference, MeetingPlatform, MeetingStatus, ModerationStatus, Role,
};

pub(crate) fn parse_ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", s, e);
            DateTime::default()
        })
}

pub(crate) fn parse_ts_opt(s: &Option<String>) -> Option<DateTime<Utc>> {
    s.as_deref().map(parse_ts)
}

pub(crate) fn parse_list(s: &str) -> Vec<String> {
    serde_json::from_str(s).unwrap_or_else(|e| {
        warn!("Corrupt JSON list '{}': {}", s, e);
        vec![]
    })
}

pub(crate) fn parse_items(s: &str) -> Vec<SummaryItem> {
    serde_json::from_str(s).unwrap_or_else(|e| {
        warn!("Corrupt summary item list '{}': {}", s, e);
        vec![]
    })
}

pub(crate) fn user_response(user: &UserRow) -> UserResponse {
    UserResponse {
        id: user.id.clone(),
        email: user.email.clone(),
        username: user.username.clone(),
        role: Role::parse(&user.role).unwrap_or_else(|| {
            warn!("Corrupt role '{}' on user '{}'", user.role, user.id);
            Role::Developer
        }),
        avatar_url: user.avatar_url.clone(),
        location: user.location.clone(),
    }
}

pub(crate) fn pitch_response(pitch: &PitchRow, developer: &UserRow) -> PitchResponse {
    PitchResponse {
        id: pitch.id.clone(),
        developer: user_response(developer),
        title: pitch.title.clone(),
        description: pitch.description.clone(),
        tags: parse_list(&pitch.tags),
        funding_stage: pitch.funding_stage.clone(),
        ask: pitch.ask.clone(),
        video_url: pitch.video_url.clone(),
        thumbnail_url: pitch.thumbnail_url.clone(),
        views: pitch.views,
        saves: pitch.saves,
        created_at: parse_ts(&pitch.created_at),
    }
}

pub(crate) fn post_response(post: &InvestorPostRow, investor: &UserRow) -> InvestorPostResponse {
    InvestorPostResponse {
        id: post.id.clone(),
        investor: user_response(investor),
        title: post.title.clone(),
        description: post.description.clone(),
        tags: parse_list(&post.tags),
        stages: parse_list(&post.stages),
        amount_range: post.amount_range.clone(),
        location: post.location.clone(),
        contact_preference: post.contact_preference.clone(),
        logo_url: post.logo_url.clone(),
        status: ModerationStatus::parse(&post.status).unwrap_or_else(|| {
            warn!("Corrupt status '{}' on post '{}'", post.status, post.id);
            ModerationStatus::Pending
        }),
        views: post.views,
        saved_count: post.saved_count,
        created_at: parse_ts(&post.created_at),
    }
}

pub(crate) fn request_response(
    req: &ContactRequestRow,
    developer: &UserRow,
    investor: &UserRow,
    pitch: Option<PitchResponse>,
    investor_post: Option<InvestorPostResponse>,
) -> ContactRequestResponse {
    ContactRequestResponse {
        id: req.id.clone(),
        developer: user_response(developer),
        investor: user_response(investor),
        pitch,
        investor_post,
        message: req.message.clone(),
        meeting_link: req.meeting_link.clone(),
        preference: ContactPreference::parse(&req.preference).unwrap_or_else(|| {
            warn!("Corrupt preference '{}' on request '{}'", req.preference, req.id);
            ContactPreference::Email
        }),
        viewed: req.viewed,
        created_at: parse_ts(&req.created_at),
        scheduled_start_time: parse_ts_opt(&req.scheduled_start_time),
        scheduled_end_time: parse_ts_opt(&req.scheduled_end_time),
        timezone: req.timezone.clone(),
        meeting_platform: MeetingPlatform::parse(&req.meeting_platform).unwrap_or_else(|| {
            warn!(
                "Corrupt platform '{}' on request '{}'",
                req.meeting_platform, req.id
            );
            MeetingPlatform::Other
        }),
        agenda: req.agenda.clone(),
        meeting_status: MeetingStatus::parse(&req.meeting_status).unwrap_or_else(|| {
            warn!(
                "Corrupt meeting status '{}' on request '{}'",
                req.meeting_status, req.id
            );
            MeetingStatus::Scheduled
        }),
        meeting_summary: req.meeting_summary.clone(),
        meeting_started_at: parse_ts_opt(&req.meeting_started_at),
        meeting_ended_at: parse_ts_opt(&req.meeting_ended_at),
    }
}

pub(crate) fn summary_response(row: &MeetingSummaryRow) -> StructuredSummaryResponse {
    StructuredSummaryResponse {
        id: row.id.clone(),
        contact_request: row.contact_request_id.clone(),
        discussion_points: parse_items(&row.discussion_points),
        action_items: parse_items(&row.action_items),
        decisions_made: parse_items(&row.decisions_made),
        next_steps: row.next_steps.clone(),
        needs_followup: row.needs_followup,
        followup_date: parse_ts_opt(&row.followup_date),
        additional_notes: row.additional_notes.clone(),
        created_at: parse_ts(&row.created_at),
        updated_at: parse_ts(&row.updated_at),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrupt_text_falls_back_instead_of_panicking() {
        assert_eq!(parse_list("not json"), Vec::<String>::new());
        assert_eq!(parse_list("[\"a\",\"b\"]"), vec!["a", "b"]);
        assert_eq!(parse_ts("garbage"), DateTime::<Utc>::default());

        let ts = Utc::now();
        assert_eq!(parse_ts(&ts.to_rfc3339()), ts);
    }
}
