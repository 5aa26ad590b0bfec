use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ContactPreference, MeetingPlatform, MeetingStatus, ModerationStatus, Role};

// -- JWT Claims --

/// JWT claims shared between token issuance (fundfeed-api auth handlers)
/// and request authentication (middleware). Canonical definition lives
/// here in fundfeed-types to eliminate duplication.
///
/// `aud` is `"access"` or `"refresh"`; the auth middleware only accepts
/// access tokens, the refresh endpoint only accepts refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub aud: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    #[serde(default)]
    pub username: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub tokens: TokenPair,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access: String,
}

// -- Users & profiles --

#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub username: String,
    pub role: Role,
    pub avatar_url: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeveloperProfileBody {
    pub title: String,
    pub bio: String,
    pub skills: Vec<String>,
    pub github: Option<String>,
    pub linkedin: Option<String>,
    pub portfolio: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestorProfileBody {
    pub firm: String,
    pub investor_type: String,
    pub contact_preference: String,
    pub stages: Vec<String>,
    pub sectors: Vec<String>,
    pub linkedin: Option<String>,
    pub website: Option<String>,
}

/// Role-shaped public profile payload. An explicit variant per role
/// rather than a single struct with a pile of nullable fields.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ProfilePayload {
    Developer(DeveloperProfileBody),
    Investor(InvestorProfileBody),
}

#[derive(Debug, Serialize)]
pub struct PublicProfileResponse {
    pub user: UserResponse,
    pub profile: Option<ProfilePayload>,
}

/// Partial update for a developer profile. Absent fields keep their
/// stored value.
#[derive(Debug, Default, Deserialize)]
pub struct DeveloperProfileUpdate {
    pub title: Option<String>,
    pub bio: Option<String>,
    pub skills: Option<Vec<String>>,
    pub github: Option<String>,
    pub linkedin: Option<String>,
    pub portfolio: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct InvestorProfileUpdate {
    pub firm: Option<String>,
    pub investor_type: Option<String>,
    pub contact_preference: Option<String>,
    pub stages: Option<Vec<String>>,
    pub sectors: Option<Vec<String>>,
    pub linkedin: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProfileUpdateResponse {
    pub profile: ProfilePayload,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AvatarResponse {
    pub avatar_url: String,
}

// -- Pitches --

#[derive(Debug, Clone, Serialize)]
pub struct PitchResponse {
    pub id: String,
    pub developer: UserResponse,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub funding_stage: String,
    pub ask: String,
    pub video_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub views: i64,
    pub saves: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePitchRequest {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub funding_stage: String,
    #[serde(default)]
    pub ask: String,
    pub video_url: Option<String>,
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePitchRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub funding_stage: Option<String>,
    pub ask: Option<String>,
    pub video_url: Option<String>,
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SavedPitchResponse {
    pub id: String,
    pub investor: String,
    pub pitch: PitchResponse,
    pub saved_at: DateTime<Utc>,
}

// -- Investor posts --

#[derive(Debug, Clone, Serialize)]
pub struct InvestorPostResponse {
    pub id: String,
    pub investor: UserResponse,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub stages: Vec<String>,
    pub amount_range: String,
    pub location: String,
    pub contact_preference: String,
    pub logo_url: Option<String>,
    pub status: ModerationStatus,
    pub views: i64,
    pub saved_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateInvestorPostRequest {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub stages: Vec<String>,
    #[serde(default)]
    pub amount_range: String,
    #[serde(default)]
    pub location: String,
    #[serde(default = "default_contact_preference")]
    pub contact_preference: String,
    pub logo_url: Option<String>,
}

fn default_contact_preference() -> String {
    "email".to_string()
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateInvestorPostRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub stages: Option<Vec<String>>,
    pub amount_range: Option<String>,
    pub location: Option<String>,
    pub contact_preference: Option<String>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SavedInvestorPostResponse {
    pub id: String,
    pub developer: String,
    pub post: InvestorPostResponse,
    pub saved_at: DateTime<Utc>,
}

// -- Contact requests --

#[derive(Debug, Serialize)]
pub struct ContactRequestResponse {
    pub id: String,
    pub developer: UserResponse,
    pub investor: UserResponse,
    pub pitch: Option<PitchResponse>,
    pub investor_post: Option<InvestorPostResponse>,
    pub message: String,
    pub meeting_link: Option<String>,
    pub preference: ContactPreference,
    pub viewed: bool,
    pub created_at: DateTime<Utc>,
    pub scheduled_start_time: Option<DateTime<Utc>>,
    pub scheduled_end_time: Option<DateTime<Utc>>,
    pub timezone: String,
    pub meeting_platform: MeetingPlatform,
    pub agenda: Option<String>,
    pub meeting_status: MeetingStatus,
    pub meeting_summary: Option<String>,
    pub meeting_started_at: Option<DateTime<Utc>>,
    pub meeting_ended_at: Option<DateTime<Utc>>,
}

/// Creation payload. Exactly one of `pitch` / `investor_post` must be
/// set; the server derives sender and receiver from it.
#[derive(Debug, Deserialize)]
pub struct CreateContactRequest {
    pub pitch: Option<String>,
    pub investor_post: Option<String>,
    pub message: String,
    pub meeting_link: Option<String>,
    #[serde(default)]
    pub preference: Option<ContactPreference>,
    pub scheduled_start_time: Option<DateTime<Utc>>,
    pub scheduled_end_time: Option<DateTime<Utc>>,
    pub timezone: Option<String>,
    pub meeting_platform: Option<MeetingPlatform>,
    pub agenda: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateContactRequest {
    pub message: Option<String>,
    pub meeting_link: Option<String>,
    pub preference: Option<ContactPreference>,
    pub scheduled_start_time: Option<DateTime<Utc>>,
    pub scheduled_end_time: Option<DateTime<Utc>>,
    pub timezone: Option<String>,
    pub meeting_platform: Option<MeetingPlatform>,
    pub agenda: Option<String>,
    /// Only used to cancel a meeting; the guarded transition endpoints
    /// own every other state change.
    pub meeting_status: Option<MeetingStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateSummaryRequest {
    pub summary: Option<String>,
}

// -- Structured meeting summaries --

/// One entry in a structured summary list. `assignee` and `due_date`
/// are only meaningful for action items but accepted everywhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryItem {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct StructuredSummaryRequest {
    #[serde(default)]
    pub discussion_points: Vec<SummaryItem>,
    #[serde(default)]
    pub action_items: Vec<SummaryItem>,
    #[serde(default)]
    pub decisions_made: Vec<SummaryItem>,
    pub next_steps: Option<String>,
    #[serde(default)]
    pub needs_followup: bool,
    pub followup_date: Option<DateTime<Utc>>,
    pub additional_notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StructuredSummaryResponse {
    pub id: String,
    pub contact_request: String,
    pub discussion_points: Vec<SummaryItem>,
    pub action_items: Vec<SummaryItem>,
    pub decisions_made: Vec<SummaryItem>,
    pub next_steps: Option<String>,
    pub needs_followup: bool,
    pub followup_date: Option<DateTime<Utc>>,
    pub additional_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
