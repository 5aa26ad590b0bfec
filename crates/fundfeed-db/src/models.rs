/// Database row types — these map directly to SQLite rows.
/// Distinct from the fundfeed-types API models to keep the DB layer
/// independent. List-valued columns (tags, skills, ...) hold JSON text;
/// timestamps hold RFC 3339 UTC text.

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub role: String,
    pub status: String,
    pub avatar_url: Option<String>,
    pub location: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct DeveloperProfileRow {
    pub user_id: String,
    pub title: String,
    pub bio: String,
    pub skills: String,
    pub github: Option<String>,
    pub linkedin: Option<String>,
    pub portfolio: Option<String>,
}

#[derive(Debug, Clone)]
pub struct InvestorProfileRow {
    pub user_id: String,
    pub firm: String,
    pub investor_type: String,
    pub contact_preference: String,
    pub stages: String,
    pub sectors: String,
    pub linkedin: Option<String>,
    pub website: Option<String>,
}

/// `saves` is not a column: list/get queries derive it by counting
/// saved_pitches rows, so it can never drift.
#[derive(Debug, Clone)]
pub struct PitchRow {
    pub id: String,
    pub developer_id: String,
    pub title: String,
    pub description: String,
    pub tags: String,
    pub funding_stage: String,
    pub ask: String,
    pub video_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub views: i64,
    pub saves: i64,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct SavedPitchRow {
    pub id: String,
    pub investor_id: String,
    pub pitch_id: String,
    pub saved_at: String,
}

#[derive(Debug, Clone)]
pub struct InvestorPostRow {
    pub id: String,
    pub investor_id: String,
    pub title: String,
    pub description: String,
    pub tags: String,
    pub stages: String,
    pub amount_range: String,
    pub location: String,
    pub contact_preference: String,
    pub logo_url: Option<String>,
    pub status: String,
    pub views: i64,
    pub saved_count: i64,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct SavedInvestorPostRow {
    pub id: String,
    pub developer_id: String,
    pub post_id: String,
    pub saved_at: String,
}

#[derive(Debug, Clone)]
pub struct ContactRequestRow {
    pub id: String,
    pub developer_id: String,
    pub investor_id: String,
    pub pitch_id: Option<String>,
    pub investor_post_id: Option<String>,
    pub message: String,
    pub meeting_link: Option<String>,
    pub preference: String,
    pub viewed: bool,
    pub created_at: String,
    pub scheduled_start_time: Option<String>,
    pub scheduled_end_time: Option<String>,
    pub timezone: String,
    pub meeting_platform: String,
    pub agenda: Option<String>,
    pub meeting_status: String,
    pub meeting_started_at: Option<String>,
    pub meeting_ended_at: Option<String>,
    pub meeting_summary: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MeetingSummaryRow {
    pub id: String,
    pub contact_request_id: String,
    pub discussion_points: String,
    pub action_items: String,
    pub decisions_made: String,
    pub next_steps: Option<String>,
    pub needs_followup: bool,
    pub followup_date: Option<String>,
    pub additional_notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}
