use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

use fundfeed_db::models::{DeveloperProfileRow, InvestorProfileRow};
use fundfeed_types::api::{
    AvatarResponse, Claims, DeveloperProfileBody, DeveloperProfileUpdate, InvestorProfileBody,
    InvestorProfileUpdate, ProfilePayload, ProfileUpdateResponse, PublicProfileResponse,
};
use fundfeed_types::models::Role;

use crate::AppState;
use crate::error::ApiError;
use crate::responses::{parse_list, user_response};

fn developer_payload(row: &DeveloperProfileRow) -> ProfilePayload {
    ProfilePayload::Developer(DeveloperProfileBody {
        title: row.title.clone(),
        bio: row.bio.clone(),
        skills: parse_list(&row.skills),
        github: row.github.clone(),
        linkedin: row.linkedin.clone(),
        portfolio: row.portfolio.clone(),
    })
}

fn investor_payload(row: &InvestorProfileRow) -> ProfilePayload {
    ProfilePayload::Investor(InvestorProfileBody {
        firm: row.firm.clone(),
        investor_type: row.investor_type.clone(),
        contact_preference: row.contact_preference.clone(),
        stages: parse_list(&row.stages),
        sectors: parse_list(&row.sectors),
        linkedin: row.linkedin.clone(),
        website: row.website.clone(),
    })
}

/// GET /profile/{user_id} — public; the profile shape follows the
/// user's role.
pub async fn public_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let id = user_id.clone();
    let (user, profile) = tokio::task::spawn_blocking(move || {
        let Some(user) = db.db.get_user_by_id(&id)? else {
            return Ok((None, None));
        };
        let profile = if user.role == "developer" {
            db.db.get_developer_profile(&user.id)?.map(|p| developer_payload(&p))
        } else {
            db.db.get_investor_profile(&user.id)?.map(|p| investor_payload(&p))
        };
        Ok::<_, anyhow::Error>((Some(user), profile))
    })
    .await
    .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??;

    let user = user.ok_or_else(|| ApiError::NotFound("user not found".into()))?;

    Ok(Json(PublicProfileResponse {
        user: user_response(&user),
        profile,
    }))
}

/// The role-shaped partial update, parsed up front so malformed bodies
/// come back as field errors rather than 500s.
enum ProfileUpdate {
    Developer(DeveloperProfileUpdate),
    Investor(InvestorProfileUpdate),
}

/// PATCH /profile/update — partial update of the caller's role-matching
/// profile. The row is created lazily when registration predates it.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(body): Json<serde_json::Value>,
) -> Result<impl IntoResponse, ApiError> {
    let update = match claims.role {
        Role::Developer => ProfileUpdate::Developer(
            serde_json::from_value(body)
                .map_err(|e| ApiError::validation("profile", format!("invalid profile payload: {}", e)))?,
        ),
        Role::Investor => ProfileUpdate::Investor(
            serde_json::from_value(body)
                .map_err(|e| ApiError::validation("profile", format!("invalid profile payload: {}", e)))?,
        ),
    };

    let db = state.clone();
    let user_id = claims.sub.clone();

    let (profile, avatar_url) = tokio::task::spawn_blocking(move || {
        let user = db
            .db
            .get_user_by_id(&user_id)?
            .ok_or_else(|| anyhow::anyhow!("authenticated user {} missing", user_id))?;

        let payload = match update {
            ProfileUpdate::Developer(update) => {
                let mut row = db
                    .db
                    .get_developer_profile(&user_id)?
                    .unwrap_or_else(|| DeveloperProfileRow {
                        user_id: user_id.clone(),
                        title: String::new(),
                        bio: String::new(),
                        skills: "[]".to_string(),
                        github: None,
                        linkedin: None,
                        portfolio: None,
                    });
                if let Some(title) = update.title {
                    row.title = title;
                }
                if let Some(bio) = update.bio {
                    row.bio = bio;
                }
                if let Some(skills) = update.skills {
                    row.skills = serde_json::to_string(&skills)?;
                }
                if let Some(github) = update.github {
                    row.github = Some(github);
                }
                if let Some(linkedin) = update.linkedin {
                    row.linkedin = Some(linkedin);
                }
                if let Some(portfolio) = update.portfolio {
                    row.portfolio = Some(portfolio);
                }
                db.db.upsert_developer_profile(&row)?;
                developer_payload(&row)
            }
            ProfileUpdate::Investor(update) => {
                let mut row = db
                    .db
                    .get_investor_profile(&user_id)?
                    .unwrap_or_else(|| InvestorProfileRow {
                        user_id: user_id.clone(),
                        firm: String::new(),
                        investor_type: String::new(),
                        contact_preference: "email".to_string(),
                        stages: "[]".to_string(),
                        sectors: "[]".to_string(),
                        linkedin: None,
                        website: None,
                    });
                if let Some(firm) = update.firm {
                    row.firm = firm;
                }
                if let Some(investor_type) = update.investor_type {
                    row.investor_type = investor_type;
                }
                if let Some(contact_preference) = update.contact_preference {
                    row.contact_preference = contact_preference;
                }
                if let Some(stages) = update.stages {
                    row.stages = serde_json::to_string(&stages)?;
                }
                if let Some(sectors) = update.sectors {
                    row.sectors = serde_json::to_string(&sectors)?;
                }
                if let Some(linkedin) = update.linkedin {
                    row.linkedin = Some(linkedin);
                }
                if let Some(website) = update.website {
                    row.website = Some(website);
                }
                db.db.upsert_investor_profile(&row)?;
                investor_payload(&row)
            }
        };

        Ok::<_, anyhow::Error>((payload, user.avatar_url))
    })
    .await
    .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??;

    Ok(Json(ProfileUpdateResponse {
        profile,
        avatar_url,
    }))
}

/// 5 MB is plenty for an avatar image.
const MAX_AVATAR_SIZE: usize = 5 * 1024 * 1024;

/// POST /profile/avatar — raw image bytes in, public URL out.
pub async fn upload_avatar(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    bytes: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    if bytes.is_empty() {
        return Err(ApiError::validation("avatar", "avatar upload is empty"));
    }
    if bytes.len() > MAX_AVATAR_SIZE {
        return Err(ApiError::BadRequest("avatar exceeds 5 MB limit".into()));
    }

    let name = format!("{}-{}", claims.sub, Uuid::new_v4());
    let url = state
        .media
        .save("avatars", &name, &bytes)
        .await
        .map_err(ApiError::Internal)?;

    let db = state.clone();
    let user_id = claims.sub.clone();
    let stored_url = url.clone();
    let updated = tokio::task::spawn_blocking(move || db.db.set_avatar_url(&user_id, &stored_url))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??;

    if !updated {
        return Err(ApiError::NotFound("user not found".into()));
    }

    Ok(Json(AvatarResponse { avatar_url: url }))
}
