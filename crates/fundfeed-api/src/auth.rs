use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use fundfeed_db::models::UserRow;
use fundfeed_types::api::{
    AuthResponse, Claims, LoginRequest, RefreshRequest, RefreshResponse, RegisterRequest,
    TokenPair,
};
use fundfeed_types::models::Role;

use crate::AppState;
use crate::error::ApiError;
use crate::responses::user_response;

/// Access tokens last a day, refresh tokens a week.
const ACCESS_TOKEN_DAYS: i64 = 1;
const REFRESH_TOKEN_DAYS: i64 = 7;

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.email.is_empty() || !req.email.contains('@') {
        return Err(ApiError::validation("email", "a valid email is required"));
    }
    if req.password.len() < 8 {
        return Err(ApiError::validation(
            "password",
            "password must be at least 8 characters",
        ));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
        .to_string();

    let user = UserRow {
        id: Uuid::new_v4().to_string(),
        email: req.email,
        username: req.username,
        password: password_hash,
        role: req.role.as_str().to_string(),
        status: "pending".to_string(),
        avatar_url: None,
        location: None,
        created_at: Utc::now().to_rfc3339(),
    };

    // Run blocking DB insert off the async runtime
    let db = state.clone();
    let row = user.clone();
    let result = tokio::task::spawn_blocking(move || db.db.create_user_with_profile(&row))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))?;

    if let Err(e) = result {
        if fundfeed_db::is_unique_violation(&e) {
            return Err(ApiError::Conflict("email already registered".into()));
        }
        return Err(e.into());
    }

    let tokens = issue_token_pair(&state.jwt_secret, &user.id, req.role)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: user_response(&user),
            tokens,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let email = req.email.clone();
    let user = tokio::task::spawn_blocking(move || db.db.get_user_by_email(&email))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??
        .ok_or_else(|| ApiError::Unauthorized("invalid email or password".into()))?;

    // Verify password
    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| anyhow::anyhow!("stored password hash is corrupt: {}", e))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized("invalid email or password".into()))?;

    let role = Role::parse(&user.role)
        .ok_or_else(|| anyhow::anyhow!("unknown role '{}' on user {}", user.role, user.id))?;
    let tokens = issue_token_pair(&state.jwt_secret, &user.id, role)?;

    Ok(Json(AuthResponse {
        user: user_response(&user),
        tokens,
    }))
}

/// Exchange a refresh token for a fresh access token.
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut validation = Validation::default();
    validation.set_audience(&["refresh"]);

    let token_data = decode::<Claims>(
        &req.refresh,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &validation,
    )
    .map_err(|_| ApiError::Unauthorized("invalid or expired refresh token".into()))?;

    let claims = token_data.claims;

    // The account must still exist for the refresh to succeed.
    let db = state.clone();
    let user_id = claims.sub.clone();
    let user = tokio::task::spawn_blocking(move || db.db.get_user_by_id(&user_id))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??
        .ok_or_else(|| ApiError::Unauthorized("account no longer exists".into()))?;

    let access = create_token(
        &state.jwt_secret,
        &user.id,
        claims.role,
        "access",
        ACCESS_TOKEN_DAYS,
    )?;

    Ok(Json(RefreshResponse { access }))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let user_id = claims.sub.clone();
    let user = tokio::task::spawn_blocking(move || db.db.get_user_by_id(&user_id))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;

    Ok(Json(user_response(&user)))
}

fn issue_token_pair(secret: &str, user_id: &str, role: Role) -> Result<TokenPair, ApiError> {
    Ok(TokenPair {
        access: create_token(secret, user_id, role, "access", ACCESS_TOKEN_DAYS)?,
        refresh: create_token(secret, user_id, role, "refresh", REFRESH_TOKEN_DAYS)?,
    })
}

fn create_token(
    secret: &str,
    user_id: &str,
    role: Role,
    aud: &str,
    days: i64,
) -> Result<String, ApiError> {
    let claims = Claims {
        sub: user_id.to_string(),
        role,
        aud: aud.to_string(),
        exp: (Utc::now() + chrono::Duration::days(days)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| anyhow::anyhow!("token encoding failed: {}", e))?;

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_and_refresh_audiences_are_disjoint() {
        let secret = "test-secret";
        let access = create_token(secret, "u1", Role::Developer, "access", 1).unwrap();
        let refresh = create_token(secret, "u1", Role::Investor, "refresh", 7).unwrap();

        let mut want_access = Validation::default();
        want_access.set_audience(&["access"]);
        let key = DecodingKey::from_secret(secret.as_bytes());

        assert!(decode::<Claims>(&access, &key, &want_access).is_ok());
        assert!(decode::<Claims>(&refresh, &key, &want_access).is_err());

        let mut want_refresh = Validation::default();
        want_refresh.set_audience(&["refresh"]);
        let claims = decode::<Claims>(&refresh, &key, &want_refresh)
            .unwrap()
            .claims;
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.role, Role::Investor);
    }
}
