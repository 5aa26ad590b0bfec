use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Validation { field: String, message: String },

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation { .. } | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = match &self {
            ApiError::Validation { field, message } => serde_json::json!({
                "error": message,
                "field": field,
            }),
            ApiError::Internal(e) => {
                error!("internal error: {:#}", e);
                serde_json::json!({ "error": "internal server error" })
            }
            other => serde_json::json!({ "error": other.to_string() }),
        };

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_taxonomy() {
        let cases = [
            (ApiError::validation("email", "email is required").into_response(), 400),
            (ApiError::BadRequest("meeting is not in progress".into()).into_response(), 400),
            (ApiError::Unauthorized("invalid token".into()).into_response(), 401),
            (ApiError::Forbidden("not a participant".into()).into_response(), 403),
            (ApiError::NotFound("pitch not found".into()).into_response(), 404),
            (ApiError::Conflict("email already registered".into()).into_response(), 409),
            (ApiError::Internal(anyhow::anyhow!("boom")).into_response(), 500),
        ];
        for (response, expected) in cases {
            assert_eq!(response.status().as_u16(), expected);
        }
    }
}
