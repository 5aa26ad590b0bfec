//! End-to-end flows through the actual handlers: accounts, listings,
//! bookmarks, contact requests and the meeting lifecycle.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use chrono::Utc;

use fundfeed_api::media::MediaStore;
use fundfeed_api::{AppState, AppStateInner, auth, meetings, pitches, posts, requests};
use fundfeed_types::api::{Claims, RegisterRequest};
use fundfeed_types::models::Role;

async fn test_state() -> AppState {
    let media_dir = std::env::temp_dir().join(format!("fundfeed-test-{}", uuid::Uuid::new_v4()));
    Arc::new(AppStateInner {
        db: fundfeed_db::Database::open_in_memory().unwrap(),
        jwt_secret: "test-secret".to_string(),
        media: MediaStore::new(media_dir).await.unwrap(),
        mailer: None,
    })
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
}

/// Register through the handler and hand back ready-to-use claims.
async fn register(state: &AppState, email: &str, role: Role) -> Claims {
    let response = auth::register(
        State(state.clone()),
        Json(RegisterRequest {
            email: email.to_string(),
            username: email.split('@').next().unwrap().to_string(),
            password: "pw123456".to_string(),
            role,
        }),
    )
    .await
    .into_response();
    assert_eq!(response.status().as_u16(), 201);

    let body = body_json(response).await;
    Claims {
        sub: body["user"]["id"].as_str().unwrap().to_string(),
        role,
        aud: "access".to_string(),
        exp: (Utc::now().timestamp() + 3600) as usize,
    }
}

async fn create_pitch(state: &AppState, dev: &Claims, title: &str) -> String {
    let response = pitches::create_pitch(
        State(state.clone()),
        Extension(dev.clone()),
        Json(serde_json::from_value(serde_json::json!({
            "title": title,
            "description": "A pitch worth funding",
            "tags": ["fintech"],
            "funding_stage": "seed",
            "ask": "$250k"
        }))
        .unwrap()),
    )
    .await
    .into_response();
    assert_eq!(response.status().as_u16(), 201);
    body_json(response).await["id"].as_str().unwrap().to_string()
}

fn no_query() -> Query<requests::RequestQuery> {
    Query(requests::RequestQuery { box_: None })
}

#[tokio::test]
async fn save_unsave_scenario_keeps_counts_honest() {
    let state = test_state().await;
    let dev = register(&state, "dev@x.com", Role::Developer).await;
    let inv = register(&state, "inv@x.com", Role::Investor).await;
    let pitch_id = create_pitch(&state, &dev, "Foo").await;

    // Investors cannot create pitches.
    let response = pitches::create_pitch(
        State(state.clone()),
        Extension(inv.clone()),
        Json(serde_json::from_value(serde_json::json!({
            "title": "Nope",
            "description": "wrong role"
        }))
        .unwrap()),
    )
    .await
    .into_response();
    assert_eq!(response.status().as_u16(), 403);

    // Save twice: 201 then the idempotent 200.
    let response = pitches::save_pitch(
        State(state.clone()),
        Path(pitch_id.clone()),
        Extension(inv.clone()),
    )
    .await
    .into_response();
    assert_eq!(response.status().as_u16(), 201);

    let response = pitches::save_pitch(
        State(state.clone()),
        Path(pitch_id.clone()),
        Extension(inv.clone()),
    )
    .await
    .into_response();
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(body_json(response).await["detail"], "Already saved");

    let response = pitches::saved_pitches(State(state.clone()), Extension(inv.clone()))
        .await
        .into_response();
    let saved = body_json(response).await;
    assert_eq!(saved.as_array().unwrap().len(), 1);
    assert_eq!(saved[0]["pitch"]["title"], "Foo");
    assert_eq!(saved[0]["pitch"]["saves"], 1);

    // Unsave, then unsave again: both succeed, second is a no-op.
    for expected_detail in ["Removed", "Not saved"] {
        let response = pitches::unsave_pitch(
            State(state.clone()),
            Path(pitch_id.clone()),
            Extension(inv.clone()),
        )
        .await
        .into_response();
        assert_eq!(response.status().as_u16(), 200);
        assert_eq!(body_json(response).await["detail"], expected_detail);
    }

    let response = pitches::saved_pitches(State(state.clone()), Extension(inv.clone()))
        .await
        .into_response();
    assert!(body_json(response).await.as_array().unwrap().is_empty());

    let response = pitches::get_pitch(
        State(state.clone()),
        Path(pitch_id.clone()),
        Extension(inv.clone()),
    )
    .await
    .into_response();
    assert_eq!(body_json(response).await["saves"], 0);
}

#[tokio::test]
async fn post_saved_count_survives_duplicate_saves() {
    let state = test_state().await;
    let dev = register(&state, "dev@x.com", Role::Developer).await;
    let inv = register(&state, "inv@x.com", Role::Investor).await;

    let response = posts::create_post(
        State(state.clone()),
        Extension(inv.clone()),
        Json(serde_json::from_value(serde_json::json!({
            "title": "Pre-seed SaaS",
            "description": "Thesis",
            "stages": ["pre-seed"]
        }))
        .unwrap()),
    )
    .await
    .into_response();
    assert_eq!(response.status().as_u16(), 201);
    let post_id = body_json(response).await["id"].as_str().unwrap().to_string();

    for expected_status in [201, 200] {
        let response = posts::save_post(
            State(state.clone()),
            Path(post_id.clone()),
            Extension(dev.clone()),
        )
        .await
        .into_response();
        assert_eq!(response.status().as_u16(), expected_status);
    }

    let response = posts::get_post(
        State(state.clone()),
        Path(post_id.clone()),
        Extension(dev.clone()),
    )
    .await
    .into_response();
    assert_eq!(body_json(response).await["saved_count"], 1);

    let response = posts::unsave_post(
        State(state.clone()),
        Path(post_id.clone()),
        Extension(dev.clone()),
    )
    .await
    .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    let response = posts::get_post(
        State(state.clone()),
        Path(post_id),
        Extension(dev.clone()),
    )
    .await
    .into_response();
    assert_eq!(body_json(response).await["saved_count"], 0);
}

#[tokio::test]
async fn contact_request_inbox_and_meeting_lifecycle() {
    let state = test_state().await;
    let dev = register(&state, "dev@x.com", Role::Developer).await;
    let inv = register(&state, "inv@x.com", Role::Investor).await;
    let outsider = register(&state, "other@x.com", Role::Investor).await;
    let pitch_id = create_pitch(&state, &dev, "Foo").await;

    // Neither/both listing refs are rejected.
    let response = requests::create_request(
        State(state.clone()),
        Extension(inv.clone()),
        Json(serde_json::from_value(serde_json::json!({ "message": "hi" })).unwrap()),
    )
    .await
    .into_response();
    assert_eq!(response.status().as_u16(), 400);

    // Investor contacts the developer about the pitch.
    let response = requests::create_request(
        State(state.clone()),
        Extension(inv.clone()),
        Json(serde_json::from_value(serde_json::json!({
            "pitch": pitch_id,
            "message": "Let's meet",
            "meeting_link": "https://meet.example/xyz"
        }))
        .unwrap()),
    )
    .await
    .into_response();
    assert_eq!(response.status().as_u16(), 201);
    let request_id = body_json(response).await["id"].as_str().unwrap().to_string();

    // Developer's inbox has it unviewed; investor's inbox does not.
    let response = requests::list_requests(State(state.clone()), no_query(), Extension(dev.clone()))
        .await
        .into_response();
    let inbox = body_json(response).await;
    assert_eq!(inbox.as_array().unwrap().len(), 1);
    assert_eq!(inbox[0]["viewed"], false);
    assert_eq!(inbox[0]["pitch"]["title"], "Foo");

    let response = requests::list_requests(State(state.clone()), no_query(), Extension(inv.clone()))
        .await
        .into_response();
    assert!(body_json(response).await.as_array().unwrap().is_empty());

    let response = requests::list_requests(
        State(state.clone()),
        Query(requests::RequestQuery {
            box_: Some("sent".to_string()),
        }),
        Extension(inv.clone()),
    )
    .await
    .into_response();
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);

    // Outsiders cannot touch it.
    let response = requests::mark_viewed(
        State(state.clone()),
        Path(request_id.clone()),
        Extension(outsider.clone()),
    )
    .await
    .into_response();
    assert_eq!(response.status().as_u16(), 403);

    let response = requests::mark_viewed(
        State(state.clone()),
        Path(request_id.clone()),
        Extension(dev.clone()),
    )
    .await
    .into_response();
    assert_eq!(response.status().as_u16(), 200);

    let response = requests::list_requests(State(state.clone()), no_query(), Extension(dev.clone()))
        .await
        .into_response();
    assert_eq!(body_json(response).await[0]["viewed"], true);

    // Lifecycle: end before start is a precondition failure.
    let response = meetings::end_meeting(
        State(state.clone()),
        Path(request_id.clone()),
        Extension(dev.clone()),
    )
    .await
    .into_response();
    assert_eq!(response.status().as_u16(), 400);

    let response = meetings::start_meeting(
        State(state.clone()),
        Path(request_id.clone()),
        Extension(dev.clone()),
    )
    .await
    .into_response();
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(body_json(response).await["meeting_status"], "in_progress");

    // A second start hits the guard.
    let response = meetings::start_meeting(
        State(state.clone()),
        Path(request_id.clone()),
        Extension(inv.clone()),
    )
    .await
    .into_response();
    assert_eq!(response.status().as_u16(), 400);

    // Summary before completion is rejected.
    let response = meetings::generate_summary(
        State(state.clone()),
        Path(request_id.clone()),
        Extension(dev.clone()),
        Json(Default::default()),
    )
    .await
    .into_response();
    assert_eq!(response.status().as_u16(), 400);

    let response = meetings::end_meeting(
        State(state.clone()),
        Path(request_id.clone()),
        Extension(inv.clone()),
    )
    .await
    .into_response();
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(body_json(response).await["meeting_status"], "completed");

    // No caller text: the template mentions both parties and the pitch.
    let response = meetings::generate_summary(
        State(state.clone()),
        Path(request_id.clone()),
        Extension(dev.clone()),
        Json(Default::default()),
    )
    .await
    .into_response();
    assert_eq!(response.status().as_u16(), 200);
    let summary = body_json(response).await["meeting_summary"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(summary.contains("\"Foo\""));
    assert!(summary.contains("dev"));

    // PDF export is a real PDF attachment.
    let response = meetings::download_summary_pdf(
        State(state.clone()),
        Path(request_id.clone()),
        Extension(inv.clone()),
    )
    .await
    .into_response();
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/pdf"
    );
    let disposition = response
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment;"));
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn start_meeting_respects_the_scheduled_window() {
    let state = test_state().await;
    let dev = register(&state, "dev@x.com", Role::Developer).await;
    let inv = register(&state, "inv@x.com", Role::Investor).await;
    let pitch_id = create_pitch(&state, &dev, "Foo").await;

    let start = (Utc::now() + chrono::Duration::hours(1)).to_rfc3339();
    let response = requests::create_request(
        State(state.clone()),
        Extension(inv.clone()),
        Json(serde_json::from_value(serde_json::json!({
            "pitch": pitch_id,
            "message": "Later today",
            "meeting_link": "https://meet.example/xyz",
            "scheduled_start_time": start
        }))
        .unwrap()),
    )
    .await
    .into_response();
    assert_eq!(response.status().as_u16(), 201);
    let request_id = body_json(response).await["id"].as_str().unwrap().to_string();

    let response = meetings::start_meeting(
        State(state.clone()),
        Path(request_id.clone()),
        Extension(dev.clone()),
    )
    .await
    .into_response();
    assert_eq!(response.status().as_u16(), 400);
    let body = body_json(response).await;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("before its scheduled start"));
}
