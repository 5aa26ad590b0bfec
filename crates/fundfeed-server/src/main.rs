mod config;

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, patch, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use fundfeed_api::media::{MAX_MEDIA_SIZE, MediaStore};
use fundfeed_api::middleware::require_auth;
use fundfeed_api::notify::Mailer;
use fundfeed_api::{AppState, AppStateInner, auth, media, meetings, pitches, posts, profiles, requests};

use crate::config::{Config, DEV_JWT_SECRET};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fundfeed=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;
    if config.jwt_secret == DEV_JWT_SECRET {
        warn!("FUNDFEED_JWT_SECRET is unset; using the development placeholder");
    }

    // Init database and media storage
    let db = fundfeed_db::Database::open(&config.db_path)?;
    let media_store = MediaStore::new(config.media_dir.clone()).await?;

    let mailer = match &config.smtp {
        Some(smtp) => {
            info!("SMTP relay configured: {}", smtp.host);
            Some(Mailer::new(&smtp.host, &smtp.username, &smtp.password, &smtp.from)?)
        }
        None => {
            info!("SMTP not configured; contact request emails are disabled");
            None
        }
    };

    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret: config.jwt_secret.clone(),
        media: media_store,
        mailer,
    });

    // Routes
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/profile/{user_id}", get(profiles::public_profile))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/profile/update", patch(profiles::update_profile))
        .route("/profile/avatar", post(profiles::upload_avatar))
        .route("/uploads", post(media::upload_media))
        // Pitches
        .route("/pitches", get(pitches::list_pitches).post(pitches::create_pitch))
        .route("/pitches/saved", get(pitches::saved_pitches))
        .route(
            "/pitches/{id}",
            get(pitches::get_pitch)
                .patch(pitches::update_pitch)
                .delete(pitches::delete_pitch),
        )
        .route("/pitches/{id}/add_view", post(pitches::add_view))
        .route("/pitches/{id}/save", post(pitches::save_pitch))
        .route("/pitches/{id}/unsave", delete(pitches::unsave_pitch))
        // Investor posts
        .route("/investor-posts", get(posts::list_posts).post(posts::create_post))
        .route("/investor-posts/saved", get(posts::saved_posts))
        .route(
            "/investor-posts/{id}",
            get(posts::get_post)
                .patch(posts::update_post)
                .delete(posts::delete_post),
        )
        .route("/investor-posts/{id}/add_view", post(posts::add_view))
        .route("/investor-posts/{id}/save", post(posts::save_post))
        .route("/investor-posts/{id}/unsave", delete(posts::unsave_post))
        // Contact requests & meetings
        .route("/requests", get(requests::list_requests).post(requests::create_request))
        .route(
            "/requests/{id}",
            get(requests::get_request)
                .patch(requests::update_request)
                .delete(requests::delete_request),
        )
        .route("/requests/{id}/mark_viewed", post(requests::mark_viewed))
        .route("/requests/{id}/start_meeting", post(meetings::start_meeting))
        .route("/requests/{id}/end_meeting", post(meetings::end_meeting))
        .route("/requests/{id}/generate_summary", post(meetings::generate_summary))
        .route(
            "/requests/{id}/structured_summary",
            put(meetings::put_structured_summary).get(meetings::get_structured_summary),
        )
        .route(
            "/requests/{id}/download_summary_pdf",
            get(meetings::download_summary_pdf),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state.clone());

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .nest_service("/media", ServeDir::new(state.media.root()))
        .layer(DefaultBodyLimit::max(MAX_MEDIA_SIZE))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    info!("FundFeed server listening on {}", config.http_addr);

    let listener = tokio::net::TcpListener::bind(config.http_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
