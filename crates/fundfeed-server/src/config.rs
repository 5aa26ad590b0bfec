//! Server configuration loaded from environment variables.
//!
//! Everything except SMTP has a default so the server starts with zero
//! configuration for local development. SMTP is optional: without it
//! the notification side effect is disabled, not an error.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;

#[derive(Debug, Clone)]
pub struct Config {
    /// Socket address for the HTTP API server.
    /// Env: `FUNDFEED_HOST` / `FUNDFEED_PORT`
    /// Default: `0.0.0.0:3000`
    pub http_addr: SocketAddr,

    /// SQLite database file.
    /// Env: `FUNDFEED_DB_PATH`
    /// Default: `fundfeed.db`
    pub db_path: PathBuf,

    /// Directory for uploaded media (avatars, videos, logos), served
    /// under `/media/`.
    /// Env: `FUNDFEED_MEDIA_DIR`
    /// Default: `./media`
    pub media_dir: PathBuf,

    /// HMAC secret for access and refresh tokens.
    /// Env: `FUNDFEED_JWT_SECRET`
    /// Default: a development-only placeholder.
    pub jwt_secret: String,

    /// SMTP settings for outbound notification email; `None` when
    /// `FUNDFEED_SMTP_HOST` is unset.
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    /// Env: `FUNDFEED_SMTP_HOST`
    pub host: String,
    /// Env: `FUNDFEED_SMTP_USERNAME`
    pub username: String,
    /// Env: `FUNDFEED_SMTP_PASSWORD`
    pub password: String,
    /// Env: `FUNDFEED_FROM_EMAIL`
    /// Default: `FundFeed <no-reply@fundfeed.app>`
    pub from: String,
}

pub const DEV_JWT_SECRET: &str = "dev-secret-change-me";

impl Config {
    pub fn from_env() -> Result<Self> {
        let host = std::env::var("FUNDFEED_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = std::env::var("FUNDFEED_PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()?;
        let http_addr: SocketAddr = format!("{}:{}", host, port).parse()?;

        let db_path = std::env::var("FUNDFEED_DB_PATH")
            .unwrap_or_else(|_| "fundfeed.db".into())
            .into();
        let media_dir = std::env::var("FUNDFEED_MEDIA_DIR")
            .unwrap_or_else(|_| "./media".into())
            .into();
        let jwt_secret =
            std::env::var("FUNDFEED_JWT_SECRET").unwrap_or_else(|_| DEV_JWT_SECRET.into());

        let smtp = match std::env::var("FUNDFEED_SMTP_HOST") {
            Ok(host) if !host.is_empty() => Some(SmtpConfig {
                host,
                username: std::env::var("FUNDFEED_SMTP_USERNAME").unwrap_or_default(),
                password: std::env::var("FUNDFEED_SMTP_PASSWORD").unwrap_or_default(),
                from: std::env::var("FUNDFEED_FROM_EMAIL")
                    .unwrap_or_else(|_| "FundFeed <no-reply@fundfeed.app>".into()),
            }),
            _ => None,
        };

        Ok(Config {
            http_addr,
            db_path,
            media_dir,
            jwt_secret,
            smtp,
        })
    }
}
