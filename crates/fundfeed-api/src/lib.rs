pub mod auth;
pub mod error;
pub mod media;
pub mod meetings;
pub mod middleware;
pub mod notify;
pub mod pdf;
pub mod pitches;
pub mod posts;
pub mod profiles;
pub mod requests;
pub mod responses;

use std::sync::Arc;

use fundfeed_db::Database;

use crate::media::MediaStore;
use crate::notify::Mailer;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub media: MediaStore,
    /// None when SMTP is unconfigured; notifications are then skipped.
    pub mailer: Option<Mailer>,
}
