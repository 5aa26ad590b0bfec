pub mod migrations;
pub mod models;
pub mod pitches;
pub mod posts;
pub mod profiles;
pub mod requests;
pub mod summaries;
pub mod users;

use anyhow::Result;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrations::run(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
        f(&conn)
    }

    /// Variant handing out a mutable connection for multi-statement
    /// transactions.
    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
        f(&mut conn)
    }
}

/// True when the error wraps a SQLite UNIQUE constraint violation.
/// Handlers use this to turn duplicate inserts into 409s.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<rusqlite::Error>(),
        Some(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

#[cfg(test)]
pub(crate) mod testing {
    use super::Database;
    use crate::models::{InvestorPostRow, PitchRow, UserRow};
    use chrono::Utc;
    use uuid::Uuid;

    pub fn db() -> Database {
        Database::open_in_memory().expect("in-memory db")
    }

    pub fn user(db: &Database, email: &str, role: &str) -> UserRow {
        let row = UserRow {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            username: email.split('@').next().unwrap_or("user").to_string(),
            password: "argon2-hash-placeholder".to_string(),
            role: role.to_string(),
            status: "pending".to_string(),
            avatar_url: None,
            location: None,
            created_at: Utc::now().to_rfc3339(),
        };
        db.create_user_with_profile(&row).expect("create user");
        row
    }

    pub fn pitch(db: &Database, developer_id: &str, title: &str) -> PitchRow {
        let row = PitchRow {
            id: Uuid::new_v4().to_string(),
            developer_id: developer_id.to_string(),
            title: title.to_string(),
            description: "A pitch".to_string(),
            tags: "[\"fintech\"]".to_string(),
            funding_stage: "seed".to_string(),
            ask: "$100k".to_string(),
            video_url: None,
            thumbnail_url: None,
            views: 0,
            saves: 0,
            created_at: Utc::now().to_rfc3339(),
        };
        db.insert_pitch(&row).expect("insert pitch");
        row
    }

    pub fn post(db: &Database, investor_id: &str, title: &str) -> InvestorPostRow {
        let row = InvestorPostRow {
            id: Uuid::new_v4().to_string(),
            investor_id: investor_id.to_string(),
            title: title.to_string(),
            description: "An investment thesis".to_string(),
            tags: "[\"saas\"]".to_string(),
            stages: "[\"seed\"]".to_string(),
            amount_range: "$50k-$250k".to_string(),
            location: "Berlin".to_string(),
            contact_preference: "email".to_string(),
            logo_url: None,
            status: "approved".to_string(),
            views: 0,
            saved_count: 0,
            created_at: Utc::now().to_rfc3339(),
        };
        db.insert_investor_post(&row).expect("insert post");
        row
    }
}
