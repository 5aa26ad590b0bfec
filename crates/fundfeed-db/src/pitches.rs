use anyhow::Result;
use rusqlite::OptionalExtension;

use crate::Database;
use crate::models::{PitchRow, SavedPitchRow, UserRow};

/// Listing filters. All optional; combined with AND.
#[derive(Debug, Default, Clone)]
pub struct PitchFilter {
    /// Case-insensitive substring over title and description.
    pub search: Option<String>,
    /// Containment match against the JSON tags list.
    pub tag: Option<String>,
    pub stage: Option<String>,
    pub developer_id: Option<String>,
}

const PITCH_SELECT: &str = "
    SELECT p.id, p.developer_id, p.title, p.description, p.tags, p.funding_stage,
           p.ask, p.video_url, p.thumbnail_url, p.views,
           (SELECT COUNT(*) FROM saved_pitches sp WHERE sp.pitch_id = p.id) AS saves,
           p.created_at,
           u.id, u.email, u.username, u.password, u.role, u.status,
           u.avatar_url, u.location, u.created_at
    FROM pitches p
    JOIN users u ON u.id = p.developer_id";

fn map_pitch_with_developer(row: &rusqlite::Row<'_>) -> rusqlite::Result<(PitchRow, UserRow)> {
    let pitch = PitchRow {
        id: row.get(0)?,
        developer_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        tags: row.get(4)?,
        funding_stage: row.get(5)?,
        ask: row.get(6)?,
        video_url: row.get(7)?,
        thumbnail_url: row.get(8)?,
        views: row.get(9)?,
        saves: row.get(10)?,
        created_at: row.get(11)?,
    };
    let developer = UserRow {
        id: row.get(12)?,
        email: row.get(13)?,
        username: row.get(14)?,
        password: row.get(15)?,
        role: row.get(16)?,
        status: row.get(17)?,
        avatar_url: row.get(18)?,
        location: row.get(19)?,
        created_at: row.get(20)?,
    };
    Ok((pitch, developer))
}

impl Database {
    pub fn insert_pitch(&self, pitch: &PitchRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO pitches (id, developer_id, title, description, tags,
                                      funding_stage, ask, video_url, thumbnail_url,
                                      views, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                rusqlite::params![
                    pitch.id,
                    pitch.developer_id,
                    pitch.title,
                    pitch.description,
                    pitch.tags,
                    pitch.funding_stage,
                    pitch.ask,
                    pitch.video_url,
                    pitch.thumbnail_url,
                    pitch.views,
                    pitch.created_at,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_pitch(&self, id: &str) -> Result<Option<(PitchRow, UserRow)>> {
        self.with_conn(|conn| {
            let sql = format!("{} WHERE p.id = ?1", PITCH_SELECT);
            let mut stmt = conn.prepare(&sql)?;
            let row = stmt.query_row([id], map_pitch_with_developer).optional()?;
            Ok(row)
        })
    }

    pub fn list_pitches(&self, filter: &PitchFilter) -> Result<Vec<(PitchRow, UserRow)>> {
        self.with_conn(|conn| {
            let mut clauses: Vec<&str> = Vec::new();
            let mut params: Vec<String> = Vec::new();

            if let Some(search) = &filter.search {
                clauses.push("(p.title LIKE ? OR p.description LIKE ?)");
                let pattern = format!("%{}%", search);
                params.push(pattern.clone());
                params.push(pattern);
            }
            if let Some(tag) = &filter.tag {
                clauses.push("p.tags LIKE ?");
                params.push(format!("%{}%", tag));
            }
            if let Some(stage) = &filter.stage {
                clauses.push("p.funding_stage = ?");
                params.push(stage.clone());
            }
            if let Some(developer_id) = &filter.developer_id {
                clauses.push("p.developer_id = ?");
                params.push(developer_id.clone());
            }

            let mut sql = PITCH_SELECT.to_string();
            if !clauses.is_empty() {
                sql.push_str(" WHERE ");
                sql.push_str(&clauses.join(" AND "));
            }
            sql.push_str(" ORDER BY p.created_at DESC");

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(
                    rusqlite::params_from_iter(params.iter()),
                    map_pitch_with_developer,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn update_pitch(&self, pitch: &PitchRow) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE pitches SET title = ?1, description = ?2, tags = ?3,
                        funding_stage = ?4, ask = ?5, video_url = ?6, thumbnail_url = ?7
                 WHERE id = ?8",
                rusqlite::params![
                    pitch.title,
                    pitch.description,
                    pitch.tags,
                    pitch.funding_stage,
                    pitch.ask,
                    pitch.video_url,
                    pitch.thumbnail_url,
                    pitch.id,
                ],
            )?;
            Ok(n > 0)
        })
    }

    pub fn delete_pitch(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM pitches WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }

    /// Atomic view bump; returns the new count, None when the pitch is
    /// gone.
    pub fn add_pitch_view(&self, id: &str) -> Result<Option<i64>> {
        self.with_conn(|conn| {
            let views = conn
                .query_row(
                    "UPDATE pitches SET views = views + 1 WHERE id = ?1 RETURNING views",
                    [id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(views)
        })
    }

    /// Idempotent bookmark. Returns true when a new row was created,
    /// false when the pitch was already saved.
    pub fn save_pitch(&self, id: &str, investor_id: &str, pitch_id: &str, saved_at: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "INSERT OR IGNORE INTO saved_pitches (id, investor_id, pitch_id, saved_at)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id, investor_id, pitch_id, saved_at],
            )?;
            Ok(n > 0)
        })
    }

    /// Returns true when a bookmark was removed, false when there was
    /// none (a no-op, not an error).
    pub fn unsave_pitch(&self, investor_id: &str, pitch_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "DELETE FROM saved_pitches WHERE investor_id = ?1 AND pitch_id = ?2",
                rusqlite::params![investor_id, pitch_id],
            )?;
            Ok(n > 0)
        })
    }

    pub fn list_saved_pitches(
        &self,
        investor_id: &str,
    ) -> Result<Vec<(SavedPitchRow, PitchRow, UserRow)>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT s.id, s.investor_id, s.pitch_id, s.saved_at,
                        p.id, p.developer_id, p.title, p.description, p.tags,
                        p.funding_stage, p.ask, p.video_url, p.thumbnail_url, p.views,
                        (SELECT COUNT(*) FROM saved_pitches sp WHERE sp.pitch_id = p.id),
                        p.created_at,
                        u.id, u.email, u.username, u.password, u.role, u.status,
                        u.avatar_url, u.location, u.created_at
                 FROM saved_pitches s
                 JOIN pitches p ON p.id = s.pitch_id
                 JOIN users u ON u.id = p.developer_id
                 WHERE s.investor_id = ?1
                 ORDER BY s.saved_at DESC",
            )?;
            let rows = stmt
                .query_map([investor_id], |row| {
                    let saved = SavedPitchRow {
                        id: row.get(0)?,
                        investor_id: row.get(1)?,
                        pitch_id: row.get(2)?,
                        saved_at: row.get(3)?,
                    };
                    let pitch = PitchRow {
                        id: row.get(4)?,
                        developer_id: row.get(5)?,
                        title: row.get(6)?,
                        description: row.get(7)?,
                        tags: row.get(8)?,
                        funding_stage: row.get(9)?,
                        ask: row.get(10)?,
                        video_url: row.get(11)?,
                        thumbnail_url: row.get(12)?,
                        views: row.get(13)?,
                        saves: row.get(14)?,
                        created_at: row.get(15)?,
                    };
                    let developer = UserRow {
                        id: row.get(16)?,
                        email: row.get(17)?,
                        username: row.get(18)?,
                        password: row.get(19)?,
                        role: row.get(20)?,
                        status: row.get(21)?,
                        avatar_url: row.get(22)?,
                        location: row.get(23)?,
                        created_at: row.get(24)?,
                    };
                    Ok((saved, pitch, developer))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use crate::pitches::PitchFilter;
    use crate::testing;

    #[test]
    fn save_then_unsave_round_trip() {
        let db = testing::db();
        let dev = testing::user(&db, "dev@x.com", "developer");
        let inv = testing::user(&db, "inv@x.com", "investor");
        let pitch = testing::pitch(&db, &dev.id, "Foo");

        let created = db
            .save_pitch(&Uuid::new_v4().to_string(), &inv.id, &pitch.id, &Utc::now().to_rfc3339())
            .unwrap();
        assert!(created);

        let saved = db.list_saved_pitches(&inv.id).unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].1.title, "Foo");
        assert_eq!(saved[0].1.saves, 1);

        assert!(db.unsave_pitch(&inv.id, &pitch.id).unwrap());
        assert!(db.list_saved_pitches(&inv.id).unwrap().is_empty());
        let (pitch_row, _) = db.get_pitch(&pitch.id).unwrap().unwrap();
        assert_eq!(pitch_row.saves, 0);
    }

    #[test]
    fn duplicate_save_is_idempotent_and_unsave_absent_is_noop() {
        let db = testing::db();
        let dev = testing::user(&db, "dev@x.com", "developer");
        let inv = testing::user(&db, "inv@x.com", "investor");
        let pitch = testing::pitch(&db, &dev.id, "Foo");

        let now = Utc::now().to_rfc3339();
        assert!(db.save_pitch(&Uuid::new_v4().to_string(), &inv.id, &pitch.id, &now).unwrap());
        assert!(!db.save_pitch(&Uuid::new_v4().to_string(), &inv.id, &pitch.id, &now).unwrap());

        let (pitch_row, _) = db.get_pitch(&pitch.id).unwrap().unwrap();
        assert_eq!(pitch_row.saves, 1);

        assert!(db.unsave_pitch(&inv.id, &pitch.id).unwrap());
        assert!(!db.unsave_pitch(&inv.id, &pitch.id).unwrap());
    }

    #[test]
    fn filters_narrow_the_listing() {
        let db = testing::db();
        let dev = testing::user(&db, "dev@x.com", "developer");
        testing::pitch(&db, &dev.id, "Fintech ledger");
        testing::pitch(&db, &dev.id, "Gardening app");

        let hits = db
            .list_pitches(&PitchFilter {
                search: Some("ledger".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0.title, "Fintech ledger");

        let hits = db
            .list_pitches(&PitchFilter {
                tag: Some("fintech".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(hits.len(), 2); // both fixtures carry the fintech tag

        let hits = db
            .list_pitches(&PitchFilter {
                developer_id: Some(dev.id.clone()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn add_view_increments_atomically() {
        let db = testing::db();
        let dev = testing::user(&db, "dev@x.com", "developer");
        let pitch = testing::pitch(&db, &dev.id, "Foo");

        assert_eq!(db.add_pitch_view(&pitch.id).unwrap(), Some(1));
        assert_eq!(db.add_pitch_view(&pitch.id).unwrap(), Some(2));
        assert_eq!(db.add_pitch_view("missing").unwrap(), None);
    }
}
