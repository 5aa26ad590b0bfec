use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};

use crate::Database;
use crate::models::{InvestorPostRow, SavedInvestorPostRow, UserRow};

/// Listing filters for investor posts. All optional; combined with AND.
#[derive(Debug, Default, Clone)]
pub struct PostFilter {
    /// Case-insensitive substring over title, description and location.
    pub search: Option<String>,
    /// Containment match against the JSON tags list.
    pub tag: Option<String>,
    /// Containment match against the JSON stages list.
    pub stage: Option<String>,
    pub location: Option<String>,
    pub investor_id: Option<String>,
}

const POST_SELECT: &str = "
    SELECT ip.id, ip.investor_id, ip.title, ip.description, ip.tags, ip.stages,
           ip.amount_range, ip.location, ip.contact_preference, ip.logo_url,
           ip.status, ip.views, ip.saved_count, ip.created_at,
           u.id, u.email, u.username, u.password, u.role, u.status,
           u.avatar_url, u.location, u.created_at
    FROM investor_posts ip
    JOIN users u ON u.id = ip.investor_id";

fn map_post_with_investor(row: &rusqlite::Row<'_>) -> rusqlite::Result<(InvestorPostRow, UserRow)> {
    let post = InvestorPostRow {
        id: row.get(0)?,
        investor_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        tags: row.get(4)?,
        stages: row.get(5)?,
        amount_range: row.get(6)?,
        location: row.get(7)?,
        contact_preference: row.get(8)?,
        logo_url: row.get(9)?,
        status: row.get(10)?,
        views: row.get(11)?,
        saved_count: row.get(12)?,
        created_at: row.get(13)?,
    };
    let investor = UserRow {
        id: row.get(14)?,
        email: row.get(15)?,
        username: row.get(16)?,
        password: row.get(17)?,
        role: row.get(18)?,
        status: row.get(19)?,
        avatar_url: row.get(20)?,
        location: row.get(21)?,
        created_at: row.get(22)?,
    };
    Ok((post, investor))
}

/// Recompute the denormalized saved_count from the bookmark table.
/// Runs inside the same transaction as the save/unsave write, so the
/// counter can neither drift nor go negative.
fn refresh_saved_count(conn: &Connection, post_id: &str) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE investor_posts
         SET saved_count = (SELECT COUNT(*) FROM saved_investor_posts s
                            WHERE s.post_id = investor_posts.id)
         WHERE id = ?1",
        [post_id],
    )
}

impl Database {
    pub fn insert_investor_post(&self, post: &InvestorPostRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO investor_posts (id, investor_id, title, description, tags,
                                             stages, amount_range, location,
                                             contact_preference, logo_url, status,
                                             views, saved_count, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                rusqlite::params![
                    post.id,
                    post.investor_id,
                    post.title,
                    post.description,
                    post.tags,
                    post.stages,
                    post.amount_range,
                    post.location,
                    post.contact_preference,
                    post.logo_url,
                    post.status,
                    post.views,
                    post.saved_count,
                    post.created_at,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_investor_post(&self, id: &str) -> Result<Option<(InvestorPostRow, UserRow)>> {
        self.with_conn(|conn| {
            let sql = format!("{} WHERE ip.id = ?1", POST_SELECT);
            let mut stmt = conn.prepare(&sql)?;
            let row = stmt.query_row([id], map_post_with_investor).optional()?;
            Ok(row)
        })
    }

    pub fn list_investor_posts(&self, filter: &PostFilter) -> Result<Vec<(InvestorPostRow, UserRow)>> {
        self.with_conn(|conn| {
            let mut clauses: Vec<&str> = Vec::new();
            let mut params: Vec<String> = Vec::new();

            if let Some(search) = &filter.search {
                clauses.push(
                    "(ip.title LIKE ? OR ip.description LIKE ? OR ip.location LIKE ?)",
                );
                let pattern = format!("%{}%", search);
                params.push(pattern.clone());
                params.push(pattern.clone());
                params.push(pattern);
            }
            if let Some(tag) = &filter.tag {
                clauses.push("ip.tags LIKE ?");
                params.push(format!("%{}%", tag));
            }
            if let Some(stage) = &filter.stage {
                clauses.push("ip.stages LIKE ?");
                params.push(format!("%{}%", stage));
            }
            if let Some(location) = &filter.location {
                clauses.push("ip.location LIKE ?");
                params.push(format!("%{}%", location));
            }
            if let Some(investor_id) = &filter.investor_id {
                clauses.push("ip.investor_id = ?");
                params.push(investor_id.clone());
            }

            let mut sql = POST_SELECT.to_string();
            if !clauses.is_empty() {
                sql.push_str(" WHERE ");
                sql.push_str(&clauses.join(" AND "));
            }
            sql.push_str(" ORDER BY ip.created_at DESC");

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(
                    rusqlite::params_from_iter(params.iter()),
                    map_post_with_investor,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn update_investor_post(&self, post: &InvestorPostRow) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE investor_posts SET title = ?1, description = ?2, tags = ?3,
                        stages = ?4, amount_range = ?5, location = ?6,
                        contact_preference = ?7, logo_url = ?8
                 WHERE id = ?9",
                rusqlite::params![
                    post.title,
                    post.description,
                    post.tags,
                    post.stages,
                    post.amount_range,
                    post.location,
                    post.contact_preference,
                    post.logo_url,
                    post.id,
                ],
            )?;
            Ok(n > 0)
        })
    }

    pub fn delete_investor_post(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM investor_posts WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }

    pub fn add_investor_post_view(&self, id: &str) -> Result<Option<i64>> {
        self.with_conn(|conn| {
            let views = conn
                .query_row(
                    "UPDATE investor_posts SET views = views + 1 WHERE id = ?1 RETURNING views",
                    [id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(views)
        })
    }

    /// Idempotent bookmark plus saved_count refresh in one transaction.
    /// Returns true when a new row was created.
    pub fn save_investor_post(
        &self,
        id: &str,
        developer_id: &str,
        post_id: &str,
        saved_at: &str,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let created = tx.execute(
                "INSERT OR IGNORE INTO saved_investor_posts (id, developer_id, post_id, saved_at)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id, developer_id, post_id, saved_at],
            )? > 0;
            if created {
                refresh_saved_count(&tx, post_id)?;
            }
            tx.commit()?;
            Ok(created)
        })
    }

    /// Returns true when a bookmark was removed; absent bookmarks are a
    /// no-op.
    pub fn unsave_investor_post(&self, developer_id: &str, post_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let removed = tx.execute(
                "DELETE FROM saved_investor_posts WHERE developer_id = ?1 AND post_id = ?2",
                rusqlite::params![developer_id, post_id],
            )? > 0;
            if removed {
                refresh_saved_count(&tx, post_id)?;
            }
            tx.commit()?;
            Ok(removed)
        })
    }

    pub fn list_saved_investor_posts(
        &self,
        developer_id: &str,
    ) -> Result<Vec<(SavedInvestorPostRow, InvestorPostRow, UserRow)>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT s.id, s.developer_id, s.post_id, s.saved_at,
                        ip.id, ip.investor_id, ip.title, ip.description, ip.tags, ip.stages,
                        ip.amount_range, ip.location, ip.contact_preference, ip.logo_url,
                        ip.status, ip.views, ip.saved_count, ip.created_at,
                        u.id, u.email, u.username, u.password, u.role, u.status,
                        u.avatar_url, u.location, u.created_at
                 FROM saved_investor_posts s
                 JOIN investor_posts ip ON ip.id = s.post_id
                 JOIN users u ON u.id = ip.investor_id
                 WHERE s.developer_id = ?1
                 ORDER BY s.saved_at DESC",
            )?;
            let rows = stmt
                .query_map([developer_id], |row| {
                    let saved = SavedInvestorPostRow {
                        id: row.get(0)?,
                        developer_id: row.get(1)?,
                        post_id: row.get(2)?,
                        saved_at: row.get(3)?,
                    };
                    let post = InvestorPostRow {
                        id: row.get(4)?,
                        investor_id: row.get(5)?,
                        title: row.get(6)?,
                        description: row.get(7)?,
                        tags: row.get(8)?,
                        stages: row.get(9)?,
                        amount_range: row.get(10)?,
                        location: row.get(11)?,
                        contact_preference: row.get(12)?,
                        logo_url: row.get(13)?,
                        status: row.get(14)?,
                        views: row.get(15)?,
                        saved_count: row.get(16)?,
                        created_at: row.get(17)?,
                    };
                    let investor = UserRow {
                        id: row.get(18)?,
                        email: row.get(19)?,
                        username: row.get(20)?,
                        password: row.get(21)?,
                        role: row.get(22)?,
                        status: row.get(23)?,
                        avatar_url: row.get(24)?,
                        location: row.get(25)?,
                        created_at: row.get(26)?,
                    };
                    Ok((saved, post, investor))
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

    use crate::posts::PostFilter;
    use crate::testing;

    fn live_count(db: &crate::Database, post_id: &str) -> i64 {
        db.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM saved_investor_posts WHERE post_id = ?1",
                [post_id],
                |row| row.get(0),
            )?)
        })
        .unwrap()
    }

    #[test]
    fn saved_count_tracks_live_rows_through_any_sequence() {
        let db = testing::db();
        let inv = testing::user(&db, "inv@x.com", "investor");
        let dev_a = testing::user(&db, "a@x.com", "developer");
        let dev_b = testing::user(&db, "b@x.com", "developer");
        let post = testing::post(&db, &inv.id, "Seed fund");

        let now = Utc::now().to_rfc3339();
        // save, duplicate save, second saver, unsave, unsave-when-absent
        assert!(db.save_investor_post(&Uuid::new_v4().to_string(), &dev_a.id, &post.id, &now).unwrap());
        assert!(!db.save_investor_post(&Uuid::new_v4().to_string(), &dev_a.id, &post.id, &now).unwrap());
        assert!(db.save_investor_post(&Uuid::new_v4().to_string(), &dev_b.id, &post.id, &now).unwrap());
        assert!(db.unsave_investor_post(&dev_a.id, &post.id).unwrap());
        assert!(!db.unsave_investor_post(&dev_a.id, &post.id).unwrap());

        let (row, _) = db.get_investor_post(&post.id).unwrap().unwrap();
        assert_eq!(row.saved_count, 1);
        assert_eq!(row.saved_count, live_count(&db, &post.id));

        assert!(db.unsave_investor_post(&dev_b.id, &post.id).unwrap());
        let (row, _) = db.get_investor_post(&post.id).unwrap().unwrap();
        assert_eq!(row.saved_count, 0);
        assert_eq!(row.saved_count, live_count(&db, &post.id));
    }

    #[test]
    fn saved_listing_embeds_post_and_investor() {
        let db = testing::db();
        let inv = testing::user(&db, "inv@x.com", "investor");
        let dev = testing::user(&db, "dev@x.com", "developer");
        let post = testing::post(&db, &inv.id, "Seed fund");

        db.save_investor_post(
            &Uuid::new_v4().to_string(),
            &dev.id,
            &post.id,
            &Utc::now().to_rfc3339(),
        )
        .unwrap();

        let saved = db.list_saved_investor_posts(&dev.id).unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].1.title, "Seed fund");
        assert_eq!(saved[0].2.email, "inv@x.com");
    }

    #[test]
    fn search_covers_location() {
        let db = testing::db();
        let inv = testing::user(&db, "inv@x.com", "investor");
        testing::post(&db, &inv.id, "Seed fund");

        let hits = db
            .list_investor_posts(&PostFilter {
                search: Some("berlin".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(hits.len(), 1);

        let hits = db
            .list_investor_posts(&PostFilter {
                stage: Some("seed".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(hits.len(), 1);
    }
}
