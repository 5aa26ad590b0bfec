use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};

use crate::Database;
use crate::models::UserRow;

impl Database {
    /// Insert a user plus the empty profile row matching their role, in
    /// one transaction. A duplicate email surfaces as a UNIQUE
    /// constraint failure.
    pub fn create_user_with_profile(&self, user: &UserRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO users (id, email, username, password, role, status,
                                    avatar_url, location, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                rusqlite::params![
                    user.id,
                    user.email,
                    user.username,
                    user.password,
                    user.role,
                    user.status,
                    user.avatar_url,
                    user.location,
                    user.created_at,
                ],
            )?;
            if user.role == "developer" {
                tx.execute(
                    "INSERT INTO developer_profiles (user_id) VALUES (?1)",
                    [&user.id],
                )?;
            } else {
                tx.execute(
                    "INSERT INTO investor_profiles (user_id) VALUES (?1)",
                    [&user.id],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    /// Batch-fetch users by id (request listings embed both parties).
    pub fn get_users_by_ids(&self, ids: &[String]) -> Result<Vec<UserRow>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> = (1..=ids.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT {} FROM users WHERE id IN ({})",
                USER_COLUMNS,
                placeholders.join(", ")
            );

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params_from_iter(ids.iter()), map_user)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn set_avatar_url(&self, user_id: &str, avatar_url: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE users SET avatar_url = ?1 WHERE id = ?2",
                rusqlite::params![avatar_url, user_id],
            )?;
            Ok(n > 0)
        })
    }
}

pub(crate) const USER_COLUMNS: &str =
    "id, email, username, password, role, status, avatar_url, location, created_at";

pub(crate) fn map_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        email: row.get(1)?,
        username: row.get(2)?,
        password: row.get(3)?,
        role: row.get(4)?,
        status: row.get(5)?,
        avatar_url: row.get(6)?,
        location: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {} FROM users WHERE {} = ?1", USER_COLUMNS, column);
    let mut stmt = conn.prepare(&sql)?;
    let row = stmt.query_row([value], map_user).optional()?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use crate::testing;

    #[test]
    fn register_creates_matching_profile() {
        let db = testing::db();
        let dev = testing::user(&db, "dev@x.com", "developer");
        let inv = testing::user(&db, "inv@x.com", "investor");

        assert!(db.get_developer_profile(&dev.id).unwrap().is_some());
        assert!(db.get_investor_profile(&dev.id).unwrap().is_none());
        assert!(db.get_investor_profile(&inv.id).unwrap().is_some());
    }

    #[test]
    fn duplicate_email_is_unique_violation() {
        let db = testing::db();
        testing::user(&db, "dev@x.com", "developer");

        let dup = crate::models::UserRow {
            id: uuid::Uuid::new_v4().to_string(),
            email: "dev@x.com".to_string(),
            username: "other".to_string(),
            password: "hash".to_string(),
            role: "investor".to_string(),
            status: "pending".to_string(),
            avatar_url: None,
            location: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        let err = db.create_user_with_profile(&dup).unwrap_err();
        assert!(crate::is_unique_violation(&err));
    }

    #[test]
    fn batch_fetch_returns_requested_users() {
        let db = testing::db();
        let a = testing::user(&db, "a@x.com", "developer");
        let b = testing::user(&db, "b@x.com", "investor");
        testing::user(&db, "c@x.com", "investor");

        let users = db
            .get_users_by_ids(&[a.id.clone(), b.id.clone()])
            .unwrap();
        assert_eq!(users.len(), 2);
    }
}
