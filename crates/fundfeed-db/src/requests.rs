use anyhow::Result;
use rusqlite::OptionalExtension;

use crate::Database;
use crate::models::ContactRequestRow;

/// Which side of a user's ledger to list.
///
/// Sender vs receiver follows from which listing a request references:
/// a request about a pitch was sent by the investor to the pitch's
/// developer; a request about an investor post was sent by the
/// developer to the post's investor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestBox {
    Inbox,
    Sent,
}

const REQUEST_COLUMNS: &str = "id, developer_id, investor_id, pitch_id, investor_post_id,
    message, meeting_link, preference, viewed, created_at,
    scheduled_start_time, scheduled_end_time, timezone, meeting_platform, agenda,
    meeting_status, meeting_started_at, meeting_ended_at, meeting_summary";

fn map_request(row: &rusqlite::Row<'_>) -> rusqlite::Result<ContactRequestRow> {
    Ok(ContactRequestRow {
        id: row.get(0)?,
        developer_id: row.get(1)?,
        investor_id: row.get(2)?,
        pitch_id: row.get(3)?,
        investor_post_id: row.get(4)?,
        message: row.get(5)?,
        meeting_link: row.get(6)?,
        preference: row.get(7)?,
        viewed: row.get(8)?,
        created_at: row.get(9)?,
        scheduled_start_time: row.get(10)?,
        scheduled_end_time: row.get(11)?,
        timezone: row.get(12)?,
        meeting_platform: row.get(13)?,
        agenda: row.get(14)?,
        meeting_status: row.get(15)?,
        meeting_started_at: row.get(16)?,
        meeting_ended_at: row.get(17)?,
        meeting_summary: row.get(18)?,
    })
}

impl Database {
    pub fn insert_contact_request(&self, req: &ContactRequestRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO contact_requests
                     (id, developer_id, investor_id, pitch_id, investor_post_id,
                      message, meeting_link, preference, viewed, created_at,
                      scheduled_start_time, scheduled_end_time, timezone,
                      meeting_platform, agenda, meeting_status,
                      meeting_started_at, meeting_ended_at, meeting_summary)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                         ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
                rusqlite::params![
                    req.id,
                    req.developer_id,
                    req.investor_id,
                    req.pitch_id,
                    req.investor_post_id,
                    req.message,
                    req.meeting_link,
                    req.preference,
                    req.viewed,
                    req.created_at,
                    req.scheduled_start_time,
                    req.scheduled_end_time,
                    req.timezone,
                    req.meeting_platform,
                    req.agenda,
                    req.meeting_status,
                    req.meeting_started_at,
                    req.meeting_ended_at,
                    req.meeting_summary,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_contact_request(&self, id: &str) -> Result<Option<ContactRequestRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM contact_requests WHERE id = ?1",
                REQUEST_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let row = stmt.query_row([id], map_request).optional()?;
            Ok(row)
        })
    }

    pub fn list_contact_requests(
        &self,
        user_id: &str,
        box_: RequestBox,
    ) -> Result<Vec<ContactRequestRow>> {
        self.with_conn(|conn| {
            // Inbox: the user receives — developer on pitch requests,
            // investor on post requests. Sent is the mirror image.
            let direction = match box_ {
                RequestBox::Inbox => {
                    "(developer_id = ?1 AND pitch_id IS NOT NULL)
                     OR (investor_id = ?1 AND investor_post_id IS NOT NULL)"
                }
                RequestBox::Sent => {
                    "(investor_id = ?1 AND pitch_id IS NOT NULL)
                     OR (developer_id = ?1 AND investor_post_id IS NOT NULL)"
                }
            };
            let sql = format!(
                "SELECT {} FROM contact_requests WHERE {} ORDER BY created_at DESC",
                REQUEST_COLUMNS, direction
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([user_id], map_request)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn mark_request_viewed(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE contact_requests SET viewed = 1 WHERE id = ?1",
                [id],
            )?;
            Ok(n > 0)
        })
    }

    /// Update the mutable scheduling/metadata fields of a request.
    pub fn update_contact_request(&self, req: &ContactRequestRow) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE contact_requests SET
                     message = ?1, meeting_link = ?2, preference = ?3,
                     scheduled_start_time = ?4, scheduled_end_time = ?5,
                     timezone = ?6, meeting_platform = ?7, agenda = ?8,
                     meeting_status = ?9
                 WHERE id = ?10",
                rusqlite::params![
                    req.message,
                    req.meeting_link,
                    req.preference,
                    req.scheduled_start_time,
                    req.scheduled_end_time,
                    req.timezone,
                    req.meeting_platform,
                    req.agenda,
                    req.meeting_status,
                    req.id,
                ],
            )?;
            Ok(n > 0)
        })
    }

    pub fn delete_contact_request(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM contact_requests WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }

    /// Prior requests on the same (developer, investor) pair since the
    /// given instant, excluding the row just created. Drives the email
    /// throttle.
    pub fn count_recent_requests(
        &self,
        developer_id: &str,
        investor_id: &str,
        since: &str,
        exclude_id: &str,
    ) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM contact_requests
                 WHERE developer_id = ?1 AND investor_id = ?2
                   AND created_at >= ?3 AND id <> ?4",
                rusqlite::params![developer_id, investor_id, since, exclude_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }

    /// Guarded transition scheduled -> in_progress. The WHERE clause on
    /// the current status makes concurrent starts race safely at the
    /// storage layer: exactly one caller observes true.
    pub fn start_meeting(&self, id: &str, started_at: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE contact_requests
                 SET meeting_status = 'in_progress', meeting_started_at = ?1
                 WHERE id = ?2 AND meeting_status = 'scheduled'",
                rusqlite::params![started_at, id],
            )?;
            Ok(n > 0)
        })
    }

    /// Guarded transition in_progress -> completed.
    pub fn end_meeting(&self, id: &str, ended_at: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE contact_requests
                 SET meeting_status = 'completed', meeting_ended_at = ?1
                 WHERE id = ?2 AND meeting_status = 'in_progress'",
                rusqlite::params![ended_at, id],
            )?;
            Ok(n > 0)
        })
    }

    /// Persist the free-text summary; only valid once completed.
    pub fn set_meeting_summary(&self, id: &str, summary: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE contact_requests SET meeting_summary = ?1
                 WHERE id = ?2 AND meeting_status = 'completed'",
                rusqlite::params![summary, id],
            )?;
            Ok(n > 0)
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use crate::models::ContactRequestRow;
    use crate::requests::RequestBox;
    use crate::testing;

    fn request_about_pitch(
        db: &crate::Database,
        developer_id: &str,
        investor_id: &str,
        pitch_id: &str,
        created_at: &str,
    ) -> ContactRequestRow {
        let row = ContactRequestRow {
            id: Uuid::new_v4().to_string(),
            developer_id: developer_id.to_string(),
            investor_id: investor_id.to_string(),
            pitch_id: Some(pitch_id.to_string()),
            investor_post_id: None,
            message: "Interested in your pitch".to_string(),
            meeting_link: Some("https://meet.example/abc".to_string()),
            preference: "email".to_string(),
            viewed: false,
            created_at: created_at.to_string(),
            scheduled_start_time: None,
            scheduled_end_time: None,
            timezone: "UTC".to_string(),
            meeting_platform: "google-meet".to_string(),
            agenda: None,
            meeting_status: "scheduled".to_string(),
            meeting_started_at: None,
            meeting_ended_at: None,
            meeting_summary: None,
        };
        db.insert_contact_request(&row).expect("insert request");
        row
    }

    #[test]
    fn both_or_neither_listing_refs_are_rejected() {
        let db = testing::db();
        let dev = testing::user(&db, "dev@x.com", "developer");
        let inv = testing::user(&db, "inv@x.com", "investor");
        let pitch = testing::pitch(&db, &dev.id, "Foo");
        let post = testing::post(&db, &inv.id, "Thesis");

        let mut row = request_about_pitch(&db, &dev.id, &inv.id, &pitch.id, &Utc::now().to_rfc3339());
        row.id = Uuid::new_v4().to_string();
        row.investor_post_id = Some(post.id.clone());
        assert!(db.insert_contact_request(&row).is_err());

        row.id = Uuid::new_v4().to_string();
        row.pitch_id = None;
        row.investor_post_id = None;
        assert!(db.insert_contact_request(&row).is_err());
    }

    #[test]
    fn pitch_request_lands_in_developer_inbox_and_investor_sent() {
        let db = testing::db();
        let dev = testing::user(&db, "dev@x.com", "developer");
        let inv = testing::user(&db, "inv@x.com", "investor");
        let pitch = testing::pitch(&db, &dev.id, "Foo");

        let req = request_about_pitch(&db, &dev.id, &inv.id, &pitch.id, &Utc::now().to_rfc3339());

        let inbox = db.list_contact_requests(&dev.id, RequestBox::Inbox).unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].id, req.id);
        assert!(!inbox[0].viewed);

        let sent = db.list_contact_requests(&inv.id, RequestBox::Sent).unwrap();
        assert_eq!(sent.len(), 1);

        // Never the reverse
        assert!(db.list_contact_requests(&dev.id, RequestBox::Sent).unwrap().is_empty());
        assert!(db.list_contact_requests(&inv.id, RequestBox::Inbox).unwrap().is_empty());

        assert!(db.mark_request_viewed(&req.id).unwrap());
        let inbox = db.list_contact_requests(&dev.id, RequestBox::Inbox).unwrap();
        assert!(inbox[0].viewed);
    }

    #[test]
    fn transitions_are_guarded_by_current_status() {
        let db = testing::db();
        let dev = testing::user(&db, "dev@x.com", "developer");
        let inv = testing::user(&db, "inv@x.com", "investor");
        let pitch = testing::pitch(&db, &dev.id, "Foo");
        let req = request_about_pitch(&db, &dev.id, &inv.id, &pitch.id, &Utc::now().to_rfc3339());

        let now = Utc::now().to_rfc3339();
        // end before start refuses
        assert!(!db.end_meeting(&req.id, &now).unwrap());
        // summary before completion refuses
        assert!(!db.set_meeting_summary(&req.id, "notes").unwrap());

        assert!(db.start_meeting(&req.id, &now).unwrap());
        // second start loses the guard
        assert!(!db.start_meeting(&req.id, &now).unwrap());

        assert!(db.end_meeting(&req.id, &now).unwrap());
        assert!(!db.end_meeting(&req.id, &now).unwrap());

        assert!(db.set_meeting_summary(&req.id, "notes").unwrap());
        let row = db.get_contact_request(&req.id).unwrap().unwrap();
        assert_eq!(row.meeting_status, "completed");
        assert_eq!(row.meeting_summary.as_deref(), Some("notes"));
        assert!(row.meeting_started_at.is_some());
        assert!(row.meeting_ended_at.is_some());
    }

    #[test]
    fn recent_request_count_honors_window_and_exclusion() {
        let db = testing::db();
        let dev = testing::user(&db, "dev@x.com", "developer");
        let inv = testing::user(&db, "inv@x.com", "investor");
        let pitch = testing::pitch(&db, &dev.id, "Foo");

        let now = Utc::now();
        let old = request_about_pitch(
            &db,
            &dev.id,
            &inv.id,
            &pitch.id,
            &(now - Duration::minutes(45)).to_rfc3339(),
        );
        let fresh = request_about_pitch(&db, &dev.id, &inv.id, &pitch.id, &now.to_rfc3339());

        let since = (now - Duration::minutes(30)).to_rfc3339();
        // Only the fresh row is inside the window, and it is excluded.
        assert_eq!(
            db.count_recent_requests(&dev.id, &inv.id, &since, &fresh.id).unwrap(),
            0
        );

        let second = request_about_pitch(&db, &dev.id, &inv.id, &pitch.id, &now.to_rfc3339());
        assert_eq!(
            db.count_recent_requests(&dev.id, &inv.id, &since, &second.id).unwrap(),
            1
        );

        // The stale row still counts for a wide enough window.
        let wide = (now - Duration::minutes(60)).to_rfc3339();
        assert_eq!(
            db.count_recent_requests(&dev.id, &inv.id, &wide, &old.id).unwrap(),
            2
        );
    }
}
