use anyhow::Result;
use rusqlite::OptionalExtension;

use crate::Database;
use crate::models::MeetingSummaryRow;

impl Database {
    /// Create or replace the one-to-one structured summary for a
    /// request. `created_at` survives replacement; `updated_at` moves.
    pub fn upsert_meeting_summary(&self, summary: &MeetingSummaryRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO meeting_summaries
                     (id, contact_request_id, discussion_points, action_items,
                      decisions_made, next_steps, needs_followup, followup_date,
                      additional_notes, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                 ON CONFLICT(contact_request_id) DO UPDATE SET
                     discussion_points = excluded.discussion_points,
                     action_items = excluded.action_items,
                     decisions_made = excluded.decisions_made,
                     next_steps = excluded.next_steps,
                     needs_followup = excluded.needs_followup,
                     followup_date = excluded.followup_date,
                     additional_notes = excluded.additional_notes,
                     updated_at = excluded.updated_at",
                rusqlite::params![
                    summary.id,
                    summary.contact_request_id,
                    summary.discussion_points,
                    summary.action_items,
                    summary.decisions_made,
                    summary.next_steps,
                    summary.needs_followup,
                    summary.followup_date,
                    summary.additional_notes,
                    summary.created_at,
                    summary.updated_at,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_meeting_summary(&self, contact_request_id: &str) -> Result<Option<MeetingSummaryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, contact_request_id, discussion_points, action_items,
                        decisions_made, next_steps, needs_followup, followup_date,
                        additional_notes, created_at, updated_at
                 FROM meeting_summaries WHERE contact_request_id = ?1",
            )?;
            let row = stmt
                .query_row([contact_request_id], |row| {
                    Ok(MeetingSummaryRow {
                        id: row.get(0)?,
                        contact_request_id: row.get(1)?,
                        discussion_points: row.get(2)?,
                        action_items: row.get(3)?,
                        decisions_made: row.get(4)?,
                        next_steps: row.get(5)?,
                        needs_followup: row.get(6)?,
                        followup_date: row.get(7)?,
                        additional_notes: row.get(8)?,
                        created_at: row.get(9)?,
                        updated_at: row.get(10)?,
                    })
                })
                .optional()?;
            Ok(row)
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use crate::models::{ContactRequestRow, MeetingSummaryRow};
    use crate::testing;

    #[test]
    fn upsert_replaces_content_but_keeps_created_at() {
        let db = testing::db();
        let dev = testing::user(&db, "dev@x.com", "developer");
        let inv = testing::user(&db, "inv@x.com", "investor");
        let pitch = testing::pitch(&db, &dev.id, "Foo");

        let req = ContactRequestRow {
            id: Uuid::new_v4().to_string(),
            developer_id: dev.id.clone(),
            investor_id: inv.id.clone(),
            pitch_id: Some(pitch.id.clone()),
            investor_post_id: None,
            message: "hi".to_string(),
            meeting_link: None,
            preference: "email".to_string(),
            viewed: false,
            created_at: Utc::now().to_rfc3339(),
            scheduled_start_time: None,
            scheduled_end_time: None,
            timezone: "UTC".to_string(),
            meeting_platform: "zoom".to_string(),
            agenda: None,
            meeting_status: "scheduled".to_string(),
            meeting_started_at: None,
            meeting_ended_at: None,
            meeting_summary: None,
        };
        db.insert_contact_request(&req).unwrap();

        let first = MeetingSummaryRow {
            id: Uuid::new_v4().to_string(),
            contact_request_id: req.id.clone(),
            discussion_points: "[{\"text\":\"traction\"}]".to_string(),
            action_items: "[]".to_string(),
            decisions_made: "[]".to_string(),
            next_steps: None,
            needs_followup: false,
            followup_date: None,
            additional_notes: None,
            created_at: "2026-01-01T00:00:00+00:00".to_string(),
            updated_at: "2026-01-01T00:00:00+00:00".to_string(),
        };
        db.upsert_meeting_summary(&first).unwrap();

        let second = MeetingSummaryRow {
            discussion_points: "[{\"text\":\"valuation\"}]".to_string(),
            needs_followup: true,
            updated_at: "2026-02-01T00:00:00+00:00".to_string(),
            ..first.clone()
        };
        db.upsert_meeting_summary(&second).unwrap();

        let stored = db.get_meeting_summary(&req.id).unwrap().unwrap();
        assert_eq!(stored.discussion_points, "[{\"text\":\"valuation\"}]");
        assert!(stored.needs_followup);
        assert_eq!(stored.created_at, "2026-01-01T00:00:00+00:00");
        assert_eq!(stored.updated_at, "2026-02-01T00:00:00+00:00");
    }
}
