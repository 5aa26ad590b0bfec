use anyhow::Result;
use rusqlite::OptionalExtension;

use crate::Database;
use crate::models::{DeveloperProfileRow, InvestorProfileRow};

impl Database {
    pub fn get_developer_profile(&self, user_id: &str) -> Result<Option<DeveloperProfileRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT user_id, title, bio, skills, github, linkedin, portfolio
                 FROM developer_profiles WHERE user_id = ?1",
            )?;
            let row = stmt
                .query_row([user_id], |row| {
                    Ok(DeveloperProfileRow {
                        user_id: row.get(0)?,
                        title: row.get(1)?,
                        bio: row.get(2)?,
                        skills: row.get(3)?,
                        github: row.get(4)?,
                        linkedin: row.get(5)?,
                        portfolio: row.get(6)?,
                    })
                })
                .optional()?;
            Ok(row)
        })
    }

    /// Write the full profile row, creating it if registration predates
    /// the profile table entry.
    pub fn upsert_developer_profile(&self, profile: &DeveloperProfileRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO developer_profiles
                     (user_id, title, bio, skills, github, linkedin, portfolio)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(user_id) DO UPDATE SET
                     title = excluded.title,
                     bio = excluded.bio,
                     skills = excluded.skills,
                     github = excluded.github,
                     linkedin = excluded.linkedin,
                     portfolio = excluded.portfolio",
                rusqlite::params![
                    profile.user_id,
                    profile.title,
                    profile.bio,
                    profile.skills,
                    profile.github,
                    profile.linkedin,
                    profile.portfolio,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_investor_profile(&self, user_id: &str) -> Result<Option<InvestorProfileRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT user_id, firm, investor_type, contact_preference, stages, sectors,
                        linkedin, website
                 FROM investor_profiles WHERE user_id = ?1",
            )?;
            let row = stmt
                .query_row([user_id], |row| {
                    Ok(InvestorProfileRow {
                        user_id: row.get(0)?,
                        firm: row.get(1)?,
                        investor_type: row.get(2)?,
                        contact_preference: row.get(3)?,
                        stages: row.get(4)?,
                        sectors: row.get(5)?,
                        linkedin: row.get(6)?,
                        website: row.get(7)?,
                    })
                })
                .optional()?;
            Ok(row)
        })
    }

    pub fn upsert_investor_profile(&self, profile: &InvestorProfileRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO investor_profiles
                     (user_id, firm, investor_type, contact_preference, stages, sectors,
                      linkedin, website)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(user_id) DO UPDATE SET
                     firm = excluded.firm,
                     investor_type = excluded.investor_type,
                     contact_preference = excluded.contact_preference,
                     stages = excluded.stages,
                     sectors = excluded.sectors,
                     linkedin = excluded.linkedin,
                     website = excluded.website",
                rusqlite::params![
                    profile.user_id,
                    profile.firm,
                    profile.investor_type,
                    profile.contact_preference,
                    profile.stages,
                    profile.sectors,
                    profile.linkedin,
                    profile.website,
                ],
            )?;
            Ok(())
        })
    }
}
