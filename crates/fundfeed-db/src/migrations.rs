use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            email       TEXT NOT NULL UNIQUE,
            username    TEXT NOT NULL DEFAULT '',
            password    TEXT NOT NULL,
            role        TEXT NOT NULL CHECK (role IN ('developer', 'investor')),
            status      TEXT NOT NULL DEFAULT 'pending'
                        CHECK (status IN ('pending', 'approved', 'rejected')),
            avatar_url  TEXT,
            location    TEXT,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS developer_profiles (
            user_id     TEXT PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
            title       TEXT NOT NULL DEFAULT '',
            bio         TEXT NOT NULL DEFAULT '',
            skills      TEXT NOT NULL DEFAULT '[]',
            github      TEXT,
            linkedin    TEXT,
            portfolio   TEXT
        );

        CREATE TABLE IF NOT EXISTS investor_profiles (
            user_id             TEXT PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
            firm                TEXT NOT NULL DEFAULT '',
            investor_type       TEXT NOT NULL DEFAULT '',
            contact_preference  TEXT NOT NULL DEFAULT 'email',
            stages              TEXT NOT NULL DEFAULT '[]',
            sectors             TEXT NOT NULL DEFAULT '[]',
            linkedin            TEXT,
            website             TEXT
        );

        CREATE TABLE IF NOT EXISTS pitches (
            id              TEXT PRIMARY KEY,
            developer_id    TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            title           TEXT NOT NULL,
            description     TEXT NOT NULL,
            tags            TEXT NOT NULL DEFAULT '[]',
            funding_stage   TEXT NOT NULL DEFAULT '',
            ask             TEXT NOT NULL DEFAULT '',
            video_url       TEXT,
            thumbnail_url   TEXT,
            views           INTEGER NOT NULL DEFAULT 0,
            created_at      TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_pitches_developer
            ON pitches(developer_id, created_at);

        CREATE TABLE IF NOT EXISTS saved_pitches (
            id          TEXT PRIMARY KEY,
            investor_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            pitch_id    TEXT NOT NULL REFERENCES pitches(id) ON DELETE CASCADE,
            saved_at    TEXT NOT NULL,
            UNIQUE(investor_id, pitch_id)
        );

        CREATE INDEX IF NOT EXISTS idx_saved_pitches_pitch
            ON saved_pitches(pitch_id);

        CREATE TABLE IF NOT EXISTS investor_posts (
            id                  TEXT PRIMARY KEY,
            investor_id         TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            title               TEXT NOT NULL,
            description         TEXT NOT NULL,
            tags                TEXT NOT NULL DEFAULT '[]',
            stages              TEXT NOT NULL DEFAULT '[]',
            amount_range        TEXT NOT NULL DEFAULT '',
            location            TEXT NOT NULL DEFAULT '',
            contact_preference  TEXT NOT NULL DEFAULT 'email',
            logo_url            TEXT,
            status              TEXT NOT NULL DEFAULT 'approved'
                                CHECK (status IN ('pending', 'approved', 'rejected')),
            views               INTEGER NOT NULL DEFAULT 0,
            saved_count         INTEGER NOT NULL DEFAULT 0,
            created_at          TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_investor_posts_investor
            ON investor_posts(investor_id, created_at);

        CREATE TABLE IF NOT EXISTS saved_investor_posts (
            id           TEXT PRIMARY KEY,
            developer_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            post_id      TEXT NOT NULL REFERENCES investor_posts(id) ON DELETE CASCADE,
            saved_at     TEXT NOT NULL,
            UNIQUE(developer_id, post_id)
        );

        CREATE INDEX IF NOT EXISTS idx_saved_investor_posts_post
            ON saved_investor_posts(post_id);

        -- Exactly one of pitch_id / investor_post_id is set; the pair
        -- determines sender vs receiver. Listing deletion cascades so the
        -- invariant holds for the row's whole lifetime.
        CREATE TABLE IF NOT EXISTS contact_requests (
            id                    TEXT PRIMARY KEY,
            developer_id          TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            investor_id           TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            pitch_id              TEXT REFERENCES pitches(id) ON DELETE CASCADE,
            investor_post_id      TEXT REFERENCES investor_posts(id) ON DELETE CASCADE,
            message               TEXT NOT NULL,
            meeting_link          TEXT,
            preference            TEXT NOT NULL DEFAULT 'email'
                                  CHECK (preference IN ('email', 'phone', 'dm')),
            viewed                INTEGER NOT NULL DEFAULT 0,
            created_at            TEXT NOT NULL,
            scheduled_start_time  TEXT,
            scheduled_end_time    TEXT,
            timezone              TEXT NOT NULL DEFAULT 'UTC',
            meeting_platform      TEXT NOT NULL DEFAULT 'google-meet',
            agenda                TEXT,
            meeting_status        TEXT NOT NULL DEFAULT 'scheduled'
                                  CHECK (meeting_status IN
                                      ('scheduled', 'in_progress', 'completed', 'cancelled')),
            meeting_started_at    TEXT,
            meeting_ended_at      TEXT,
            meeting_summary       TEXT,
            CHECK ((pitch_id IS NULL) + (investor_post_id IS NULL) = 1)
        );

        CREATE INDEX IF NOT EXISTS idx_requests_pair
            ON contact_requests(developer_id, investor_id, created_at);

        CREATE INDEX IF NOT EXISTS idx_requests_created
            ON contact_requests(created_at);

        CREATE TABLE IF NOT EXISTS meeting_summaries (
            id                  TEXT PRIMARY KEY,
            contact_request_id  TEXT NOT NULL UNIQUE
                                REFERENCES contact_requests(id) ON DELETE CASCADE,
            discussion_points   TEXT NOT NULL DEFAULT '[]',
            action_items        TEXT NOT NULL DEFAULT '[]',
            decisions_made      TEXT NOT NULL DEFAULT '[]',
            next_steps          TEXT,
            needs_followup      INTEGER NOT NULL DEFAULT 0,
            followup_date       TEXT,
            additional_notes    TEXT,
            created_at          TEXT NOT NULL,
            updated_at          TEXT NOT NULL
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
