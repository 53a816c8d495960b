//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the lolcrawler database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Player matchlists, replaced on every crawl of the player
CREATE TABLE IF NOT EXISTS matchlists (
    id TEXT PRIMARY KEY,
    region TEXT,
    body TEXT NOT NULL,
    stored_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_matchlists_region ON matchlists(region);

-- Match documents, written once
CREATE TABLE IF NOT EXISTS matches (
    id TEXT PRIMARY KEY,
    region TEXT,
    body TEXT NOT NULL,
    stored_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_matches_region ON matches(region);

-- Matches that could not be fetched
CREATE TABLE IF NOT EXISTS failed_matches (
    id TEXT PRIMARY KEY,
    attempts INTEGER NOT NULL DEFAULT 0,
    permanent INTEGER NOT NULL DEFAULT 0,
    last_error TEXT NOT NULL,
    last_attempt_at TEXT NOT NULL
);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
