use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::backend::{AuthUser, Session, UserMetadata};

// ── Config ─────────────────────────────────────────────────────────

pub fn get_config(conn: &Connection, key: &str) -> Result<Option<String>, rusqlite::Error> {
    conn.query_row(
        "SELECT value FROM app_config WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
}

pub fn set_config(conn: &Connection, key: &str, value: &str) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT OR REPLACE INTO app_config (key, value, updated_at)
         VALUES (?1, ?2, datetime('now'))",
        params![key, value],
    )?;
    Ok(())
}

/// Returns true if the key existed.
pub fn delete_config(conn: &Connection, key: &str) -> Result<bool, rusqlite::Error> {
    let n = conn.execute("DELETE FROM app_config WHERE key = ?1", params![key])?;
    Ok(n > 0)
}

pub fn list_config(conn: &Connection) -> Result<Vec<(String, String)>, rusqlite::Error> {
    let mut stmt = conn.prepare("SELECT key, value FROM app_config ORDER BY key")?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    rows.collect()
}

// ── Session ────────────────────────────────────────────────────────

/// Store `session`, replacing any previous one.
pub fn save_session(conn: &Connection, session: &Session) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT OR REPLACE INTO auth_session (
            id, access_token, refresh_token, expires_at, user_id, email, full_name, saved_at
        ) VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, datetime('now'))",
        params![
            session.access_token,
            session.refresh_token,
            session.expires_at.map(|t| t.timestamp()),
            session.user.id,
            session.user.email,
            session.user.user_metadata.full_name,
        ],
    )?;
    Ok(())
}

pub fn load_session(conn: &Connection) -> Result<Option<Session>, rusqlite::Error> {
    conn.query_row(
        "SELECT access_token, refresh_token, expires_at, user_id, email, full_name
         FROM auth_session WHERE id = 1",
        [],
        |row| {
            let expires_at: Option<i64> = row.get(2)?;
            Ok(Session {
                access_token: row.get(0)?,
                refresh_token: row.get(1)?,
                expires_at: expires_at.and_then(|s| DateTime::<Utc>::from_timestamp(s, 0)),
                user: AuthUser {
                    id: row.get(3)?,
                    email: row.get(4)?,
                    user_metadata: UserMetadata {
                        full_name: row.get(5)?,
                    },
                },
            })
        },
    )
    .optional()
}

/// Returns true if a session was stored.
pub fn clear_session(conn: &Connection) -> Result<bool, rusqlite::Error> {
    let n = conn.execute("DELETE FROM auth_session", [])?;
    Ok(n > 0)
}
