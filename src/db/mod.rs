//! Document store for users, goals and logs.
//!
//! Each entity is stored as its JSON document alongside the key columns it is
//! queried by, mirroring a key-value table layout:
//!
//! - `users`: keyed by `userId`
//! - `goals`: keyed by (`userId`, `goalId`), indexed by `category`
//! - `logs`: keyed by (`goalId`, `logId`), indexed by `userId` and `timestamp`
//!
//! Documents are validated on the way in and on the way out, so the store
//! never hands back a record that does not have its entity's shape.

mod schema;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use serde_json::Value;

use crate::models::*;
use crate::validate::Entity;

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "upcount")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        let db_path = dirs.data_dir().join("upcount.db");
        Self::open(db_path)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();
        schema::run_migrations(&conn)
    }

    // ============================================================
    // User operations
    // ============================================================

    pub fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        let conn = self.conn.lock();
        let doc: Option<String> = conn
            .query_row("SELECT doc FROM users WHERE user_id = ?", [user_id], |row| {
                row.get(0)
            })
            .optional()?;
        doc.map(decode).transpose()
    }

    /// Insert or replace a user.
    pub fn put_user(&self, user: &User) -> Result<()> {
        let doc = encode(user)?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO users (user_id, email, doc) VALUES (?, ?, ?)
             ON CONFLICT(user_id) DO UPDATE SET email = excluded.email, doc = excluded.doc",
            (&user.user_id, &user.email, &doc),
        )?;
        Ok(())
    }

    // ============================================================
    // Goal operations
    // ============================================================

    /// All goals owned by a user, in creation order.
    pub fn list_goals(&self, user_id: &str) -> Result<Vec<Goal>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT doc FROM goals WHERE user_id = ? ORDER BY rowid")?;
        let docs = stmt
            .query_map([user_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        docs.into_iter().map(decode).collect()
    }

    pub fn list_goals_by_category(&self, user_id: &str, category: &str) -> Result<Vec<Goal>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT doc FROM goals WHERE category = ? AND user_id = ? ORDER BY rowid",
        )?;
        let docs = stmt
            .query_map([category, user_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        docs.into_iter().map(decode).collect()
    }

    pub fn get_goal(&self, user_id: &str, goal_id: &str) -> Result<Option<Goal>> {
        let conn = self.conn.lock();
        let doc: Option<String> = conn
            .query_row(
                "SELECT doc FROM goals WHERE user_id = ? AND goal_id = ?",
                [user_id, goal_id],
                |row| row.get(0),
            )
            .optional()?;
        doc.map(decode).transpose()
    }

    /// Insert or replace a goal. Replacing keeps the goal's position in listings.
    pub fn put_goal(&self, goal: &Goal) -> Result<()> {
        let doc = encode(goal)?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO goals (user_id, goal_id, category, doc) VALUES (?, ?, ?, ?)
             ON CONFLICT(user_id, goal_id) DO UPDATE SET category = excluded.category, doc = excluded.doc",
            (&goal.user_id, &goal.goal_id, &goal.category, &doc),
        )?;
        Ok(())
    }

    /// Delete a goal. Its logs are left in place.
    pub fn delete_goal(&self, user_id: &str, goal_id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = conn.execute(
            "DELETE FROM goals WHERE user_id = ? AND goal_id = ?",
            [user_id, goal_id],
        )?;
        Ok(rows > 0)
    }

    // ============================================================
    // Log operations
    // ============================================================

    /// All logs for a goal, oldest activity first.
    pub fn list_logs(&self, goal_id: &str) -> Result<Vec<Log>> {
        let conn = self.conn.lock();
        let mut stmt =
            conn.prepare("SELECT doc FROM logs WHERE goal_id = ? ORDER BY timestamp, rowid")?;
        let docs = stmt
            .query_map([goal_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        docs.into_iter().map(decode).collect()
    }

    /// All logs recorded by a user across goals, oldest activity first.
    pub fn list_user_logs(&self, user_id: &str) -> Result<Vec<Log>> {
        let conn = self.conn.lock();
        let mut stmt =
            conn.prepare("SELECT doc FROM logs WHERE user_id = ? ORDER BY timestamp, rowid")?;
        let docs = stmt
            .query_map([user_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        docs.into_iter().map(decode).collect()
    }

    pub fn get_log(&self, goal_id: &str, log_id: &str) -> Result<Option<Log>> {
        let conn = self.conn.lock();
        let doc: Option<String> = conn
            .query_row(
                "SELECT doc FROM logs WHERE goal_id = ? AND log_id = ?",
                [goal_id, log_id],
                |row| row.get(0),
            )
            .optional()?;
        doc.map(decode).transpose()
    }

    pub fn put_log(&self, log: &Log) -> Result<()> {
        let doc = encode(log)?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO logs (goal_id, log_id, user_id, timestamp, doc) VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(goal_id, log_id) DO UPDATE SET
                user_id = excluded.user_id, timestamp = excluded.timestamp, doc = excluded.doc",
            (&log.goal_id, &log.log_id, &log.user_id, &log.timestamp, &doc),
        )?;
        Ok(())
    }

    pub fn delete_log(&self, goal_id: &str, log_id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = conn.execute(
            "DELETE FROM logs WHERE goal_id = ? AND log_id = ?",
            [goal_id, log_id],
        )?;
        Ok(rows > 0)
    }
}

/// Serialize an entity, checking it has a valid shape first.
fn encode<T: Entity + Serialize>(entity: &T) -> Result<String> {
    let value = serde_json::to_value(entity)?;
    T::parse(&value)
        .with_context(|| format!("Refusing to store invalid {} {}", T::KIND, entity.id()))?;
    Ok(value.to_string())
}

fn decode<T: Entity>(doc: String) -> Result<T> {
    let value: Value = serde_json::from_str(&doc).context("Stored document is not JSON")?;
    T::parse(&value).with_context(|| format!("Stored {} has an invalid shape", T::KIND))
}
