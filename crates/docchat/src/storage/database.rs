//! SQLite store for user accounts and chat transcripts

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::{ChatMessage, ChatMode, ChatRecord, UserRecord};

/// SQLite-backed chat/user store
pub struct ChatDb {
    conn: Arc<Mutex<Connection>>,
}

impl ChatDb {
    /// Create or open the database at the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| Error::store(format!("failed to open database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.migrate()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::store(format!("failed to open in-memory database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.migrate()?;
        Ok(db)
    }

    /// Run database migrations
    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                user_id TEXT PRIMARY KEY,
                username TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);

            CREATE TABLE IF NOT EXISTS chats (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                title TEXT NOT NULL,
                chat TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                mode TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_chats_user_id ON chats(user_id);
            CREATE INDEX IF NOT EXISTS idx_chats_timestamp ON chats(timestamp);
        "#,
        )
        .map_err(|e| Error::store(format!("migration failed: {}", e)))?;

        Ok(())
    }

    /// Insert a new user account
    pub fn insert_user(&self, user: &UserRecord) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO users (user_id, username, email, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![user.user_id, user.username, user.email, user.created_at],
        )
        .map_err(|e| Error::store(format!("failed to insert user: {}", e)))?;
        Ok(())
    }

    /// Find a user by email
    pub fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT user_id, username, email, created_at FROM users WHERE email = ?1",
            params![email],
            Self::row_to_user,
        )
        .optional()
        .map_err(|e| Error::store(format!("failed to query user: {}", e)))
    }

    /// Find a user by email and user id together
    pub fn find_user(&self, email: &str, user_id: &str) -> Result<Option<UserRecord>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT user_id, username, email, created_at FROM users \
             WHERE email = ?1 AND user_id = ?2",
            params![email, user_id],
            Self::row_to_user,
        )
        .optional()
        .map_err(|e| Error::store(format!("failed to query user: {}", e)))
    }

    /// Id of the most recently created user, if any
    pub fn latest_user_id(&self) -> Result<Option<String>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT user_id FROM users ORDER BY created_at DESC, user_id DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| Error::store(format!("failed to query latest user: {}", e)))
    }

    /// Persist a chat transcript
    pub fn insert_chat(&self, record: &ChatRecord) -> Result<()> {
        let chat_json = serde_json::to_string(&record.chat)?;

        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO chats (id, user_id, title, chat, timestamp, mode) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.id,
                record.user_id,
                record.title,
                chat_json,
                record.timestamp,
                record.mode.as_str(),
            ],
        )
        .map_err(|e| Error::store(format!("failed to insert chat: {}", e)))?;
        Ok(())
    }

    /// Update a stored chat's title and transcript
    pub fn update_chat(&self, record: &ChatRecord) -> Result<()> {
        let chat_json = serde_json::to_string(&record.chat)?;

        let conn = self.conn.lock();
        conn.execute(
            "UPDATE chats SET title = ?1, chat = ?2 WHERE id = ?3",
            params![record.title, chat_json, record.id],
        )
        .map_err(|e| Error::store(format!("failed to update chat: {}", e)))?;
        Ok(())
    }

    /// List a user's chats, most recent first
    pub fn list_chats(&self, user_id: &str) -> Result<Vec<ChatRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, user_id, title, chat, timestamp, mode FROM chats \
                 WHERE user_id = ?1 ORDER BY timestamp DESC",
            )
            .map_err(|e| Error::store(format!("failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![user_id], |row| {
                let chat_json: String = row.get(3)?;
                let mode: String = row.get(5)?;
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    chat_json,
                    row.get::<_, DateTime<Utc>>(4)?,
                    mode,
                ))
            })
            .map_err(|e| Error::store(format!("failed to query chats: {}", e)))?;

        let mut records = Vec::new();
        for row in rows {
            let (id, user_id, title, chat_json, timestamp, mode) =
                row.map_err(|e| Error::store(format!("failed to read chat row: {}", e)))?;
            let chat: Vec<ChatMessage> = serde_json::from_str(&chat_json)?;
            records.push(ChatRecord {
                id,
                user_id,
                title,
                chat,
                timestamp,
                mode: ChatMode::parse(&mode),
            });
        }

        Ok(records)
    }

    /// Delete a chat by id
    pub fn delete_chat(&self, chat_id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let deleted = conn
            .execute("DELETE FROM chats WHERE id = ?1", params![chat_id])
            .map_err(|e| Error::store(format!("failed to delete chat: {}", e)))?;
        Ok(deleted > 0)
    }

    fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRecord> {
        Ok(UserRecord {
            user_id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(user_id: &str, email: &str) -> UserRecord {
        UserRecord {
            user_id: user_id.to_string(),
            username: "Test User".to_string(),
            email: email.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn insert_and_find_user() {
        let db = ChatDb::in_memory().unwrap();
        db.insert_user(&user("USR0001", "a@example.com")).unwrap();

        let found = db.find_user_by_email("a@example.com").unwrap().unwrap();
        assert_eq!(found.user_id, "USR0001");

        assert!(db.find_user("a@example.com", "USR0001").unwrap().is_some());
        assert!(db.find_user("a@example.com", "USR0002").unwrap().is_none());
        assert!(db.find_user_by_email("b@example.com").unwrap().is_none());
    }

    #[test]
    fn duplicate_email_is_rejected_by_the_store() {
        let db = ChatDb::in_memory().unwrap();
        db.insert_user(&user("USR0001", "a@example.com")).unwrap();
        assert!(db.insert_user(&user("USR0002", "a@example.com")).is_err());
    }

    #[test]
    fn latest_user_id_tracks_creation_order() {
        let db = ChatDb::in_memory().unwrap();
        assert!(db.latest_user_id().unwrap().is_none());

        db.insert_user(&user("USR0001", "a@example.com")).unwrap();
        db.insert_user(&user("USR0002", "b@example.com")).unwrap();
        assert_eq!(db.latest_user_id().unwrap().unwrap(), "USR0002");
    }

    #[test]
    fn chats_round_trip_and_list_most_recent_first() {
        let db = ChatDb::in_memory().unwrap();

        let mut older = ChatRecord::new(
            "USR0001",
            "first chat",
            vec![ChatMessage::user("hi"), ChatMessage::assistant("hello")],
            ChatMode::Global,
        );
        older.timestamp = Utc::now() - chrono::Duration::minutes(5);
        let newer = ChatRecord::new(
            "USR0001",
            "second chat",
            vec![ChatMessage::user("more")],
            ChatMode::Local,
        );

        db.insert_chat(&older).unwrap();
        db.insert_chat(&newer).unwrap();

        let chats = db.list_chats("USR0001").unwrap();
        assert_eq!(chats.len(), 2);
        assert_eq!(chats[0].title, "second chat");
        assert_eq!(chats[0].mode, ChatMode::Local);
        assert_eq!(chats[1].chat.len(), 2);
        assert_eq!(chats[1].chat[1], ChatMessage::assistant("hello"));

        assert!(db.list_chats("USR0002").unwrap().is_empty());
    }

    #[test]
    fn update_chat_replaces_title_and_transcript() {
        let db = ChatDb::in_memory().unwrap();
        let mut record = ChatRecord::new(
            "USR0001",
            "before",
            vec![ChatMessage::user("one")],
            ChatMode::Global,
        );
        db.insert_chat(&record).unwrap();

        record.title = "after".to_string();
        record.chat.push(ChatMessage::assistant("two"));
        db.update_chat(&record).unwrap();

        let chats = db.list_chats("USR0001").unwrap();
        assert_eq!(chats[0].title, "after");
        assert_eq!(chats[0].chat.len(), 2);
    }

    #[test]
    fn delete_chat_removes_the_record() {
        let db = ChatDb::in_memory().unwrap();
        let record = ChatRecord::new(
            "USR0001",
            "to delete",
            vec![ChatMessage::user("bye")],
            ChatMode::Global,
        );
        db.insert_chat(&record).unwrap();

        assert!(db.delete_chat(&record.id).unwrap());
        assert!(!db.delete_chat(&record.id).unwrap());
        assert!(db.list_chats("USR0001").unwrap().is_empty());
    }
}
