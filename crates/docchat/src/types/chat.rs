//! Chat transcript and account record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of a chat message author
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One message in a chat transcript
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Chat mode: ungrounded or grounded in the user's documents
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    /// Answer from the model alone, with the full transcript as context
    #[default]
    Global,
    /// Answer only from the user's uploaded documents
    Local,
}

impl ChatMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Local => "local",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "local" => Self::Local,
            _ => Self::Global,
        }
    }
}

/// A persisted chat transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRecord {
    /// Record ID
    pub id: String,
    /// Owning user
    pub user_id: String,
    /// Title derived from the first message
    pub title: String,
    /// Ordered transcript
    pub chat: Vec<ChatMessage>,
    /// Creation time
    pub timestamp: DateTime<Utc>,
    /// Mode the chat was held in
    pub mode: ChatMode,
}

impl ChatRecord {
    pub fn new(user_id: &str, title: &str, chat: Vec<ChatMessage>, mode: ChatMode) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title: title.to_string(),
            chat,
            timestamp: Utc::now(),
            mode,
        }
    }
}

/// A registered user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    /// ID of the form USR0001
    pub user_id: String,
    /// Display name
    pub username: String,
    /// Login email (stored lowercase)
    pub email: String,
    /// Registration time
    pub created_at: DateTime<Utc>,
}
