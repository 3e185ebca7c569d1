//! User registration and login

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::storage::ChatDb;
use crate::types::UserRecord;
use crate::uploads::UploadStore;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.-]+@[\w.-]+\.\w+$").expect("valid email regex"));

/// Check an email address's format
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Registration and login over the user store
pub struct AccountManager {
    db: Arc<ChatDb>,
    uploads: Arc<UploadStore>,
}

impl AccountManager {
    /// Create a manager over the given store and upload root
    pub fn new(db: Arc<ChatDb>, uploads: Arc<UploadStore>) -> Self {
        Self { db, uploads }
    }

    /// Register a new account.
    ///
    /// Emails are stored lowercase and must be unique. Registration also
    /// creates the user's uploads directory so the first upload never races
    /// directory creation.
    pub fn register(&self, username: &str, email: &str) -> Result<UserRecord> {
        let username = username.trim();
        let email = email.trim().to_lowercase();

        if username.is_empty() || email.is_empty() {
            return Err(Error::account("name and email are required"));
        }
        if !is_valid_email(&email) {
            return Err(Error::account(format!("invalid email format: {}", email)));
        }
        if self.db.find_user_by_email(&email)?.is_some() {
            return Err(Error::account("email already registered, please log in"));
        }

        let user = UserRecord {
            user_id: self.next_user_id()?,
            username: username.to_string(),
            email,
            created_at: Utc::now(),
        };

        self.db.insert_user(&user)?;
        self.uploads.user_dir(&user.user_id)?;

        tracing::info!(user = %user.user_id, "registered new account");
        Ok(user)
    }

    /// Log in with an email and user id pair
    pub fn login(&self, email: &str, user_id: &str) -> Result<UserRecord> {
        let email = email.trim().to_lowercase();
        let user_id = user_id.trim().to_uppercase();

        if email.is_empty() || user_id.is_empty() {
            return Err(Error::account("email and user id are required"));
        }

        self.db
            .find_user(&email, &user_id)?
            .ok_or_else(|| Error::account("email or user id not found"))
    }

    /// Allocate the next user id: USR followed by a zero-padded counter,
    /// derived from the most recently created user.
    fn next_user_id(&self) -> Result<String> {
        let id = match self.db.latest_user_id()? {
            None => "USR0001".to_string(),
            Some(last) => {
                let number: u32 = last
                    .strip_prefix("USR")
                    .and_then(|n| n.parse().ok())
                    .ok_or_else(|| Error::store(format!("malformed user id: {}", last)))?;
                format!("USR{:04}", number + 1)
            }
        };
        Ok(id)
    }
}
