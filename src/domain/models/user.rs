//! Bot user and chat records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A chat known to the bot, optionally owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRecord {
    pub id: i64,
    /// Platform chat id
    pub telegram_id: i64,
    pub chat_type: String,
    pub user_id: Option<i64>,
}

/// A platform user, possibly linked to a web application account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    /// Platform user id
    pub telegram_id: i64,
    /// Web application account id, set once linking completes
    pub webapp_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub activated_at: Option<DateTime<Utc>>,
    /// One-time link token handed to the web application
    pub token: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub chats: Vec<ChatRecord>,
}

impl User {
    pub fn is_active(&self) -> bool {
        self.activated_at.is_some()
    }

    /// Destination for direct notifications.
    pub fn chat(&self) -> Option<&ChatRecord> {
        self.chats.first()
    }

    /// True when a token is set and has not expired at `now`.
    pub fn has_valid_token(&self, now: DateTime<Utc>) -> bool {
        match (&self.token, self.token_expires_at) {
            (Some(_), Some(expires_at)) => expires_at > now,
            (Some(_), None) => true,
            _ => false,
        }
    }

    /// Record a successful link and consume the one-time token.
    pub fn activate(&mut self, webapp_id: i64, now: DateTime<Utc>) {
        self.webapp_id = Some(webapp_id);
        self.activated_at = Some(now);
        self.token = None;
        self.token_expires_at = None;
    }
}
