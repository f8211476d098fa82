//! SQLite implementation of the UserRepository.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::adapters::sqlite::{parse_datetime, parse_optional_datetime};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Chat, ChatRecord, User};
use crate::domain::ports::UserRepository;

pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn with_chats(&self, row: Option<UserRow>) -> DomainResult<Option<User>> {
        let Some(row) = row else {
            return Ok(None);
        };

        let chats: Vec<ChatRow> =
            sqlx::query_as("SELECT * FROM chats WHERE user_id = ? ORDER BY id")
                .bind(row.id)
                .fetch_all(&self.pool)
                .await?;

        let mut user = User::try_from(row)?;
        user.chats = chats.into_iter().map(ChatRecord::from).collect();
        Ok(Some(user))
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn get_by_telegram_id(&self, telegram_id: i64) -> DomainResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE telegram_id = ?")
            .bind(telegram_id)
            .fetch_optional(&self.pool)
            .await?;

        self.with_chats(row).await
    }

    async fn get_by_token_with_chats(&self, token: &str) -> DomainResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE token = ?")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;

        self.with_chats(row).await
    }

    async fn get_by_webapp_id_with_chats(&self, webapp_id: i64) -> DomainResult<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as("SELECT * FROM users WHERE webapp_id = ? ORDER BY id LIMIT 1")
                .bind(webapp_id)
                .fetch_optional(&self.pool)
                .await?;

        self.with_chats(row).await
    }

    async fn get_or_create(&self, telegram_id: i64, chat: &Chat) -> DomainResult<User> {
        let mut tx = self.pool.begin().await?;

        // Concurrent callers race on the UNIQUE constraints; the loser's
        // insert is a no-op and both read the same row afterwards.
        sqlx::query(
            "INSERT INTO users (telegram_id, created_at) VALUES (?, ?)
             ON CONFLICT(telegram_id) DO NOTHING",
        )
        .bind(telegram_id)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await?;

        let (user_id,): (i64,) = sqlx::query_as("SELECT id FROM users WHERE telegram_id = ?")
            .bind(telegram_id)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO chats (telegram_id, chat_type, user_id) VALUES (?, ?, ?)
             ON CONFLICT(telegram_id) DO UPDATE SET user_id = COALESCE(chats.user_id, excluded.user_id)",
        )
        .bind(chat.id)
        .bind(&chat.chat_type)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get_by_telegram_id(telegram_id)
            .await?
            .ok_or(DomainError::UserNotFound(user_id))
    }

    async fn update(&self, user: &User) -> DomainResult<()> {
        let result = sqlx::query(
            "UPDATE users SET webapp_id = ?, activated_at = ?, token = ?, token_expires_at = ?
             WHERE id = ?",
        )
        .bind(user.webapp_id)
        .bind(user.activated_at.map(|dt| dt.to_rfc3339()))
        .bind(&user.token)
        .bind(user.token_expires_at.map(|dt| dt.to_rfc3339()))
        .bind(user.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::UserNotFound(user.id));
        }

        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    telegram_id: i64,
    webapp_id: Option<i64>,
    created_at: String,
    activated_at: Option<String>,
    token: Option<String>,
    token_expires_at: Option<String>,
}

impl TryFrom<UserRow> for User {
    type Error = DomainError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            telegram_id: row.telegram_id,
            webapp_id: row.webapp_id,
            created_at: parse_datetime(&row.created_at)?,
            activated_at: parse_optional_datetime(row.activated_at)?,
            token: row.token,
            token_expires_at: parse_optional_datetime(row.token_expires_at)?,
            chats: Vec::new(),
        })
    }
}

#[derive(sqlx::FromRow)]
struct ChatRow {
    id: i64,
    telegram_id: i64,
    chat_type: String,
    user_id: Option<i64>,
}

impl From<ChatRow> for ChatRecord {
    fn from(row: ChatRow) -> Self {
        ChatRecord {
            id: row.id,
            telegram_id: row.telegram_id,
            chat_type: row.chat_type,
            user_id: row.user_id,
        }
    }
}
