use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Chat, User};

/// Repository port for users and their chats.
///
/// Every method runs in its own short-lived statement or transaction; users
/// are returned with their chats loaded.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Get a user by platform user id
    async fn get_by_telegram_id(&self, telegram_id: i64) -> DomainResult<Option<User>>;

    /// Get the user holding a one-time link token
    async fn get_by_token_with_chats(&self, token: &str) -> DomainResult<Option<User>>;

    /// Get a user by web application account id
    async fn get_by_webapp_id_with_chats(&self, webapp_id: i64) -> DomainResult<Option<User>>;

    /// Read the user for `telegram_id`, creating it and attaching `chat` if needed.
    ///
    /// Safe to call concurrently for the same identity.
    async fn get_or_create(&self, telegram_id: i64, chat: &Chat) -> DomainResult<User>;

    /// Persist the mutable user fields
    async fn update(&self, user: &User) -> DomainResult<()>;
}
