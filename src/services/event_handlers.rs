//! Handlers for externally produced events.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use crate::domain::models::{
    AccountLinkedPayload, ExternalEvent, User, UserMessagePayload, BOT_ACCOUNT_LINKED, USER_EVENT,
};
use crate::domain::ports::{ChatClient, MessageOptions, UserRepository};

pub const ACCOUNT_LINKED_MESSAGE: &str =
    "Your happiness-mj.xyz account has been linked successfully!";

#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Value of `event.type` this handler consumes
    fn event_type(&self) -> &'static str;

    async fn handle(&self, event: &ExternalEvent) -> anyhow::Result<()>;
}

/// Explicit event type to handler map.
#[derive(Default)]
pub struct EventRouter {
    handlers: HashMap<&'static str, Arc<dyn EventHandler>>,
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Router with the built-in handlers registered.
    pub fn builtin(chat: Arc<dyn ChatClient>, users: Arc<dyn UserRepository>) -> Self {
        let mut router = Self::new();
        router.register(Arc::new(UserNotificationHandler::new(
            Arc::clone(&chat),
            Arc::clone(&users),
        )));
        router.register(Arc::new(AccountLinkedHandler::new(chat, users)));
        router
    }

    /// Register `handler`, replacing any handler of the same type.
    pub fn register(&mut self, handler: Arc<dyn EventHandler>) {
        let event_type = handler.event_type();
        if self.handlers.insert(event_type, handler).is_some() {
            warn!(event_type, "event handler replaced");
        }
    }

    pub fn route(&self, event_type: &str) -> Option<Arc<dyn EventHandler>> {
        self.handlers.get(event_type).cloned()
    }

    pub fn event_types(&self) -> Vec<&'static str> {
        let mut types: Vec<_> = self.handlers.keys().copied().collect();
        types.sort_unstable();
        types
    }
}

async fn notify(chat: &dyn ChatClient, user: &User, text: &str) -> anyhow::Result<()> {
    let Some(destination) = user.chat() else {
        warn!(user_id = user.id, "user has no chat to notify");
        return Ok(());
    };
    chat.post_message(destination.telegram_id, text, MessageOptions::default())
        .await
        .context("Failed to post notification")?;
    Ok(())
}

// ============================================================================
// UserNotificationHandler
// ============================================================================

/// Posts a message from the web application to a linked user.
pub struct UserNotificationHandler {
    chat: Arc<dyn ChatClient>,
    users: Arc<dyn UserRepository>,
}

impl UserNotificationHandler {
    pub fn new(chat: Arc<dyn ChatClient>, users: Arc<dyn UserRepository>) -> Self {
        Self { chat, users }
    }
}

#[async_trait]
impl EventHandler for UserNotificationHandler {
    fn event_type(&self) -> &'static str {
        USER_EVENT
    }

    #[instrument(skip_all, fields(event_id = %event.id))]
    async fn handle(&self, event: &ExternalEvent) -> anyhow::Result<()> {
        let payload: UserMessagePayload = event.payload_as().context("Invalid user_event payload")?;

        let Some(user) = self.users.get_by_webapp_id_with_chats(payload.user_id).await? else {
            debug!(webapp_id = payload.user_id, "no user for notification");
            return Ok(());
        };

        notify(self.chat.as_ref(), &user, &payload.message).await
    }
}

// ============================================================================
// AccountLinkedHandler
// ============================================================================

/// Completes account linking once the web application redeemed a token.
pub struct AccountLinkedHandler {
    chat: Arc<dyn ChatClient>,
    users: Arc<dyn UserRepository>,
}

impl AccountLinkedHandler {
    pub fn new(chat: Arc<dyn ChatClient>, users: Arc<dyn UserRepository>) -> Self {
        Self { chat, users }
    }
}

#[async_trait]
impl EventHandler for AccountLinkedHandler {
    fn event_type(&self) -> &'static str {
        BOT_ACCOUNT_LINKED
    }

    #[instrument(skip_all, fields(event_id = %event.id))]
    async fn handle(&self, event: &ExternalEvent) -> anyhow::Result<()> {
        let payload: AccountLinkedPayload =
            event.payload_as().context("Invalid bot_account_linked payload")?;

        let now = Utc::now();
        let user = self.users.get_by_token_with_chats(&payload.token).await?;
        let Some(mut user) = user.filter(|u| u.has_valid_token(now)) else {
            debug!("link token unknown or expired");
            return Ok(());
        };

        user.activate(payload.user_id, now);
        self.users.update(&user).await.context("Failed to activate user")?;
        info!(user_id = user.id, webapp_id = payload.user_id, "account linked");

        notify(self.chat.as_ref(), &user, ACCOUNT_LINKED_MESSAGE).await
    }
}
