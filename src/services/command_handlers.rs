//! Built-in command handlers.
//!
//! Each handler is constructed per invocation from [`HandlerDeps`] and runs
//! inside a task manager slot, so a failure here never reaches the polling
//! loop.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::models::{CallbackQuery, Command, LinkConfig, Message};
use crate::domain::ports::{BotCommand, ChatClient, LinkService, MessageOptions, UserRepository};
use crate::services::bot_context::BotContext;
use crate::services::handler_registry::HandlerRegistry;

/// Shared collaborators handed to every handler constructor.
#[derive(Clone)]
pub struct HandlerDeps {
    pub chat: Arc<dyn ChatClient>,
    pub users: Arc<dyn UserRepository>,
    pub links: Arc<dyn LinkService>,
    pub context: Arc<BotContext>,
    pub link: LinkConfig,
    /// Public command list, in registration order
    pub commands: Arc<[BotCommand]>,
}

impl HandlerDeps {
    pub fn new(
        chat: Arc<dyn ChatClient>,
        users: Arc<dyn UserRepository>,
        links: Arc<dyn LinkService>,
        link: LinkConfig,
        registry: &HandlerRegistry,
    ) -> Self {
        Self {
            chat,
            users,
            links,
            context: Arc::new(BotContext::new()),
            link,
            commands: registry.bot_commands().into(),
        }
    }
}

#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Run the command carried by `message`.
    async fn process(&self, message: &Message, command: &Command) -> anyhow::Result<()>;

    /// Run a callback query routed to this handler.
    async fn process_callback(&self, callback: &CallbackQuery) -> anyhow::Result<()> {
        warn!(callback_id = %callback.id, "handler does not accept callbacks");
        Ok(())
    }
}

/// Escape text for the HTML parse mode.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

// ============================================================================
// LinkHandler
// ============================================================================

pub const ALREADY_LINKED: &str = "Your happiness-mj.xyz account is already linked.";

/// Hands the caller a one-time URL that links their web application account.
pub struct LinkHandler {
    chat: Arc<dyn ChatClient>,
    users: Arc<dyn UserRepository>,
    links: Arc<dyn LinkService>,
    config: LinkConfig,
}

impl LinkHandler {
    pub fn new(deps: &HandlerDeps) -> Self {
        Self {
            chat: Arc::clone(&deps.chat),
            users: Arc::clone(&deps.users),
            links: Arc::clone(&deps.links),
            config: deps.link.clone(),
        }
    }
}

#[async_trait]
impl CommandHandler for LinkHandler {
    #[instrument(skip_all, fields(chat_id = message.chat.id))]
    async fn process(&self, message: &Message, _command: &Command) -> anyhow::Result<()> {
        let mut user = self
            .users
            .get_or_create(message.sender_id(), &message.chat)
            .await
            .context("Failed to load user")?;

        if user.is_active() {
            self.chat
                .reply(message, ALREADY_LINKED, MessageOptions::default())
                .await?;
            return Ok(());
        }

        let now = Utc::now();
        if !user.has_valid_token(now) {
            let ttl = chrono::Duration::from_std(self.config.token_ttl())
                .context("Link token lifetime out of range")?;
            user.token = Some(Uuid::new_v4().simple().to_string());
            user.token_expires_at = Some(now + ttl);
            self.users
                .update(&user)
                .await
                .context("Failed to store link token")?;
            info!(user_id = user.id, "issued link token");
        }

        let token = user.token.as_deref().context("User has no link token")?;
        let response = self
            .links
            .create_link_token(token)
            .await
            .context("Failed to register link token")?;

        let text = format!(
            "Open <a href=\"{}\">this link</a> to connect your happiness-mj.xyz account.",
            escape_html(&response.url)
        );
        self.chat
            .reply(message, &text, MessageOptions::default().without_preview())
            .await?;
        Ok(())
    }
}

// ============================================================================
// PingHandler
// ============================================================================

pub struct PingHandler {
    chat: Arc<dyn ChatClient>,
}

impl PingHandler {
    pub fn new(deps: &HandlerDeps) -> Self {
        Self {
            chat: Arc::clone(&deps.chat),
        }
    }
}

#[async_trait]
impl CommandHandler for PingHandler {
    async fn process(&self, message: &Message, _command: &Command) -> anyhow::Result<()> {
        self.chat
            .reply(message, "pong", MessageOptions::default())
            .await?;
        Ok(())
    }
}

// ============================================================================
// GithubHandler
// ============================================================================

pub struct GithubHandler {
    chat: Arc<dyn ChatClient>,
}

impl GithubHandler {
    pub fn new(deps: &HandlerDeps) -> Self {
        Self {
            chat: Arc::clone(&deps.chat),
        }
    }
}

#[async_trait]
impl CommandHandler for GithubHandler {
    async fn process(&self, message: &Message, _command: &Command) -> anyhow::Result<()> {
        self.chat
            .reply(
                message,
                "Coming soon...",
                MessageOptions::default().without_preview(),
            )
            .await?;
        Ok(())
    }
}

// ============================================================================
// HelpHandler
// ============================================================================

pub const HELP_HEADER: &str = "Happy bot. Available commands:";

pub struct HelpHandler {
    chat: Arc<dyn ChatClient>,
    commands: Arc<[BotCommand]>,
}

impl HelpHandler {
    pub fn new(deps: &HandlerDeps) -> Self {
        Self {
            chat: Arc::clone(&deps.chat),
            commands: Arc::clone(&deps.commands),
        }
    }

    fn overview(&self) -> String {
        let mut text = HELP_HEADER.to_string();
        for command in self.commands.iter() {
            text.push_str(&format!(
                "\n/{} - {}",
                command.command,
                escape_html(&command.description)
            ));
        }
        text
    }

    fn describe(&self, name: &str) -> String {
        let name = name.trim_start_matches('/').to_lowercase();
        match self.commands.iter().find(|c| c.command == name) {
            Some(command) => format!("/{} - {}", command.command, escape_html(&command.description)),
            None => format!("Unrecognized command: {}", escape_html(&name)),
        }
    }
}

#[async_trait]
impl CommandHandler for HelpHandler {
    async fn process(&self, message: &Message, command: &Command) -> anyhow::Result<()> {
        let text = match command.raw_args.first() {
            Some(name) => self.describe(name),
            None => self.overview(),
        };
        self.chat
            .reply(message, &text, MessageOptions::default())
            .await?;
        Ok(())
    }
}

// ============================================================================
// StatusHandler
// ============================================================================

pub struct StatusHandler {
    chat: Arc<dyn ChatClient>,
    context: Arc<BotContext>,
}

impl StatusHandler {
    pub fn new(deps: &HandlerDeps) -> Self {
        Self {
            chat: Arc::clone(&deps.chat),
            context: Arc::clone(&deps.context),
        }
    }
}

#[async_trait]
impl CommandHandler for StatusHandler {
    async fn process(&self, message: &Message, _command: &Command) -> anyhow::Result<()> {
        self.chat
            .reply(message, &self.context.status(), MessageOptions::default())
            .await?;
        Ok(())
    }
}
