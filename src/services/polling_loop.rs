//! Update polling loop.
//!
//! Fetches batches from the chat platform and, for each update in order,
//! classifies it, resolves its handler, validates its arguments and submits
//! the handler to the bounded task manager. Handler executions may finish out
//! of order; classification and validation never do.

use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, error, info, warn, Level};

use crate::domain::models::{BotConfig, CallbackQuery, Command, Message, RawUpdate};
use crate::domain::ports::{ChatClient, MessageOptions};
use crate::infrastructure::logging::redact_update;
use crate::services::classifier::{classify, UpdateKind};
use crate::services::command_handlers::{escape_html, HandlerDeps};
use crate::services::fetcher::UpdateFetcher;
use crate::services::handler_registry::HandlerRegistry;
use crate::services::task_manager::TaskManager;

pub struct Bot {
    username: String,
    fetcher: UpdateFetcher,
    registry: Arc<HandlerRegistry>,
    deps: HandlerDeps,
    tasks: TaskManager,
}

impl Bot {
    pub fn new(config: &BotConfig, registry: Arc<HandlerRegistry>, deps: HandlerDeps) -> Self {
        Self {
            username: config.username.clone(),
            fetcher: UpdateFetcher::from_config(Arc::clone(&deps.chat), config),
            registry,
            deps,
            tasks: TaskManager::new("updates", config.max_parallel_tasks),
        }
    }

    pub fn cursor(&self) -> Option<i64> {
        self.fetcher.cursor()
    }

    pub fn task_manager(&self) -> &TaskManager {
        &self.tasks
    }

    fn chat(&self) -> &dyn ChatClient {
        self.deps.chat.as_ref()
    }

    /// Publish the public command list to the platform.
    pub async fn publish_commands(&self) -> anyhow::Result<()> {
        let commands = self.registry.bot_commands();
        info!(count = commands.len(), "setting bot command list");
        self.chat()
            .set_my_commands(&commands)
            .await
            .context("Failed to set bot commands")
    }

    /// Poll until `shutdown` resolves, then wait for in-flight handlers.
    ///
    /// A fetch failure ends the loop with an error.
    pub async fn run_until<S>(&mut self, shutdown: S) -> anyhow::Result<()>
    where
        S: Future<Output = ()>,
    {
        info!(username = %self.username, "starting the polling loop");
        tokio::pin!(shutdown);

        let result = 'poll: loop {
            let batch = tokio::select! {
                biased;
                () = &mut shutdown => break Ok(()),
                batch = self.fetcher.fetch() => batch,
            };

            let updates = match batch.context("Failed to fetch updates") {
                Ok(updates) => updates,
                Err(err) => break Err(err),
            };
            if !updates.is_empty() {
                debug!(count = updates.len(), cursor = ?self.fetcher.cursor(), "updates received");
            }

            for update in &updates {
                if let Err(err) = self.process_update(update).await {
                    break 'poll Err(err);
                }
            }
        };

        info!("polling loop stopping, waiting for in-flight handlers");
        self.tasks.shutdown().await;
        result
    }

    /// Route a single update. Only a task manager that was shut down fails.
    pub async fn process_update(&self, update: &RawUpdate) -> anyhow::Result<()> {
        if tracing::enabled!(Level::DEBUG) {
            debug!(update = %redact_update(&update.to_value()), "processing update");
        }

        match classify(update) {
            UpdateKind::CommandMessage { message, command } => {
                self.process_command(message, command).await
            }
            UpdateKind::Callback(callback) => self.process_callback(callback).await,
            UpdateKind::ForwardedMessage { message, from_chat } => {
                debug!(chat_id = message.chat.id, from_chat_id = from_chat.id, "forwarded message");
                Ok(())
            }
            UpdateKind::TaggedMessage { message, tags } => {
                debug!(chat_id = message.chat.id, ?tags, "tagged message");
                Ok(())
            }
            UpdateKind::Unrecognized => {
                debug!(update_id = update.update_id, "unrecognized update");
                Ok(())
            }
        }
    }

    async fn process_command(&self, message: Message, command: Command) -> anyhow::Result<()> {
        if !command.is_addressed_to(&self.username) {
            debug!(
                command = %command.name,
                target = ?command.target_bot,
                "command addressed to another bot"
            );
            return Ok(());
        }

        let Some(descriptor) = self.registry.lookup(&command.name) else {
            let text = format!("Unrecognized command: {}", escape_html(&command.name));
            self.reply_now(&message, &text).await;
            return Ok(());
        };

        if let Err(err) = descriptor.validation.validate(&command) {
            debug!(command = %command.name, error = %err, "command rejected");
            self.reply_now(&message, &escape_html(&err.message)).await;
            return Ok(());
        }

        let handler = descriptor.build(&self.deps);
        let task_id = self
            .tasks
            .submit(async move { handler.process(&message, &command).await })
            .await?;
        debug!(command = descriptor.command, %task_id, "command submitted");
        Ok(())
    }

    async fn process_callback(&self, callback: CallbackQuery) -> anyhow::Result<()> {
        let Some(callback_type) = callback.callback_type() else {
            error!(callback_id = %callback.id, "callback query without a type");
            return Ok(());
        };

        let Some(descriptor) = self.registry.lookup_callback(callback_type) else {
            warn!(callback_type, "no handler for callback type");
            return Ok(());
        };

        let handler = descriptor.build(&self.deps);
        self.tasks
            .submit(async move { handler.process_callback(&callback).await })
            .await?;
        Ok(())
    }

    /// Reply on the loop itself. Failures are logged, never propagated.
    async fn reply_now(&self, message: &Message, text: &str) {
        if let Err(err) = self
            .chat()
            .reply(message, text, MessageOptions::default())
            .await
        {
            warn!(chat_id = message.chat.id, error = %err, "failed to send reply");
        }
    }
}
