//! Implementation of the `gcservant register-commands` command.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::domain::ports::ChatClient;
use crate::infrastructure::telegram::TelegramClient;
use crate::services::HandlerRegistry;

pub async fn execute(config_path: Option<&Path>) -> Result<()> {
    let (config, _logger) = super::bootstrap(config_path)?;

    let client = TelegramClient::new(&config.bot)?;
    let commands = HandlerRegistry::builtin().bot_commands();
    client
        .set_my_commands(&commands)
        .await
        .context("Failed to set bot commands")?;

    info!(count = commands.len(), "bot command list published");
    Ok(())
}
