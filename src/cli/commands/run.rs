//! Implementation of the `gcservant run` command.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::{error, info};

use crate::adapters::redis::RedisEventQueue;
use crate::adapters::sqlite::{initialize_database, SqliteUserRepository};
use crate::domain::ports::{ChatClient, EventQueue, LinkService, UserRepository};
use crate::infrastructure::telegram::TelegramClient;
use crate::infrastructure::webapp::WebappClient;
use crate::services::{Bot, EventDrain, EventRouter, HandlerDeps, HandlerRegistry};

pub async fn execute(config_path: Option<&Path>) -> Result<()> {
    let (config, _logger) = super::bootstrap(config_path)?;
    info!(version = env!("CARGO_PKG_VERSION"), username = %config.bot.username, "starting gcservant");

    let pool = initialize_database(&config.database)
        .await
        .context("Failed to initialize database")?;
    let users: Arc<dyn UserRepository> = Arc::new(SqliteUserRepository::new(pool));

    let chat: Arc<dyn ChatClient> = Arc::new(TelegramClient::new(&config.bot)?);
    let links: Arc<dyn LinkService> = Arc::new(WebappClient::new(&config.webapp)?);
    let queue: Arc<dyn EventQueue> = Arc::new(
        RedisEventQueue::connect(&config.events.redis_url, config.events.queue.clone())
            .await
            .context("Failed to connect to the event queue")?,
    );

    let registry = Arc::new(HandlerRegistry::builtin());
    let deps = HandlerDeps::new(
        Arc::clone(&chat),
        Arc::clone(&users),
        links,
        config.link.clone(),
        &registry,
    );
    let mut bot = Bot::new(&config.bot, Arc::clone(&registry), deps);
    if config.bot.register_commands {
        bot.publish_commands().await?;
    }

    let drain = EventDrain::new(
        queue,
        EventRouter::builtin(chat, users),
        config.events.max_parallel_tasks,
    );

    let (stop_tx, stop_rx) = watch::channel(false);
    let stop_tx = Arc::new(stop_tx);
    let signal_listener = tokio::spawn(stop_on_ctrl_c(Arc::clone(&stop_tx)));

    // Either loop ending stops the other, so both drain their tasks.
    let polling = async {
        let result = bot.run_until(stopped(stop_rx.clone())).await;
        stop_tx.send_replace(true);
        result
    };
    let draining = async {
        let result = drain.run_until(stopped(stop_rx.clone())).await;
        stop_tx.send_replace(true);
        result
    };
    let (polled, drained) = tokio::join!(polling, draining);
    signal_listener.abort();

    polled?;
    drained?;
    info!("gcservant stopped");
    Ok(())
}

async fn stop_on_ctrl_c(stop_tx: Arc<watch::Sender<bool>>) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("received Ctrl-C, shutting down"),
        Err(err) => error!(error = %err, "failed to listen for Ctrl-C, shutting down"),
    }
    stop_tx.send_replace(true);
}

/// Resolves once the stop flag is raised or its sender is gone.
fn stopped(mut stop_rx: watch::Receiver<bool>) -> impl Future<Output = ()> {
    async move {
        let _ = stop_rx.wait_for(|stop| *stop).await;
    }
}
