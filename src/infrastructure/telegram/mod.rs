//! Telegram Bot API client
//!
//! reqwest-backed implementation of the `ChatClient` port.

pub mod client;

pub use client::TelegramClient;
