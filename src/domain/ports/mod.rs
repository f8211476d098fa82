//! Port trait definitions (Hexagonal Architecture)
//!
//! Async trait interfaces that infrastructure adapters implement:
//! - `ChatClient`: chat-platform Bot API
//! - `UserRepository`: user and chat persistence
//! - `LinkService`: companion web application
//! - `EventQueue`: shared external event queue

pub mod chat_client;
pub mod errors;
pub mod event_queue;
pub mod link_service;
pub mod user_repository;

pub use chat_client::{BotCommand, ChatClient, MessageOptions, UpdatesRequest};
pub use errors::{ChatClientError, LinkServiceError, QueueError};
pub use event_queue::EventQueue;
pub use link_service::{LinkService, LinkTokenResponse};
pub use user_repository::UserRepository;
