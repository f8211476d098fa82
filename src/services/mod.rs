//! Update ingestion and dispatch services.

pub mod bot_context;
pub mod classifier;
pub mod command_handlers;
pub mod event_drain;
pub mod event_handlers;
pub mod fetcher;
pub mod handler_registry;
pub mod polling_loop;
pub mod task_manager;
pub mod validation;

pub use bot_context::BotContext;
pub use classifier::{classify, UpdateKind};
pub use command_handlers::{CommandHandler, HandlerDeps};
pub use event_drain::EventDrain;
pub use event_handlers::{EventHandler, EventRouter};
pub use fetcher::UpdateFetcher;
pub use handler_registry::{HandlerDescriptor, HandlerRegistry};
pub use polling_loop::Bot;
pub use task_manager::{TaskId, TaskManager, TaskManagerError};
pub use validation::{ArgumentCount, Validation, Validator};
