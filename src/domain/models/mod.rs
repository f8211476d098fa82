pub mod command;
pub mod config;
pub mod event;
pub mod update;
pub mod user;

pub use command::{Command, SourceSpan};
pub use config::{
    BotConfig, Config, DatabaseConfig, EventsConfig, LinkConfig, LogFormat, LoggingConfig,
    RotationPolicy, WebappConfig,
};
pub use event::{
    AccountLinkedPayload, ExternalEvent, UserMessagePayload, BOT_ACCOUNT_LINKED, USER_EVENT,
};
pub use update::{
    CallbackQuery, Chat, EntityKind, ForwardFromChat, Message, MessageEntity, RawCallbackQuery,
    RawUpdate, Sender,
};
pub use user::{ChatRecord, User};
