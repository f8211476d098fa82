//! Update classification.
//!
//! Turns a raw feed item into one of a small set of typed events. Checks run
//! in priority order and the first match wins: forwarded-chat metadata, a
//! leading bot command, then hashtags.

use tracing::debug;

use crate::domain::models::{
    CallbackQuery, Command, EntityKind, ForwardFromChat, Message, RawCallbackQuery, RawUpdate,
    SourceSpan,
};

#[derive(Debug, Clone, PartialEq)]
pub enum UpdateKind {
    CommandMessage { message: Message, command: Command },
    Callback(CallbackQuery),
    ForwardedMessage { message: Message, from_chat: ForwardFromChat },
    TaggedMessage { message: Message, tags: Vec<String> },
    Unrecognized,
}

impl UpdateKind {
    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::CommandMessage { .. } => "command",
            Self::Callback(_) => "callback",
            Self::ForwardedMessage { .. } => "forwarded",
            Self::TaggedMessage { .. } => "tagged",
            Self::Unrecognized => "unrecognized",
        }
    }
}

pub fn classify(update: &RawUpdate) -> UpdateKind {
    if let Some(message) = parse_field::<Message>(update, "message") {
        return classify_message(message);
    }

    if let Some(raw) = parse_field::<RawCallbackQuery>(update, "callback_query") {
        return UpdateKind::Callback(CallbackQuery::from(raw));
    }

    UpdateKind::Unrecognized
}

fn parse_field<T: serde::de::DeserializeOwned>(update: &RawUpdate, name: &str) -> Option<T> {
    let value = update.field(name)?;
    match serde_json::from_value(value.clone()) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            debug!(update_id = update.update_id, field = name, error = %err, "unreadable update field");
            None
        }
    }
}

fn classify_message(message: Message) -> UpdateKind {
    if let Some(from_chat) = message.forward_from_chat.clone() {
        return UpdateKind::ForwardedMessage { message, from_chat };
    }

    // A command that does not open the message falls through to the tag check.
    if let Some(command) = extract_command(&message).filter(Command::is_leading) {
        return UpdateKind::CommandMessage { message, command };
    }

    let tags: Vec<String> = message
        .entities_of(EntityKind::Hashtag)
        .filter_map(|entity| message.entity_text(entity))
        .collect();
    if !tags.is_empty() {
        return UpdateKind::TaggedMessage { message, tags };
    }

    UpdateKind::Unrecognized
}

/// Build a command from the first `bot_command` entity of `message`.
pub fn extract_command(message: &Message) -> Option<Command> {
    let entity = message.entities_of(EntityKind::BotCommand).next()?;
    let text = message.entity_text(entity)?;

    let (name, target_bot) = match text.split_once('@') {
        // A bare trailing `@` addresses nobody.
        Some((name, target)) => {
            let target = Some(target).filter(|t| !t.is_empty());
            (name, target.map(str::to_string))
        }
        None => (text.as_str(), None),
    };

    let raw_args = message
        .text_after(entity)
        .split_whitespace()
        .map(str::to_string)
        .collect();

    Some(Command {
        name: name.to_lowercase(),
        raw_args,
        target_bot,
        span: SourceSpan {
            offset: entity.offset,
            length: entity.length,
        },
    })
}
