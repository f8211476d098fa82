//! Update feed domain model.
//!
//! Raw updates are kept as JSON objects so that a single unexpected update
//! never makes a whole batch unreadable; only `update_id` is required to
//! advance the cursor. Typed views are parsed on demand by the classifier.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single item of the long-poll feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawUpdate {
    /// Monotonic feed position of this update
    pub update_id: i64,
    /// Remaining fields (`message`, `callback_query`, ...)
    #[serde(flatten)]
    pub body: Map<String, Value>,
}

impl RawUpdate {
    pub fn new(update_id: i64, body: Map<String, Value>) -> Self {
        Self { update_id, body }
    }

    /// Whole update as a JSON value, `update_id` included.
    pub fn to_value(&self) -> Value {
        let mut object = self.body.clone();
        object.insert("update_id".to_string(), Value::from(self.update_id));
        Value::Object(object)
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.body.get(name)
    }
}

/// Chat a message was posted in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub chat_type: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// Author of a message or callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

/// Channel or group a message was forwarded from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardFromChat {
    pub id: i64,
    #[serde(rename = "type")]
    pub chat_type: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

/// Tagged span of a message text. Offsets count UTF-16 code units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEntity {
    pub offset: usize,
    pub length: usize,
    #[serde(rename = "type")]
    pub kind: EntityKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    BotCommand,
    Hashtag,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub date: i64,
    #[serde(default)]
    pub from: Option<Sender>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub entities: Vec<MessageEntity>,
    #[serde(default)]
    pub forward_from_chat: Option<ForwardFromChat>,
}

impl Message {
    pub fn entities_of(&self, kind: EntityKind) -> impl Iterator<Item = &MessageEntity> {
        self.entities.iter().filter(move |e| e.kind == kind)
    }

    /// Text covered by `entity`, without its leading sigil (`/` or `#`).
    pub fn entity_text(&self, entity: &MessageEntity) -> Option<String> {
        let text = self.text.as_deref()?;
        let start = entity.offset.checked_add(1)?;
        let end = entity.offset.checked_add(entity.length)?;
        utf16_slice(text, start, end)
    }

    /// Text following `entity` and one separating character.
    pub fn text_after(&self, entity: &MessageEntity) -> String {
        let Some(text) = self.text.as_deref() else {
            return String::new();
        };
        let Some(start) = entity
            .offset
            .checked_add(entity.length)
            .and_then(|end| end.checked_add(1))
        else {
            return String::new();
        };
        let total = text.encode_utf16().count();
        utf16_slice(text, start, total).unwrap_or_default()
    }

    /// Identity of the author, falling back to the chat for anonymous posts.
    pub fn sender_id(&self) -> i64 {
        self.from.as_ref().map_or(self.chat.id, |sender| sender.id)
    }
}

/// Slice `text` by UTF-16 code unit positions, as the platform reports them.
fn utf16_slice(text: &str, start: usize, end: usize) -> Option<String> {
    let units: Vec<u16> = text.encode_utf16().collect();
    if start > end || end > units.len() {
        return None;
    }
    Some(String::from_utf16_lossy(&units[start..end]))
}

/// Callback query as delivered on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCallbackQuery {
    pub id: String,
    #[serde(default)]
    pub from: Option<Sender>,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub data: Option<String>,
}

/// Callback query with its `data` decoded.
///
/// Non-JSON (or non-object) data is preserved under the `raw` key.
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackQuery {
    pub id: String,
    pub from: Option<Sender>,
    pub message_id: Option<i64>,
    pub chat_id: Option<i64>,
    pub data: Map<String, Value>,
}

impl From<RawCallbackQuery> for CallbackQuery {
    fn from(raw: RawCallbackQuery) -> Self {
        let data = match raw.data {
            Some(data) => match serde_json::from_str::<Value>(&data) {
                Ok(Value::Object(map)) => map,
                _ => {
                    let mut map = Map::new();
                    map.insert("raw".to_string(), Value::String(data));
                    map
                }
            },
            None => Map::new(),
        };

        Self {
            id: raw.id,
            from: raw.from,
            message_id: raw.message.as_ref().map(|m| m.message_id),
            chat_id: raw.message.as_ref().map(|m| m.chat.id),
            data,
        }
    }
}

impl CallbackQuery {
    /// Routing key of the callback (`data.type`).
    pub fn callback_type(&self) -> Option<&str> {
        self.data.get("type").and_then(Value::as_str)
    }
}
