//! Common test utilities for integration tests
//!
//! In-memory fakes of the ports plus update builders.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use gcservant::domain::models::{
    Chat, ChatRecord, LinkConfig, Message, RawUpdate, User,
};
use gcservant::domain::ports::{
    BotCommand, ChatClient, ChatClientError, EventQueue, LinkService, LinkServiceError,
    LinkTokenResponse, MessageOptions, QueueError, UpdatesRequest, UserRepository,
};
use gcservant::domain::{DomainError, DomainResult};
use gcservant::services::{HandlerDeps, HandlerRegistry};

pub const BOT_USERNAME: &str = "gcservantbot";

/// Message posted through the fake client
#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub chat_id: i64,
    pub text: String,
    pub options: MessageOptions,
}

/// Chat client serving scripted batches and recording everything sent.
#[derive(Default)]
pub struct FakeChatClient {
    batches: Mutex<VecDeque<Result<Vec<RawUpdate>, ChatClientError>>>,
    requests: Mutex<Vec<UpdatesRequest>>,
    sent: Mutex<Vec<SentMessage>>,
    published: Mutex<Vec<Vec<BotCommand>>>,
    answered: Mutex<Vec<String>>,
}

impl FakeChatClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_batch(&self, batch: Vec<RawUpdate>) {
        self.batches.lock().unwrap().push_back(Ok(batch));
    }

    pub fn push_error(&self, err: ChatClientError) {
        self.batches.lock().unwrap().push_back(Err(err));
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|m| m.text).collect()
    }

    pub fn requests(&self) -> Vec<UpdatesRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn published(&self) -> Vec<Vec<BotCommand>> {
        self.published.lock().unwrap().clone()
    }

    pub fn answered(&self) -> Vec<String> {
        self.answered.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatClient for FakeChatClient {
    async fn get_updates(&self, request: UpdatesRequest) -> Result<Vec<RawUpdate>, ChatClientError> {
        self.requests.lock().unwrap().push(request);
        let next = self.batches.lock().unwrap().pop_front();
        match next {
            Some(batch) => batch,
            None => {
                // Idle long poll.
                tokio::time::sleep(Duration::from_millis(10)).await;
                Err(ChatClientError::Timeout)
            }
        }
    }

    async fn post_message(
        &self,
        chat_id: i64,
        text: &str,
        options: MessageOptions,
    ) -> Result<(), ChatClientError> {
        self.sent.lock().unwrap().push(SentMessage {
            chat_id,
            text: text.to_string(),
            options,
        });
        Ok(())
    }

    async fn set_my_commands(&self, commands: &[BotCommand]) -> Result<(), ChatClientError> {
        self.published.lock().unwrap().push(commands.to_vec());
        Ok(())
    }

    async fn answer_callback_query(
        &self,
        callback_id: &str,
        _text: Option<&str>,
    ) -> Result<(), ChatClientError> {
        self.answered.lock().unwrap().push(callback_id.to_string());
        Ok(())
    }
}

/// Users and chats kept in a vector.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert(&self, user: User) {
        self.users.lock().unwrap().push(user);
    }

    pub fn all(&self) -> Vec<User> {
        self.users.lock().unwrap().clone()
    }

    fn find(&self, predicate: impl Fn(&User) -> bool) -> Option<User> {
        self.users.lock().unwrap().iter().find(|u| predicate(u)).cloned()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get_by_telegram_id(&self, telegram_id: i64) -> DomainResult<Option<User>> {
        Ok(self.find(|u| u.telegram_id == telegram_id))
    }

    async fn get_by_token_with_chats(&self, token: &str) -> DomainResult<Option<User>> {
        Ok(self.find(|u| u.token.as_deref() == Some(token)))
    }

    async fn get_by_webapp_id_with_chats(&self, webapp_id: i64) -> DomainResult<Option<User>> {
        Ok(self.find(|u| u.webapp_id == Some(webapp_id)))
    }

    async fn get_or_create(&self, telegram_id: i64, chat: &Chat) -> DomainResult<User> {
        let mut users = self.users.lock().unwrap();
        let next_chat_id = users.iter().map(|u| u.chats.len() as i64).sum::<i64>() + 1;
        let chat_known = users
            .iter()
            .any(|u| u.chats.iter().any(|c| c.telegram_id == chat.id));

        let index = match users.iter().position(|u| u.telegram_id == telegram_id) {
            Some(index) => index,
            None => {
                let id = users.len() as i64 + 1;
                users.push(user(id, telegram_id));
                users.len() - 1
            }
        };

        let user = &mut users[index];
        if !chat_known {
            user.chats.push(ChatRecord {
                id: next_chat_id,
                telegram_id: chat.id,
                chat_type: chat.chat_type.clone(),
                user_id: Some(user.id),
            });
        }
        Ok(user.clone())
    }

    async fn update(&self, updated: &User) -> DomainResult<()> {
        let mut users = self.users.lock().unwrap();
        let existing = users
            .iter_mut()
            .find(|u| u.id == updated.id)
            .ok_or(DomainError::UserNotFound(updated.id))?;
        let chats = std::mem::take(&mut existing.chats);
        *existing = User {
            chats,
            ..updated.clone()
        };
        Ok(())
    }
}

/// Link service answering with a URL derived from the token.
#[derive(Default)]
pub struct FakeLinkService {
    tokens: Mutex<Vec<String>>,
}

impl FakeLinkService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn tokens(&self) -> Vec<String> {
        self.tokens.lock().unwrap().clone()
    }
}

#[async_trait]
impl LinkService for FakeLinkService {
    async fn create_link_token(&self, token: &str) -> Result<LinkTokenResponse, LinkServiceError> {
        self.tokens.lock().unwrap().push(token.to_string());
        Ok(LinkTokenResponse {
            url: format!("https://happiness-mj.xyz/link?token={token}&src=bot"),
        })
    }
}

/// Event queue fed through a channel; closing the sender closes the queue.
pub struct ChannelEventQueue {
    receiver: tokio::sync::Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
}

impl ChannelEventQueue {
    pub fn new() -> (mpsc::UnboundedSender<Vec<u8>>, Arc<Self>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            sender,
            Arc::new(Self {
                receiver: tokio::sync::Mutex::new(receiver),
            }),
        )
    }
}

#[async_trait]
impl EventQueue for ChannelEventQueue {
    async fn blocking_pop(&self) -> Result<Vec<u8>, QueueError> {
        self.receiver.lock().await.recv().await.ok_or(QueueError::Closed)
    }
}

/// Bot collaborators wired to fakes.
pub struct Harness {
    pub chat: Arc<FakeChatClient>,
    pub users: Arc<InMemoryUserRepository>,
    pub links: Arc<FakeLinkService>,
    pub registry: Arc<HandlerRegistry>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            chat: FakeChatClient::new(),
            users: InMemoryUserRepository::new(),
            links: FakeLinkService::new(),
            registry: Arc::new(HandlerRegistry::builtin()),
        }
    }

    pub fn deps(&self) -> HandlerDeps {
        HandlerDeps::new(
            self.chat.clone(),
            self.users.clone(),
            self.links.clone(),
            LinkConfig::default(),
            &self.registry,
        )
    }
}

pub fn user(id: i64, telegram_id: i64) -> User {
    User {
        id,
        telegram_id,
        webapp_id: None,
        created_at: chrono::Utc::now(),
        activated_at: None,
        token: None,
        token_expires_at: None,
        chats: vec![],
    }
}

pub fn chat_record(id: i64, telegram_id: i64, user_id: i64) -> ChatRecord {
    ChatRecord {
        id,
        telegram_id,
        chat_type: "private".to_string(),
        user_id: Some(user_id),
    }
}

/// Message JSON with bot command entities for every leading `/word`.
pub fn message_json(message_id: i64, chat_id: i64, text: &str) -> Value {
    let mut entities = Vec::new();
    let mut offset = 0usize;
    for word in text.split(' ') {
        let length = word.encode_utf16().count();
        if word.starts_with('/') {
            entities.push(json!({"type": "bot_command", "offset": offset, "length": length}));
        } else if word.starts_with('#') {
            entities.push(json!({"type": "hashtag", "offset": offset, "length": length}));
        }
        offset += length + 1;
    }

    json!({
        "message_id": message_id,
        "date": 1_700_000_000,
        "chat": {"id": chat_id, "type": "private"},
        "from": {"id": chat_id, "is_bot": false, "first_name": "Test"},
        "text": text,
        "entities": entities
    })
}

pub fn text_update(update_id: i64, chat_id: i64, text: &str) -> RawUpdate {
    let value = json!({"update_id": update_id, "message": message_json(update_id, chat_id, text)});
    serde_json::from_value(value).unwrap()
}

pub fn raw_update(value: Value) -> RawUpdate {
    serde_json::from_value(value).unwrap()
}

pub fn message(chat_id: i64, text: &str) -> Message {
    serde_json::from_value(message_json(1, chat_id, text)).unwrap()
}

pub fn event_bytes(event_type: &str, payload: Value) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "id": "req-1",
        "type": event_type,
        "timestamp": 1_700_000_000.5,
        "payload": payload
    }))
    .unwrap()
}

/// Poll `predicate` until it holds, failing after a second.
pub async fn wait_until(mut predicate: impl FnMut() -> bool) {
    for _ in 0..200 {
        if predicate() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached");
}
