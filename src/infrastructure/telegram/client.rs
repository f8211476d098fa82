use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::domain::models::{BotConfig, RawUpdate};
use crate::domain::ports::{BotCommand, ChatClient, ChatClientError, MessageOptions, UpdatesRequest};
use crate::infrastructure::logging::SecretScrubber;

/// Bot API response envelope
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to_message_id: Option<i64>,
    disable_web_page_preview: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<&'a Value>,
}

#[derive(Debug, Serialize)]
struct SetMyCommands<'a> {
    commands: &'a [BotCommand],
}

#[derive(Debug, Serialize)]
struct AnswerCallbackQuery<'a> {
    callback_query_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
}

/// HTTP client for the Telegram Bot API
///
/// Every method URL embeds the bot token, so transport errors are stripped
/// of their URL and scrubbed before they leave this type.
pub struct TelegramClient {
    http_client: ReqwestClient,
    /// `{api_base_url}/bot{token}`
    base_url: String,
    request_timeout: Duration,
    scrubber: SecretScrubber,
}

impl TelegramClient {
    pub fn new(config: &BotConfig) -> Result<Self> {
        let http_client = ReqwestClient::builder()
            .pool_max_idle_per_host(10)
            .tcp_nodelay(true)
            .build()
            .context("Failed to build HTTP client")?;

        let scrubber = SecretScrubber::new(Some(&config.token))
            .context("Failed to build token scrubber")?;

        Ok(Self {
            http_client,
            base_url: format!("{}/bot{}", config.api_base_url.trim_end_matches('/'), config.token),
            request_timeout: config.request_timeout(),
            scrubber,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{method}", self.base_url)
    }

    fn transport_error(&self, err: reqwest::Error) -> ChatClientError {
        if err.is_timeout() {
            return ChatClientError::Timeout;
        }
        ChatClientError::Network(self.scrubber.scrub_message(&err.without_url().to_string()))
    }

    /// Send `request` and unwrap the response envelope.
    async fn execute<T: DeserializeOwned>(
        &self,
        method: &str,
        request: RequestBuilder,
    ) -> Result<T, ChatClientError> {
        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();

        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(ChatClientError::Status {
                status: status.as_u16(),
                body: self.scrubber.scrub_message(&body),
            });
        }

        let envelope: Envelope<T> = serde_json::from_str(&body)
            .map_err(|e| ChatClientError::Decode(format!("{method}: {e}")))?;

        if !envelope.ok {
            return Err(ChatClientError::Api(
                envelope
                    .description
                    .unwrap_or_else(|| format!("{method} failed without description")),
            ));
        }

        envelope
            .result
            .ok_or_else(|| ChatClientError::Decode(format!("{method}: missing result")))
    }

    async fn post<P: Serialize + Sync, T: DeserializeOwned>(
        &self,
        method: &str,
        params: &P,
    ) -> Result<T, ChatClientError> {
        debug!(method, "calling Bot API");
        let request = self
            .http_client
            .post(self.method_url(method))
            .timeout(self.request_timeout)
            .json(params);
        self.execute(method, request).await
    }
}

#[async_trait]
impl ChatClient for TelegramClient {
    #[instrument(skip(self), fields(offset = ?request.offset))]
    async fn get_updates(
        &self,
        request: UpdatesRequest,
    ) -> Result<Vec<RawUpdate>, ChatClientError> {
        let mut query = vec![("timeout", request.poll_timeout.as_secs().to_string())];
        if let Some(offset) = request.offset {
            query.push(("offset", offset.to_string()));
        }

        let builder = self
            .http_client
            .get(self.method_url("getUpdates"))
            .timeout(request.request_timeout)
            .query(&query);

        let updates: Vec<RawUpdate> = self.execute("getUpdates", builder).await?;
        debug!(count = updates.len(), "received updates");
        Ok(updates)
    }

    async fn post_message(
        &self,
        chat_id: i64,
        text: &str,
        options: MessageOptions,
    ) -> Result<(), ChatClientError> {
        let params = SendMessage {
            chat_id,
            text,
            parse_mode: options.parse_mode.as_deref(),
            reply_to_message_id: options.reply_to_message_id,
            disable_web_page_preview: options.disable_web_page_preview,
            reply_markup: options.reply_markup.as_ref(),
        };

        let _sent: Value = self.post("sendMessage", &params).await?;
        Ok(())
    }

    async fn set_my_commands(&self, commands: &[BotCommand]) -> Result<(), ChatClientError> {
        let _accepted: bool = self.post("setMyCommands", &SetMyCommands { commands }).await?;
        Ok(())
    }

    async fn answer_callback_query(
        &self,
        callback_id: &str,
        text: Option<&str>,
    ) -> Result<(), ChatClientError> {
        let params = AnswerCallbackQuery {
            callback_query_id: callback_id,
            text,
        };
        let _accepted: bool = self.post("answerCallbackQuery", &params).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use tokio::net::TcpListener;

    const TOKEN: &str = "123:abc";

    fn client_for(url: String) -> TelegramClient {
        TelegramClient::new(&BotConfig {
            token: TOKEN.to_string(),
            api_base_url: url,
            ..BotConfig::default()
        })
        .unwrap()
    }

    fn poll(offset: Option<i64>, request_timeout: Duration) -> UpdatesRequest {
        UpdatesRequest {
            offset,
            poll_timeout: Duration::from_secs(1),
            request_timeout,
        }
    }

    #[tokio::test]
    async fn test_get_updates_sends_offset_and_timeout() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/bot123:abc/getUpdates")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("offset".into(), "6".into()),
                Matcher::UrlEncoded("timeout".into(), "1".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "ok": true,
                    "result": [
                        {"update_id": 6, "message": {"message_id": 1, "chat": {"id": 9, "type": "private"}}},
                        {"update_id": 7, "edited_message": {}}
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = client_for(server.url());
        let updates = client
            .get_updates(poll(Some(6), Duration::from_secs(5)))
            .await
            .unwrap();

        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].update_id, 6);
        assert!(updates[1].field("edited_message").is_some());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_updates_times_out() {
        // Accepts connections and never answers.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let client = client_for(format!("http://{addr}"));
        let err = client
            .get_updates(poll(None, Duration::from_millis(200)))
            .await
            .unwrap_err();

        assert!(err.is_timeout(), "expected timeout, got {err:?}");
        server.abort();
    }

    #[tokio::test]
    async fn test_send_message_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/bot123:abc/sendMessage")
            .match_body(Matcher::PartialJson(json!({
                "chat_id": 42,
                "text": "pong",
                "parse_mode": "HTML",
                "reply_to_message_id": 3,
                "disable_web_page_preview": true
            })))
            .with_status(200)
            .with_body(json!({"ok": true, "result": {"message_id": 4}}).to_string())
            .create_async()
            .await;

        let client = client_for(server.url());
        client
            .post_message(42, "pong", MessageOptions::default().reply_to(3).without_preview())
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_api_error_envelope() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/bot123:abc/setMyCommands")
            .with_status(200)
            .with_body(json!({"ok": false, "description": "Bad Request: commands too long"}).to_string())
            .create_async()
            .await;

        let client = client_for(server.url());
        let commands = [BotCommand {
            command: "ping".to_string(),
            description: "Sends \"pong\" in response.".to_string(),
        }];
        let err = client.set_my_commands(&commands).await.unwrap_err();

        assert!(matches!(err, ChatClientError::Api(ref d) if d.contains("commands too long")));
    }

    #[tokio::test]
    async fn test_status_error_is_scrubbed() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/bot123:abc/answerCallbackQuery")
            .with_status(401)
            .with_body(format!("Unauthorized for token {TOKEN}"))
            .create_async()
            .await;

        let client = client_for(server.url());
        let err = client.answer_callback_query("cb-1", None).await.unwrap_err();

        match err {
            ChatClientError::Status { status, body } => {
                assert_eq!(status, 401);
                assert!(!body.contains(TOKEN));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_network_error_hides_token() {
        // Nothing listens on port 9 of localhost.
        let client = client_for("http://127.0.0.1:9".to_string());
        let err = client.post_message(1, "hi", MessageOptions::default()).await.unwrap_err();

        assert!(!err.to_string().contains(TOKEN));
    }
}
