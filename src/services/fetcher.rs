//! Cursor-tracked update fetcher.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use crate::domain::models::{BotConfig, RawUpdate};
use crate::domain::ports::{ChatClient, ChatClientError, UpdatesRequest};

/// Wraps the long-poll call and remembers the last update seen.
pub struct UpdateFetcher {
    client: Arc<dyn ChatClient>,
    cursor: Option<i64>,
    poll_timeout: Duration,
    request_timeout: Duration,
}

impl UpdateFetcher {
    pub fn new(client: Arc<dyn ChatClient>, poll_timeout: Duration, request_timeout: Duration) -> Self {
        Self {
            client,
            cursor: None,
            poll_timeout,
            request_timeout,
        }
    }

    pub fn from_config(client: Arc<dyn ChatClient>, config: &BotConfig) -> Self {
        Self::new(client, config.poll_interval(), config.long_poll_timeout())
    }

    /// Id of the last update received, if any.
    pub fn cursor(&self) -> Option<i64> {
        self.cursor
    }

    /// Offset sent with the next request.
    pub fn offset(&self) -> Option<i64> {
        self.cursor.map(|id| id + 1)
    }

    /// Fetch the next batch of updates.
    ///
    /// A timed out poll yields an empty batch. Any other failure is returned
    /// to the caller, which must not keep polling in a tight loop.
    #[instrument(skip(self), fields(offset = ?self.offset()))]
    pub async fn fetch(&mut self) -> Result<Vec<RawUpdate>, ChatClientError> {
        let request = UpdatesRequest {
            offset: self.offset(),
            poll_timeout: self.poll_timeout,
            request_timeout: self.request_timeout,
        };

        let updates = match self.client.get_updates(request).await {
            Ok(updates) => updates,
            Err(ChatClientError::Timeout) => {
                debug!("long poll timed out");
                return Ok(Vec::new());
            }
            Err(err) => return Err(err),
        };

        // The feed is delivered in id order; the last item is the new cursor.
        if let Some(last) = updates.last() {
            if self.cursor.is_some_and(|cursor| last.update_id < cursor) {
                warn!(
                    cursor = ?self.cursor,
                    update_id = last.update_id,
                    "feed returned an update older than the cursor"
                );
            }
            self.cursor = Some(last.update_id);
        }

        Ok(updates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{BotCommand, MessageOptions};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedClient {
        batches: Mutex<VecDeque<Result<Vec<RawUpdate>, ChatClientError>>>,
        offsets: Mutex<Vec<Option<i64>>>,
    }

    impl ScriptedClient {
        fn new(batches: Vec<Result<Vec<RawUpdate>, ChatClientError>>) -> Self {
            Self {
                batches: Mutex::new(batches.into()),
                offsets: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatClient for ScriptedClient {
        async fn get_updates(
            &self,
            request: UpdatesRequest,
        ) -> Result<Vec<RawUpdate>, ChatClientError> {
            assert!(request.request_timeout > request.poll_timeout);
            self.offsets.lock().unwrap().push(request.offset);
            self.batches
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(Vec::new()))
        }

        async fn post_message(&self, _: i64, _: &str, _: MessageOptions) -> Result<(), ChatClientError> {
            Ok(())
        }

        async fn set_my_commands(&self, _: &[BotCommand]) -> Result<(), ChatClientError> {
            Ok(())
        }

        async fn answer_callback_query(&self, _: &str, _: Option<&str>) -> Result<(), ChatClientError> {
            Ok(())
        }
    }

    fn batch(ids: &[i64]) -> Vec<RawUpdate> {
        ids.iter()
            .map(|id| RawUpdate::new(*id, serde_json::Map::new()))
            .collect()
    }

    fn fetcher(client: Arc<ScriptedClient>) -> UpdateFetcher {
        UpdateFetcher::from_config(client, &BotConfig::default())
    }

    #[tokio::test]
    async fn test_cursor_follows_last_item() {
        let client = Arc::new(ScriptedClient::new(vec![
            Ok(batch(&[5, 6, 7])),
            Ok(batch(&[])),
            Ok(batch(&[9])),
        ]));
        let mut fetcher = fetcher(Arc::clone(&client));

        assert_eq!(fetcher.fetch().await.unwrap().len(), 3);
        assert_eq!(fetcher.cursor(), Some(7));
        assert!(fetcher.fetch().await.unwrap().is_empty());
        assert_eq!(fetcher.cursor(), Some(7));
        fetcher.fetch().await.unwrap();
        assert_eq!(fetcher.cursor(), Some(9));

        let offsets = client.offsets.lock().unwrap().clone();
        assert_eq!(offsets, vec![None, Some(8), Some(8)]);
    }

    #[tokio::test]
    async fn test_cursor_uses_last_not_max() {
        let client = Arc::new(ScriptedClient::new(vec![Ok(batch(&[10, 12, 11]))]));
        let mut fetcher = fetcher(client);
        fetcher.fetch().await.unwrap();
        assert_eq!(fetcher.cursor(), Some(11));
    }

    #[tokio::test]
    async fn test_timeout_is_empty_batch() {
        let client = Arc::new(ScriptedClient::new(vec![
            Ok(batch(&[3])),
            Err(ChatClientError::Timeout),
        ]));
        let mut fetcher = fetcher(client);
        fetcher.fetch().await.unwrap();

        assert!(fetcher.fetch().await.unwrap().is_empty());
        assert_eq!(fetcher.cursor(), Some(3));
    }

    #[tokio::test]
    async fn test_failure_propagates_and_keeps_cursor() {
        let client = Arc::new(ScriptedClient::new(vec![
            Ok(batch(&[3])),
            Err(ChatClientError::Status {
                status: 502,
                body: "bad gateway".to_string(),
            }),
        ]));
        let mut fetcher = fetcher(client);
        fetcher.fetch().await.unwrap();

        let err = fetcher.fetch().await.unwrap_err();
        assert!(matches!(err, ChatClientError::Status { status: 502, .. }));
        assert_eq!(fetcher.cursor(), Some(3));
    }

    #[tokio::test]
    async fn test_cursor_zero_is_kept() {
        let client = Arc::new(ScriptedClient::new(vec![Ok(batch(&[0]))]));
        let mut fetcher = fetcher(client);
        fetcher.fetch().await.unwrap();
        assert_eq!(fetcher.offset(), Some(1));
    }
}
