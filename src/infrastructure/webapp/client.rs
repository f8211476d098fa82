use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::domain::models::WebappConfig;
use crate::domain::ports::{LinkService, LinkServiceError, LinkTokenResponse};

const BOT_TOKEN_PATH: &str = "/_int/users/bot_token/";

#[derive(Debug, Serialize)]
struct BotTokenRequest<'a> {
    token: &'a str,
}

/// HTTP client for the web application's internal API
pub struct WebappClient {
    http_client: ReqwestClient,
    base_url: String,
}

impl WebappClient {
    pub fn new(config: &WebappConfig) -> Result<Self> {
        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl LinkService for WebappClient {
    #[instrument(skip_all)]
    async fn create_link_token(&self, token: &str) -> Result<LinkTokenResponse, LinkServiceError> {
        let response = self
            .http_client
            .post(format!("{}{BOT_TOKEN_PATH}", self.base_url))
            .json(&BotTokenRequest { token })
            .send()
            .await
            .map_err(|e| LinkServiceError::Network(e.to_string()))?;

        let status = response.status();
        debug!(status = status.as_u16(), "web application responded");

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());
            return Err(LinkServiceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<LinkTokenResponse>()
            .await
            .map_err(|e| LinkServiceError::Decode(e.to_string()))
    }
}
