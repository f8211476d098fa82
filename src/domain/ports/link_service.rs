use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::ports::errors::LinkServiceError;

/// Response of the web application when a link token is registered
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LinkTokenResponse {
    /// URL the user opens to finish linking
    pub url: String,
}

/// Companion web application port
#[async_trait]
pub trait LinkService: Send + Sync {
    /// Register a one-time token and get the URL that redeems it
    async fn create_link_token(&self, token: &str) -> Result<LinkTokenResponse, LinkServiceError>;
}
