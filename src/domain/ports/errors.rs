use thiserror::Error;

/// Chat-platform API errors
#[derive(Debug, Error)]
pub enum ChatClientError {
    /// The request did not complete within its deadline
    #[error("Request timed out")]
    Timeout,

    /// Non-2xx HTTP response
    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// 2xx response whose envelope reports `ok: false`
    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    Decode(String),
}

impl ChatClientError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

/// Companion web application errors
#[derive(Debug, Error)]
pub enum LinkServiceError {
    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    Decode(String),
}

/// External event queue errors
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Queue connection error: {0}")]
    Connection(String),

    #[error("Queue closed")]
    Closed,
}
