use shared::domain::CartId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CartClientError {
    #[error("cart request to {endpoint} failed: {source}")]
    Network {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("cart {0} not found")]
    NotFound(CartId),
    #[error("unexpected status {status} from {endpoint}: {body}")]
    UnexpectedStatus {
        endpoint: String,
        status: u16,
        body: String,
    },
    #[error("failed to decode response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid api url: {0}")]
    InvalidUrl(String),
}

impl From<url::ParseError> for CartClientError {
    fn from(value: url::ParseError) -> Self {
        Self::InvalidUrl(value.to_string())
    }
}
