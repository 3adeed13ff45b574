use anyhow::Result;
use async_trait::async_trait;
use shared::{
    domain::{CartId, CartSession},
    protocol::AdjustQuantityRequest,
};
use storage::Storage;

pub mod api_client;
pub mod controller;
pub mod error;

pub use api_client::CartApiClient;
pub use controller::{
    CartNotification, CartSessionController, ChangeQuantityError, ControllerState, ViewEvent,
};
pub use error::CartClientError;

/// Durable local key/value lookup, consulted once when a controller boots.
#[async_trait]
pub trait IdentifierStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
}

#[async_trait]
impl IdentifierStore for Storage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Storage::get(self, key).await
    }
}

/// Identifier store with a fixed value, for embedders that resolve the cart
/// identifier elsewhere.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentifierStore {
    value: Option<String>,
}

impl StaticIdentifierStore {
    pub fn new(value: Option<String>) -> Self {
        Self { value }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentifierStore for StaticIdentifierStore {
    async fn get(&self, _key: &str) -> Result<Option<String>> {
        Ok(self.value.clone())
    }
}

#[async_trait]
pub trait CartQueryService: Send + Sync {
    /// Always returns the full current cart, never a delta.
    async fn fetch_cart(&self, cart_id: &CartId) -> Result<CartSession, CartClientError>;
}

#[async_trait]
pub trait QuantityMutationService: Send + Sync {
    /// Posts the request to the endpoint its adjustment direction names.
    async fn adjust_quantity(
        &self,
        request: &AdjustQuantityRequest,
    ) -> Result<(), CartClientError>;
}
