//! HTTP client for the cart REST endpoints.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use shared::{
    domain::{CartId, CartSession, ProductId},
    protocol::AdjustQuantityRequest,
};
use tracing::{debug, info};
use url::Url;

use crate::{CartClientError, CartQueryService, QuantityMutationService};

const CART_GET_PATH: &str = "cart_get/";
const PRODUCT_IMAGE_PATH: &str = "get_product_image/";

/// No request timeout is configured; a hung call stays pending until the
/// server or the transport gives up.
#[derive(Debug, Clone)]
pub struct CartApiClient {
    http: Client,
    base_url: Url,
}

impl CartApiClient {
    pub fn new(api_url: &str) -> Result<Self, CartClientError> {
        Self::with_http_client(Client::new(), api_url)
    }

    pub fn with_http_client(http: Client, api_url: &str) -> Result<Self, CartClientError> {
        let mut base_url = Url::parse(api_url.trim())?;
        if base_url.cannot_be_a_base() {
            return Err(CartClientError::InvalidUrl(format!(
                "'{api_url}' cannot be used as an api root"
            )));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { http, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url, CartClientError> {
        Ok(self.base_url.join(path)?)
    }

    fn endpoint_with_segment(&self, path: &str, segment: &str) -> Result<Url, CartClientError> {
        let mut url = self.endpoint(path)?;
        url.path_segments_mut()
            .map_err(|_| CartClientError::InvalidUrl(format!("cannot extend '{path}'")))?
            .pop_if_empty()
            .push(segment);
        Ok(url)
    }

    /// Location of a product's image. Fetching it is left to the caller.
    pub fn product_image_url(&self, product: &ProductId) -> Result<Url, CartClientError> {
        self.endpoint_with_segment(PRODUCT_IMAGE_PATH, &product.to_string())
    }

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: Url,
        body: &T,
    ) -> Result<(), CartClientError> {
        let endpoint = url.to_string();
        let res = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|source| CartClientError::Network {
                endpoint: endpoint.clone(),
                source,
            })?;
        let status = res.status();
        if status.is_success() {
            return Ok(());
        }
        let body = res.text().await.unwrap_or_default();
        Err(CartClientError::UnexpectedStatus {
            endpoint,
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl CartQueryService for CartApiClient {
    async fn fetch_cart(&self, cart_id: &CartId) -> Result<CartSession, CartClientError> {
        let url = self.endpoint_with_segment(CART_GET_PATH, cart_id.as_str())?;
        let endpoint = url.to_string();
        debug!(%cart_id, endpoint = %endpoint, "fetching cart");

        let res = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| CartClientError::Network {
                endpoint: endpoint.clone(),
                source,
            })?;
        let status = res.status();
        if status == StatusCode::NOT_FOUND {
            return Err(CartClientError::NotFound(cart_id.clone()));
        }
        let body = res
            .text()
            .await
            .map_err(|source| CartClientError::Network {
                endpoint: endpoint.clone(),
                source,
            })?;
        if !status.is_success() {
            return Err(CartClientError::UnexpectedStatus {
                endpoint,
                status: status.as_u16(),
                body,
            });
        }
        serde_json::from_str(&body).map_err(|source| CartClientError::Decode { endpoint, source })
    }
}

#[async_trait]
impl QuantityMutationService for CartApiClient {
    async fn adjust_quantity(
        &self,
        request: &AdjustQuantityRequest,
    ) -> Result<(), CartClientError> {
        let url = self.endpoint(request.endpoint())?;
        self.post_json(url, &request.body()).await?;
        info!(
            cart_id = %request.cart_id,
            product_id = %request.product_id,
            direction = ?request.adjustment.direction,
            amount = request.adjustment.amount,
            "cart quantity adjusted"
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/api_client_tests.rs"]
mod tests;
