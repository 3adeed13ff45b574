//! Cart session controller: keeps a local view of the remote cart in sync and
//! turns quantity intents into mutation requests.
//!
//! Local state is only ever replaced by an authoritative fetch. Quantity
//! changes are sent to the server and reported through notifications; they
//! become visible in state on the next activation refresh.

use std::sync::Arc;

use shared::{
    domain::{CartId, CartSession, ProductId},
    protocol::{AdjustQuantityRequest, QuantityAdjustment},
};
use storage::CART_ID_KEY;
use thiserror::Error;
use tokio::{
    sync::{broadcast, mpsc, Mutex},
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};

use crate::{CartClientError, CartQueryService, IdentifierStore, QuantityMutationService};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ControllerState {
    #[default]
    Uninitialized,
    Loading,
    Empty,
    Populated(CartSession),
}

impl ControllerState {
    pub fn session(&self) -> Option<&CartSession> {
        match self {
            ControllerState::Populated(session) => Some(session),
            _ => None,
        }
    }
}

/// Focus changes of the view consuming the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewEvent {
    Activated,
    Deactivated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartNotification {
    QuantityChanged {
        cart_id: CartId,
        product_id: ProductId,
        adjustment: QuantityAdjustment,
    },
    QuantityChangeFailed {
        cart_id: CartId,
        product_id: ProductId,
        adjustment: QuantityAdjustment,
        reason: String,
    },
}

impl CartNotification {
    pub fn is_success(&self) -> bool {
        matches!(self, CartNotification::QuantityChanged { .. })
    }
}

/// Caller misuse of [`CartSessionController::change_quantity`]. Transport and
/// server failures are reported as notifications instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChangeQuantityError {
    #[error("no cart is loaded")]
    NoActiveCart,
    #[error("quantity delta must be non-zero")]
    ZeroDelta,
    #[error("product {0} is not in the cart")]
    UnknownProduct(ProductId),
}

struct ControllerInner {
    state: ControllerState,
    cart_id: Option<CartId>,
    bootstrapped: bool,
    active: bool,
    /// Bumped when a fetch is issued and on every deactivation. Only a response
    /// tagged with the current value is applied.
    generation: u64,
}

impl ControllerInner {
    fn issue_fetch(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }
}

pub struct CartSessionController {
    identifiers: Arc<dyn IdentifierStore>,
    carts: Arc<dyn CartQueryService>,
    mutations: Arc<dyn QuantityMutationService>,
    inner: Mutex<ControllerInner>,
    notifications: broadcast::Sender<CartNotification>,
}

impl CartSessionController {
    pub fn new(
        identifiers: Arc<dyn IdentifierStore>,
        carts: Arc<dyn CartQueryService>,
        mutations: Arc<dyn QuantityMutationService>,
    ) -> Arc<Self> {
        let (notifications, _) = broadcast::channel(64);
        Arc::new(Self {
            identifiers,
            carts,
            mutations,
            inner: Mutex::new(ControllerInner {
                state: ControllerState::Uninitialized,
                cart_id: None,
                bootstrapped: false,
                active: false,
                generation: 0,
            }),
            notifications,
        })
    }

    pub async fn snapshot(&self) -> ControllerState {
        self.inner.lock().await.state.clone()
    }

    pub async fn is_loading(&self) -> bool {
        matches!(self.inner.lock().await.state, ControllerState::Loading)
    }

    pub fn subscribe_notifications(&self) -> broadcast::Receiver<CartNotification> {
        self.notifications.subscribe()
    }

    /// Reads the stored cart identifier once and loads the cart it names.
    /// Later calls are ignored. A view deactivated before this call stays
    /// inactive, and the load is applied on its next activation.
    pub async fn bootstrap(&self) {
        {
            let mut guard = self.inner.lock().await;
            if guard.bootstrapped {
                debug!("cart controller already bootstrapped");
                return;
            }
            guard.bootstrapped = true;
            // Mounting activates the view unless it already reported losing focus.
            if guard.generation == 0 {
                guard.active = true;
            }
        }

        let stored = match self.identifiers.get(CART_ID_KEY).await {
            Ok(value) => value,
            Err(err) => {
                error!(error = %err, "failed to read stored cart id");
                None
            }
        };

        let (cart_id, generation) = {
            let mut guard = self.inner.lock().await;
            let Some(raw) = stored.filter(|raw| !raw.trim().is_empty()) else {
                info!("no stored cart id; cart is empty");
                guard.state = ControllerState::Empty;
                return;
            };
            let cart_id = CartId::new(raw);
            guard.cart_id = Some(cart_id.clone());
            guard.state = ControllerState::Loading;
            (cart_id, guard.issue_fetch())
        };

        self.fetch_and_apply(cart_id, generation).await;
    }

    /// Marks the view active and refreshes the held cart.
    pub async fn activate(&self) {
        if let Some((cart_id, generation)) = self.begin_activation().await {
            self.fetch_and_apply(cart_id, generation).await;
        }
    }

    /// Marks the view inactive. Responses to requests issued before this call
    /// are discarded.
    pub async fn deactivate(&self) {
        let mut guard = self.inner.lock().await;
        guard.active = false;
        guard.generation = guard.generation.wrapping_add(1);
        debug!(generation = guard.generation, "cart view deactivated");
    }

    /// Consumes view focus events until the sender is dropped, which counts as
    /// a final deactivation.
    pub fn spawn_view_listener(
        self: &Arc<Self>,
        mut events: mpsc::Receiver<ViewEvent>,
    ) -> JoinHandle<()> {
        let controller = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    ViewEvent::Activated => {
                        let refresh = controller.begin_activation().await;
                        if let Some((cart_id, generation)) = refresh {
                            let refresher = Arc::clone(&controller);
                            tokio::spawn(async move {
                                refresher.fetch_and_apply(cart_id, generation).await;
                            });
                        }
                    }
                    ViewEvent::Deactivated => controller.deactivate().await,
                }
            }
            controller.deactivate().await;
        })
    }

    async fn begin_activation(&self) -> Option<(CartId, u64)> {
        let mut guard = self.inner.lock().await;
        let was_active = guard.active;
        guard.active = true;
        let cart_id = match &guard.state {
            ControllerState::Populated(session) => session.cart_id.clone(),
            // A bootstrap fetch dropped by an earlier deactivation is resumed.
            ControllerState::Loading if !was_active => guard.cart_id.clone()?,
            ControllerState::Uninitialized | ControllerState::Loading | ControllerState::Empty => {
                return None
            }
        };
        Some((cart_id, guard.issue_fetch()))
    }

    async fn fetch_and_apply(&self, cart_id: CartId, generation: u64) {
        let result = self.carts.fetch_cart(&cart_id).await;

        let mut guard = self.inner.lock().await;
        if !guard.active {
            debug!(%cart_id, "discarding cart response for inactive view");
            return;
        }
        if guard.generation != generation {
            debug!(%cart_id, "discarding superseded cart response");
            return;
        }

        match result {
            Ok(session) => {
                let line_sum = session.sum_of_line_totals();
                if line_sum != session.total_price {
                    debug!(
                        %cart_id,
                        total_price = %session.total_price,
                        line_sum = %line_sum,
                        "server total differs from sum of line totals"
                    );
                }
                info!(%cart_id, entries = session.entries.len(), "cart loaded");
                guard.state = ControllerState::Populated(session);
            }
            Err(err) => {
                match &err {
                    CartClientError::NotFound(_) => {
                        warn!(%cart_id, "stored cart no longer exists")
                    }
                    _ => error!(%cart_id, error = %err, "failed to fetch cart"),
                }
                if guard.state == ControllerState::Loading {
                    guard.state = ControllerState::Empty;
                }
            }
        }
    }

    /// Sends a signed quantity change for one product of the loaded cart.
    /// Local state is left untouched; the outcome is returned and broadcast.
    pub async fn change_quantity(
        &self,
        product_id: ProductId,
        delta: i64,
    ) -> Result<CartNotification, ChangeQuantityError> {
        let adjustment =
            QuantityAdjustment::from_delta(delta).ok_or(ChangeQuantityError::ZeroDelta)?;
        let cart_id = self
            .inner
            .lock()
            .await
            .state
            .session()
            .map(|session| session.cart_id.clone())
            .ok_or(ChangeQuantityError::NoActiveCart)?;

        let request = AdjustQuantityRequest::new(cart_id, product_id, adjustment);
        Ok(self.send_adjustment(request).await)
    }

    /// Removes an entry by subtracting its whole currently held quantity.
    pub async fn remove_entry(
        &self,
        product_id: &ProductId,
    ) -> Result<CartNotification, ChangeQuantityError> {
        let request = {
            let guard = self.inner.lock().await;
            let session = guard
                .state
                .session()
                .ok_or(ChangeQuantityError::NoActiveCart)?;
            let entry = session
                .entry(product_id)
                .ok_or_else(|| ChangeQuantityError::UnknownProduct(product_id.clone()))?;
            let adjustment =
                QuantityAdjustment::removal_of(entry).ok_or(ChangeQuantityError::ZeroDelta)?;
            AdjustQuantityRequest::new(session.cart_id.clone(), product_id.clone(), adjustment)
        };
        Ok(self.send_adjustment(request).await)
    }

    async fn send_adjustment(&self, request: AdjustQuantityRequest) -> CartNotification {
        let result = self.mutations.adjust_quantity(&request).await;
        self.report_mutation(request, result)
    }

    fn report_mutation(
        &self,
        request: AdjustQuantityRequest,
        result: Result<(), CartClientError>,
    ) -> CartNotification {
        let AdjustQuantityRequest {
            cart_id,
            product_id,
            adjustment,
        } = request;
        let notification = match result {
            Ok(()) => CartNotification::QuantityChanged {
                cart_id,
                product_id,
                adjustment,
            },
            Err(err) => {
                error!(%cart_id, %product_id, error = %err, "failed to change cart quantity");
                CartNotification::QuantityChangeFailed {
                    cart_id,
                    product_id,
                    adjustment,
                    reason: err.to_string(),
                }
            }
        };
        // No subscribers is fine.
        let _ = self.notifications.send(notification.clone());
        notification
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
