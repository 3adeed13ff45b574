use serde::{Deserialize, Serialize};

use crate::domain::{CartEntry, CartId, ProductId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentDirection {
    Add,
    Subtract,
}

impl AdjustmentDirection {
    /// Path segment of the endpoint serving this direction, relative to the API root.
    pub fn endpoint(self) -> &'static str {
        match self {
            AdjustmentDirection::Add => "cart_add_product/",
            AdjustmentDirection::Subtract => "cart_subtract_product/",
        }
    }
}

/// A signed quantity delta split into the direction and positive amount the
/// server endpoints expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuantityAdjustment {
    pub direction: AdjustmentDirection,
    pub amount: u64,
}

impl QuantityAdjustment {
    /// Returns `None` for a zero delta, which is never sent.
    pub fn from_delta(delta: i64) -> Option<Self> {
        match delta {
            0 => None,
            d if d > 0 => Some(Self {
                direction: AdjustmentDirection::Add,
                amount: d.unsigned_abs(),
            }),
            d => Some(Self {
                direction: AdjustmentDirection::Subtract,
                amount: d.unsigned_abs(),
            }),
        }
    }

    /// Removal is a subtract of the whole held quantity; the server drops the
    /// entry once it reaches zero.
    pub fn removal_of(entry: &CartEntry) -> Option<Self> {
        Self::from_delta(-i64::from(entry.quantity))
    }
}

/// One quantity adjustment of one product. The adjustment picks the endpoint
/// and supplies the amount, so the two cannot disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjustQuantityRequest {
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub adjustment: QuantityAdjustment,
}

impl AdjustQuantityRequest {
    pub fn new(cart_id: CartId, product_id: ProductId, adjustment: QuantityAdjustment) -> Self {
        Self {
            cart_id,
            product_id,
            adjustment,
        }
    }

    pub fn endpoint(&self) -> &'static str {
        self.adjustment.direction.endpoint()
    }

    pub fn body(&self) -> AdjustQuantityBody<'_> {
        AdjustQuantityBody {
            amount: self.adjustment.amount,
            product_id: &self.product_id,
            cart_id: &self.cart_id,
        }
    }
}

/// JSON body shared by `cart_add_product/` and `cart_subtract_product/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdjustQuantityBody<'a> {
    pub amount: u64,
    pub product_id: &'a ProductId,
    pub cart_id: &'a CartId,
}
