use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ParseProductIdError;

/// Opaque identifier of a remote shopping cart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartId(pub String);

impl CartId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Product identifier as the server sends it. Integer and UUID keyed catalogs
/// both exist, so the received form is kept and echoed back verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductId {
    Numeric(i64),
    Text(String),
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProductId::Numeric(id) => write!(f, "{id}"),
            ProductId::Text(id) => f.write_str(id),
        }
    }
}

impl FromStr for ProductId {
    type Err = ParseProductIdError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ParseProductIdError::Empty);
        }
        if raw.bytes().all(|b| b.is_ascii_digit()) {
            return raw
                .parse::<i64>()
                .map(ProductId::Numeric)
                .map_err(|_| ParseProductIdError::OutOfRange(raw.to_string()));
        }
        Ok(ProductId::Text(raw.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    pub product: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl CartEntry {
    /// Display-only per-line amount. Never used to derive the cart total.
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Full remote cart state, always replaced wholesale by a fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSession {
    pub cart_id: CartId,
    #[serde(default)]
    pub entries: Vec<CartEntry>,
    pub total_price: Decimal,
}

impl CartSession {
    pub fn entry(&self, product: &ProductId) -> Option<&CartEntry> {
        self.entries.iter().find(|entry| &entry.product == product)
    }

    pub fn sum_of_line_totals(&self) -> Decimal {
        self.entries.iter().map(CartEntry::line_total).sum()
    }
}
