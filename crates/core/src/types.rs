//! Catalog and cart domain types. These are the inputs the analytics
//! normalizer translates into the GA4 ecommerce shapes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Product identifier — the upstream catalog uses both numeric SKUs and
/// string slugs, so both serialize transparently.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Int(i64),
    Str(String),
}

impl From<i64> for ItemId {
    fn from(id: i64) -> Self {
        ItemId::Int(id)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        ItemId::Str(id.to_string())
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        ItemId::Str(id)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Int(id) => write!(f, "{id}"),
            ItemId::Str(id) => write!(f, "{id}"),
        }
    }
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ItemId,
    pub name: String,
    pub price: f64,
    pub category: Option<String>,
    pub brand: Option<String>,
}

/// One cart line: a product at a quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product: Product,
    pub quantity: u32,
}

impl CartLine {
    pub fn new(product: Product, quantity: u32) -> Self {
        Self { product, quantity }
    }

    /// Line value: unit price × quantity.
    pub fn subtotal(&self) -> f64 {
        self.product.price * f64::from(self.quantity)
    }
}
