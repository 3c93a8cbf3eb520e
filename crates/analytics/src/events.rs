//! GA4 event schema — wire-exact parameter structs and canonical event
//! names. Key names must match Google's ingestion schema byte-for-byte;
//! optional fields are omitted from JSON rather than sent as null.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use shopfront_core::types::ItemId;

/// Currency applied when a caller leaves it unspecified.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Canonical GA4 event names.
pub mod names {
    pub const PAGE_VIEW: &str = "page_view";
    pub const VIEW_ITEM: &str = "view_item";
    pub const ADD_TO_CART: &str = "add_to_cart";
    pub const REMOVE_FROM_CART: &str = "remove_from_cart";
    pub const VIEW_CART: &str = "view_cart";
    pub const BEGIN_CHECKOUT: &str = "begin_checkout";
    pub const PURCHASE: &str = "purchase";
    pub const SEARCH: &str = "search";
    pub const VIEW_ITEM_LIST: &str = "view_item_list";
    pub const CONVERSION: &str = "conversion";
    pub const ENGAGEMENT: &str = "engagement";
}

/// One product unit inside an ecommerce-shaped event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EcommerceItem {
    pub item_id: ItemId,
    pub item_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_variant: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
}

/// Value-bearing envelope shared by view_item, add_to_cart,
/// remove_from_cart, view_cart, and begin_checkout.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EcommerceParams {
    /// Defaults to [`DEFAULT_CURRENCY`] when absent.
    pub currency: Option<String>,
    pub value: f64,
    pub items: Vec<EcommerceItem>,
}

impl EcommerceParams {
    /// Build the wire object, applying the currency default. The caller
    /// contract that `value` reconciles with the item sum is not enforced
    /// here.
    pub fn into_wire(self) -> Value {
        json!({
            "currency": self.currency.unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            "value": self.value,
            "items": self.items,
        })
    }
}

/// Purchase envelope. Tax and shipping default to 0 on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseParams {
    pub transaction_id: String,
    pub currency: Option<String>,
    pub value: f64,
    pub tax: Option<f64>,
    pub shipping: Option<f64>,
    pub items: Vec<EcommerceItem>,
}

impl PurchaseParams {
    pub fn into_wire(self) -> Value {
        json!({
            "transaction_id": self.transaction_id,
            "currency": self.currency.unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            "value": self.value,
            "tax": self.tax.unwrap_or(0.0),
            "shipping": self.shipping.unwrap_or(0.0),
            "items": self.items,
        })
    }
}

/// page_view parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageViewParams {
    pub page_path: String,
    pub page_title: String,
    pub page_location: String,
}

/// engagement parameters. Label and value are only emitted when present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementParams {
    pub event_category: String,
    pub event_action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

/// conversion parameters. A value implies the default currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionParams {
    pub conversion_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

impl ConversionParams {
    pub fn into_wire(self) -> Value {
        let mut params = json!({ "conversion_name": self.conversion_name });
        if let Some(value) = self.value {
            params["value"] = json!(value);
            params["currency"] = json!(DEFAULT_CURRENCY);
        }
        params
    }
}

/// One structured entry pushed onto the data-layer queue: a required event
/// name plus arbitrary flattened keys (ecommerce payloads nest under an
/// `ecommerce` key).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataLayerEvent {
    pub event: String,
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl DataLayerEvent {
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            params: Map::new(),
        }
    }

    /// Build an event from a name and a flat parameter object. Non-object
    /// params produce an event with no extra keys.
    pub fn with_params(event: impl Into<String>, params: Value) -> Self {
        let params = match params {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            event: event.into(),
            params,
        }
    }

    /// Build an ecommerce-shaped event: the payload nests under `ecommerce`.
    pub fn with_ecommerce(event: impl Into<String>, ecommerce: Value) -> Self {
        let mut params = Map::new();
        params.insert("ecommerce".to_string(), ecommerce);
        Self {
            event: event.into(),
            params,
        }
    }
}
