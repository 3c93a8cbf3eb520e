//! Shopfront analytics — Google Analytics 4 / Google Tag Manager event
//! tracking for the storefront.
//!
//! Normalizes storefront actions (product views, cart changes, checkout,
//! search) into the GA4 event schema and forwards them to two host-page
//! sinks: the shared data-layer queue and the global tagging function.
//! Tracking is optional telemetry — every degraded condition (missing
//! configuration, disabled environment, absent sink) degrades to a logged
//! no-op, never an error.
//!
//! # Modules
//!
//! - [`events`] — Wire-exact GA4 event schema (items, parameter structs, names)
//! - [`sinks`] — The data-layer queue and tagging-function boundary
//! - [`page`] — Host page environment the bootstrap manipulates
//! - [`bootstrap`] — One-time, best-effort GTM / GA4 integration setup
//! - [`gateway`] — The gated forwarding surface callers emit through
//! - [`normalize`] — Pure catalog/cart → ecommerce-shape translation

pub mod bootstrap;
pub mod events;
pub mod gateway;
pub mod normalize;
pub mod page;
pub mod sinks;

pub use events::{
    ConversionParams, DataLayerEvent, EcommerceItem, EcommerceParams, EngagementParams,
    PageViewParams, PurchaseParams, DEFAULT_CURRENCY,
};
pub use gateway::{AnalyticsGateway, DropReason, DropStats};
pub use page::{InjectedResource, MemoryPage, Page};
pub use sinks::{
    CaptureTagFunction, DataLayer, DataLayerEntry, GtagCall, QueueTagFunction, SharedDataLayer,
    TagFunction,
};
