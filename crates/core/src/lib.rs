//! Shared foundation for the Shopfront workspace — configuration, the
//! workspace error type, and the catalog/cart domain types consumed by the
//! analytics layer.

pub mod config;
pub mod error;
pub mod types;

pub use config::{AnalyticsConfig, AppConfig, Environment};
pub use error::{ShopfrontError, ShopfrontResult};
