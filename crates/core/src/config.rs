use anyhow::{anyhow, Result};
use serde::Deserialize;

use crate::error::{ShopfrontError, ShopfrontResult};

/// Placeholder IDs shipped in example configs. Either value is treated as
/// "not configured" and suppresses the corresponding bootstrap.
pub const PLACEHOLDER_MEASUREMENT_ID: &str = "G-XXXXXXXXXX";
pub const PLACEHOLDER_CONTAINER_ID: &str = "GTM-XXXXXXX";

/// Runtime environment. Tracking is gated off in development unless
/// explicitly enabled via [`AnalyticsConfig::enable_in_dev`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Detect the environment from `SHOPFRONT_ENV`. Anything other than
    /// `production` counts as development.
    pub fn detect() -> Self {
        match std::env::var("SHOPFRONT_ENV") {
            Ok(v) if v.eq_ignore_ascii_case("production") => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn is_development(self) -> bool {
        self == Environment::Development
    }
}

/// Root application configuration. Loaded from environment variables with
/// the prefix `SHOPFRONT__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "Environment::detect")]
    pub environment: Environment,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: Environment::detect(),
            analytics: AnalyticsConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> ShopfrontResult<Self> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("SHOPFRONT")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| ShopfrontError::Config(e.to_string()))?;
        config
            .try_deserialize()
            .map_err(|e| ShopfrontError::Config(e.to_string()))
    }
}

/// Static analytics integration settings. Read once at startup, never
/// reloaded.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsConfig {
    /// GA4 Measurement ID, e.g. "G-XXXXXXXXXX".
    #[serde(default = "default_measurement_id")]
    pub ga4_measurement_id: String,
    /// GTM container ID, e.g. "GTM-XXXXXXX".
    #[serde(default = "default_container_id")]
    pub gtm_container_id: String,
    /// Forward tracking calls even in development (default: false).
    #[serde(default)]
    pub enable_in_dev: bool,
    /// Enable GA4 debug mode and verbose payload logging (default: false).
    #[serde(default)]
    pub debug: bool,
}

fn default_measurement_id() -> String {
    PLACEHOLDER_MEASUREMENT_ID.to_string()
}

fn default_container_id() -> String {
    PLACEHOLDER_CONTAINER_ID.to_string()
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            ga4_measurement_id: default_measurement_id(),
            gtm_container_id: default_container_id(),
            enable_in_dev: false,
            debug: false,
        }
    }
}

impl AnalyticsConfig {
    /// Whether a usable GA4 measurement ID is present.
    pub fn ga4_configured(&self) -> bool {
        !self.ga4_measurement_id.is_empty()
            && self.ga4_measurement_id != PLACEHOLDER_MEASUREMENT_ID
    }

    /// Whether a usable GTM container ID is present.
    pub fn gtm_configured(&self) -> bool {
        !self.gtm_container_id.is_empty() && self.gtm_container_id != PLACEHOLDER_CONTAINER_ID
    }

    /// Validate ID formats. Used for startup warnings only — a bad ID never
    /// aborts the host application, it just suppresses that bootstrap.
    pub fn validate(&self) -> Result<()> {
        if self.ga4_configured() && !self.ga4_measurement_id.starts_with("G-") {
            return Err(anyhow!(
                "GA4 measurement ID must start with 'G-', got '{}'",
                self.ga4_measurement_id
            ));
        }
        if self.gtm_configured() && !self.gtm_container_id.starts_with("GTM-") {
            return Err(anyhow!(
                "GTM container ID must start with 'GTM-', got '{}'",
                self.gtm_container_id
            ));
        }
        Ok(())
    }
}
