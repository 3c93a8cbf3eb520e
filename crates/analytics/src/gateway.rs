//! Sink gateway — owns the one-time bootstrap and gates/forwards every
//! tracking call to the two host-page sinks. Fail-open by policy: missing
//! configuration, a disabled environment, or an absent sink degrades to a
//! counted, logged no-op. Nothing here returns an error to the caller.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::{json, Map, Value};
use tracing::debug;

use shopfront_core::config::{AnalyticsConfig, Environment};

use crate::bootstrap;
use crate::events::{
    names, ConversionParams, DataLayerEvent, EcommerceParams, EngagementParams, PageViewParams,
    PurchaseParams,
};
use crate::page::Page;
use crate::sinks::{DataLayerEntry, GtagCall};

/// Why a tracking call was dropped instead of forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Development environment without the dev opt-in.
    Disabled,
    /// The target sink was never installed (bootstrap skipped or partial).
    SinkUnavailable,
}

/// Counters for dropped tracking calls, split by cause. Observational only:
/// a drop is never surfaced to the caller as an error.
#[derive(Default)]
pub struct DropStats {
    disabled: AtomicU64,
    sink_unavailable: AtomicU64,
    by_event: DashMap<String, u64>,
}

impl DropStats {
    fn record(&self, event: &str, reason: DropReason) {
        match reason {
            DropReason::Disabled => self.disabled.fetch_add(1, Ordering::Relaxed),
            DropReason::SinkUnavailable => self.sink_unavailable.fetch_add(1, Ordering::Relaxed),
        };
        *self.by_event.entry(event.to_string()).or_insert(0) += 1;
    }

    pub fn disabled(&self) -> u64 {
        self.disabled.load(Ordering::Relaxed)
    }

    pub fn sink_unavailable(&self) -> u64 {
        self.sink_unavailable.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> u64 {
        self.disabled() + self.sink_unavailable()
    }

    /// Drops recorded for a specific event name.
    pub fn for_event(&self, event: &str) -> u64 {
        self.by_event.get(event).map(|count| *count).unwrap_or(0)
    }
}

/// The tracking context object. Constructed once at startup and passed to
/// whoever needs to emit telemetry; the sole writer of the initialized flag.
pub struct AnalyticsGateway {
    config: AnalyticsConfig,
    environment: Environment,
    page: Arc<dyn Page>,
    initialized: AtomicBool,
    drops: DropStats,
}

impl AnalyticsGateway {
    pub fn new(config: AnalyticsConfig, environment: Environment, page: Arc<dyn Page>) -> Self {
        Self {
            config,
            environment,
            page,
            initialized: AtomicBool::new(false),
            drops: DropStats::default(),
        }
    }

    /// One-time bootstrap of both integrations. Idempotent: repeat calls
    /// are no-ops regardless of whether the first run skipped any step.
    pub fn initialize(&self) {
        if self.initialized.swap(true, Ordering::SeqCst) {
            return;
        }
        bootstrap::run(&self.config, self.environment, &self.page);
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// The enablement gate: false only in development without the opt-in.
    pub fn is_enabled(&self) -> bool {
        !(self.environment.is_development() && !self.config.enable_in_dev)
    }

    pub fn drop_stats(&self) -> &DropStats {
        &self.drops
    }

    /// Forward `("event", name, params)` to the tagging function. Disabled
    /// or sink-less contexts drop the call.
    pub fn send_event(&self, name: &str, params: Value) {
        if !self.is_enabled() {
            debug!(event = name, "tracking disabled, event dropped");
            self.drops.record(name, DropReason::Disabled);
            return;
        }

        match self.page.tag_function() {
            Some(tag) => {
                if self.config.debug {
                    debug!(event = name, params = %params, "sending event");
                }
                tag.call(GtagCall::Event {
                    name: name.to_string(),
                    params,
                });
            }
            None => {
                debug!(event = name, "tag function unavailable, event dropped");
                self.drops.record(name, DropReason::SinkUnavailable);
            }
        }
    }

    /// Append a structured event to the data-layer queue.
    pub fn push_to_data_layer(&self, event: DataLayerEvent) {
        if !self.is_enabled() {
            debug!(event = %event.event, "tracking disabled, data layer push dropped");
            self.drops.record(&event.event, DropReason::Disabled);
            return;
        }

        match self.page.data_layer() {
            Some(queue) => {
                if self.config.debug {
                    debug!(event = %event.event, "pushing to data layer");
                }
                queue.push(DataLayerEntry::Event(event));
            }
            None => {
                debug!(event = %event.event, "data layer unavailable, push dropped");
                self.drops.record(&event.event, DropReason::SinkUnavailable);
            }
        }
    }

    // ─── Ecommerce events ───────────────────────────────────────────────

    /// Generic ecommerce forwarder: the same wire object goes to the tag
    /// function flat and to the data layer nested under `ecommerce`.
    pub fn track_ecommerce(&self, name: &str, params: EcommerceParams) {
        self.forward_ecommerce(name, params.into_wire());
    }

    pub fn track_view_item(&self, params: EcommerceParams) {
        self.forward_ecommerce(names::VIEW_ITEM, params.into_wire());
    }

    pub fn track_add_to_cart(&self, params: EcommerceParams) {
        self.forward_ecommerce(names::ADD_TO_CART, params.into_wire());
    }

    pub fn track_remove_from_cart(&self, params: EcommerceParams) {
        self.forward_ecommerce(names::REMOVE_FROM_CART, params.into_wire());
    }

    pub fn track_view_cart(&self, params: EcommerceParams) {
        self.forward_ecommerce(names::VIEW_CART, params.into_wire());
    }

    pub fn track_begin_checkout(&self, params: EcommerceParams) {
        self.forward_ecommerce(names::BEGIN_CHECKOUT, params.into_wire());
    }

    pub fn track_purchase(&self, params: PurchaseParams) {
        self.forward_ecommerce(names::PURCHASE, params.into_wire());
    }

    fn forward_ecommerce(&self, name: &str, wire: Value) {
        self.send_event(name, wire.clone());
        self.push_to_data_layer(DataLayerEvent::with_ecommerce(name, wire));
    }

    // ─── Standard and custom events ─────────────────────────────────────

    pub fn track_page_view(&self, params: PageViewParams) {
        self.forward_flat(names::PAGE_VIEW, json!(params));
    }

    pub fn track_search(&self, search_term: &str) {
        self.forward_flat(names::SEARCH, json!({ "search_term": search_term }));
    }

    /// Category selection maps to view_item_list.
    pub fn track_category_view(&self, category: &str, item_count: usize) {
        self.forward_flat(
            names::VIEW_ITEM_LIST,
            json!({ "item_list_name": category, "item_count": item_count }),
        );
    }

    pub fn track_engagement(&self, params: EngagementParams) {
        self.forward_flat(names::ENGAGEMENT, json!(params));
    }

    pub fn track_conversion(&self, params: ConversionParams) {
        self.forward_flat(names::CONVERSION, params.into_wire());
    }

    /// Generic custom event: a plain delegate to [`Self::send_event`].
    pub fn track_event(&self, name: &str, params: Value) {
        self.send_event(name, params);
    }

    fn forward_flat(&self, name: &str, params: Value) {
        self.send_event(name, params.clone());
        self.push_to_data_layer(DataLayerEvent::with_params(name, params));
    }

    // ─── User identity ──────────────────────────────────────────────────

    /// Issue `("set", "user_properties", <mapping>)`.
    pub fn set_user_properties(&self, properties: Map<String, Value>) {
        self.set_call("user_properties", GtagCall::SetUserProperties(properties));
    }

    /// Issue `("set", {user_id: <id>})`.
    pub fn set_user_id(&self, user_id: &str) {
        self.set_call("user_id", GtagCall::SetUserId(user_id.to_string()));
    }

    fn set_call(&self, what: &str, call: GtagCall) {
        if !self.is_enabled() {
            self.drops.record(what, DropReason::Disabled);
            return;
        }
        match self.page.tag_function() {
            Some(tag) => {
                if self.config.debug {
                    debug!(what, "set call issued");
                }
                tag.call(call);
            }
            None => {
                self.drops.record(what, DropReason::SinkUnavailable);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EcommerceItem;
    use crate::page::MemoryPage;
    use crate::sinks::SharedDataLayer;

    fn configured() -> AnalyticsConfig {
        AnalyticsConfig {
            ga4_measurement_id: "G-TEST12345".into(),
            gtm_container_id: "GTM-ABC1234".into(),
            enable_in_dev: true,
            debug: false,
        }
    }

    fn gateway() -> (AnalyticsGateway, Arc<MemoryPage>) {
        let page = Arc::new(MemoryPage::new());
        let gateway = AnalyticsGateway::new(
            configured(),
            Environment::Production,
            page.clone() as Arc<dyn Page>,
        );
        gateway.initialize();
        (gateway, page)
    }

    fn item() -> EcommerceItem {
        EcommerceItem {
            item_id: 1.into(),
            item_name: "X".into(),
            price: Some(10.0),
            quantity: Some(1),
            item_category: Some("A".into()),
            item_brand: None,
            item_variant: None,
            index: None,
        }
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let (gateway, page) = gateway();
        assert!(gateway.is_initialized());
        let after_first = page.injected().len();
        let queue_after_first = page.shared_queue().unwrap().len();

        gateway.initialize();
        gateway.initialize();

        assert_eq!(page.injected().len(), after_first);
        assert_eq!(page.shared_queue().unwrap().len(), queue_after_first);
    }

    #[test]
    fn test_ecommerce_event_reaches_both_sinks() {
        let (gateway, page) = gateway();
        let queue = page.shared_queue().unwrap();
        let before = queue.len();

        gateway.track_add_to_cart(EcommerceParams {
            currency: None,
            value: 10.0,
            items: vec![item()],
        });

        // One gtag event call plus one structured push.
        assert_eq!(queue.len(), before + 2);
        assert_eq!(queue.count_events("add_to_cart"), 1);

        let call = queue
            .calls()
            .into_iter()
            .find_map(|call| match call {
                GtagCall::Event { name, params } if name == "add_to_cart" => Some(params),
                _ => None,
            })
            .unwrap();
        assert_eq!(call["currency"], "USD");
        assert_eq!(call["value"], 10.0);
        assert_eq!(call["items"][0]["item_id"], 1);
        assert_eq!(call["items"][0]["item_name"], "X");
        assert_eq!(call["items"][0]["quantity"], 1);
        assert_eq!(call["items"][0]["item_category"], "A");

        // The data-layer copy nests the same object under `ecommerce`.
        let nested = queue
            .entries()
            .into_iter()
            .find_map(|entry| match entry {
                DataLayerEntry::Event(e) if e.event == "add_to_cart" => Some(e),
                _ => None,
            })
            .unwrap();
        assert_eq!(nested.params["ecommerce"], call);
    }

    #[test]
    fn test_remove_from_cart_reaches_both_sinks() {
        let (gateway, page) = gateway();
        gateway.track_remove_from_cart(EcommerceParams {
            currency: None,
            value: 10.0,
            items: vec![item()],
        });

        let queue = page.shared_queue().unwrap();
        assert_eq!(queue.count_events("remove_from_cart"), 1);
        let call = queue
            .calls()
            .into_iter()
            .find_map(|call| match call {
                GtagCall::Event { name, params } if name == "remove_from_cart" => Some(params),
                _ => None,
            })
            .unwrap();
        assert_eq!(call["currency"], "USD");
        assert_eq!(call["value"], 10.0);

        let nested = queue
            .entries()
            .into_iter()
            .find_map(|entry| match entry {
                DataLayerEntry::Event(e) if e.event == "remove_from_cart" => Some(e),
                _ => None,
            })
            .unwrap();
        assert_eq!(nested.params["ecommerce"], call);
    }

    #[test]
    fn test_generic_ecommerce_forwarder_reaches_both_sinks() {
        let (gateway, page) = gateway();
        gateway.track_ecommerce(
            "add_to_wishlist",
            EcommerceParams {
                currency: None,
                value: 10.0,
                items: vec![item()],
            },
        );

        let queue = page.shared_queue().unwrap();
        assert_eq!(queue.count_events("add_to_wishlist"), 1);
        let call = queue
            .calls()
            .into_iter()
            .find_map(|call| match call {
                GtagCall::Event { name, params } if name == "add_to_wishlist" => Some(params),
                _ => None,
            })
            .unwrap();
        assert_eq!(call["currency"], "USD");

        let nested = queue
            .entries()
            .into_iter()
            .find_map(|entry| match entry {
                DataLayerEntry::Event(e) if e.event == "add_to_wishlist" => Some(e),
                _ => None,
            })
            .unwrap();
        assert_eq!(nested.params["ecommerce"], call);
    }

    #[test]
    fn test_generic_event_delegates_to_send() {
        let (gateway, page) = gateway();
        let queue = page.shared_queue().unwrap();
        let before = queue.len();

        gateway.track_event("theme_changed", json!({ "theme": "dark" }));

        // One gtag call, no structured data-layer push.
        assert_eq!(queue.len(), before + 1);
        assert_eq!(queue.count_events("theme_changed"), 0);
        let call = queue
            .calls()
            .into_iter()
            .find_map(|call| match call {
                GtagCall::Event { name, params } if name == "theme_changed" => Some(params),
                _ => None,
            })
            .unwrap();
        assert_eq!(call["theme"], "dark");
    }

    #[test]
    fn test_purchase_defaults_flow_through() {
        let (gateway, page) = gateway();
        gateway.track_purchase(PurchaseParams {
            transaction_id: "txn-9".into(),
            currency: None,
            value: 25.0,
            tax: None,
            shipping: None,
            items: vec![item()],
        });

        let queue = page.shared_queue().unwrap();
        let nested = queue
            .entries()
            .into_iter()
            .find_map(|entry| match entry {
                DataLayerEntry::Event(e) if e.event == "purchase" => Some(e),
                _ => None,
            })
            .unwrap();
        let ecommerce = &nested.params["ecommerce"];
        assert_eq!(ecommerce["transaction_id"], "txn-9");
        assert_eq!(ecommerce["tax"], 0.0);
        assert_eq!(ecommerce["shipping"], 0.0);
    }

    #[test]
    fn test_disabled_gate_blocks_everything() {
        let page = Arc::new(MemoryPage::new());
        // Pre-install sinks so a leak would be visible.
        let queue = Arc::new(SharedDataLayer::new());
        page.install_tag_function(Arc::new(crate::sinks::QueueTagFunction::new(
            queue.clone() as Arc<dyn crate::sinks::DataLayer>,
        )));

        let config = AnalyticsConfig {
            enable_in_dev: false,
            ..configured()
        };
        let gateway = AnalyticsGateway::new(
            config,
            Environment::Development,
            page.clone() as Arc<dyn Page>,
        );
        gateway.initialize();

        assert!(!gateway.is_enabled());
        gateway.track_search("mug");
        gateway.track_view_cart(EcommerceParams::default());
        gateway.set_user_id("u-1");
        gateway.track_page_view(PageViewParams {
            page_path: "/".into(),
            page_title: "Home".into(),
            page_location: "https://shop.example/".into(),
        });

        assert!(queue.is_empty());
        assert!(page.shared_queue().is_none());
        assert!(gateway.drop_stats().disabled() > 0);
        assert_eq!(gateway.drop_stats().sink_unavailable(), 0);
    }

    #[test]
    fn test_uninitialized_gateway_drops_as_unavailable() {
        let page = Arc::new(MemoryPage::new());
        let gateway = AnalyticsGateway::new(
            configured(),
            Environment::Production,
            page.clone() as Arc<dyn Page>,
        );
        // No initialize(): neither sink exists.
        gateway.track_search("mug");

        // send_event and push_to_data_layer each record a drop.
        assert_eq!(gateway.drop_stats().sink_unavailable(), 2);
        assert_eq!(gateway.drop_stats().for_event("search"), 2);
        assert_eq!(gateway.drop_stats().disabled(), 0);
    }

    #[test]
    fn test_empty_search_term_still_tracked() {
        let (gateway, page) = gateway();
        gateway.track_search("");

        let queue = page.shared_queue().unwrap();
        assert_eq!(queue.count_events("search"), 1);
        let call = queue
            .calls()
            .into_iter()
            .find_map(|call| match call {
                GtagCall::Event { name, params } if name == "search" => Some(params),
                _ => None,
            })
            .unwrap();
        assert_eq!(call["search_term"], "");
    }

    #[test]
    fn test_category_view_shape() {
        let (gateway, page) = gateway();
        gateway.track_category_view("Kitchen", 12);

        let queue = page.shared_queue().unwrap();
        let entry = queue
            .entries()
            .into_iter()
            .find_map(|entry| match entry {
                DataLayerEntry::Event(e) if e.event == "view_item_list" => Some(e),
                _ => None,
            })
            .unwrap();
        assert_eq!(entry.params["item_list_name"], "Kitchen");
        assert_eq!(entry.params["item_count"], 12);
    }

    #[test]
    fn test_engagement_optional_fields() {
        let (gateway, page) = gateway();
        gateway.track_engagement(EngagementParams {
            event_category: "ui".into(),
            event_action: "theme_toggle".into(),
            event_label: None,
            value: None,
        });

        let queue = page.shared_queue().unwrap();
        let entry = queue
            .entries()
            .into_iter()
            .find_map(|entry| match entry {
                DataLayerEntry::Event(e) if e.event == "engagement" => Some(e),
                _ => None,
            })
            .unwrap();
        assert_eq!(entry.params["event_category"], "ui");
        assert_eq!(entry.params["event_action"], "theme_toggle");
        assert!(entry.params.get("event_label").is_none());
        assert!(entry.params.get("value").is_none());
    }

    #[test]
    fn test_user_identity_calls() {
        let (gateway, page) = gateway();
        let queue = page.shared_queue().unwrap();

        let mut properties = Map::new();
        properties.insert("account_type".to_string(), json!("premium"));
        gateway.set_user_properties(properties.clone());
        gateway.set_user_id("user-42");

        let calls = queue.calls();
        assert!(calls
            .iter()
            .any(|call| matches!(call, GtagCall::SetUserProperties(p) if *p == properties)));
        assert!(calls
            .iter()
            .any(|call| matches!(call, GtagCall::SetUserId(id) if id == "user-42")));
    }
}
