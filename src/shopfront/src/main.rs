//! Shopfront demo — drives the analytics layer through a simulated
//! storefront session (browse, search, cart, checkout) and reports what
//! reached the data layer. Stands in for the web UI, which renders the
//! same catalog and emits the same events.

use std::sync::Arc;

use clap::Parser;
use serde_json::{json, Map};
use tracing::info;
use uuid::Uuid;

use shopfront_analytics::{
    normalize, AnalyticsGateway, ConversionParams, EcommerceParams, EngagementParams, MemoryPage,
    Page, PageViewParams, PurchaseParams,
};
use shopfront_core::config::AppConfig;
use shopfront_core::types::{CartLine, Product};

#[derive(Parser, Debug)]
#[command(name = "shopfront")]
#[command(about = "Demo storefront session with GA4/GTM event tracking")]
#[command(version)]
struct Cli {
    /// GA4 measurement ID (overrides config)
    #[arg(long, env = "SHOPFRONT__ANALYTICS__GA4_MEASUREMENT_ID")]
    ga4_id: Option<String>,

    /// GTM container ID (overrides config)
    #[arg(long, env = "SHOPFRONT__ANALYTICS__GTM_CONTAINER_ID")]
    gtm_id: Option<String>,

    /// Forward tracking calls even in development
    #[arg(long, default_value_t = false)]
    enable_in_dev: bool,

    /// Verbose payload logging and GA4 debug mode
    #[arg(long, default_value_t = false)]
    debug: bool,
}

fn catalog() -> Vec<Product> {
    vec![
        Product {
            id: 1.into(),
            name: "Stoneware Mug".into(),
            price: 18.0,
            category: Some("Kitchen".into()),
            brand: Some("Hearth".into()),
        },
        Product {
            id: 2.into(),
            name: "Linen Apron".into(),
            price: 42.0,
            category: Some("Kitchen".into()),
            brand: Some("Hearth".into()),
        },
        Product {
            id: 3.into(),
            name: "Walnut Serving Board".into(),
            price: 65.0,
            category: Some("Tableware".into()),
            brand: None,
        },
    ]
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shopfront=info,shopfront_analytics=debug".into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    if let Some(id) = cli.ga4_id {
        config.analytics.ga4_measurement_id = id;
    }
    if let Some(id) = cli.gtm_id {
        config.analytics.gtm_container_id = id;
    }
    if cli.enable_in_dev {
        config.analytics.enable_in_dev = true;
    }
    if cli.debug {
        config.analytics.debug = true;
    }

    info!(
        environment = ?config.environment,
        ga4_configured = config.analytics.ga4_configured(),
        gtm_configured = config.analytics.gtm_configured(),
        "Shopfront demo starting"
    );

    let page = Arc::new(MemoryPage::new());
    let gateway = AnalyticsGateway::new(
        config.analytics.clone(),
        config.environment,
        page.clone() as Arc<dyn Page>,
    );
    gateway.initialize();
    // Second call is a deliberate no-op; UI code paths may race to init.
    gateway.initialize();

    let products = catalog();
    run_session(&gateway, &products);

    match page.shared_queue() {
        Some(queue) => info!(
            entries = queue.len(),
            injected = page.injected().len(),
            "session complete, data layer populated"
        ),
        None => info!("session complete, tracking was not bootstrapped"),
    }
    let drops = gateway.drop_stats();
    info!(
        disabled = drops.disabled(),
        sink_unavailable = drops.sink_unavailable(),
        "dropped tracking calls"
    );

    Ok(())
}

/// One shopper's journey: land, search, browse a category, inspect a
/// product, fill the cart, check out, convert.
fn run_session(gateway: &AnalyticsGateway, products: &[Product]) {
    gateway.track_page_view(PageViewParams {
        page_path: "/".into(),
        page_title: "Shopfront".into(),
        page_location: "https://shop.example/".into(),
    });

    gateway.track_search("mug");
    gateway.track_category_view("Kitchen", 2);

    let mug = &products[0];
    let board = &products[2];

    gateway.track_view_item(EcommerceParams {
        currency: None,
        value: mug.price,
        items: vec![normalize::item_from_product(mug, None)],
    });
    gateway.track_add_to_cart(EcommerceParams {
        currency: None,
        value: mug.price,
        items: vec![normalize::item_from_product(mug, Some(1))],
    });
    gateway.track_add_to_cart(EcommerceParams {
        currency: None,
        value: board.price,
        items: vec![normalize::item_from_product(board, Some(1))],
    });

    // Shopper reconsiders the apron they picked up earlier.
    let apron = &products[1];
    gateway.track_add_to_cart(EcommerceParams {
        currency: None,
        value: apron.price,
        items: vec![normalize::item_from_product(apron, Some(1))],
    });
    gateway.track_remove_from_cart(EcommerceParams {
        currency: None,
        value: apron.price,
        items: vec![normalize::item_from_product(apron, Some(1))],
    });

    let cart = vec![
        CartLine::new(mug.clone(), 2),
        CartLine::new(board.clone(), 1),
    ];
    gateway.track_view_cart(normalize::payload_from_lines(&cart));
    gateway.track_begin_checkout(normalize::payload_from_lines(&cart));

    let payload = normalize::payload_from_lines(&cart);
    gateway.track_purchase(PurchaseParams {
        transaction_id: Uuid::new_v4().to_string(),
        currency: None,
        value: payload.value,
        tax: Some(payload.value * 0.08),
        shipping: Some(5.0),
        items: payload.items,
    });

    gateway.track_engagement(EngagementParams {
        event_category: "checkout".into(),
        event_action: "payment_method_selected".into(),
        event_label: Some("card".into()),
        value: None,
    });
    gateway.track_conversion(ConversionParams {
        conversion_name: "order_complete".into(),
        value: Some(payload.value),
    });

    let mut properties = Map::new();
    properties.insert("account_type".to_string(), json!("guest"));
    gateway.set_user_properties(properties);
    gateway.set_user_id("demo-shopper");
}
