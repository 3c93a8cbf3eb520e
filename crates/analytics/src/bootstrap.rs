//! One-time integration bootstrap — an ordered set of best-effort steps
//! that wire the GTM loader and the GA4 tagging function into the host
//! page. A step whose predicate fails is skipped with a log line; it never
//! aborts the remaining steps.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, warn};
use url::Url;

use shopfront_core::config::{AnalyticsConfig, Environment};

use crate::events::DataLayerEvent;
use crate::page::{InjectedResource, Page};
use crate::sinks::{DataLayerEntry, GtagCall, QueueTagFunction};

const GTM_LOADER_BASE: &str = "https://www.googletagmanager.com/gtm.js";
const GTM_NOSCRIPT_BASE: &str = "https://www.googletagmanager.com/ns.html";
const GTAG_LOADER_BASE: &str = "https://www.googletagmanager.com/gtag/js";

/// GTM loader URL for a container.
pub fn gtm_loader_url(container_id: &str) -> Url {
    loader_url(GTM_LOADER_BASE, container_id)
}

/// gtag.js loader URL for a measurement ID.
pub fn gtag_loader_url(measurement_id: &str) -> Url {
    loader_url(GTAG_LOADER_BASE, measurement_id)
}

fn loader_url(base: &str, id: &str) -> Url {
    let mut url = Url::parse(base).expect("loader base URL is valid");
    url.query_pairs_mut().append_pair("id", id);
    url
}

/// The inline GTM loader snippet, with the container ID interpolated.
pub fn gtm_snippet(container_id: &str) -> String {
    format!(
        "(function(w,d,s,l,i){{w[l]=w[l]||[];w[l].push({{'gtm.start':\n\
         new Date().getTime(),event:'gtm.js'}});var f=d.getElementsByTagName(s)[0],\n\
         j=d.createElement(s),dl=l!='dataLayer'?'&l='+l:'';j.async=true;j.src=\n\
         '{}'+dl;f.parentNode.insertBefore(j,f);\n\
         }})(window,document,'script','dataLayer','{container_id}');",
        gtm_loader_url(container_id)
    )
}

/// The GTM noscript fallback iframe markup.
pub fn gtm_noscript(container_id: &str) -> String {
    let mut src = Url::parse(GTM_NOSCRIPT_BASE).expect("loader base URL is valid");
    src.query_pairs_mut().append_pair("id", container_id);
    format!(
        "<iframe src=\"{src}\" height=\"0\" width=\"0\" \
         style=\"display:none;visibility:hidden\"></iframe>"
    )
}

/// Run the bootstrap steps in order: GTM first, then GA4. Best-effort — a
/// skipped or unconfigured step never prevents the next one.
pub(crate) fn run(config: &AnalyticsConfig, environment: Environment, page: &Arc<dyn Page>) {
    if environment.is_development() && !config.enable_in_dev {
        debug!("skipping analytics bootstrap in development");
        return;
    }

    if let Err(e) = config.validate() {
        warn!(error = %e, "analytics ID format looks wrong");
    }

    let gtm_step = || bootstrap_gtm(config, page);
    let ga4_step = || bootstrap_ga4(config, page);
    let steps: [(&str, bool, &dyn Fn()); 2] = [
        ("gtm", config.gtm_configured(), &gtm_step),
        ("ga4", config.ga4_configured(), &ga4_step),
    ];

    for (integration, configured, action) in steps {
        if !configured {
            warn!(integration, "integration ID not configured, skipping bootstrap");
            continue;
        }
        action();
    }
}

/// GTM: ensure the queue, record the loader start entry, inject the loader
/// snippet and the noscript fallback.
fn bootstrap_gtm(config: &AnalyticsConfig, page: &Arc<dyn Page>) {
    let queue = page.ensure_data_layer();

    let mut start = DataLayerEvent::new("gtm.js");
    start
        .params
        .insert("gtm.start".to_string(), json!(Utc::now().timestamp_millis()));
    queue.push(DataLayerEntry::Event(start));

    page.inject(InjectedResource::InlineScript(gtm_snippet(
        &config.gtm_container_id,
    )));
    page.inject(InjectedResource::NoScript(gtm_noscript(
        &config.gtm_container_id,
    )));

    debug!(container_id = %config.gtm_container_id, "GTM bootstrap complete");
}

/// GA4: ensure the queue, install the default tagging function if none is
/// present, issue the timestamp and config calls, inject the async loader.
fn bootstrap_ga4(config: &AnalyticsConfig, page: &Arc<dyn Page>) {
    let queue = page.ensure_data_layer();

    if page.tag_function().is_none() {
        page.install_tag_function(Arc::new(QueueTagFunction::new(queue)));
    }

    if let Some(tag) = page.tag_function() {
        tag.call(GtagCall::Js(Utc::now()));
        tag.call(GtagCall::Config {
            measurement_id: config.ga4_measurement_id.clone(),
            send_page_view: true,
            debug_mode: config.debug,
        });
    }

    page.inject(InjectedResource::ExternalScript {
        src: gtag_loader_url(&config.ga4_measurement_id),
        async_load: true,
    });

    debug!(measurement_id = %config.ga4_measurement_id, "GA4 bootstrap complete");
}
