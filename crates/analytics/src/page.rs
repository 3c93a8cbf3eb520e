//! Host page environment — the mutable slots the bootstrap manipulates.
//! Models what the original browser integration touches on `window` and the
//! document: the data-layer global, the tagging-function global, and the
//! loader resources injected into head/body.

use std::sync::{Arc, Mutex};
use url::Url;

use crate::sinks::{DataLayer, SharedDataLayer, TagFunction};

/// A resource injected into the page during bootstrap.
#[derive(Debug, Clone, PartialEq)]
pub enum InjectedResource {
    /// Inline script, e.g. the GTM loader snippet.
    InlineScript(String),
    /// External script tag, e.g. the gtag.js loader.
    ExternalScript { src: Url, async_load: bool },
    /// Noscript fallback markup, e.g. the GTM iframe.
    NoScript(String),
}

/// The host page as seen by the tracking layer. The gateway never assumes
/// the slots are populated — an absent slot means the call drops.
pub trait Page: Send + Sync {
    /// Shared event queue, if one has been installed.
    fn data_layer(&self) -> Option<Arc<dyn DataLayer>>;

    /// Return the existing queue, installing a fresh one if absent.
    fn ensure_data_layer(&self) -> Arc<dyn DataLayer>;

    /// Global tagging function, if one has been installed.
    fn tag_function(&self) -> Option<Arc<dyn TagFunction>>;

    fn install_tag_function(&self, tag: Arc<dyn TagFunction>);

    /// Record a loader resource injection. Fire-and-forget: nothing awaits
    /// the resource actually loading.
    fn inject(&self, resource: InjectedResource);
}

/// In-memory page for the demo binary and tests.
#[derive(Default)]
pub struct MemoryPage {
    data_layer: Mutex<Option<Arc<SharedDataLayer>>>,
    tag_function: Mutex<Option<Arc<dyn TagFunction>>>,
    injected: Mutex<Vec<InjectedResource>>,
}

impl MemoryPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Concrete queue accessor, for inspecting entries after a run.
    pub fn shared_queue(&self) -> Option<Arc<SharedDataLayer>> {
        self.data_layer.lock().expect("page mutex poisoned").clone()
    }

    pub fn injected(&self) -> Vec<InjectedResource> {
        self.injected.lock().expect("page mutex poisoned").clone()
    }
}

impl Page for MemoryPage {
    fn data_layer(&self) -> Option<Arc<dyn DataLayer>> {
        self.data_layer
            .lock()
            .expect("page mutex poisoned")
            .clone()
            .map(|layer| layer as Arc<dyn DataLayer>)
    }

    fn ensure_data_layer(&self) -> Arc<dyn DataLayer> {
        let mut slot = self.data_layer.lock().expect("page mutex poisoned");
        slot.get_or_insert_with(|| Arc::new(SharedDataLayer::new()))
            .clone()
    }

    fn tag_function(&self) -> Option<Arc<dyn TagFunction>> {
        self.tag_function.lock().expect("page mutex poisoned").clone()
    }

    fn install_tag_function(&self, tag: Arc<dyn TagFunction>) {
        *self.tag_function.lock().expect("page mutex poisoned") = Some(tag);
    }

    fn inject(&self, resource: InjectedResource) {
        self.injected.lock().expect("page mutex poisoned").push(resource);
    }
}
