//! External sinks — the shared data-layer queue and the global tagging
//! function. Both live on the host page; this layer only appends to the
//! queue and invokes the tagging function, never reads back.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};

use crate::events::DataLayerEvent;

/// One call form accepted by the tagging function.
#[derive(Debug, Clone, PartialEq)]
pub enum GtagCall {
    /// `gtag("js", <timestamp>)` — bootstrap timestamp.
    Js(DateTime<Utc>),
    /// `gtag("config", <measurement-id>, {...})`.
    Config {
        measurement_id: String,
        send_page_view: bool,
        debug_mode: bool,
    },
    /// `gtag("event", <name>, <params>)`.
    Event { name: String, params: Value },
    /// `gtag("set", "user_properties", <mapping>)`.
    SetUserProperties(Map<String, Value>),
    /// `gtag("set", {user_id: <id>})`.
    SetUserId(String),
}

/// An entry on the data-layer queue: either a structured event pushed
/// directly, or a tagging-function call recorded by the default adapter.
#[derive(Debug, Clone, PartialEq)]
pub enum DataLayerEntry {
    Event(DataLayerEvent),
    Call(GtagCall),
}

/// Ordered, append-only event queue. This layer is write-only against it.
pub trait DataLayer: Send + Sync {
    fn push(&self, entry: DataLayerEntry);
}

/// The global tagging function boundary.
pub trait TagFunction: Send + Sync {
    fn call(&self, call: GtagCall);
}

/// In-memory data layer — the stand-in for the page-global queue. Entries
/// are readable for the demo and for tests; the tracking layer itself never
/// reads them.
#[derive(Default)]
pub struct SharedDataLayer {
    entries: Mutex<Vec<DataLayerEntry>>,
}

impl SharedDataLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<DataLayerEntry> {
        self.entries.lock().expect("data layer mutex poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("data layer mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Count structured events with the given name.
    pub fn count_events(&self, name: &str) -> usize {
        self.entries
            .lock()
            .expect("data layer mutex poisoned")
            .iter()
            .filter(|entry| matches!(entry, DataLayerEntry::Event(e) if e.event == name))
            .count()
    }

    /// All recorded tagging-function calls, in push order.
    pub fn calls(&self) -> Vec<GtagCall> {
        self.entries
            .lock()
            .expect("data layer mutex poisoned")
            .iter()
            .filter_map(|entry| match entry {
                DataLayerEntry::Call(call) => Some(call.clone()),
                DataLayerEntry::Event(_) => None,
            })
            .collect()
    }
}

impl DataLayer for SharedDataLayer {
    fn push(&self, entry: DataLayerEntry) {
        self.entries.lock().expect("data layer mutex poisoned").push(entry);
    }
}

/// Default tagging function installed by the GA4 bootstrap: a thin adapter
/// that appends every call onto the shared queue.
pub struct QueueTagFunction {
    queue: Arc<dyn DataLayer>,
}

impl QueueTagFunction {
    pub fn new(queue: Arc<dyn DataLayer>) -> Self {
        Self { queue }
    }
}

impl TagFunction for QueueTagFunction {
    fn call(&self, call: GtagCall) {
        self.queue.push(DataLayerEntry::Call(call));
    }
}

/// In-memory tagging function that captures calls for testing.
#[derive(Default)]
pub struct CaptureTagFunction {
    calls: Mutex<Vec<GtagCall>>,
}

impl CaptureTagFunction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<GtagCall> {
        self.calls.lock().expect("capture mutex poisoned").clone()
    }

    pub fn count(&self) -> usize {
        self.calls.lock().expect("capture mutex poisoned").len()
    }

    /// Count `("event", name, ...)` calls with the given name.
    pub fn count_events(&self, name: &str) -> usize {
        self.calls
            .lock()
            .expect("capture mutex poisoned")
            .iter()
            .filter(|call| matches!(call, GtagCall::Event { name: n, .. } if n == name))
            .count()
    }
}

impl TagFunction for CaptureTagFunction {
    fn call(&self, call: GtagCall) {
        self.calls.lock().expect("capture mutex poisoned").push(call);
    }
}
