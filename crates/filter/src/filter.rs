//! Include filter over involved objects

use evr_protocol::Event;
use serde::Deserialize;

/// Filters in events that should be forwarded
///
/// Values within a field are ORed together, while non-empty fields are
/// ANDed together. An empty field allows everything through, so the
/// default filter passes every event.
///
/// For example, to forward Pods or DaemonSets with any name in namespace
/// "kube-system":
///
/// ```toml
/// [filter]
/// kinds = ["Pod", "DaemonSet"]
/// namespaces = ["kube-system"]
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EventFilter {
    /// Involved-object kinds to allow (empty = all)
    pub kinds: Vec<String>,

    /// Involved-object names to allow (empty = all)
    pub names: Vec<String>,

    /// Namespaces to allow (empty = all)
    pub namespaces: Vec<String>,
}

impl EventFilter {
    /// Returns true if the event is allowed through this filter
    ///
    /// Pure function of the filter configuration and the event's involved
    /// object; no side effects.
    pub fn passes(&self, event: &Event) -> bool {
        let object = &event.involved_object;

        if !self.kinds.is_empty() && !self.kinds.contains(&object.kind) {
            return false;
        }
        if !self.names.is_empty() && !self.names.contains(&object.name) {
            return false;
        }
        if !self.namespaces.is_empty() && !self.namespaces.contains(&object.namespace) {
            return false;
        }

        true
    }

    /// Returns true if no field imposes any constraint
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty() && self.names.is_empty() && self.namespaces.is_empty()
    }
}
