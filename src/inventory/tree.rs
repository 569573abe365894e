//! Inventory tree model
//!
//! The shared, site-keyed aggregate every processor writes into and the
//! diff engine reads from. Field names are serde-pinned to the snapshot
//! file format, which must stay round-trip stable across runs.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Which site map a reference points into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteType {
    Site,
    VirtualSite,
}

impl SiteType {
    /// Parse the tag used in advertise/where clauses
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "site" => Some(SiteType::Site),
            "virtual_site" => Some(SiteType::VirtualSite),
            _ => None,
        }
    }
}

/// Root of one inventory snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(rename = "site", default)]
    pub sites: BTreeMap<String, SiteRecord>,

    #[serde(rename = "virtual_site", default)]
    pub virtual_sites: BTreeMap<String, SiteRecord>,

    /// Namespace names in discovery order
    #[serde(default)]
    pub namespaces: Vec<String>,

    /// Sites in a non-applied/non-online state, name -> state string.
    /// Populated by the site processor before anything else runs; every
    /// other processor consults it as a write guard.
    #[serde(rename = "failed", default)]
    pub failed: BTreeMap<String, String>,

    /// Site objects with no recognizable kind, recorded and otherwise ignored
    #[serde(default)]
    pub untyped: Vec<String>,
}

impl Inventory {
    /// Write-guard: may an object attach data under this site?
    ///
    /// True only if the name already exists in the matching sub-tree
    /// (the site processor ran first) and the site is not failed.
    pub fn may_attach(&self, site_type: SiteType, name: &str) -> bool {
        let exists = match site_type {
            SiteType::Site => self.sites.contains_key(name),
            SiteType::VirtualSite => self.virtual_sites.contains_key(name),
        };
        exists && !self.failed.contains_key(name)
    }

    /// Mutable access to a guarded site record; `None` when the write
    /// guard refuses the attach.
    pub fn attach(&mut self, site_type: SiteType, name: &str) -> Option<&mut SiteRecord> {
        if !self.may_attach(site_type, name) {
            return None;
        }
        match site_type {
            SiteType::Site => self.sites.get_mut(name),
            SiteType::VirtualSite => self.virtual_sites.get_mut(name),
        }
    }
}

/// One site (or virtual site) and everything referencing it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteRecord {
    #[serde(default)]
    pub kind: String,

    /// Provider flavor for securemesh sites (aws, azure, gcp, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_kind: Option<String>,

    /// Opaque object payloads, copied verbatim from the API
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub metadata: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub spec: Value,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    #[serde(default)]
    pub main_node_count: u64,
    #[serde(default)]
    pub worker_node_count: u64,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub nodes: BTreeMap<String, NodeRecord>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub namespaces: BTreeMap<String, NamespaceSlice>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub bgp: BTreeMap<String, ObjectRecord>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub efp: BTreeMap<String, ObjectRecord>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fpp: BTreeMap<String, ObjectRecord>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dc_cluster_group: BTreeMap<String, ObjectRecord>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub smg: BTreeMap<String, ObjectRecord>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub segments: BTreeMap<String, ObjectRecord>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub cloud_connector: BTreeMap<String, ObjectRecord>,

    /// Virtual sites whose label selectors match this site; derived by
    /// the virtual-site processor, never fetched directly.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vsites: Vec<String>,

    /// Spoke payload recorded off a cloud connector, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spoke: Option<Value>,
}

impl SiteRecord {
    /// Namespace slice, created on first use
    pub fn namespace_mut(&mut self, namespace: &str) -> &mut NamespaceSlice {
        self.namespaces.entry(namespace.to_string()).or_default()
    }
}

/// One node of a site: hostname plus the raw hardware/interface facts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeRecord {
    #[serde(default)]
    pub hostname: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub interfaces: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub hw_info: Value,
}

/// Per-namespace objects advertised to a site
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NamespaceSlice {
    /// protocol tag (http/tcp/udp) -> name -> record
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub loadbalancer: BTreeMap<String, BTreeMap<String, ObjectRecord>>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub proxys: BTreeMap<String, ObjectRecord>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub origin_pools: BTreeMap<String, ObjectRecord>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub site_mesh_groups: BTreeMap<String, ObjectRecord>,
}

/// Uniform envelope copied verbatim per referencing object
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectRecord {
    #[serde(default)]
    pub spec: Value,
    #[serde(default)]
    pub metadata: Value,
    #[serde(default)]
    pub system_metadata: Value,
}

impl ObjectRecord {
    /// Build the envelope from a raw detail response
    pub fn from_detail(body: &Value) -> Self {
        Self {
            spec: body.get("spec").cloned().unwrap_or(Value::Null),
            metadata: body.get("metadata").cloned().unwrap_or(Value::Null),
            system_metadata: body.get("system_metadata").cloned().unwrap_or(Value::Null),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn attach_refuses_unknown_site() {
        let mut inv = Inventory::default();
        assert!(inv.attach(SiteType::Site, "ghost").is_none());
        // The refused attach must not create the key either
        assert!(!inv.sites.contains_key("ghost"));
    }

    #[test]
    fn attach_refuses_failed_site() {
        let mut inv = Inventory::default();
        inv.sites.insert("edge-1".into(), SiteRecord::default());
        inv.failed.insert("edge-1".into(), "PROVISIONING".into());
        assert!(inv.attach(SiteType::Site, "edge-1").is_none());
    }

    #[test]
    fn attach_allows_known_healthy_site() {
        let mut inv = Inventory::default();
        inv.sites.insert("edge-1".into(), SiteRecord::default());
        assert!(inv.attach(SiteType::Site, "edge-1").is_some());
    }

    #[test]
    fn object_record_copies_envelope_verbatim() {
        let body = json!({
            "spec": {"a": 1},
            "metadata": {"name": "lb-1"},
            "system_metadata": {"uid": "x"},
            "extra": true
        });
        let rec = ObjectRecord::from_detail(&body);
        assert_eq!(rec.spec, json!({"a": 1}));
        assert_eq!(rec.metadata["name"], "lb-1");
        assert_eq!(rec.system_metadata["uid"], "x");
    }
}
