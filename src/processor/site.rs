//! Site processor
//!
//! Runs first. Lists all sites, classifies each one (kind from the
//! `ves.io/siteType` label, failed state from the listing state), and
//! fills the base record every other processor attaches to: labels,
//! metadata/spec, node facts from the primary control nodes, and the
//! securemesh provider flavor.

use crate::fanout::{self, FetchTarget};
use crate::inventory::{Inventory, NodeRecord, SiteRecord};
use crate::processor::ProcessorCtx;
use crate::xc::uris::{NODE_PRIMARY, SITE_KIND_SMS_V1, SITE_KIND_SMS_V2};
use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::BTreeMap;

const SITE_TYPE_LABEL: &str = "ves.io/siteType";

/// States a healthy site may report; anything else lands in `failed`
const HEALTHY_STATES: &[&str] = &["APPLIED", "ONLINE"];

/// Provider one-of keys a securemesh spec names its flavor in
const PROVIDER_KEYS: &[&str] = &[
    "aws", "azure", "gcp", "baremetal", "kvm", "vmware", "openstack", "rseries",
];

pub async fn run(cx: &ProcessorCtx, inv: &mut Inventory) -> Result<()> {
    let listing = cx
        .client
        .list(&cx.client.sites_uri())
        .await
        .context("listing sites")?;
    tracing::info!("site listing returned {} entries", listing.len());

    let mut targets = Vec::new();

    for item in &listing {
        let Some(name) = item.get("name").and_then(|v| v.as_str()) else {
            tracing::warn!("site listing entry without a name, skipped");
            continue;
        };
        if !cx.site_selected(name) {
            continue;
        }

        let labels = parse_labels(item);
        let Some(kind) = site_kind(&labels) else {
            tracing::warn!("site {} has no recognizable kind", name);
            inv.untyped.push(name.to_string());
            continue;
        };

        if let Some(state) = failed_state(item) {
            tracing::warn!("site {} is in state {}", name, state);
            inv.failed.insert(name.to_string(), state);
        }

        inv.sites.insert(
            name.to_string(),
            SiteRecord {
                kind,
                labels,
                ..SiteRecord::default()
            },
        );
        targets.push(FetchTarget::new(name, cx.client.site_uri(name)));
    }

    for fetched in fanout::fetch_all(&cx.client, targets, cx.workers).await {
        apply_detail(inv, &fetched.name, &fetched.body);
    }

    let sms_targets: Vec<FetchTarget> = inv
        .sites
        .iter()
        .filter_map(|(name, rec)| match rec.kind.as_str() {
            SITE_KIND_SMS_V1 => Some(FetchTarget::new(name.clone(), cx.client.sms_v1_uri(name))),
            SITE_KIND_SMS_V2 => Some(FetchTarget::new(name.clone(), cx.client.sms_v2_uri(name))),
            _ => None,
        })
        .collect();

    for fetched in fanout::fetch_all(&cx.client, sms_targets, cx.workers).await {
        if let Some(rec) = inv.sites.get_mut(&fetched.name) {
            rec.sub_kind = provider_flavor(fetched.body.get("spec"));
        }
    }

    Ok(())
}

fn parse_labels(item: &Value) -> BTreeMap<String, String> {
    item.get("labels")
        .and_then(|v| v.as_object())
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

/// Kind from the site-type label, normalized to the object-kind form
/// (`ves-io-securemesh-site` -> `securemesh_site`)
fn site_kind(labels: &BTreeMap<String, String>) -> Option<String> {
    let raw = labels.get(SITE_TYPE_LABEL)?;
    let stripped = raw.strip_prefix("ves-io-").unwrap_or(raw);
    if stripped.is_empty() {
        return None;
    }
    Some(stripped.replace('-', "_"))
}

fn failed_state(item: &Value) -> Option<String> {
    let state = item.get("state").and_then(|v| v.as_str())?;
    if HEALTHY_STATES.contains(&state) {
        None
    } else {
        Some(state.to_string())
    }
}

/// Fold the detail response into the site record: payloads, node
/// counts, and the primary control nodes with their hardware facts.
fn apply_detail(inv: &mut Inventory, name: &str, body: &Value) {
    let Some(rec) = inv.sites.get_mut(name) else {
        return;
    };

    rec.metadata = body.get("metadata").cloned().unwrap_or(Value::Null);
    rec.spec = body.get("spec").cloned().unwrap_or(Value::Null);
    rec.main_node_count = node_count(body, "main_nodes");
    rec.worker_node_count = node_count(body, "worker_nodes");

    let Some(status) = body.get("status").and_then(|v| v.as_array()) else {
        return;
    };
    for node in status {
        let Some(info) = node.get("node_info") else {
            continue;
        };
        if !info.get("role").map(role_is_primary).unwrap_or(false) {
            continue;
        }
        let Some(hostname) = info.get("hostname").and_then(|v| v.as_str()) else {
            continue;
        };
        rec.nodes.insert(
            hostname.to_string(),
            NodeRecord {
                hostname: hostname.to_string(),
                interfaces: node.get("interfaces").cloned().unwrap_or(Value::Null),
                hw_info: node.get("hw_info").cloned().unwrap_or(Value::Null),
            },
        );
    }
}

fn node_count(body: &Value, field: &str) -> u64 {
    body.get("spec")
        .and_then(|s| s.get(field))
        .and_then(|v| v.as_array())
        .map(|a| a.len() as u64)
        .unwrap_or(0)
}

/// The role field is a string on older sites and a list on newer ones
fn role_is_primary(role: &Value) -> bool {
    match role {
        Value::String(s) => s.contains(NODE_PRIMARY),
        Value::Array(roles) => roles
            .iter()
            .any(|r| r.as_str().map(|s| s.contains(NODE_PRIMARY)).unwrap_or(false)),
        _ => false,
    }
}

fn provider_flavor(spec: Option<&Value>) -> Option<String> {
    let spec = spec?.as_object()?;
    PROVIDER_KEYS
        .iter()
        .find(|key| spec.contains_key(**key))
        .map(|key| key.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_comes_from_the_site_type_label_normalized() {
        let mut labels = BTreeMap::new();
        labels.insert(SITE_TYPE_LABEL.to_string(), "ves-io-securemesh-site".to_string());
        assert_eq!(site_kind(&labels), Some("securemesh_site".to_string()));

        labels.insert(SITE_TYPE_LABEL.to_string(), "ves-io-aws-vpc-site".to_string());
        assert_eq!(site_kind(&labels), Some("aws_vpc_site".to_string()));
    }

    #[test]
    fn missing_site_type_label_means_untyped() {
        assert_eq!(site_kind(&BTreeMap::new()), None);
    }

    #[test]
    fn non_applied_state_is_recorded_as_failed() {
        assert_eq!(
            failed_state(&json!({"state": "PROVISIONING"})),
            Some("PROVISIONING".to_string())
        );
        assert_eq!(failed_state(&json!({"state": "APPLIED"})), None);
        assert_eq!(failed_state(&json!({"state": "ONLINE"})), None);
        assert_eq!(failed_state(&json!({})), None);
    }

    #[test]
    fn detail_fills_nodes_from_primary_control_nodes_only() {
        let mut inv = Inventory::default();
        inv.sites.insert("edge-1".into(), SiteRecord::default());

        let body = json!({
            "metadata": {"name": "edge-1"},
            "spec": {"main_nodes": [{}, {}, {}], "worker_nodes": [{}]},
            "status": [
                {
                    "node_info": {"role": ["k8s-master-primary"], "hostname": "master-0"},
                    "hw_info": {"cpu": {"model": "EPYC"}},
                    "interfaces": [{"name": "eth0"}]
                },
                {
                    "node_info": {"role": ["k8s-worker"], "hostname": "worker-0"},
                    "hw_info": {}
                }
            ]
        });
        apply_detail(&mut inv, "edge-1", &body);

        let rec = &inv.sites["edge-1"];
        assert_eq!(rec.main_node_count, 3);
        assert_eq!(rec.worker_node_count, 1);
        assert_eq!(rec.nodes.len(), 1);
        assert_eq!(rec.nodes["master-0"].hw_info["cpu"]["model"], "EPYC");
    }

    #[test]
    fn provider_flavor_probes_the_one_of_keys() {
        assert_eq!(
            provider_flavor(Some(&json!({"azure": {}, "volterra_certified_hw": "x"}))),
            Some("azure".to_string())
        );
        assert_eq!(provider_flavor(Some(&json!({"unrelated": {}}))), None);
        assert_eq!(provider_flavor(None), None);
    }
}
