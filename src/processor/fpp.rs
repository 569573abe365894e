//! Forward-proxy-policy processor
//!
//! Mirrors the enhanced-firewall-policy processor for
//! `spec.active_forward_proxy_policies`.

use crate::inventory::Inventory;
use crate::processor::{self, PolicyRef, ProcessorCtx};
use anyhow::Result;
use serde_json::Value;

pub async fn run(cx: &ProcessorCtx, inv: &mut Inventory) -> Result<()> {
    processor::attach_site_policies(
        cx,
        inv,
        active_policies,
        |client, namespace, name| client.forward_proxy_policy_uri(namespace, name),
        |rec| &mut rec.fpp,
    )
    .await
}

/// `spec.active_forward_proxy_policies.forward_proxy_policies[]`
fn active_policies(spec: &Value) -> Vec<PolicyRef> {
    spec.get("active_forward_proxy_policies")
        .and_then(|a| a.get("forward_proxy_policies"))
        .and_then(|v| v.as_array())
        .map(|refs| refs.iter().filter_map(processor::policy_ref).collect())
        .unwrap_or_default()
}
