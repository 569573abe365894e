//! DC-cluster-group processor
//!
//! A site joins at most one DC cluster group per interface flavor,
//! referenced from `spec.dc_cluster_group` (outside interfaces) or
//! `spec.dc_cluster_group_sli` (site-local inside).

use crate::inventory::Inventory;
use crate::processor::{self, PolicyRef, ProcessorCtx};
use anyhow::Result;
use serde_json::Value;

const REF_FIELDS: &[&str] = &["dc_cluster_group", "dc_cluster_group_sli"];

pub async fn run(cx: &ProcessorCtx, inv: &mut Inventory) -> Result<()> {
    processor::attach_site_policies(
        cx,
        inv,
        group_refs,
        |client, namespace, name| client.dc_cluster_group_uri(namespace, name),
        |rec| &mut rec.dc_cluster_group,
    )
    .await
}

fn group_refs(spec: &Value) -> Vec<PolicyRef> {
    REF_FIELDS
        .iter()
        .filter_map(|field| spec.get(*field))
        .filter_map(processor::policy_ref)
        .collect()
}
