//! Load-balancer processor
//!
//! Lists the http/tcp/udp load-balancer collections in every
//! namespace, then attaches each instance under the sites and virtual
//! sites named in its custom advertise policy.

use crate::fanout::{self, FetchTarget};
use crate::inventory::{Inventory, ObjectRecord, SiteType};
use crate::processor::ProcessorCtx;
use crate::xc::uris::LOAD_BALANCER_TYPES;
use anyhow::{Context, Result};
use serde_json::Value;

pub async fn run(cx: &ProcessorCtx, inv: &mut Inventory) -> Result<()> {
    let namespaces = inv.namespaces.clone();

    for lb_type in LOAD_BALANCER_TYPES {
        let protocol = protocol_tag(lb_type);
        let mut targets = Vec::new();

        for namespace in &namespaces {
            let collection = cx.client.load_balancers_uri(namespace, lb_type);
            let listing = cx
                .client
                .list(&collection)
                .await
                .with_context(|| format!("listing {} in namespace {}", lb_type, namespace))?;

            for item in &listing {
                if let Some(name) = item.get("name").and_then(|v| v.as_str()) {
                    targets.push(FetchTarget::new(name, format!("{}/{}", collection, name)));
                }
            }
        }

        tracing::info!("fetching {} {} details", targets.len(), protocol);

        for fetched in fanout::fetch_all(&cx.client, targets, cx.workers).await {
            attach(cx, inv, protocol, &fetched.body);
        }
    }

    Ok(())
}

fn protocol_tag(lb_type: &str) -> &str {
    lb_type.split('_').next().unwrap_or(lb_type)
}

/// File the load balancer under every advertised site
fn attach(cx: &ProcessorCtx, inv: &mut Inventory, protocol: &str, body: &Value) {
    let Some(name) = body
        .get("metadata")
        .and_then(|m| m.get("name"))
        .and_then(|v| v.as_str())
    else {
        tracing::warn!("load balancer detail without metadata.name, skipped");
        return;
    };
    let Some(namespace) = body
        .get("metadata")
        .and_then(|m| m.get("namespace"))
        .and_then(|v| v.as_str())
    else {
        tracing::warn!("load balancer {} without metadata.namespace, skipped", name);
        return;
    };

    for (site_type, site_name) in super::advertised_sites(
        body.get("spec")
            .and_then(|s| s.get("advertise_custom"))
            .and_then(|a| a.get("advertise_where")),
    ) {
        if !cx.site_selected(&site_name) {
            continue;
        }
        if let Some(rec) = inv.attach(site_type, &site_name) {
            rec.namespace_mut(namespace)
                .loadbalancer
                .entry(protocol.to_string())
                .or_default()
                .insert(name.to_string(), ObjectRecord::from_detail(body));
            tracing::debug!(
                "attached {} load balancer {} to {} in namespace {}",
                protocol,
                name,
                site_name,
                namespace
            );
        }
    }
}
