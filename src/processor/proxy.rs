//! Proxy processor
//!
//! Same shape as the load-balancer processor, but proxies advertise
//! through `spec.site_virtual_sites.advertise_where` and land in the
//! namespace slice's `proxys` map.

use crate::fanout::{self, FetchTarget};
use crate::inventory::{Inventory, ObjectRecord};
use crate::processor::ProcessorCtx;
use anyhow::{Context, Result};
use serde_json::Value;

pub async fn run(cx: &ProcessorCtx, inv: &mut Inventory) -> Result<()> {
    let namespaces = inv.namespaces.clone();
    let mut targets = Vec::new();

    for namespace in &namespaces {
        let collection = cx.client.proxys_uri(namespace);
        let listing = cx
            .client
            .list(&collection)
            .await
            .with_context(|| format!("listing proxys in namespace {}", namespace))?;

        for item in &listing {
            if let Some(name) = item.get("name").and_then(|v| v.as_str()) {
                targets.push(FetchTarget::new(name, format!("{}/{}", collection, name)));
            }
        }
    }

    tracing::info!("fetching {} proxy details", targets.len());

    for fetched in fanout::fetch_all(&cx.client, targets, cx.workers).await {
        attach(cx, inv, &fetched.body);
    }

    Ok(())
}

fn attach(cx: &ProcessorCtx, inv: &mut Inventory, body: &Value) {
    let Some(name) = body
        .get("metadata")
        .and_then(|m| m.get("name"))
        .and_then(|v| v.as_str())
    else {
        tracing::warn!("proxy detail without metadata.name, skipped");
        return;
    };
    let Some(namespace) = body
        .get("metadata")
        .and_then(|m| m.get("namespace"))
        .and_then(|v| v.as_str())
    else {
        tracing::warn!("proxy {} without metadata.namespace, skipped", name);
        return;
    };

    for (site_type, site_name) in super::advertised_sites(
        body.get("spec")
            .and_then(|s| s.get("site_virtual_sites"))
            .and_then(|s| s.get("advertise_where")),
    ) {
        if !cx.site_selected(&site_name) {
            continue;
        }
        if let Some(rec) = inv.attach(site_type, &site_name) {
            rec.namespace_mut(namespace)
                .proxys
                .insert(name.to_string(), ObjectRecord::from_detail(body));
            tracing::debug!(
                "attached proxy {} to {} in namespace {}",
                name,
                site_name,
                namespace
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::SiteRecord;
    use crate::xc::client::XcClient;
    use serde_json::json;

    fn cx() -> ProcessorCtx {
        ProcessorCtx {
            client: XcClient::new("https://x/api", "t").unwrap(),
            site_filter: None,
            workers: 1,
        }
    }

    #[test]
    fn attach_files_under_each_advertised_site() {
        let mut inv = Inventory::default();
        inv.sites.insert("edge-1".into(), SiteRecord::default());
        inv.virtual_sites.insert("vs-emea".into(), SiteRecord::default());

        let body = json!({
            "metadata": {"name": "px-1", "namespace": "shared"},
            "spec": {
                "http_proxy": {},
                "site_virtual_sites": {
                    "advertise_where": [
                        {"site": {"site": {"name": "edge-1"}}},
                        {"virtual_site": {"virtual_site": {"name": "vs-emea"}}}
                    ]
                }
            }
        });
        attach(&cx(), &mut inv, &body);

        assert!(inv.sites["edge-1"].namespaces["shared"].proxys.contains_key("px-1"));
        assert!(inv.virtual_sites["vs-emea"].namespaces["shared"]
            .proxys
            .contains_key("px-1"));
    }

    #[test]
    fn failed_site_receives_nothing() {
        let mut inv = Inventory::default();
        inv.sites.insert("edge-1".into(), SiteRecord::default());
        inv.failed.insert("edge-1".into(), "UPGRADING".into());

        let body = json!({
            "metadata": {"name": "px-1", "namespace": "shared"},
            "spec": {
                "site_virtual_sites": {
                    "advertise_where": [{"site": {"site": {"name": "edge-1"}}}]
                }
            }
        });
        attach(&cx(), &mut inv, &body);
        assert!(inv.sites["edge-1"].namespaces.is_empty());
    }
}
