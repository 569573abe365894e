//! Segment processor
//!
//! Segments attach to plain sites only, one reference per entry in
//! `spec.attachments[].site`.

use crate::fanout::{self, FetchTarget};
use crate::inventory::{Inventory, ObjectRecord, SiteType};
use crate::processor::ProcessorCtx;
use anyhow::{Context, Result};
use serde_json::Value;

pub async fn run(cx: &ProcessorCtx, inv: &mut Inventory) -> Result<()> {
    let listing = cx
        .client
        .list(&cx.client.segments_uri())
        .await
        .context("listing segments")?;
    tracing::info!("segment listing returned {} entries", listing.len());

    let targets: Vec<FetchTarget> = listing
        .iter()
        .filter_map(|item| item.get("name").and_then(|v| v.as_str()))
        .map(|name| FetchTarget::new(name, cx.client.segment_uri(name)))
        .collect();

    for fetched in fanout::fetch_all(&cx.client, targets, cx.workers).await {
        attach(cx, inv, &fetched.name, &fetched.body);
    }

    Ok(())
}

fn attach(cx: &ProcessorCtx, inv: &mut Inventory, name: &str, body: &Value) {
    for site_name in attached_sites(body.get("spec")) {
        if !cx.site_selected(&site_name) {
            continue;
        }
        if let Some(rec) = inv.attach(SiteType::Site, &site_name) {
            rec.segments
                .insert(name.to_string(), ObjectRecord::from_detail(body));
            tracing::debug!("attached segment {} to {}", name, site_name);
        }
    }
}

fn attached_sites(spec: Option<&Value>) -> Vec<String> {
    spec.and_then(|s| s.get("attachments"))
        .and_then(|v| v.as_array())
        .map(|attachments| {
            attachments
                .iter()
                .filter_map(|a| a.get("site").and_then(|v| v.as_str()))
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::SiteRecord;
    use crate::xc::client::XcClient;
    use serde_json::json;

    #[test]
    fn attachments_name_their_sites_directly() {
        let spec = json!({
            "attachments": [
                {"site": "edge-1", "interface": "eth1"},
                {"site": "edge-2"},
                {"virtual_network": "vn"}
            ]
        });
        assert_eq!(attached_sites(Some(&spec)), vec!["edge-1", "edge-2"]);
        assert!(attached_sites(None).is_empty());
    }

    #[test]
    fn segment_attaches_to_each_referenced_site() {
        let mut inv = Inventory::default();
        inv.sites.insert("edge-1".into(), SiteRecord::default());
        inv.sites.insert("edge-2".into(), SiteRecord::default());
        inv.failed.insert("edge-2".into(), "DOWN".into());

        let cx = ProcessorCtx {
            client: XcClient::new("https://x/api", "t").unwrap(),
            site_filter: None,
            workers: 1,
        };
        let body = json!({
            "metadata": {"name": "seg-1"},
            "spec": {"attachments": [{"site": "edge-1"}, {"site": "edge-2"}]}
        });
        attach(&cx, &mut inv, "seg-1", &body);

        assert!(inv.sites["edge-1"].segments.contains_key("seg-1"));
        // edge-2 is failed, the guard refuses the write
        assert!(inv.sites["edge-2"].segments.is_empty());
    }
}
