//! Cloud-connect processor
//!
//! A cloud connector names its attachment site inside a provider
//! one-of (`aws_tgw_site` or `azure_vnet_site`). The connector record
//! attaches at the site level and its spokes payload, if present, is
//! recorded as the site's `spoke`.

use crate::fanout::{self, FetchTarget};
use crate::inventory::{Inventory, ObjectRecord, SiteType};
use crate::processor::ProcessorCtx;
use crate::xc::uris::CLOUD_CONNECT_TYPES;
use anyhow::{Context, Result};
use serde_json::Value;

pub async fn run(cx: &ProcessorCtx, inv: &mut Inventory) -> Result<()> {
    let listing = cx
        .client
        .list(&cx.client.cloud_connects_uri())
        .await
        .context("listing cloud connects")?;
    tracing::info!("cloud connect listing returned {} entries", listing.len());

    let targets: Vec<FetchTarget> = listing
        .iter()
        .filter_map(|item| item.get("name").and_then(|v| v.as_str()))
        .map(|name| FetchTarget::new(name, cx.client.cloud_connect_uri(name)))
        .collect();

    for fetched in fanout::fetch_all(&cx.client, targets, cx.workers).await {
        attach(cx, inv, &fetched.name, &fetched.body);
    }

    Ok(())
}

fn attach(cx: &ProcessorCtx, inv: &mut Inventory, name: &str, body: &Value) {
    let spec = body.get("spec");

    let Some((wrapper, site_name)) = connected_site(spec) else {
        tracing::warn!("cloud connect {} without a recognizable provider site", name);
        return;
    };
    if !cx.site_selected(&site_name) {
        return;
    }

    let spoke = spec
        .and_then(|s| s.get(wrapper))
        .and_then(|w| w.get("spokes"))
        .cloned();

    if let Some(rec) = inv.attach(SiteType::Site, &site_name) {
        rec.cloud_connector
            .insert(name.to_string(), ObjectRecord::from_detail(body));
        if spoke.is_some() {
            rec.spoke = spoke;
        }
        tracing::debug!("attached cloud connect {} to {}", name, site_name);
    }
}

/// First provider one-of present in the spec, with its site name
fn connected_site(spec: Option<&Value>) -> Option<(&'static str, String)> {
    let spec = spec?;
    for wrapper in CLOUD_CONNECT_TYPES {
        let site_name = spec
            .get(*wrapper)
            .and_then(|w| w.get("site"))
            .and_then(|s| s.get("name"))
            .and_then(|v| v.as_str());
        if let Some(site_name) = site_name {
            return Some((*wrapper, site_name.to_string()));
        }
    }
    None
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
    fn provider_one_of_names_the_site() {
        let spec = json!({
            "aws_tgw_site": {"site": {"name": "tgw-1", "namespace": "system"}}
        });
        assert_eq!(
            connected_site(Some(&spec)),
            Some(("aws_tgw_site", "tgw-1".to_string()))
        );
        assert_eq!(connected_site(Some(&json!({"gcp": {}}))), None);
    }

    #[test]
    fn spokes_land_on_the_site_record() {
        let mut inv = Inventory::default();
        inv.sites.insert("tgw-1".into(), SiteRecord::default());

        let body = json!({
            "metadata": {"name": "cc-1"},
            "spec": {
                "aws_tgw_site": {
                    "site": {"name": "tgw-1"},
                    "spokes": [{"vpc_id": "vpc-123"}]
                }
            }
        });
        attach(&cx(), &mut inv, "cc-1", &body);

        let rec = &inv.sites["tgw-1"];
        assert!(rec.cloud_connector.contains_key("cc-1"));
        assert_eq!(rec.spoke, Some(json!([{"vpc_id": "vpc-123"}])));
    }

    #[test]
    fn connector_without_spokes_leaves_spoke_alone() {
        let mut inv = Inventory::default();
        inv.sites.insert("vnet-1".into(), SiteRecord::default());

        let body = json!({
            "metadata": {"name": "cc-2"},
            "spec": {"azure_vnet_site": {"site": {"name": "vnet-1"}}}
        });
        attach(&cx(), &mut inv, "cc-2", &body);

        assert!(inv.sites["vnet-1"].cloud_connector.contains_key("cc-2"));
        assert!(inv.sites["vnet-1"].spoke.is_none());
    }
}
