//! Inventory processors
//!
//! One module per object kind. Every processor follows the same
//! contract: list its kind (a transport failure here is fatal), fetch
//! one detail per instance through the bounded fan-out, resolve the
//! kind-specific site references, and write guarded idempotent entries
//! into the inventory. The site processor runs first so the write
//! guard has something to check against.

pub mod bgp;
pub mod cloud_connect;
pub mod dc_cluster_group;
pub mod efp;
pub mod fpp;
pub mod load_balancer;
pub mod origin_pool;
pub mod proxy;
pub mod segment;
pub mod site;
pub mod smg;
pub mod virtual_site;

use crate::fanout::{self, FetchTarget};
use crate::inventory::{Inventory, ObjectRecord, SiteRecord, SiteType};
use crate::xc::client::XcClient;
use anyhow::Result;
use serde_json::Value;
use std::collections::BTreeMap;

/// The closed set of processor kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Site,
    VirtualSite,
    LoadBalancer,
    Proxy,
    OriginPool,
    Bgp,
    Segment,
    SiteMeshGroup,
    CloudConnect,
    EnhancedFirewallPolicy,
    ForwardProxyPolicy,
    DcClusterGroup,
}

impl Kind {
    pub fn name(&self) -> &'static str {
        match self {
            Kind::Site => "site",
            Kind::VirtualSite => "virtual_site",
            Kind::LoadBalancer => "load_balancer",
            Kind::Proxy => "proxy",
            Kind::OriginPool => "origin_pool",
            Kind::Bgp => "bgp",
            Kind::Segment => "segment",
            Kind::SiteMeshGroup => "site_mesh_group",
            Kind::CloudConnect => "cloud_connect",
            Kind::EnhancedFirewallPolicy => "enhanced_firewall_policy",
            Kind::ForwardProxyPolicy => "forward_proxy_policy",
            Kind::DcClusterGroup => "dc_cluster_group",
        }
    }
}

/// Execution order. Site and virtual-site records must exist before
/// the referencing kinds attach to them; the policy kinds come last
/// because they scan the site specs the site processor filled in.
pub const RUN_ORDER: &[Kind] = &[
    Kind::Site,
    Kind::VirtualSite,
    Kind::LoadBalancer,
    Kind::Proxy,
    Kind::OriginPool,
    Kind::Bgp,
    Kind::Segment,
    Kind::SiteMeshGroup,
    Kind::CloudConnect,
    Kind::EnhancedFirewallPolicy,
    Kind::ForwardProxyPolicy,
    Kind::DcClusterGroup,
];

/// Shared processor inputs, passed explicitly to every run
pub struct ProcessorCtx {
    pub client: XcClient,
    /// When set, only this site receives writes; everything else is
    /// dropped at write time.
    pub site_filter: Option<String>,
    pub workers: usize,
}

impl ProcessorCtx {
    /// Does the single-site filter admit this site name?
    pub fn site_selected(&self, name: &str) -> bool {
        self.site_filter.as_deref().map_or(true, |f| f == name)
    }
}

/// Dispatch one processor by kind
pub async fn run(kind: Kind, cx: &ProcessorCtx, inv: &mut Inventory) -> Result<()> {
    tracing::info!("processor {} started", kind.name());

    match kind {
        Kind::Site => site::run(cx, inv).await,
        Kind::VirtualSite => virtual_site::run(cx, inv).await,
        Kind::LoadBalancer => load_balancer::run(cx, inv).await,
        Kind::Proxy => proxy::run(cx, inv).await,
        Kind::OriginPool => origin_pool::run(cx, inv).await,
        Kind::Bgp => bgp::run(cx, inv).await,
        Kind::Segment => segment::run(cx, inv).await,
        Kind::SiteMeshGroup => smg::run(cx, inv).await,
        Kind::CloudConnect => cloud_connect::run(cx, inv).await,
        Kind::EnhancedFirewallPolicy => efp::run(cx, inv).await,
        Kind::ForwardProxyPolicy => fpp::run(cx, inv).await,
        Kind::DcClusterGroup => dc_cluster_group::run(cx, inv).await,
    }
}

/// Run the full pipeline in order; each batch completes before the
/// next kind starts.
pub async fn run_all(cx: &ProcessorCtx, inv: &mut Inventory) -> Result<()> {
    for kind in RUN_ORDER {
        run(*kind, cx, inv).await?;
    }
    Ok(())
}

/// Site references out of an `advertise_where` clause, shared by the
/// load-balancer and proxy processors. Each entry wraps the reference
/// twice: `{"site": {"site": {"name": ...}}}`.
pub(crate) fn advertised_sites(advertise_where: Option<&Value>) -> Vec<(SiteType, String)> {
    let Some(entries) = advertise_where.and_then(|v| v.as_array()) else {
        return Vec::new();
    };

    let mut refs = Vec::new();
    for entry in entries {
        let Some(map) = entry.as_object() else {
            continue;
        };
        for (tag, wrapper) in map {
            let Some(site_type) = SiteType::from_tag(tag) else {
                continue;
            };
            if let Some(name) = wrapper.get(tag).and_then(|v| v.get("name")).and_then(|v| v.as_str()) {
                refs.push((site_type, name.to_string()));
            }
        }
    }
    refs
}

/// A policy or group referenced from a site spec
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PolicyRef {
    pub namespace: String,
    pub name: String,
}

/// Shared driver for the kinds whose reference lives on the site
/// itself (enhanced firewall policies, forward proxy policies, DC
/// cluster groups): scan every healthy site spec for references, fetch
/// each referenced object once, and write it back under every site
/// that names it.
pub(crate) async fn attach_site_policies(
    cx: &ProcessorCtx,
    inv: &mut Inventory,
    refs_of: fn(&Value) -> Vec<PolicyRef>,
    uri_of: fn(&XcClient, &str, &str) -> String,
    map_of: fn(&mut SiteRecord) -> &mut BTreeMap<String, ObjectRecord>,
) -> Result<()> {
    let mut referencing: BTreeMap<String, (PolicyRef, Vec<String>)> = BTreeMap::new();

    for (site_name, rec) in &inv.sites {
        if !cx.site_selected(site_name) || !inv.may_attach(SiteType::Site, site_name) {
            continue;
        }
        for policy in refs_of(&rec.spec) {
            referencing
                .entry(policy.name.clone())
                .or_insert_with(|| (policy, Vec::new()))
                .1
                .push(site_name.clone());
        }
    }

    let targets: Vec<FetchTarget> = referencing
        .values()
        .map(|(policy, _)| {
            FetchTarget::new(
                policy.name.clone(),
                uri_of(&cx.client, &policy.namespace, &policy.name),
            )
        })
        .collect();

    for fetched in fanout::fetch_all(&cx.client, targets, cx.workers).await {
        let Some((_, sites)) = referencing.get(&fetched.name) else {
            continue;
        };
        for site_name in sites {
            if let Some(rec) = inv.attach(SiteType::Site, site_name) {
                map_of(rec).insert(fetched.name.clone(), ObjectRecord::from_detail(&fetched.body));
            }
        }
    }

    Ok(())
}

/// Resolve `{name, namespace}` out of one reference object
pub(crate) fn policy_ref(value: &Value) -> Option<PolicyRef> {
    let name = value.get("name").and_then(|v| v.as_str())?;
    let namespace = value
        .get("namespace")
        .and_then(|v| v.as_str())
        .filter(|ns| !ns.is_empty())
        .unwrap_or(crate::xc::uris::NAMESPACE_SYSTEM);
    Some(PolicyRef {
        namespace: namespace.to_string(),
        name: name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn site_runs_before_every_referencing_kind() {
        assert_eq!(RUN_ORDER[0], Kind::Site);
        assert_eq!(RUN_ORDER[1], Kind::VirtualSite);
    }

    #[test]
    fn site_filter_admits_only_the_named_site() {
        let cx = ProcessorCtx {
            client: XcClient::new("https://x/api", "t").unwrap(),
            site_filter: Some("edge-1".into()),
            workers: 4,
        };
        assert!(cx.site_selected("edge-1"));
        assert!(!cx.site_selected("edge-2"));
    }

    #[test]
    fn advertised_sites_reads_both_reference_flavors() {
        let clause = serde_json::json!([
            {"site": {"site": {"name": "edge-1", "namespace": "system"}}},
            {"virtual_site": {"virtual_site": {"name": "vs-emea"}}},
            {"vk8s_service": {"virtual_site": {"name": "ignored"}}}
        ]);
        let refs = advertised_sites(Some(&clause));
        assert_eq!(
            refs,
            vec![
                (SiteType::Site, "edge-1".to_string()),
                (SiteType::VirtualSite, "vs-emea".to_string()),
            ]
        );
        assert!(advertised_sites(None).is_empty());
    }

    #[test]
    fn no_filter_admits_everything() {
        let cx = ProcessorCtx {
            client: XcClient::new("https://x/api", "t").unwrap(),
            site_filter: None,
            workers: 4,
        };
        assert!(cx.site_selected("anything"));
    }
}
