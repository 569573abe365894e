//! XC API resource paths and object-kind constants
//!
//! One constant per configuration endpoint, kept in the same shape the
//! console API documents them. Path parameters are filled in by the
//! URL builders on [`super::client::XcClient`].

pub const URI_NAMESPACES: &str = "/web/namespaces";
pub const URI_SITES: &str = "/config/namespaces/system/sites";
pub const URI_SITE: &str = "/config/namespaces/system/sites/{name}";
pub const URI_SMS_V1: &str = "/config/namespaces/{namespace}/securemesh_sites/{name}";
pub const URI_SMS_V2: &str = "/config/namespaces/{namespace}/securemesh_site_v2s/{name}";
pub const URI_VIRTUAL_SITES: &str = "/config/namespaces/{namespace}/virtual_sites";
pub const URI_VIRTUAL_SITE: &str = "/config/namespaces/{namespace}/virtual_sites/{name}";
pub const URI_LOAD_BALANCERS: &str = "/config/namespaces/{namespace}/{lb_type}";
pub const URI_ORIGIN_POOLS: &str = "/config/namespaces/{namespace}/origin_pools";
pub const URI_PROXYS: &str = "/config/namespaces/{namespace}/proxys";
pub const URI_BGPS: &str = "/config/namespaces/{namespace}/bgps";
pub const URI_BGP: &str = "/config/namespaces/{namespace}/bgps/{name}";
pub const URI_SEGMENTS: &str = "/config/namespaces/{namespace}/segments";
pub const URI_SEGMENT: &str = "/config/namespaces/{namespace}/segments/{name}";
pub const URI_SITE_MESH_GROUPS: &str = "/config/namespaces/{namespace}/site_mesh_groups";
pub const URI_SITE_MESH_GROUP: &str = "/config/namespaces/{namespace}/site_mesh_groups/{name}";
pub const URI_CLOUD_CONNECTS: &str = "/config/namespaces/{namespace}/cloud_connects";
pub const URI_CLOUD_CONNECT: &str = "/config/namespaces/{namespace}/cloud_connects/{name}";
pub const URI_DC_CLUSTER_GROUP: &str = "/config/namespaces/{namespace}/dc_cluster_groups/{name}";
pub const URI_ENHANCED_FW_POLICY: &str =
    "/config/namespaces/{namespace}/enhanced_firewall_policys/{name}";
pub const URI_FORWARD_PROXY_POLICY: &str =
    "/config/namespaces/{namespace}/forward_proxy_policys/{name}";

/// Load balancer collections queried per namespace
pub const LOAD_BALANCER_TYPES: &[&str] =
    &["http_loadbalancers", "tcp_loadbalancers", "udp_loadbalancers"];

/// One-of wrappers an origin server hides its site locator in
pub const ORIGIN_SERVER_TYPES: &[&str] =
    &["private_ip", "k8s_service", "consul_service", "private_name"];

/// One-of wrappers a cloud connector names its attachment site in
pub const CLOUD_CONNECT_TYPES: &[&str] = &["aws_tgw_site", "azure_vnet_site"];

pub const NAMESPACE_SYSTEM: &str = "system";
pub const NAMESPACE_SHARED: &str = "shared";

/// Role tag of the primary control node in a site's status list
pub const NODE_PRIMARY: &str = "k8s-master-primary";

pub const SITE_KIND_SMS_V1: &str = "securemesh_site";
pub const SITE_KIND_SMS_V2: &str = "securemesh_site_v2";

/// Fill `{namespace}` / `{name}` / `{lb_type}` placeholders in a URI template
pub fn expand(template: &str, namespace: &str, name: &str) -> String {
    template
        .replace("{namespace}", namespace)
        .replace("{name}", name)
}
