//! XC Client
//!
//! Main client for talking to an F5 XC tenant, combining the API token
//! credential with the HTTP layer and the per-kind URL builders.

use super::http::XcHttpClient;
use super::uris;
use anyhow::Result;
use serde_json::Value;

/// Main XC client
#[derive(Clone)]
pub struct XcClient {
    pub http: XcHttpClient,
    pub api_url: String,
    token: String,
}

impl XcClient {
    /// Create a new XC client for a tenant API URL and token
    pub fn new(api_url: &str, token: &str) -> Result<Self> {
        let http = XcHttpClient::new()?;

        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    /// Build a full URL from the tenant API URL plus a resource URI
    pub fn build_url(&self, uri: &str) -> String {
        format!("{}{}", self.api_url, uri)
    }

    /// Make a GET request against a resource URI
    pub async fn get(&self, uri: &str) -> Result<Value> {
        self.http.get(&self.build_url(uri), &self.token).await
    }

    /// List items of a collection URI, returning the `items` array.
    ///
    /// Used for discovery reads; callers treat an error here as fatal.
    pub async fn list(&self, uri: &str) -> Result<Vec<Value>> {
        let body = self.get(uri).await?;
        Ok(body
            .get("items")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default())
    }

    // =========================================================================
    // URI builders per object kind
    // =========================================================================

    pub fn namespaces_uri(&self) -> String {
        uris::URI_NAMESPACES.to_string()
    }

    pub fn namespace_uri(&self, namespace: &str) -> String {
        format!("{}/{}", uris::URI_NAMESPACES, namespace)
    }

    pub fn sites_uri(&self) -> String {
        uris::URI_SITES.to_string()
    }

    pub fn site_uri(&self, name: &str) -> String {
        uris::expand(uris::URI_SITE, "", name)
    }

    pub fn sms_v1_uri(&self, name: &str) -> String {
        uris::expand(uris::URI_SMS_V1, uris::NAMESPACE_SYSTEM, name)
    }

    pub fn sms_v2_uri(&self, name: &str) -> String {
        uris::expand(uris::URI_SMS_V2, uris::NAMESPACE_SYSTEM, name)
    }

    pub fn virtual_sites_uri(&self) -> String {
        uris::expand(uris::URI_VIRTUAL_SITES, uris::NAMESPACE_SHARED, "")
    }

    pub fn virtual_site_uri(&self, name: &str) -> String {
        uris::expand(uris::URI_VIRTUAL_SITE, uris::NAMESPACE_SHARED, name)
    }

    pub fn load_balancers_uri(&self, namespace: &str, lb_type: &str) -> String {
        uris::expand(uris::URI_LOAD_BALANCERS, namespace, "").replace("{lb_type}", lb_type)
    }

    pub fn origin_pools_uri(&self, namespace: &str) -> String {
        uris::expand(uris::URI_ORIGIN_POOLS, namespace, "")
    }

    pub fn proxys_uri(&self, namespace: &str) -> String {
        uris::expand(uris::URI_PROXYS, namespace, "")
    }

    pub fn bgps_uri(&self) -> String {
        uris::expand(uris::URI_BGPS, uris::NAMESPACE_SYSTEM, "")
    }

    pub fn bgp_uri(&self, name: &str) -> String {
        uris::expand(uris::URI_BGP, uris::NAMESPACE_SYSTEM, name)
    }

    pub fn segments_uri(&self) -> String {
        uris::expand(uris::URI_SEGMENTS, uris::NAMESPACE_SYSTEM, "")
    }

    pub fn segment_uri(&self, name: &str) -> String {
        uris::expand(uris::URI_SEGMENT, uris::NAMESPACE_SYSTEM, name)
    }

    pub fn site_mesh_groups_uri(&self, namespace: &str) -> String {
        uris::expand(uris::URI_SITE_MESH_GROUPS, namespace, "")
    }

    pub fn site_mesh_group_uri(&self, namespace: &str, name: &str) -> String {
        uris::expand(uris::URI_SITE_MESH_GROUP, namespace, name)
    }

    pub fn cloud_connects_uri(&self) -> String {
        uris::expand(uris::URI_CLOUD_CONNECTS, uris::NAMESPACE_SYSTEM, "")
    }

    pub fn cloud_connect_uri(&self, name: &str) -> String {
        uris::expand(uris::URI_CLOUD_CONNECT, uris::NAMESPACE_SYSTEM, name)
    }

    pub fn dc_cluster_group_uri(&self, namespace: &str, name: &str) -> String {
        uris::expand(uris::URI_DC_CLUSTER_GROUP, namespace, name)
    }

    pub fn enhanced_fw_policy_uri(&self, namespace: &str, name: &str) -> String {
        uris::expand(uris::URI_ENHANCED_FW_POLICY, namespace, name)
    }

    pub fn forward_proxy_policy_uri(&self, namespace: &str, name: &str) -> String {
        uris::expand(uris::URI_FORWARD_PROXY_POLICY, namespace, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> XcClient {
        XcClient::new("https://tenant.console.ves.volterra.io/api", "t").unwrap()
    }

    #[test]
    fn build_url_joins_api_url_and_uri() {
        let c = client();
        assert_eq!(
            c.build_url(&c.sites_uri()),
            "https://tenant.console.ves.volterra.io/api/config/namespaces/system/sites"
        );
    }

    #[test]
    fn trailing_slash_in_api_url_is_trimmed() {
        let c = XcClient::new("https://x/api/", "t").unwrap();
        assert_eq!(c.build_url("/web/namespaces"), "https://x/api/web/namespaces");
    }

    #[test]
    fn lb_uri_expands_type_and_namespace() {
        let c = client();
        assert_eq!(
            c.load_balancers_uri("prod", "http_loadbalancers"),
            "/config/namespaces/prod/http_loadbalancers"
        );
    }
}
