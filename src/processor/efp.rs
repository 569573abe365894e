//! Enhanced-firewall-policy processor
//!
//! The reference direction is inverted for this kind: the site spec
//! names its active policies, so the processor scans the site records
//! built earlier instead of walking a listing.

use crate::inventory::Inventory;
use crate::processor::{self, PolicyRef, ProcessorCtx};
use anyhow::Result;
use serde_json::Value;

pub async fn run(cx: &ProcessorCtx, inv: &mut Inventory) -> Result<()> {
    processor::attach_site_policies(
        cx,
        inv,
        active_policies,
        |client, namespace, name| client.enhanced_fw_policy_uri(namespace, name),
        |rec| &mut rec.efp,
    )
    .await
}

/// `spec.active_enhanced_firewall_policies.enhanced_firewall_policies[]`
fn active_policies(spec: &Value) -> Vec<PolicyRef> {
    spec.get("active_enhanced_firewall_policies")
        .and_then(|a| a.get("enhanced_firewall_policies"))
        .and_then(|v| v.as_array())
        .map(|refs| refs.iter().filter_map(processor::policy_ref).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn active_policies_resolve_name_and_namespace() {
        let spec = json!({
            "active_enhanced_firewall_policies": {
                "enhanced_firewall_policies": [
                    {"name": "allow-mgmt", "namespace": "system", "tenant": "acme"},
                    {"name": "deny-all"}
                ]
            }
        });
        assert_eq!(
            active_policies(&spec),
            vec![
                PolicyRef {
                    namespace: "system".into(),
                    name: "allow-mgmt".into()
                },
                PolicyRef {
                    namespace: "system".into(),
                    name: "deny-all".into()
                },
            ]
        );
    }

    #[test]
    fn site_without_active_policies_yields_nothing() {
        assert!(active_policies(&json!({"volterra_certified_hw": "x"})).is_empty());
        assert!(active_policies(&Value::Null).is_empty());
    }
}
