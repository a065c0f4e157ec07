//! Recovers the virtual network an AKS cluster runs in from its agent pool subnet ids.
//!
//! AKS does not report the VNet on the managed cluster itself. The only reference is the
//! `vnetSubnetID` of each agent pool, an ARM resource id of the form
//!
//! ```text
//! /subscriptions/<id>/resourceGroups/<group>/providers/Microsoft.Network
//!     /virtualNetworks/<vnet>/subnets/<subnet>
//! ```

use super::native::AgentPoolProfile;

const RESOURCE_GROUPS: &str = "resourceGroups";
const VIRTUAL_NETWORKS: &str = "virtualNetworks";
const SUBNETS: &str = "subnets";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetReference {
    pub resource_group: String,
    pub virtual_network: String,
    pub subnet: String,
}

/// Parses an ARM subnet resource id as key/value segment pairs (`providers/<namespace>` is one
/// such pair). Keys are matched without regard to case, as ARM does. Returns `None` unless both a
/// virtual network and a subnet are named.
pub fn parse_subnet_id(id: &str) -> Option<SubnetReference> {
    let mut segments = id.split('/').filter(|segment| !segment.is_empty());
    let mut resource_group = None;
    let mut virtual_network = None;
    let mut subnet = None;
    while let Some(key) = segments.next() {
        let value = segments.next()?;
        if key.eq_ignore_ascii_case(RESOURCE_GROUPS) {
            resource_group = Some(value);
        } else if key.eq_ignore_ascii_case(VIRTUAL_NETWORKS) {
            virtual_network = Some(value);
        } else if key.eq_ignore_ascii_case(SUBNETS) {
            subnet = Some(value);
        }
    }
    Some(SubnetReference {
        resource_group: resource_group.unwrap_or_default().to_string(),
        virtual_network: virtual_network?.to_string(),
        subnet: subnet?.to_string(),
    })
}

/// The subnet of the first agent pool that carries a parseable subnet id.
pub fn subnet_reference(pools: &[AgentPoolProfile]) -> Option<SubnetReference> {
    pools
        .iter()
        .filter_map(|pool| pool.vnet_subnet_id.as_deref())
        .find_map(parse_subnet_id)
}

#[cfg(test)]
mod test {
    use super::*;

    const SUBNET_ID: &str = "/subscriptions/0000/resourceGroups/network-rg/providers/\
        Microsoft.Network/virtualNetworks/aks-vnet/subnets/aks-subnet";

    #[test]
    fn well_formed_id() {
        assert_eq!(
            parse_subnet_id(SUBNET_ID).unwrap(),
            SubnetReference {
                resource_group: "network-rg".to_string(),
                virtual_network: "aks-vnet".to_string(),
                subnet: "aks-subnet".to_string(),
            }
        );
    }

    #[test]
    fn matches_fixed_offsets() {
        let segments: Vec<&str> = SUBNET_ID.split('/').collect();
        let parsed = parse_subnet_id(SUBNET_ID).unwrap();
        assert_eq!(parsed.virtual_network, segments[8]);
        assert_eq!(parsed.subnet, segments[10]);
    }

    #[test]
    fn keys_ignore_case() {
        let id = "/subscriptions/0000/resourcegroups/rg/providers/Microsoft.Network/\
            virtualnetworks/vnet/Subnets/default";
        let parsed = parse_subnet_id(id).unwrap();
        assert_eq!(parsed.resource_group, "rg");
        assert_eq!(parsed.virtual_network, "vnet");
        assert_eq!(parsed.subnet, "default");
    }

    #[test]
    fn incomplete_ids() {
        assert!(parse_subnet_id("").is_none());
        assert!(parse_subnet_id("/subscriptions/0000/resourceGroups/rg").is_none());
        assert!(parse_subnet_id(
            "/subscriptions/0000/resourceGroups/rg/providers/Microsoft.Network/virtualNetworks/vnet"
        )
        .is_none());
    }

    #[test]
    fn first_pool_with_a_subnet() {
        let pools = vec![
            AgentPoolProfile {
                name: Some("system".to_string()),
                ..Default::default()
            },
            AgentPoolProfile {
                name: Some("user".to_string()),
                vnet_subnet_id: Some(SUBNET_ID.to_string()),
                ..Default::default()
            },
        ];
        assert_eq!(
            subnet_reference(&pools).map(|reference| reference.virtual_network),
            Some("aks-vnet".to_string())
        );
        assert!(subnet_reference(&pools[..1]).is_none());
    }
}
