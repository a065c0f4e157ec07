//! Native AKS and virtual network resources, shaped like the Azure Resource Manager REST JSON,
//! where resource fields sit under a `properties` object. ARM reports absent collections as
//! `null`, which loads as an empty collection.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Reads an explicit `null` as the default value.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ManagedCluster {
    pub id: Option<String>,
    pub name: Option<String>,
    pub location: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub tags: BTreeMap<String, String>,
    pub sku: Option<ManagedClusterSku>,
    pub identity: Option<ManagedClusterIdentity>,
    pub properties: Option<ManagedClusterProperties>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagedClusterSku {
    pub name: Option<String>,
    pub tier: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ManagedClusterIdentity {
    #[serde(rename = "type")]
    pub identity_type: Option<String>,
    pub principal_id: Option<String>,
    pub tenant_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ManagedClusterProperties {
    pub kubernetes_version: Option<String>,
    pub dns_prefix: Option<String>,
    pub node_resource_group: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub agent_pool_profiles: Vec<AgentPoolProfile>,
    pub network_profile: Option<NetworkProfile>,
    pub api_server_access_profile: Option<ApiServerAccessProfile>,
    pub auto_scaler_profile: Option<AutoScalerProfile>,
    pub aad_profile: Option<AadProfile>,
    #[serde(deserialize_with = "null_as_default")]
    pub addon_profiles: BTreeMap<String, AddonProfile>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentPoolProfile {
    pub name: Option<String>,
    pub count: Option<i32>,
    pub vm_size: Option<String>,
    #[serde(rename = "osDiskSizeGB")]
    pub os_disk_size_gb: Option<i32>,
    pub os_disk_type: Option<String>,
    pub kubelet_disk_type: Option<String>,
    #[serde(rename = "vnetSubnetID")]
    pub vnet_subnet_id: Option<String>,
    pub max_pods: Option<i32>,
    pub os_type: Option<String>,
    pub max_count: Option<i32>,
    pub min_count: Option<i32>,
    pub enable_auto_scaling: Option<bool>,
    pub mode: Option<String>,
    pub orchestrator_version: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub availability_zones: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub node_labels: BTreeMap<String, String>,
    /// Each taint is encoded as `key=value:Effect`.
    #[serde(deserialize_with = "null_as_default")]
    pub node_taints: Vec<String>,
    #[serde(rename = "enableNodePublicIP")]
    pub enable_node_public_ip: Option<bool>,
    #[serde(rename = "nodePublicIPPrefixID")]
    pub node_public_ip_prefix_id: Option<String>,
    pub scale_set_priority: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub tags: BTreeMap<String, String>,
    #[serde(rename = "linuxOSConfig")]
    pub linux_os_config: Option<LinuxOsConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LinuxOsConfig {
    #[serde(rename = "swapFileSizeMB")]
    pub swap_file_size_mb: Option<i32>,
    pub sysctls: Option<SysctlConfig>,
    pub transparent_huge_page_defrag: Option<String>,
    pub transparent_huge_page_enabled: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SysctlConfig {
    pub fs_aio_max_nr: Option<i32>,
    pub fs_file_max: Option<i32>,
    pub fs_inotify_max_user_watches: Option<i32>,
    pub fs_nr_open: Option<i32>,
    pub kernel_threads_max: Option<i32>,
    pub net_core_netdev_max_backlog: Option<i32>,
    pub net_core_optmem_max: Option<i32>,
    pub net_core_rmem_default: Option<i32>,
    pub net_core_rmem_max: Option<i32>,
    pub net_core_somaxconn: Option<i32>,
    pub net_core_wmem_default: Option<i32>,
    pub net_core_wmem_max: Option<i32>,
    pub net_ipv4_ip_local_port_range: Option<String>,
    pub net_ipv4_neigh_default_gc_thresh1: Option<i32>,
    pub net_ipv4_neigh_default_gc_thresh2: Option<i32>,
    pub net_ipv4_neigh_default_gc_thresh3: Option<i32>,
    pub net_ipv4_tcp_fin_timeout: Option<i32>,
    pub net_ipv4_tcp_keepalive_probes: Option<i32>,
    pub net_ipv4_tcp_keepalive_time: Option<i32>,
    pub net_ipv4_tcp_max_syn_backlog: Option<i32>,
    pub net_ipv4_tcp_max_tw_buckets: Option<i32>,
    pub net_ipv4_tcp_tw_reuse: Option<bool>,
    #[serde(rename = "netIpv4TcpkeepaliveIntvl")]
    pub net_ipv4_tcp_keepalive_intvl: Option<i32>,
    pub net_netfilter_nf_conntrack_buckets: Option<i32>,
    pub net_netfilter_nf_conntrack_max: Option<i32>,
    pub vm_max_map_count: Option<i32>,
    pub vm_swappiness: Option<i32>,
    pub vm_vfs_cache_pressure: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkProfile {
    pub network_plugin: Option<String>,
    pub network_policy: Option<String>,
    pub pod_cidr: Option<String>,
    pub service_cidr: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub pod_cidrs: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub service_cidrs: Vec<String>,
    #[serde(rename = "dnsServiceIP")]
    pub dns_service_ip: Option<String>,
    pub outbound_type: Option<String>,
    pub load_balancer_sku: Option<String>,
    pub load_balancer_profile: Option<LoadBalancerProfile>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoadBalancerProfile {
    #[serde(rename = "managedOutboundIPs")]
    pub managed_outbound_ips: Option<ManagedOutboundIps>,
    #[serde(rename = "outboundIPPrefixes")]
    pub outbound_ip_prefixes: Option<OutboundIpPrefixes>,
    #[serde(rename = "outboundIPs")]
    pub outbound_ips: Option<OutboundIps>,
    pub allocated_outbound_ports: Option<i32>,
    pub idle_timeout_in_minutes: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagedOutboundIps {
    pub count: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutboundIpPrefixes {
    #[serde(rename = "publicIPPrefixes")]
    #[serde(deserialize_with = "null_as_default")]
    pub public_ip_prefixes: Vec<ResourceReference>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutboundIps {
    #[serde(rename = "publicIPs")]
    #[serde(deserialize_with = "null_as_default")]
    pub public_ips: Vec<ResourceReference>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceReference {
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiServerAccessProfile {
    #[serde(rename = "authorizedIPRanges")]
    #[serde(deserialize_with = "null_as_default")]
    pub authorized_ip_ranges: Vec<String>,
    pub enable_private_cluster: Option<bool>,
    #[serde(rename = "privateDNSZone")]
    pub private_dns_zone: Option<String>,
    #[serde(rename = "enablePrivateClusterPublicFQDN")]
    pub enable_private_cluster_public_fqdn: Option<bool>,
}

/// ARM reports the autoscaler knobs with kebab-case keys and string values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AutoScalerProfile {
    pub balance_similar_node_groups: Option<String>,
    pub expander: Option<String>,
    pub max_empty_bulk_delete: Option<String>,
    pub max_graceful_termination_sec: Option<String>,
    pub max_node_provision_time: Option<String>,
    pub max_total_unready_percentage: Option<String>,
    pub new_pod_scale_up_delay: Option<String>,
    pub ok_total_unready_count: Option<String>,
    pub scale_down_delay_after_add: Option<String>,
    pub scale_down_delay_after_delete: Option<String>,
    pub scale_down_delay_after_failure: Option<String>,
    pub scale_down_unneeded_time: Option<String>,
    pub scale_down_unready_time: Option<String>,
    pub scale_down_utilization_threshold: Option<String>,
    pub scan_interval: Option<String>,
    pub skip_nodes_with_local_storage: Option<String>,
    pub skip_nodes_with_system_pods: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AadProfile {
    pub managed: Option<bool>,
    #[serde(rename = "adminGroupObjectIDs")]
    #[serde(deserialize_with = "null_as_default")]
    pub admin_group_object_ids: Vec<String>,
    #[serde(rename = "tenantID")]
    pub tenant_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddonProfile {
    pub enabled: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub config: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VirtualNetwork {
    pub id: Option<String>,
    pub name: Option<String>,
    pub location: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub tags: BTreeMap<String, String>,
    pub properties: Option<VirtualNetworkProperties>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VirtualNetworkProperties {
    pub address_space: Option<AddressSpace>,
    #[serde(deserialize_with = "null_as_default")]
    pub subnets: Vec<Subnet>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddressSpace {
    #[serde(deserialize_with = "null_as_default")]
    pub address_prefixes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Subnet {
    pub id: Option<String>,
    pub name: Option<String>,
    pub properties: Option<SubnetProperties>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubnetProperties {
    pub address_prefix: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub address_prefixes: Vec<String>,
}

impl VirtualNetwork {
    /// The first address prefix of the VNet address space.
    pub fn cidr_block(&self) -> Option<&str> {
        self.properties
            .as_ref()?
            .address_space
            .as_ref()?
            .address_prefixes
            .first()
            .map(String::as_str)
    }

    /// The address prefix of the named subnet, falling back to the first of its prefix list.
    pub fn subnet_cidr_block(&self, subnet_name: &str) -> Option<&str> {
        let properties = self
            .properties
            .as_ref()?
            .subnets
            .iter()
            .find(|subnet| subnet.name.as_deref() == Some(subnet_name))?
            .properties
            .as_ref()?;
        properties
            .address_prefix
            .as_deref()
            .or_else(|| properties.address_prefixes.first().map(String::as_str))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn null_collections() {
        let cluster: ManagedCluster = serde_json::from_str(
            r#"{
                "name": "aks",
                "tags": null,
                "properties": {
                    "agentPoolProfiles": [
                        {"name": "p", "nodeTaints": null, "availabilityZones": null, "tags": null}
                    ],
                    "addonProfiles": null,
                    "networkProfile": {"podCidrs": null, "serviceCidrs": ["10.0.0.0/16"]}
                }
            }"#,
        )
        .unwrap();
        assert!(cluster.tags.is_empty());
        let properties = cluster.properties.unwrap();
        assert!(properties.addon_profiles.is_empty());
        let pool = &properties.agent_pool_profiles[0];
        assert!(pool.node_taints.is_empty());
        assert!(pool.availability_zones.is_empty());
        let network = properties.network_profile.unwrap();
        assert!(network.pod_cidrs.is_empty());
        assert_eq!(network.service_cidrs, vec!["10.0.0.0/16".to_string()]);
    }
}
