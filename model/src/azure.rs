//! Canonical control-plane and worker descriptions for AKS clusters.

use crate::constants::{
    ANNOTATION_REPLICAS_MANAGED_BY, EXTERNAL_AUTOSCALER, LABEL_CAPACITY_TYPE,
    LABEL_PERFORMANCE_TYPE, LABEL_SCALING_GROUP,
};
use crate::{Labels, Taints, Tags};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureCloudSpec {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cluster_identity_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cluster_identity_type: String,
    /// Always empty. Filled in by the templating step that owns the credentials.
    #[serde(default, rename = "clientID")]
    pub client_id: String,
    /// Always empty. Filled in by the templating step that owns the credentials.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub client_secret: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub client_secret_name: String,
    #[serde(default, rename = "resourceID", skip_serializing_if = "String::is_empty")]
    pub resource_id: String,
    #[serde(default, rename = "tenantID")]
    pub tenant_id: String,
    #[serde(default, rename = "subscriptionID")]
    pub subscription_id: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub resource_group_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub node_resource_group_name: String,
    #[serde(default)]
    pub virtual_network: VirtualNetwork,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_plugin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outbound_type: Option<String>,
    #[serde(default, rename = "dnsServiceIP", skip_serializing_if = "Option::is_none")]
    pub dns_service_ip: Option<String>,
    #[serde(default)]
    pub ssh_public_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<Sku>,
    #[serde(default, rename = "loadBalancerSKU", skip_serializing_if = "Option::is_none")]
    pub load_balancer_sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_balancer_profile: Option<LoadBalancerProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_server_access_profile: Option<ApiServerAccessProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_scaler_profile: Option<AutoScalerProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aad_profile: Option<AadProfile>,
    /// Always emitted, empty when the cluster has no addon profiles.
    #[serde(default)]
    pub addon_profiles: Vec<AddonProfile>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub additional_tags: Tags,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualNetwork {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cidr_block: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource_group: String,
    #[serde(default)]
    pub subnet: Subnet,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subnet {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cidr_block: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sku {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerProfile {
    #[serde(default, rename = "managedOutboundIPs", skip_serializing_if = "Option::is_none")]
    pub managed_outbound_ips: Option<i32>,
    #[serde(default, rename = "outboundIPPrefixes", skip_serializing_if = "Vec::is_empty")]
    pub outbound_ip_prefixes: Vec<String>,
    #[serde(default, rename = "outboundIPs", skip_serializing_if = "Vec::is_empty")]
    pub outbound_ips: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allocated_outbound_ports: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idle_timeout_in_minutes: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiServerAccessProfile {
    #[serde(default, rename = "authorizedIPRanges", skip_serializing_if = "Vec::is_empty")]
    pub authorized_ip_ranges: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_private_cluster: Option<bool>,
    #[serde(default, rename = "privateDNSZone", skip_serializing_if = "Option::is_none")]
    pub private_dns_zone: Option<String>,
    #[serde(
        default,
        rename = "enablePrivateClusterPublicFQDN",
        skip_serializing_if = "Option::is_none"
    )]
    pub enable_private_cluster_public_fqdn: Option<bool>,
}

/// Cluster autoscaler settings. AKS reports every knob as a string and so do we.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoScalerProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance_similar_node_groups: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expander: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_empty_bulk_delete: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_graceful_termination_sec: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_node_provision_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_total_unready_percentage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_pod_scale_up_delay: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ok_total_unready_count: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_down_delay_after_add: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_down_delay_after_delete: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_down_delay_after_failure: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_down_unneeded_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_down_unready_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_down_utilization_threshold: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_interval: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_nodes_with_local_storage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_nodes_with_system_pods: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AadProfile {
    pub managed: bool,
    #[serde(default, rename = "adminGroupObjectIDs")]
    pub admin_group_object_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddonProfile {
    pub name: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureWorker {
    pub replicas: i32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: Labels,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    pub spec: AzureWorkerSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureWorkerSpec {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub additional_tags: Tags,
    pub mode: String,
    pub sku: String,
    #[serde(default, rename = "osDiskSizeGB", skip_serializing_if = "Option::is_none")]
    pub os_disk_size_gb: Option<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub availability_zones: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub node_labels: Labels,
    #[serde(default, skip_serializing_if = "Taints::is_empty")]
    pub taints: Taints,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaling: Option<Scaling>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pods: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_disk_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_type: Option<String>,
    #[serde(default, rename = "enableNodePublicIP", skip_serializing_if = "Option::is_none")]
    pub enable_node_public_ip: Option<bool>,
    #[serde(default, rename = "nodePublicIPPrefixID", skip_serializing_if = "Option::is_none")]
    pub node_public_ip_prefix_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubelet_disk_type: Option<String>,
    #[serde(default, rename = "linuxOSConfig", skip_serializing_if = "Option::is_none")]
    pub linux_os_config: Option<LinuxOsConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_set_priority: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scaling {
    pub min_size: i32,
    pub max_size: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinuxOsConfig {
    #[serde(default, rename = "swapFileSizeMB", skip_serializing_if = "Option::is_none")]
    pub swap_file_size_mb: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sysctls: Option<SysctlConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transparent_huge_page_defrag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transparent_huge_page_enabled: Option<String>,
}

/// Kernel parameters applied to every node of a pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SysctlConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fs_aio_max_nr: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fs_file_max: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fs_inotify_max_user_watches: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fs_nr_open: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kernel_threads_max: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_core_netdev_max_backlog: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_core_optmem_max: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_core_rmem_default: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_core_rmem_max: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_core_somaxconn: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_core_wmem_default: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_core_wmem_max: Option<i32>,
    #[serde(default, rename = "netIpv4IPLocalPortRange", skip_serializing_if = "Option::is_none")]
    pub net_ipv4_ip_local_port_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_ipv4_neigh_default_gc_thresh1: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_ipv4_neigh_default_gc_thresh2: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_ipv4_neigh_default_gc_thresh3: Option<i32>,
    #[serde(default, rename = "netIpv4TCPFinTimeout", skip_serializing_if = "Option::is_none")]
    pub net_ipv4_tcp_fin_timeout: Option<i32>,
    #[serde(default, rename = "netIpv4TCPKeepaliveProbes", skip_serializing_if = "Option::is_none")]
    pub net_ipv4_tcp_keepalive_probes: Option<i32>,
    #[serde(default, rename = "netIpv4TCPKeepaliveTime", skip_serializing_if = "Option::is_none")]
    pub net_ipv4_tcp_keepalive_time: Option<i32>,
    #[serde(default, rename = "netIpv4TCPMaxSynBacklog", skip_serializing_if = "Option::is_none")]
    pub net_ipv4_tcp_max_syn_backlog: Option<i32>,
    #[serde(default, rename = "netIpv4TCPMaxTwBuckets", skip_serializing_if = "Option::is_none")]
    pub net_ipv4_tcp_max_tw_buckets: Option<i32>,
    #[serde(default, rename = "netIpv4TCPTwReuse", skip_serializing_if = "Option::is_none")]
    pub net_ipv4_tcp_tw_reuse: Option<bool>,
    #[serde(default, rename = "netIpv4TCPkeepaliveIntvl", skip_serializing_if = "Option::is_none")]
    pub net_ipv4_tcp_keepalive_intvl: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_netfilter_nf_conntrack_buckets: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_netfilter_nf_conntrack_max: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vm_max_map_count: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vm_swappiness: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vm_vfs_cache_pressure: Option<i32>,
}

/// The template applied to every AKS machine pool that does not override a field.
pub fn default_worker() -> AzureWorker {
    let mut annotations = BTreeMap::new();
    annotations.insert(
        ANNOTATION_REPLICAS_MANAGED_BY.to_string(),
        EXTERNAL_AUTOSCALER.to_string(),
    );
    let node_labels = [
        (LABEL_SCALING_GROUP, "medium-sustained-on-demand"),
        (LABEL_CAPACITY_TYPE, "ON_DEMAND"),
        (LABEL_PERFORMANCE_TYPE, "SUSTAINED"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    AzureWorker {
        replicas: 0,
        annotations,
        spec: AzureWorkerSpec {
            mode: "User".to_string(),
            sku: "Standard_D2s_v3".to_string(),
            os_disk_size_gb: Some(50),
            availability_zones: vec!["1".to_string()],
            node_labels,
            scaling: Some(Scaling {
                min_size: 1,
                max_size: 5,
            }),
            max_pods: Some(110),
            os_disk_type: Some("Managed".to_string()),
            os_type: Some("Linux".to_string()),
            enable_node_public_ip: Some(false),
            node_public_ip_prefix_id: Some(String::new()),
            scale_set_priority: Some("Regular".to_string()),
            ..Default::default()
        },
        ..Default::default()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn secrets_are_never_serialized() {
        let spec = AzureCloudSpec {
            client_secret_name: "cluster-identity-secret".to_string(),
            ..Default::default()
        };
        let value = serde_json::to_value(spec).unwrap();
        assert_eq!(value["clientID"], json!(""));
        assert!(value.get("clientSecret").is_none());
        assert_eq!(value["clientSecretName"], json!("cluster-identity-secret"));
        assert_eq!(value["addonProfiles"], json!([]));
        assert!(value.get("autoScalerProfile").is_none());
    }

    #[test]
    fn sysctl_names() {
        let sysctls = SysctlConfig {
            net_ipv4_tcp_fin_timeout: Some(30),
            net_ipv4_ip_local_port_range: Some("32000 60000".to_string()),
            vm_max_map_count: Some(262144),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(sysctls).unwrap(),
            json!({
                "netIpv4TCPFinTimeout": 30,
                "netIpv4IPLocalPortRange": "32000 60000",
                "vmMaxMapCount": 262144
            })
        );
    }

    #[test]
    fn default_worker_template() {
        let worker = default_worker();
        assert_eq!(worker.spec.node_labels.len(), 3);
        assert_eq!(
            worker.spec.scaling,
            Some(Scaling {
                min_size: 1,
                max_size: 5
            })
        );
        let value = serde_json::to_value(worker).unwrap();
        assert_eq!(value["spec"]["osDiskSizeGB"], json!(50));
        assert_eq!(value["spec"]["enableNodePublicIP"], json!(false));
        assert_eq!(value["spec"]["nodePublicIPPrefixID"], json!(""));
    }
}
