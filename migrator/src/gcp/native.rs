//! Native GKE and Compute Engine resources in the camelCase JSON of the Google REST APIs, so the
//! output of `gcloud container clusters describe --format=json` loads directly.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GkeCluster {
    pub name: Option<String>,
    pub location: Option<String>,
    pub locations: Vec<String>,
    pub network: Option<String>,
    pub subnetwork: Option<String>,
    pub current_master_version: Option<String>,
    pub cluster_ipv4_cidr: Option<String>,
    pub services_ipv4_cidr: Option<String>,
    pub autopilot: Option<Autopilot>,
    pub workload_identity_config: Option<WorkloadIdentityConfig>,
    pub release_channel: Option<ReleaseChannel>,
    pub network_config: Option<NetworkConfig>,
    pub addons_config: Option<AddonsConfig>,
    pub resource_labels: BTreeMap<String, String>,
    pub node_pools: Vec<NodePool>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Autopilot {
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkloadIdentityConfig {
    pub workload_pool: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseChannel {
    /// One of `UNSPECIFIED`, `RAPID`, `REGULAR` or `STABLE`.
    pub channel: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkConfig {
    pub network: Option<String>,
    pub subnetwork: Option<String>,
    /// One of `DATAPATH_PROVIDER_UNSPECIFIED`, `LEGACY_DATAPATH` or `ADVANCED_DATAPATH`.
    pub datapath_provider: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddonsConfig {
    pub http_load_balancing: Option<DisabledFlag>,
    pub horizontal_pod_autoscaling: Option<DisabledFlag>,
    pub network_policy_config: Option<DisabledFlag>,
    pub gcp_filestore_csi_driver_config: Option<EnabledFlag>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisabledFlag {
    pub disabled: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnabledFlag {
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodePool {
    pub name: Option<String>,
    pub version: Option<String>,
    pub initial_node_count: Option<i32>,
    pub locations: Vec<String>,
    pub config: Option<NodeConfig>,
    pub autoscaling: Option<NodePoolAutoscaling>,
    pub management: Option<NodeManagement>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeConfig {
    pub machine_type: Option<String>,
    pub disk_size_gb: Option<i32>,
    pub disk_type: Option<String>,
    pub image_type: Option<String>,
    pub labels: BTreeMap<String, String>,
    pub metadata: BTreeMap<String, String>,
    pub taints: Vec<NodeTaint>,
    pub preemptible: bool,
    pub spot: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeTaint {
    pub key: String,
    pub value: String,
    /// One of `NO_SCHEDULE`, `PREFER_NO_SCHEDULE` or `NO_EXECUTE`.
    pub effect: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodePoolAutoscaling {
    pub enabled: bool,
    pub min_node_count: i32,
    pub max_node_count: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeManagement {
    pub auto_upgrade: bool,
    pub auto_repair: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Network {
    pub name: Option<String>,
    pub self_link: Option<String>,
    pub auto_create_subnetworks: bool,
    /// Self links of the subnetworks in this network.
    pub subnetworks: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Subnetwork {
    pub name: Option<String>,
    pub self_link: Option<String>,
    /// Self link of the network this subnetwork belongs to.
    pub network: Option<String>,
    pub region: Option<String>,
    pub ip_cidr_range: Option<String>,
    pub description: Option<String>,
    pub secondary_ip_ranges: Vec<SecondaryRange>,
    pub private_ip_google_access: bool,
    pub enable_flow_logs: Option<bool>,
    pub log_config: Option<SubnetworkLogConfig>,
    pub purpose: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SecondaryRange {
    pub range_name: String,
    pub ip_cidr_range: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubnetworkLogConfig {
    pub enable: bool,
}

/// The last path segment of a Google resource URL or relative name.
pub fn resource_name(link: &str) -> &str {
    link.rsplit('/').next().unwrap_or(link)
}
