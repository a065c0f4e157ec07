//! Canonical control-plane and worker descriptions for GKE clusters.

use crate::{Labels, Taints};
use serde::{Deserialize, Serialize};
use serde_plain::derive_display_from_serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GcpCloudSpec {
    pub project: String,
    pub region: String,
    pub enable_autopilot: bool,
    pub enable_workload_identity: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_channel: Option<ReleaseChannel>,
    pub network: Option<Network>,
    pub subnets: Vec<Subnet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_labels: Option<Labels>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addons_config: Option<AddonsConfig>,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseChannel {
    Stable,
    Regular,
    Rapid,
}

derive_display_from_serialize!(ReleaseChannel);

/// How Kubernetes service routing and network policy are implemented.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DatapathProvider {
    Unspecified,
    /// kube-proxy and iptables.
    LegacyDatapath,
    /// eBPF based GKE Dataplane V2.
    AdvancedDatapath,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    pub name: String,
    pub auto_create_subnetworks: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datapath_provider: Option<DatapathProvider>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subnet {
    pub name: String,
    pub cidr_block: String,
    pub description: String,
    /// Secondary range name to CIDR.
    pub secondary_cidr_blocks: BTreeMap<String, String>,
    pub private_google_access: bool,
    pub enable_flow_logs: bool,
    pub purpose: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddonsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_load_balancing_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizontal_pod_autoscaling_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_policy_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gcp_filestore_csi_driver_enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GcpWorker {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubernetes_version: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: Labels,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    #[serde(
        default,
        rename = "isMultiAZ",
        skip_serializing_if = "std::ops::Not::not"
    )]
    pub is_multi_az: bool,
    pub spec: GcpWorkerSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GcpWorkerSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaling: Option<Scaling>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub management: Option<Management>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubernetes_labels: Option<Labels>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_labels: Option<Labels>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubernetes_taints: Option<Taints>,
    #[serde(default, rename = "providerIDList", skip_serializing_if = "Vec::is_empty")]
    pub provider_id_list: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub machine_type: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub disk_size_gb: i32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub disk_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image_type: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub preemptible: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub spot: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scaling {
    pub max_count: i32,
    pub min_count: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Management {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub auto_upgrade: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub auto_repair: bool,
}

/// The template applied to every GKE machine pool that does not override a field.
pub fn default_worker() -> GcpWorker {
    GcpWorker {
        is_multi_az: false,
        spec: GcpWorkerSpec {
            scaling: Some(Scaling {
                max_count: 6,
                min_count: 3,
            }),
            kubernetes_labels: Some(Labels::new()),
            additional_labels: Some(Labels::new()),
            kubernetes_taints: Some(Taints::default()),
            machine_type: "e2-standard-2".to_string(),
            disk_size_gb: 50,
            disk_type: "pd-standard".to_string(),
            ..Default::default()
        },
        ..Default::default()
    }
}

fn is_zero(value: &i32) -> bool {
    *value == 0
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_worker_document() {
        assert_eq!(
            serde_json::to_value(default_worker()).unwrap(),
            json!({
                "spec": {
                    "scaling": {"maxCount": 6, "minCount": 3},
                    "kubernetesLabels": {},
                    "additionalLabels": {},
                    "kubernetesTaints": [],
                    "machineType": "e2-standard-2",
                    "diskSizeGb": 50,
                    "diskType": "pd-standard"
                }
            })
        );
    }

    #[test]
    fn network_names() {
        let network = Network {
            name: "default".to_string(),
            auto_create_subnetworks: true,
            datapath_provider: Some(DatapathProvider::AdvancedDatapath),
        };
        assert_eq!(
            serde_json::to_value(network).unwrap(),
            json!({
                "name": "default",
                "autoCreateSubnetworks": true,
                "datapathProvider": "ADVANCED_DATAPATH"
            })
        );
        assert_eq!(ReleaseChannel::Rapid.to_string(), "rapid");
    }
}
