//! Maps a GKE cluster and its VPC network to the canonical [`Cluster`].

use super::native::{self, resource_name, GkeCluster};
use crate::error::{self, Result};
use migration_model::gcp::{
    AddonsConfig, DatapathProvider, GcpCloudSpec, Network, ReleaseChannel, Subnet,
};
use migration_model::{CloudSpec, Cluster, GcpConfiguration};
use snafu::OptionExt;

/// Everything fetched from GKE and Compute Engine while describing the control plane.
#[derive(Debug, Clone, Default)]
pub struct ClusterInventory {
    pub cluster: GkeCluster,
    pub network: native::Network,
    /// Subnetworks of the configured region; only those in `network` are mapped.
    pub subnetworks: Vec<native::Subnetwork>,
}

pub fn to_cluster(config: &GcpConfiguration, inventory: &ClusterInventory) -> Result<Cluster> {
    let cluster = &inventory.cluster;
    let name = cluster.name.clone().context(error::MissingFieldSnafu {
        resource: "GKE cluster",
        field: "name",
    })?;
    let kubernetes_version =
        cluster
            .current_master_version
            .clone()
            .context(error::MissingFieldSnafu {
                resource: format!("GKE cluster {}", name),
                field: "currentMasterVersion",
            })?;

    let spec = GcpCloudSpec {
        project: config.project.clone(),
        region: cluster
            .location
            .clone()
            .unwrap_or_else(|| config.region.clone()),
        enable_autopilot: cluster.autopilot.map(|a| a.enabled).unwrap_or(false),
        enable_workload_identity: workload_identity_enabled(cluster),
        release_channel: release_channel(cluster),
        network: Some(network(cluster, &inventory.network)),
        subnets: network_subnets(&inventory.network, &inventory.subnetworks)
            .map(subnet)
            .collect(),
        additional_labels: Some(cluster.resource_labels.clone())
            .filter(|labels| !labels.is_empty()),
        addons_config: cluster.addons_config.as_ref().map(addons_config),
    };

    Ok(Cluster {
        name,
        pod_cidr_blocks: cluster.cluster_ipv4_cidr.iter().cloned().collect(),
        service_cidr_blocks: cluster.services_ipv4_cidr.iter().cloned().collect(),
        kubernetes_version,
        cloud_spec: CloudSpec::gcp(spec),
    })
}

fn workload_identity_enabled(cluster: &GkeCluster) -> bool {
    cluster
        .workload_identity_config
        .as_ref()
        .and_then(|config| config.workload_pool.as_deref())
        .map(|pool| !pool.is_empty())
        .unwrap_or(false)
}

/// `None` for an unspecified or unrecognized channel.
pub fn release_channel(cluster: &GkeCluster) -> Option<ReleaseChannel> {
    match cluster.release_channel.as_ref()?.channel.as_deref()? {
        "RAPID" => Some(ReleaseChannel::Rapid),
        "REGULAR" => Some(ReleaseChannel::Regular),
        "STABLE" => Some(ReleaseChannel::Stable),
        _ => None,
    }
}

fn datapath_provider(cluster: &GkeCluster) -> Option<DatapathProvider> {
    match cluster.network_config.as_ref()?.datapath_provider.as_deref()? {
        "LEGACY_DATAPATH" => Some(DatapathProvider::LegacyDatapath),
        "ADVANCED_DATAPATH" => Some(DatapathProvider::AdvancedDatapath),
        "DATAPATH_PROVIDER_UNSPECIFIED" => Some(DatapathProvider::Unspecified),
        _ => None,
    }
}

fn network(cluster: &GkeCluster, network: &native::Network) -> Network {
    let name = network
        .name
        .clone()
        .or_else(|| cluster.network.clone())
        .unwrap_or_default();
    Network {
        name,
        auto_create_subnetworks: network.auto_create_subnetworks,
        datapath_provider: datapath_provider(cluster),
    }
}

/// The subnetworks that belong to `network`, matched by self link or by network name.
pub fn network_subnets<'a>(
    network: &'a native::Network,
    subnetworks: &'a [native::Subnetwork],
) -> impl Iterator<Item = &'a native::Subnetwork> + 'a {
    subnetworks.iter().filter(move |subnetwork| {
        let listed = subnetwork
            .self_link
            .as_ref()
            .map(|link| network.subnetworks.contains(link))
            .unwrap_or(false);
        let same_network = match (subnetwork.network.as_deref(), network.name.as_deref()) {
            (Some(link), Some(name)) => resource_name(link) == name,
            _ => false,
        };
        listed || same_network
    })
}

fn subnet(subnetwork: &native::Subnetwork) -> Subnet {
    Subnet {
        name: subnetwork.name.clone().unwrap_or_default(),
        cidr_block: subnetwork.ip_cidr_range.clone().unwrap_or_default(),
        description: subnetwork.description.clone().unwrap_or_default(),
        secondary_cidr_blocks: subnetwork
            .secondary_ip_ranges
            .iter()
            .map(|range| (range.range_name.clone(), range.ip_cidr_range.clone()))
            .collect(),
        private_google_access: subnetwork.private_ip_google_access,
        enable_flow_logs: subnetwork
            .enable_flow_logs
            .or_else(|| subnetwork.log_config.map(|config| config.enable))
            .unwrap_or(false),
        purpose: subnetwork.purpose.clone().unwrap_or_default(),
    }
}

fn addons_config(config: &native::AddonsConfig) -> AddonsConfig {
    AddonsConfig {
        http_load_balancing_enabled: config.http_load_balancing.map(|flag| !flag.disabled),
        horizontal_pod_autoscaling_enabled: config
            .horizontal_pod_autoscaling
            .map(|flag| !flag.disabled),
        network_policy_enabled: config.network_policy_config.map(|flag| !flag.disabled),
        gcp_filestore_csi_driver_enabled: config
            .gcp_filestore_csi_driver_config
            .map(|flag| flag.enabled),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::gcp::native::{
        Autopilot, DisabledFlag, NetworkConfig, SecondaryRange, Subnetwork, WorkloadIdentityConfig,
    };
    use maplit::btreemap;

    fn config() -> GcpConfiguration {
        GcpConfiguration {
            credentials: "{}".to_string(),
            project: "acme".to_string(),
            region: "europe-west1".to_string(),
            name: "gke".to_string(),
        }
    }

    fn inventory() -> ClusterInventory {
        ClusterInventory {
            cluster: GkeCluster {
                name: Some("gke".to_string()),
                location: Some("europe-west1".to_string()),
                network: Some("vpc".to_string()),
                current_master_version: Some("1.26.3-gke.1000".to_string()),
                cluster_ipv4_cidr: Some("10.4.0.0/14".to_string()),
                services_ipv4_cidr: Some("10.8.0.0/20".to_string()),
                autopilot: Some(Autopilot { enabled: false }),
                workload_identity_config: Some(WorkloadIdentityConfig {
                    workload_pool: Some("acme.svc.id.goog".to_string()),
                }),
                release_channel: Some(native::ReleaseChannel {
                    channel: Some("REGULAR".to_string()),
                }),
                network_config: Some(NetworkConfig {
                    datapath_provider: Some("ADVANCED_DATAPATH".to_string()),
                    ..Default::default()
                }),
                addons_config: Some(native::AddonsConfig {
                    http_load_balancing: Some(DisabledFlag { disabled: true }),
                    ..Default::default()
                }),
                ..Default::default()
            },
            network: native::Network {
                name: Some("vpc".to_string()),
                auto_create_subnetworks: false,
                ..Default::default()
            },
            subnetworks: vec![
                Subnetwork {
                    name: Some("nodes".to_string()),
                    network: Some(
                        "https://www.googleapis.com/compute/v1/projects/acme/global/networks/vpc"
                            .to_string(),
                    ),
                    ip_cidr_range: Some("10.0.0.0/20".to_string()),
                    secondary_ip_ranges: vec![SecondaryRange {
                        range_name: "pods".to_string(),
                        ip_cidr_range: "10.4.0.0/14".to_string(),
                    }],
                    private_ip_google_access: true,
                    ..Default::default()
                },
                Subnetwork {
                    name: Some("elsewhere".to_string()),
                    network: Some("projects/acme/global/networks/other".to_string()),
                    ..Default::default()
                },
            ],
        }
    }

    #[test]
    fn maps_cluster() {
        let cluster = to_cluster(&config(), &inventory()).unwrap();
        assert_eq!(cluster.name, "gke");
        assert_eq!(cluster.kubernetes_version, "1.26.3-gke.1000");
        assert_eq!(cluster.pod_cidr_blocks, vec!["10.4.0.0/14".to_string()]);
        assert_eq!(cluster.service_cidr_blocks, vec!["10.8.0.0/20".to_string()]);

        let spec = cluster.cloud_spec.as_gcp().unwrap();
        assert_eq!(spec.project, "acme");
        assert!(!spec.enable_autopilot);
        assert!(spec.enable_workload_identity);
        assert_eq!(spec.release_channel, Some(ReleaseChannel::Regular));
        let network = spec.network.as_ref().unwrap();
        assert_eq!(network.name, "vpc");
        assert_eq!(
            network.datapath_provider,
            Some(DatapathProvider::AdvancedDatapath)
        );
        assert_eq!(spec.subnets.len(), 1);
        assert_eq!(spec.subnets[0].name, "nodes");
        assert_eq!(
            spec.subnets[0].secondary_cidr_blocks,
            btreemap! { "pods".to_string() => "10.4.0.0/14".to_string() }
        );
        assert_eq!(
            spec.addons_config.unwrap().http_load_balancing_enabled,
            Some(false)
        );
        assert!(spec.additional_labels.is_none());
    }

    #[test]
    fn unspecified_release_channel() {
        let mut inventory = inventory();
        inventory.cluster.release_channel = Some(native::ReleaseChannel {
            channel: Some("UNSPECIFIED".to_string()),
        });
        assert!(release_channel(&inventory.cluster).is_none());
        inventory.cluster.release_channel = None;
        assert!(release_channel(&inventory.cluster).is_none());
    }

    #[test]
    fn version_is_required() {
        let mut inventory = inventory();
        inventory.cluster.current_master_version = None;
        assert!(to_cluster(&config(), &inventory).is_err());
    }
}
