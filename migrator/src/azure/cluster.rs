//! Maps an AKS managed cluster and its virtual network to the canonical [`Cluster`].

use super::native::{ManagedCluster, ManagedClusterProperties, VirtualNetwork};
use super::network::{subnet_reference, SubnetReference};
use super::profiles;
use crate::error::{self, Result};
use migration_model::azure::{self, AzureCloudSpec, Sku};
use migration_model::constants::{
    AZURE_CLIENT_SECRET_NAME, AZURE_CLUSTER_IDENTITY_NAME, AZURE_CLUSTER_IDENTITY_TYPE,
};
use migration_model::{AzureConfiguration, CloudSpec, Cluster};
use snafu::OptionExt;

/// Everything fetched from ARM while describing the control plane.
#[derive(Debug, Clone, Default)]
pub struct ClusterInventory {
    pub cluster: ManagedCluster,
    /// The VNet named by the agent pool subnets, when one could be resolved and read.
    pub virtual_network: Option<VirtualNetwork>,
}

pub fn to_cluster(config: &AzureConfiguration, inventory: &ClusterInventory) -> Result<Cluster> {
    let cluster = &inventory.cluster;
    let name = cluster.name.clone().context(error::MissingFieldSnafu {
        resource: "managed cluster",
        field: "name",
    })?;
    let properties = cluster.properties.as_ref().context(error::MissingFieldSnafu {
        resource: format!("managed cluster {}", name),
        field: "properties",
    })?;
    let kubernetes_version =
        properties
            .kubernetes_version
            .clone()
            .context(error::MissingFieldSnafu {
                resource: format!("managed cluster {}", name),
                field: "properties.kubernetesVersion",
            })?;
    let tenant_id = cluster
        .identity
        .as_ref()
        .and_then(|identity| identity.tenant_id.clone())
        .context(error::MissingFieldSnafu {
            resource: format!("managed cluster {}", name),
            field: "identity.tenantId",
        })?;
    let location = cluster.location.clone().context(error::MissingFieldSnafu {
        resource: format!("managed cluster {}", name),
        field: "location",
    })?;
    let network = properties.network_profile.clone().unwrap_or_default();

    let spec = AzureCloudSpec {
        cluster_identity_type: AZURE_CLUSTER_IDENTITY_TYPE.to_string(),
        cluster_identity_name: AZURE_CLUSTER_IDENTITY_NAME.to_string(),
        client_secret_name: AZURE_CLIENT_SECRET_NAME.to_string(),
        tenant_id,
        subscription_id: config.subscription_id.clone(),
        location,
        resource_group_name: config.resource_group.clone(),
        node_resource_group_name: properties.node_resource_group.clone().unwrap_or_default(),
        virtual_network: virtual_network(properties, inventory.virtual_network.as_ref()),
        network_plugin: network.network_plugin.clone(),
        network_policy: network.network_policy.clone(),
        outbound_type: network.outbound_type.clone(),
        dns_service_ip: network.dns_service_ip.clone(),
        sku: cluster.sku.as_ref().map(|sku| Sku {
            tier: sku.tier.clone(),
        }),
        load_balancer_sku: network.load_balancer_sku.clone(),
        load_balancer_profile: profiles::load_balancer_profile(
            network.load_balancer_profile.as_ref(),
        ),
        api_server_access_profile: profiles::api_server_access_profile(
            properties.api_server_access_profile.as_ref(),
        ),
        auto_scaler_profile: profiles::auto_scaler_profile(
            properties.auto_scaler_profile.as_ref(),
        ),
        aad_profile: profiles::aad_profile(properties.aad_profile.as_ref()),
        addon_profiles: profiles::addon_profiles(&properties.addon_profiles),
        additional_tags: cluster.tags.clone(),
        ..Default::default()
    };

    Ok(Cluster {
        name,
        pod_cidr_blocks: cidr_blocks(&network.pod_cidrs, network.pod_cidr.as_ref()),
        service_cidr_blocks: cidr_blocks(&network.service_cidrs, network.service_cidr.as_ref()),
        kubernetes_version,
        cloud_spec: CloudSpec::azure(spec),
    })
}

/// The dual-stack list when AKS reports one, otherwise the single CIDR.
fn cidr_blocks(cidrs: &[String], cidr: Option<&String>) -> Vec<String> {
    if cidrs.is_empty() {
        cidr.into_iter().cloned().collect()
    } else {
        cidrs.to_vec()
    }
}

/// Names come from the agent pool subnet ids and CIDRs from the VNet itself. Without a subnet
/// reference every field is empty.
fn virtual_network(
    properties: &ManagedClusterProperties,
    vnet: Option<&VirtualNetwork>,
) -> azure::VirtualNetwork {
    let SubnetReference {
        resource_group,
        virtual_network,
        subnet,
    } = match subnet_reference(&properties.agent_pool_profiles) {
        Some(reference) => reference,
        None => return azure::VirtualNetwork::default(),
    };
    let cidr_block = vnet.and_then(VirtualNetwork::cidr_block).unwrap_or_default();
    let subnet_cidr_block = vnet
        .and_then(|vnet| vnet.subnet_cidr_block(&subnet))
        .unwrap_or_default();
    azure::VirtualNetwork {
        name: virtual_network,
        cidr_block: cidr_block.to_string(),
        resource_group,
        subnet: azure::Subnet {
            name: subnet,
            cidr_block: subnet_cidr_block.to_string(),
        },
    }
}
