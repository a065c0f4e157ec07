//! Maps an EKS cluster and its VPC to the canonical [`Cluster`].

use super::native::{self, tag_map, EksCluster, Vpc};
use crate::error::{self, Result};
use migration_model::aws::{
    Addon, ApiEndpoint, AwsCloudSpec, Bastion, ControlPlaneLogging, EncryptionConfig,
    EndpointAccess, IdentityReference, Ipv6, NetworkSpec, SubnetSpec, VpcSpec,
};
use migration_model::constants::{
    AWS_ADDON_CONFLICT_RESOLUTION, AWS_AZ_SELECTION, AWS_CONTROL_PLANE_PORT, AWS_IDENTITY_KIND,
    AWS_IDENTITY_NAME, AWS_SSH_KEY_NAME, AWS_TOKEN_METHOD,
};
use migration_model::tags::{merge_tags, ownership_tag};
use migration_model::{AwsConfiguration, CloudSpec, Cluster};
use snafu::OptionExt;
use std::collections::BTreeMap;

const ROLE_SEPARATOR: &str = "role/";

/// Everything fetched from EKS and EC2 while describing the control plane.
#[derive(Debug, Clone, Default)]
pub struct ClusterInventory {
    pub cluster: EksCluster,
    pub addons: Vec<native::Addon>,
    /// The one VPC the cluster runs in.
    pub vpc: Vpc,
    pub subnets: Vec<SubnetInventory>,
    /// The number of availability zones in the region.
    pub availability_zones: usize,
    pub has_security_groups: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SubnetInventory {
    pub subnet: native::Subnet,
    pub route_table_id: Option<String>,
    pub nat_gateway_id: Option<String>,
}

pub fn to_cluster(config: &AwsConfiguration, inventory: &ClusterInventory) -> Result<Cluster> {
    let cluster = &inventory.cluster;
    let vpc_config = cluster
        .resources_vpc_config
        .as_ref()
        .context(error::MissingFieldSnafu {
            resource: "EKS cluster",
            field: "resourcesVpcConfig",
        })?;
    let version = cluster.version.as_deref().context(error::MissingFieldSnafu {
        resource: "EKS cluster",
        field: "version",
    })?;
    let endpoint = cluster.endpoint.as_deref().context(error::MissingFieldSnafu {
        resource: "EKS cluster",
        field: "endpoint",
    })?;

    let network = network_spec(&config.cluster_name, inventory)?;
    let pod_cidr_blocks = vec![network.vpc.cidr_block.clone()];

    let mut spec = AwsCloudSpec {
        region: config.region.clone(),
        encryption_config: encryption_config(cluster),
        logging: logging(cluster),
        ssh_key_name: AWS_SSH_KEY_NAME.to_string(),
        endpoint_access: EndpointAccess {
            public: vpc_config.endpoint_public_access.unwrap_or(true),
            public_cidrs: vpc_config.public_access_cidrs.clone(),
            private: vpc_config.endpoint_private_access.unwrap_or(false),
        },
        control_plane_endpoint: ApiEndpoint {
            host: endpoint.to_string(),
            port: AWS_CONTROL_PLANE_PORT,
        },
        addons: inventory
            .addons
            .iter()
            .map(|addon| Addon {
                name: addon.addon_name.clone().unwrap_or_default(),
                version: addon.addon_version.clone().unwrap_or_default(),
                conflict_resolution: AWS_ADDON_CONFLICT_RESOLUTION.to_string(),
            })
            .collect(),
        associate_oidc_provider: associate_oidc_provider(cluster),
        bastion: Bastion {
            allowed_cidr_blocks: vpc_config.public_access_cidrs.clone(),
            ..Default::default()
        },
        identity_ref: Some(IdentityReference {
            name: AWS_IDENTITY_NAME.to_string(),
            kind: AWS_IDENTITY_KIND.to_string(),
        }),
        network,
        token_method: AWS_TOKEN_METHOD.to_string(),
        ..Default::default()
    };
    apply_role_name(&mut spec, cluster.role_arn.as_deref());

    Ok(Cluster {
        name: config.cluster_name.clone(),
        pod_cidr_blocks,
        service_cidr_blocks: service_cidr_blocks(cluster),
        kubernetes_version: kubernetes_version(version),
        cloud_spec: CloudSpec::aws(spec),
    })
}

/// The role name is everything after the first `role/` of the role ARN. When the ARN has no such
/// segment, `spec.role_name` keeps whatever it held.
pub fn apply_role_name(spec: &mut AwsCloudSpec, role_arn: Option<&str>) {
    if let Some(name) = role_arn.and_then(role_name) {
        spec.role_name = name.to_string();
    }
}

/// Splits on the first `role/` only, so IAM paths stay part of the name: `role/service-role/x`
/// gives `service-role/x`.
pub fn role_name(role_arn: &str) -> Option<&str> {
    role_arn
        .split_once(ROLE_SEPARATOR)
        .map(|(_, name)| name)
        .filter(|name| !name.is_empty())
}

/// The OIDC issuer itself is not validated; its presence is enough.
pub fn associate_oidc_provider(cluster: &EksCluster) -> bool {
    cluster
        .identity
        .as_ref()
        .map(|identity| identity.oidc.is_some())
        .unwrap_or(false)
}

fn kubernetes_version(version: &str) -> String {
    if version.starts_with('v') {
        version.to_string()
    } else {
        format!("v{}", version)
    }
}

fn service_cidr_blocks(cluster: &EksCluster) -> Vec<String> {
    cluster
        .kubernetes_network_config
        .iter()
        .flat_map(|config| {
            [
                config.service_ipv4_cidr.clone(),
                config.service_ipv6_cidr.clone(),
            ]
        })
        .flatten()
        .collect()
}

fn network_spec(cluster_name: &str, inventory: &ClusterInventory) -> Result<NetworkSpec> {
    let vpc = &inventory.vpc;
    let id = vpc.vpc_id.clone().context(error::MissingFieldSnafu {
        resource: "VPC",
        field: "VpcId",
    })?;
    let cidr_block = vpc.cidr_block.clone().context(error::MissingFieldSnafu {
        resource: format!("VPC {}", id),
        field: "CidrBlock",
    })?;
    // Only the first IPv6 association is carried over.
    let ipv6 = vpc
        .ipv6_cidr_block_association_set
        .first()
        .map(|association| Ipv6 {
            cidr_block: association.ipv6_cidr_block.clone().unwrap_or_default(),
            pool_id: association.ipv6_pool.clone().unwrap_or_default(),
        });
    let subnets = inventory
        .subnets
        .iter()
        .map(subnet_spec)
        .collect::<Result<Vec<_>>>()?;

    Ok(NetworkSpec {
        vpc: VpcSpec {
            id,
            cidr_block,
            ipv6,
            tags: merge_tags(&ownership_tag(cluster_name), &tag_map(&vpc.tags)),
            availability_zone_usage_limit: Some(inventory.availability_zones as i32),
            availability_zone_selection: AWS_AZ_SELECTION.to_string(),
        },
        subnets,
        security_group_overrides: inventory.has_security_groups.then(BTreeMap::new),
    })
}

fn subnet_spec(inventory: &SubnetInventory) -> Result<SubnetSpec> {
    let subnet = &inventory.subnet;
    let id = subnet.subnet_id.clone().context(error::MissingFieldSnafu {
        resource: "subnet",
        field: "SubnetId",
    })?;
    let cidr_block = subnet.cidr_block.clone().context(error::MissingFieldSnafu {
        resource: format!("subnet {}", id),
        field: "CidrBlock",
    })?;
    let availability_zone = subnet
        .availability_zone
        .clone()
        .context(error::MissingFieldSnafu {
            resource: format!("subnet {}", id),
            field: "AvailabilityZone",
        })?;
    Ok(SubnetSpec {
        id,
        cidr_block,
        availability_zone,
        is_public: subnet.map_public_ip_on_launch.unwrap_or(false),
        route_table_id: inventory.route_table_id.clone(),
        nat_gateway_id: inventory.nat_gateway_id.clone(),
        tags: tag_map(&subnet.tags),
    })
}

fn logging(cluster: &EksCluster) -> ControlPlaneLogging {
    let mut logging = ControlPlaneLogging::default();
    let enabled = cluster
        .logging
        .iter()
        .flat_map(|logging| logging.cluster_logging.iter())
        .filter(|setup| setup.enabled.unwrap_or(false))
        .flat_map(|setup| setup.types.iter());
    for log_type in enabled {
        match log_type.as_str() {
            "api" => logging.api_server = true,
            "audit" => logging.audit = true,
            "authenticator" => logging.authenticator = true,
            "controllerManager" => logging.controller_manager = true,
            "scheduler" => logging.scheduler = true,
            _ => {}
        }
    }
    logging
}

fn encryption_config(cluster: &EksCluster) -> EncryptionConfig {
    cluster
        .encryption_config
        .first()
        .map(|config| EncryptionConfig {
            provider: config
                .provider
                .as_ref()
                .and_then(|provider| provider.key_arn.clone())
                .unwrap_or_default(),
            resources: config.resources.clone(),
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::aws::native::{Identity, Ipv6CidrBlockAssociation, Oidc, Tag, VpcConfig};

    fn inventory() -> ClusterInventory {
        ClusterInventory {
            cluster: EksCluster {
                name: Some("prod".to_string()),
                version: Some("1.24".to_string()),
                endpoint: Some("https://ABC.gr7.us-west-2.eks.amazonaws.com".to_string()),
                role_arn: Some("arn:aws:iam::123456789012:role/eksClusterRole".to_string()),
                resources_vpc_config: Some(VpcConfig {
                    vpc_id: Some("vpc-1".to_string()),
                    public_access_cidrs: vec!["0.0.0.0/0".to_string()],
                    endpoint_public_access: Some(true),
                    endpoint_private_access: Some(true),
                    ..Default::default()
                }),
                ..Default::default()
            },
            vpc: Vpc {
                vpc_id: Some("vpc-1".to_string()),
                cidr_block: Some("192.168.0.0/16".to_string()),
                ipv6_cidr_block_association_set: vec![
                    Ipv6CidrBlockAssociation {
                        ipv6_cidr_block: Some("2600:1f14::/56".to_string()),
                        ipv6_pool: Some("amazon".to_string()),
                    },
                    Ipv6CidrBlockAssociation {
                        ipv6_cidr_block: Some("2600:1f15::/56".to_string()),
                        ipv6_pool: Some("ignored".to_string()),
                    },
                ],
                tags: vec![Tag {
                    key: Some("Name".to_string()),
                    value: Some("prod-vpc".to_string()),
                }],
            },
            availability_zones: 3,
            ..Default::default()
        }
    }

    fn config() -> AwsConfiguration {
        AwsConfiguration {
            cluster_name: "prod".to_string(),
            region: "us-west-2".to_string(),
        }
    }

    #[test]
    fn role_name_extraction() {
        let mut spec = AwsCloudSpec::default();
        apply_role_name(
            &mut spec,
            Some("arn:aws:iam::123456789012:role/eksClusterRole"),
        );
        assert_eq!(spec.role_name, "eksClusterRole");

        let mut spec = AwsCloudSpec {
            role_name: "preset".to_string(),
            ..Default::default()
        };
        apply_role_name(&mut spec, Some("arn:aws:iam::123456789012:user/someone"));
        assert_eq!(spec.role_name, "preset");
        apply_role_name(&mut spec, None);
        assert_eq!(spec.role_name, "preset");
    }

    #[test]
    fn role_name_keeps_iam_path() {
        assert_eq!(
            role_name("arn:aws:iam::1:role/service-role/eks"),
            Some("service-role/eks")
        );
        let mut spec = AwsCloudSpec::default();
        apply_role_name(&mut spec, Some("arn:aws:iam::1:role/service-role/role/eks"));
        assert_eq!(spec.role_name, "service-role/role/eks");
        assert_eq!(role_name("arn:aws:iam::1:role/"), None);
    }

    #[test]
    fn oidc_presence() {
        let mut cluster = EksCluster::default();
        assert!(!associate_oidc_provider(&cluster));
        cluster.identity = Some(Identity { oidc: None });
        assert!(!associate_oidc_provider(&cluster));
        cluster.identity = Some(Identity {
            oidc: Some(Oidc { issuer: None }),
        });
        assert!(associate_oidc_provider(&cluster));
    }

    #[test]
    fn cluster_from_inventory() {
        let cluster = to_cluster(&config(), &inventory()).unwrap();
        assert_eq!(cluster.name, "prod");
        assert_eq!(cluster.kubernetes_version, "v1.24");
        assert_eq!(cluster.pod_cidr_blocks, vec!["192.168.0.0/16"]);
        assert!(cluster.service_cidr_blocks.is_empty());

        let spec = cluster.cloud_spec.as_aws().unwrap();
        assert_eq!(spec.role_name, "eksClusterRole");
        assert!(spec.endpoint_access.private);
        assert_eq!(spec.bastion.allowed_cidr_blocks, vec!["0.0.0.0/0"]);
        assert!(spec.addons.is_empty());
        assert_eq!(
            spec.network.vpc.ipv6,
            Some(Ipv6 {
                cidr_block: "2600:1f14::/56".to_string(),
                pool_id: "amazon".to_string(),
            })
        );
        assert_eq!(spec.network.vpc.tags.len(), 2);
        assert_eq!(spec.network.vpc.tags["kubernetes.io/cluster/prod"], "owned");
        assert_eq!(spec.network.vpc.availability_zone_usage_limit, Some(3));
        assert_eq!(spec.network.security_group_overrides, None);
        assert!(cluster.cloud_spec.as_azure().is_none());
    }

    #[test]
    fn missing_vpc_config_is_an_error() {
        let mut inventory = inventory();
        inventory.cluster.resources_vpc_config = None;
        assert!(to_cluster(&config(), &inventory).is_err());
    }

    #[test]
    fn subnet_without_cidr_is_an_error() {
        let mut inventory = inventory();
        inventory.subnets.push(SubnetInventory {
            subnet: native::Subnet {
                subnet_id: Some("subnet-1".to_string()),
                availability_zone: Some("us-west-2a".to_string()),
                ..Default::default()
            },
            ..Default::default()
        });
        assert!(to_cluster(&config(), &inventory).is_err());
    }
}
