//! The [`AwsApi`] implementation backed by the AWS SDK.

use super::native::{
    self, Addon, AvailabilityZone, EksCluster, NatGateway, Nodegroup, RouteTable, SecurityGroup,
    Subnet, Vpc, VpcEndpoint,
};
use super::AwsApi;
use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use aws_config::default_provider::credentials::default_provider;
use aws_config::sts::AssumeRoleProvider;
use aws_config::retry::RetryConfig;
use aws_sdk_ec2::model::{Filter, Tag};
use aws_smithy_types::retry::RetryMode;
use aws_credential_types::provider::SharedCredentialsProvider;
use aws_types::region::Region;
use aws_types::SdkConfig;
use log::{info, trace};
use migration_model::Tags;
use std::collections::{BTreeMap, HashMap};

const SESSION_NAME: &str = "cluster-migrator";

/// Loads the shared AWS configuration for `region`, assuming `assume_role` when one is given.
pub async fn aws_config(region: &str, assume_role: Option<&str>) -> SdkConfig {
    info!("Creating an aws config for region '{}'", region);
    let config_loader = aws_config::from_env().retry_config(
        RetryConfig::standard()
            .with_retry_mode(RetryMode::Adaptive)
            .with_max_attempts(15),
    );
    let base_provider = SharedCredentialsProvider::new(default_provider().await);
    let config_loader = match assume_role {
        Some(role_arn) => {
            info!("Assuming role '{}'", role_arn);
            config_loader.credentials_provider(SharedCredentialsProvider::new(
                AssumeRoleProvider::builder(role_arn)
                    .region(Region::new(region.to_string()))
                    .session_name(SESSION_NAME)
                    .build(base_provider),
            ))
        }
        None => config_loader.credentials_provider(base_provider),
    };
    config_loader
        .region(Region::new(region.to_string()))
        .load()
        .await
}

#[derive(Debug, Clone)]
pub struct AwsSdk {
    eks: aws_sdk_eks::Client,
    ec2: aws_sdk_ec2::Client,
}

impl AwsSdk {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            eks: aws_sdk_eks::Client::new(config),
            ec2: aws_sdk_ec2::Client::new(config),
        }
    }
}

fn filter(name: &str, value: &str) -> Filter {
    Filter::builder().name(name).values(value).build()
}

fn owned(value: Option<&str>) -> Option<String> {
    value.map(str::to_string)
}

fn strings(values: Option<&[String]>) -> Vec<String> {
    values.map(<[String]>::to_vec).unwrap_or_default()
}

fn string_map(values: Option<&HashMap<String, String>>) -> BTreeMap<String, String> {
    values
        .map(|values| {
            values
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        })
        .unwrap_or_default()
}

fn ec2_tags(tags: Option<&[Tag]>) -> Vec<native::Tag> {
    tags.unwrap_or_default()
        .iter()
        .map(|tag| native::Tag {
            key: owned(tag.key()),
            value: owned(tag.value()),
        })
        .collect()
}

fn missing(what: &str) -> ClientError {
    format!("the response did not contain {}", what).into()
}

#[async_trait]
impl AwsApi for AwsSdk {
    async fn describe_cluster(&self, name: &str) -> ClientResult<EksCluster> {
        let output = self.eks.describe_cluster().name(name).send().await?;
        let cluster = output.cluster().ok_or_else(|| missing("a cluster"))?;
        trace!("DescribeCluster: {:?}", cluster);
        Ok(eks_cluster(cluster))
    }

    async fn list_addons(&self, cluster_name: &str) -> ClientResult<Vec<Addon>> {
        let mut names = Vec::new();
        let mut next_token = None;
        loop {
            let output = self
                .eks
                .list_addons()
                .cluster_name(cluster_name)
                .set_next_token(next_token)
                .send()
                .await?;
            names.extend(strings(output.addons()));
            next_token = owned(output.next_token());
            if next_token.is_none() {
                break;
            }
        }

        let mut addons = Vec::with_capacity(names.len());
        for name in names {
            let output = self
                .eks
                .describe_addon()
                .cluster_name(cluster_name)
                .addon_name(&name)
                .send()
                .await?;
            let addon = output.addon().ok_or_else(|| missing("an addon"))?;
            addons.push(Addon {
                addon_name: owned(addon.addon_name()),
                addon_version: owned(addon.addon_version()),
            });
        }
        Ok(addons)
    }

    async fn list_nodegroups(&self, cluster_name: &str) -> ClientResult<Vec<String>> {
        let mut names = Vec::new();
        let mut next_token = None;
        loop {
            let output = self
                .eks
                .list_nodegroups()
                .cluster_name(cluster_name)
                .set_next_token(next_token)
                .send()
                .await?;
            names.extend(strings(output.nodegroups()));
            next_token = owned(output.next_token());
            if next_token.is_none() {
                break;
            }
        }
        Ok(names)
    }

    async fn describe_nodegroup(
        &self,
        cluster_name: &str,
        nodegroup_name: &str,
    ) -> ClientResult<Nodegroup> {
        let output = self
            .eks
            .describe_nodegroup()
            .cluster_name(cluster_name)
            .nodegroup_name(nodegroup_name)
            .send()
            .await?;
        let nodegroup = output.nodegroup().ok_or_else(|| missing("a nodegroup"))?;
        trace!("DescribeNodegroup: {:?}", nodegroup);
        Ok(eks_nodegroup(nodegroup))
    }

    async fn describe_vpcs(&self, vpc_id: &str) -> ClientResult<Vec<Vpc>> {
        let mut vpcs = Vec::new();
        let mut next_token = None;
        loop {
            let output = self
                .ec2
                .describe_vpcs()
                .filters(filter("vpc-id", vpc_id))
                .set_next_token(next_token)
                .send()
                .await?;
            vpcs.extend(output.vpcs().unwrap_or_default().iter().map(|vpc| Vpc {
                vpc_id: owned(vpc.vpc_id()),
                cidr_block: owned(vpc.cidr_block()),
                ipv6_cidr_block_association_set: vpc
                    .ipv6_cidr_block_association_set()
                    .unwrap_or_default()
                    .iter()
                    .map(|association| native::Ipv6CidrBlockAssociation {
                        ipv6_cidr_block: owned(association.ipv6_cidr_block()),
                        ipv6_pool: owned(association.ipv6_pool()),
                    })
                    .collect(),
                tags: ec2_tags(vpc.tags()),
            }));
            next_token = owned(output.next_token());
            if next_token.is_none() {
                break;
            }
        }
        Ok(vpcs)
    }

    async fn describe_vpc_subnets(&self, vpc_id: &str) -> ClientResult<Vec<Subnet>> {
        self.describe_subnets(filter("vpc-id", vpc_id)).await
    }

    async fn describe_subnet(&self, subnet_id: &str) -> ClientResult<Vec<Subnet>> {
        self.describe_subnets(filter("subnet-id", subnet_id)).await
    }

    async fn describe_availability_zones(
        &self,
        region: &str,
    ) -> ClientResult<Vec<AvailabilityZone>> {
        let output = self
            .ec2
            .describe_availability_zones()
            .filters(filter("region-name", region))
            .send()
            .await?;
        Ok(output
            .availability_zones()
            .unwrap_or_default()
            .iter()
            .map(|zone| AvailabilityZone {
                zone_name: owned(zone.zone_name()),
                region_name: owned(zone.region_name()),
            })
            .collect())
    }

    async fn describe_route_tables(&self, subnet_id: &str) -> ClientResult<Vec<RouteTable>> {
        let mut tables = Vec::new();
        let mut next_token = None;
        loop {
            let output = self
                .ec2
                .describe_route_tables()
                .filters(filter("association.subnet-id", subnet_id))
                .set_next_token(next_token)
                .send()
                .await?;
            tables.extend(output.route_tables().unwrap_or_default().iter().map(|table| {
                RouteTable {
                    route_table_id: owned(table.route_table_id()),
                    associations: table
                        .associations()
                        .unwrap_or_default()
                        .iter()
                        .map(|association| native::RouteTableAssociation {
                            subnet_id: owned(association.subnet_id()),
                        })
                        .collect(),
                }
            }));
            next_token = owned(output.next_token());
            if next_token.is_none() {
                break;
            }
        }
        Ok(tables)
    }

    async fn describe_nat_gateways(&self, subnet_id: &str) -> ClientResult<Vec<NatGateway>> {
        let mut gateways = Vec::new();
        let mut next_token = None;
        loop {
            let output = self
                .ec2
                .describe_nat_gateways()
                .filter(filter("subnet-id", subnet_id))
                .set_next_token(next_token)
                .send()
                .await?;
            gateways.extend(output.nat_gateways().unwrap_or_default().iter().map(
                |gateway| NatGateway {
                    nat_gateway_id: owned(gateway.nat_gateway_id()),
                    subnet_id: owned(gateway.subnet_id()),
                },
            ));
            next_token = owned(output.next_token());
            if next_token.is_none() {
                break;
            }
        }
        Ok(gateways)
    }

    async fn describe_security_groups(&self, vpc_id: &str) -> ClientResult<Vec<SecurityGroup>> {
        let mut groups = Vec::new();
        let mut next_token = None;
        loop {
            let output = self
                .ec2
                .describe_security_groups()
                .filters(filter("vpc-id", vpc_id))
                .set_next_token(next_token)
                .send()
                .await?;
            groups.extend(output.security_groups().unwrap_or_default().iter().map(
                |group| SecurityGroup {
                    group_id: owned(group.group_id()),
                    group_name: owned(group.group_name()),
                    vpc_id: owned(group.vpc_id()),
                },
            ));
            next_token = owned(output.next_token());
            if next_token.is_none() {
                break;
            }
        }
        Ok(groups)
    }

    async fn describe_vpc_endpoints(&self, vpc_id: &str) -> ClientResult<Vec<VpcEndpoint>> {
        let mut endpoints = Vec::new();
        let mut next_token = None;
        loop {
            let output = self
                .ec2
                .describe_vpc_endpoints()
                .filters(filter("vpc-id", vpc_id))
                .set_next_token(next_token)
                .send()
                .await?;
            endpoints.extend(output.vpc_endpoints().unwrap_or_default().iter().map(
                |endpoint| VpcEndpoint {
                    vpc_endpoint_id: owned(endpoint.vpc_endpoint_id()),
                    vpc_id: owned(endpoint.vpc_id()),
                },
            ));
            next_token = owned(output.next_token());
            if next_token.is_none() {
                break;
            }
        }
        Ok(endpoints)
    }

    async fn tag_eks_resource(&self, arn: &str, tags: &Tags) -> ClientResult<()> {
        self.eks
            .tag_resource()
            .resource_arn(arn)
            .set_tags(Some(tags.clone().into_iter().collect()))
            .send()
            .await?;
        Ok(())
    }

    async fn create_ec2_tags(&self, resource_id: &str, tags: &Tags) -> ClientResult<()> {
        let mut request = self.ec2.create_tags().resources(resource_id);
        for (key, value) in tags {
            request = request.tags(Tag::builder().key(key).value(value).build());
        }
        request.send().await?;
        Ok(())
    }
}

impl AwsSdk {
    async fn describe_subnets(&self, subnet_filter: Filter) -> ClientResult<Vec<Subnet>> {
        let mut subnets = Vec::new();
        let mut next_token = None;
        loop {
            let output = self
                .ec2
                .describe_subnets()
                .filters(subnet_filter.clone())
                .set_next_token(next_token)
                .send()
                .await?;
            subnets.extend(output.subnets().unwrap_or_default().iter().map(|subnet| {
                Subnet {
                    subnet_id: owned(subnet.subnet_id()),
                    vpc_id: owned(subnet.vpc_id()),
                    cidr_block: owned(subnet.cidr_block()),
                    availability_zone: owned(subnet.availability_zone()),
                    map_public_ip_on_launch: subnet.map_public_ip_on_launch().into(),
                    tags: ec2_tags(subnet.tags()),
                }
            }));
            next_token = owned(output.next_token());
            if next_token.is_none() {
                break;
            }
        }
        Ok(subnets)
    }
}

fn eks_cluster(cluster: &aws_sdk_eks::model::Cluster) -> EksCluster {
    EksCluster {
        name: owned(cluster.name()),
        arn: owned(cluster.arn()),
        version: owned(cluster.version()),
        endpoint: owned(cluster.endpoint()),
        role_arn: owned(cluster.role_arn()),
        resources_vpc_config: cluster
            .resources_vpc_config()
            .map(|config| native::VpcConfig {
                vpc_id: owned(config.vpc_id()),
                subnet_ids: strings(config.subnet_ids()),
                security_group_ids: strings(config.security_group_ids()),
                cluster_security_group_id: owned(config.cluster_security_group_id()),
                endpoint_public_access: config.endpoint_public_access().into(),
                endpoint_private_access: config.endpoint_private_access().into(),
                public_access_cidrs: strings(config.public_access_cidrs()),
            }),
        kubernetes_network_config: cluster.kubernetes_network_config().map(|config| {
            native::KubernetesNetworkConfig {
                service_ipv4_cidr: owned(config.service_ipv4_cidr()),
                service_ipv6_cidr: owned(config.service_ipv6_cidr()),
                ip_family: config.ip_family().map(|family| family.as_str().to_string()),
            }
        }),
        identity: cluster.identity().map(|identity| native::Identity {
            oidc: identity.oidc().map(|oidc| native::Oidc {
                issuer: owned(oidc.issuer()),
            }),
        }),
        logging: cluster.logging().map(|logging| native::Logging {
            cluster_logging: logging
                .cluster_logging()
                .unwrap_or_default()
                .iter()
                .map(|setup| native::LogSetup {
                    types: setup
                        .types()
                        .unwrap_or_default()
                        .iter()
                        .map(|log_type| log_type.as_str().to_string())
                        .collect(),
                    enabled: setup.enabled().into(),
                })
                .collect(),
        }),
        encryption_config: cluster
            .encryption_config()
            .unwrap_or_default()
            .iter()
            .map(|config| native::EncryptionConfig {
                resources: strings(config.resources()),
                provider: config.provider().map(|provider| native::EncryptionProvider {
                    key_arn: owned(provider.key_arn()),
                }),
            })
            .collect(),
        tags: string_map(cluster.tags()),
    }
}

fn eks_nodegroup(nodegroup: &aws_sdk_eks::model::Nodegroup) -> Nodegroup {
    Nodegroup {
        nodegroup_name: owned(nodegroup.nodegroup_name()),
        nodegroup_arn: owned(nodegroup.nodegroup_arn()),
        release_version: owned(nodegroup.release_version()),
        scaling_config: nodegroup
            .scaling_config()
            .map(|config| native::ScalingConfig {
                min_size: config.min_size().into(),
                max_size: config.max_size().into(),
                desired_size: config.desired_size().into(),
            }),
        instance_types: strings(nodegroup.instance_types()),
        subnets: strings(nodegroup.subnets()),
        ami_type: nodegroup.ami_type().map(|ami| ami.as_str().to_string()),
        capacity_type: nodegroup
            .capacity_type()
            .map(|capacity| capacity.as_str().to_string()),
        disk_size: nodegroup.disk_size().into(),
        labels: string_map(nodegroup.labels()),
        taints: nodegroup
            .taints()
            .unwrap_or_default()
            .iter()
            .map(|taint| native::Taint {
                key: owned(taint.key()),
                value: owned(taint.value()),
                effect: taint.effect().map(|effect| effect.as_str().to_string()),
            })
            .collect(),
        tags: string_map(nodegroup.tags()),
        update_config: nodegroup
            .update_config()
            .map(|config| native::UpdateConfig {
                max_unavailable: config.max_unavailable().into(),
                max_unavailable_percentage: config.max_unavailable_percentage().into(),
            }),
    }
}
