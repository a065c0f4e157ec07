use super::cluster::{self, ClusterInventory, SubnetInventory};
use super::native::EksCluster;
use super::worker::{self, unique_zones, NodegroupInventory};
use super::AwsApi;
use crate::accessor::ClusterAccessor;
use crate::error::{self, Result};
use async_trait::async_trait;
use log::{debug, info, trace};
use migration_model::constants::DEFAULT_WORKER_POOLS;
use migration_model::tags::{aws_common_role, aws_internal_elb_role, merge_tags};
use migration_model::{AwsConfiguration, Cluster, Tags, Workers};
use snafu::{ensure, OptionExt, ResultExt};
use std::sync::Arc;

const DEFAULT_SECURITY_GROUP: &str = "default";

pub struct AwsAccessor {
    config: AwsConfiguration,
    api: Arc<dyn AwsApi>,
    default_pools: Vec<String>,
}

impl AwsAccessor {
    pub fn new(config: AwsConfiguration, api: Arc<dyn AwsApi>) -> Self {
        Self {
            config,
            api,
            default_pools: DEFAULT_WORKER_POOLS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Replaces the well-known pool names that are emitted as `null` when absent.
    pub fn with_default_pools<I, S>(mut self, pools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_pools = pools.into_iter().map(Into::into).collect();
        self
    }

    async fn describe_cluster(&self) -> Result<EksCluster> {
        debug!("Describing EKS cluster '{}'", self.config.cluster_name);
        let cluster = self
            .api
            .describe_cluster(&self.config.cluster_name)
            .await
            .context(error::RemoteSnafu {
                operation: "DescribeCluster",
            })?;
        trace!("EKS cluster: {:?}", cluster);
        Ok(cluster)
    }

    fn vpc_id(cluster: &EksCluster) -> Result<String> {
        cluster
            .resources_vpc_config
            .as_ref()
            .and_then(|config| config.vpc_id.clone())
            .context(error::MissingFieldSnafu {
                resource: "EKS cluster",
                field: "resourcesVpcConfig.vpcId",
            })
    }

    /// Looks up the zone of every subnet reference, in order, then drops repeats.
    async fn availability_zones(&self, subnet_ids: &[String]) -> Result<Vec<String>> {
        let mut zones = Vec::with_capacity(subnet_ids.len());
        for subnet_id in subnet_ids {
            debug!("Looking up the availability zone of subnet '{}'", subnet_id);
            let zone = self
                .api
                .describe_subnet(subnet_id)
                .await
                .context(error::RemoteSnafu {
                    operation: "DescribeSubnets",
                })?
                .into_iter()
                .next()
                .and_then(|subnet| subnet.availability_zone)
                .context(error::SubnetZoneSnafu { subnet_id })?;
            zones.push(zone);
        }
        Ok(unique_zones(zones))
    }
}

#[async_trait]
impl ClusterAccessor for AwsAccessor {
    async fn get_cluster(&self) -> Result<Cluster> {
        let cluster = self.describe_cluster().await?;
        let vpc_id = Self::vpc_id(&cluster)?;

        info!("Listing addons of '{}'", self.config.cluster_name);
        let addons = self
            .api
            .list_addons(&self.config.cluster_name)
            .await
            .context(error::RemoteSnafu {
                operation: "ListAddons",
            })?;

        debug!("Describing subnets of '{}'", vpc_id);
        let subnets = self
            .api
            .describe_vpc_subnets(&vpc_id)
            .await
            .context(error::RemoteSnafu {
                operation: "DescribeSubnets",
            })?;

        debug!("Describing availability zones of '{}'", self.config.region);
        let availability_zones = self
            .api
            .describe_availability_zones(&self.config.region)
            .await
            .context(error::RemoteSnafu {
                operation: "DescribeAvailabilityZones",
            })?
            .len();

        debug!("Describing VPC '{}'", vpc_id);
        let mut vpcs = self
            .api
            .describe_vpcs(&vpc_id)
            .await
            .context(error::RemoteSnafu {
                operation: "DescribeVpcs",
            })?;
        ensure!(
            vpcs.len() == 1,
            error::VpcCountSnafu {
                vpc_id: &vpc_id,
                count: vpcs.len()
            }
        );
        let vpc = vpcs.remove(0);

        let mut subnet_inventory = Vec::with_capacity(subnets.len());
        for subnet in subnets {
            let subnet_id = subnet.subnet_id.clone().context(error::MissingFieldSnafu {
                resource: format!("subnet of {}", vpc_id),
                field: "SubnetId",
            })?;
            debug!("Describing route tables and NAT gateways of '{}'", subnet_id);
            let route_table_id = self
                .api
                .describe_route_tables(&subnet_id)
                .await
                .context(error::RemoteSnafu {
                    operation: "DescribeRouteTables",
                })?
                .into_iter()
                .next()
                .and_then(|table| table.route_table_id);
            let nat_gateway_id = self
                .api
                .describe_nat_gateways(&subnet_id)
                .await
                .context(error::RemoteSnafu {
                    operation: "DescribeNatGateways",
                })?
                .into_iter()
                .next()
                .and_then(|gateway| gateway.nat_gateway_id);
            subnet_inventory.push(SubnetInventory {
                subnet,
                route_table_id,
                nat_gateway_id,
            });
        }

        debug!("Describing security groups of '{}'", vpc_id);
        let has_security_groups = !self
            .api
            .describe_security_groups(&vpc_id)
            .await
            .context(error::RemoteSnafu {
                operation: "DescribeSecurityGroups",
            })?
            .is_empty();

        cluster::to_cluster(
            &self.config,
            &ClusterInventory {
                cluster,
                addons,
                vpc,
                subnets: subnet_inventory,
                availability_zones,
                has_security_groups,
            },
        )
    }

    async fn get_workers(&self) -> Result<Workers> {
        let cluster_name = &self.config.cluster_name;
        // Fails early when the cluster itself is gone.
        self.describe_cluster().await?;

        info!("Listing nodegroups of '{}'", cluster_name);
        let names = self
            .api
            .list_nodegroups(cluster_name)
            .await
            .context(error::RemoteSnafu {
                operation: "ListNodegroups",
            })?;

        let mut nodegroups = Vec::with_capacity(names.len());
        for name in names {
            debug!("Describing nodegroup '{}'", name);
            let nodegroup = self
                .api
                .describe_nodegroup(cluster_name, &name)
                .await
                .context(error::RemoteSnafu {
                    operation: "DescribeNodegroup",
                })?;
            let availability_zones = self.availability_zones(&nodegroup.subnets).await?;
            nodegroups.push(NodegroupInventory {
                nodegroup,
                availability_zones,
            });
        }

        worker::to_workers(cluster_name, &self.default_pools, &nodegroups)
    }

    async fn add_cluster_tags(&self, tags: &Tags) -> Result<()> {
        let cluster = self.describe_cluster().await?;
        let cluster_tags = merge_tags(&aws_common_role(), tags);
        let arn = cluster.arn.as_deref().context(error::MissingFieldSnafu {
            resource: "EKS cluster",
            field: "arn",
        })?;
        info!("Tagging EKS cluster '{}'", arn);
        self.api
            .tag_eks_resource(arn, &cluster_tags)
            .await
            .context(error::RemoteSnafu {
                operation: "TagResource",
            })?;

        let vpc_id = Self::vpc_id(&cluster)?;
        let vpcs = self
            .api
            .describe_vpcs(&vpc_id)
            .await
            .context(error::RemoteSnafu {
                operation: "DescribeVpcs",
            })?;
        ensure!(
            vpcs.len() == 1,
            error::VpcCountSnafu {
                vpc_id: &vpc_id,
                count: vpcs.len()
            }
        );
        info!("Tagging VPC '{}'", vpc_id);
        self.create_tags(&vpc_id, &cluster_tags).await?;

        let endpoints = self
            .api
            .describe_vpc_endpoints(&vpc_id)
            .await
            .context(error::RemoteSnafu {
                operation: "DescribeVpcEndpoints",
            })?;
        for endpoint_id in endpoints.into_iter().filter_map(|e| e.vpc_endpoint_id) {
            self.create_tags(&endpoint_id, &cluster_tags).await?;
        }

        let subnet_tags = merge_tags(&aws_internal_elb_role(), tags);
        let subnets = self
            .api
            .describe_vpc_subnets(&vpc_id)
            .await
            .context(error::RemoteSnafu {
                operation: "DescribeSubnets",
            })?;
        for subnet_id in subnets.into_iter().filter_map(|s| s.subnet_id) {
            let route_table = self
                .api
                .describe_route_tables(&subnet_id)
                .await
                .context(error::RemoteSnafu {
                    operation: "DescribeRouteTables",
                })?
                .into_iter()
                .next()
                .and_then(|table| table.route_table_id);
            if let Some(route_table_id) = route_table {
                self.create_tags(&route_table_id, tags).await?;
            }

            info!("Tagging subnet '{}'", subnet_id);
            self.create_tags(&subnet_id, &subnet_tags).await?;

            let gateways = self
                .api
                .describe_nat_gateways(&subnet_id)
                .await
                .context(error::RemoteSnafu {
                    operation: "DescribeNatGateways",
                })?;
            for gateway_id in gateways.into_iter().filter_map(|g| g.nat_gateway_id) {
                self.create_tags(&gateway_id, tags).await?;
            }
        }

        let security_groups = self
            .api
            .describe_security_groups(&vpc_id)
            .await
            .context(error::RemoteSnafu {
                operation: "DescribeSecurityGroups",
            })?;
        for group in security_groups {
            if group.group_name.as_deref() == Some(DEFAULT_SECURITY_GROUP) {
                continue;
            }
            if let Some(group_id) = group.group_id {
                self.create_tags(&group_id, tags).await?;
            }
        }
        Ok(())
    }

    async fn add_machine_pool_tags(&self, tags: &Tags) -> Result<()> {
        let cluster_name = &self.config.cluster_name;
        let names = self
            .api
            .list_nodegroups(cluster_name)
            .await
            .context(error::RemoteSnafu {
                operation: "ListNodegroups",
            })?;
        for name in names {
            let nodegroup = self
                .api
                .describe_nodegroup(cluster_name, &name)
                .await
                .context(error::RemoteSnafu {
                    operation: "DescribeNodegroup",
                })?;
            let arn = nodegroup
                .nodegroup_arn
                .context(error::MissingFieldSnafu {
                    resource: format!("nodegroup {}", name),
                    field: "nodegroupArn",
                })?;
            info!("Tagging nodegroup '{}'", name);
            self.api
                .tag_eks_resource(&arn, tags)
                .await
                .context(error::RemoteSnafu {
                    operation: "TagResource",
                })?;
        }
        Ok(())
    }

    async fn add_virtual_network_tags(&self, _: &Tags) -> Result<()> {
        debug!("The VPC is tagged together with the cluster; nothing to do");
        Ok(())
    }
}

impl AwsAccessor {
    async fn create_tags(&self, resource_id: &str, tags: &Tags) -> Result<()> {
        debug!("Tagging '{}'", resource_id);
        self.api
            .create_ec2_tags(resource_id, tags)
            .await
            .context(error::RemoteSnafu {
                operation: "CreateTags",
            })
    }
}
