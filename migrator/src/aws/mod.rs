/*!

EKS discovery. [`AwsAccessor`] drives an [`AwsApi`] facade, and the pure functions in [`cluster`]
and [`worker`] turn the native objects it returns into the canonical model.

!*/

pub use accessor::AwsAccessor;
pub use sdk::{aws_config, AwsSdk};

mod accessor;
pub mod cluster;
pub mod native;
mod sdk;
pub mod worker;

use crate::error::ClientResult;
use async_trait::async_trait;
use migration_model::Tags;
use native::{
    Addon, AvailabilityZone, EksCluster, NatGateway, Nodegroup, RouteTable, SecurityGroup,
    Subnet, Vpc, VpcEndpoint,
};

/// The EKS and EC2 operations needed to discover and tag a cluster. List operations return every
/// page.
#[async_trait]
pub trait AwsApi: Send + Sync {
    async fn describe_cluster(&self, name: &str) -> ClientResult<EksCluster>;

    /// Every managed addon installed on the cluster, with its version.
    async fn list_addons(&self, cluster_name: &str) -> ClientResult<Vec<Addon>>;

    async fn list_nodegroups(&self, cluster_name: &str) -> ClientResult<Vec<String>>;

    async fn describe_nodegroup(
        &self,
        cluster_name: &str,
        nodegroup_name: &str,
    ) -> ClientResult<Nodegroup>;

    /// VPCs matching the `vpc-id` filter.
    async fn describe_vpcs(&self, vpc_id: &str) -> ClientResult<Vec<Vpc>>;

    /// Subnets matching the `vpc-id` filter.
    async fn describe_vpc_subnets(&self, vpc_id: &str) -> ClientResult<Vec<Subnet>>;

    /// Subnets matching the `subnet-id` filter.
    async fn describe_subnet(&self, subnet_id: &str) -> ClientResult<Vec<Subnet>>;

    /// Availability zones matching the `region-name` filter.
    async fn describe_availability_zones(&self, region: &str)
        -> ClientResult<Vec<AvailabilityZone>>;

    /// Route tables matching the `association.subnet-id` filter.
    async fn describe_route_tables(&self, subnet_id: &str) -> ClientResult<Vec<RouteTable>>;

    /// NAT gateways matching the `subnet-id` filter.
    async fn describe_nat_gateways(&self, subnet_id: &str) -> ClientResult<Vec<NatGateway>>;

    /// Security groups matching the `vpc-id` filter.
    async fn describe_security_groups(&self, vpc_id: &str) -> ClientResult<Vec<SecurityGroup>>;

    /// VPC endpoints matching the `vpc-id` filter.
    async fn describe_vpc_endpoints(&self, vpc_id: &str) -> ClientResult<Vec<VpcEndpoint>>;

    /// Upserts tags on an EKS resource (cluster or nodegroup) by ARN.
    async fn tag_eks_resource(&self, arn: &str, tags: &Tags) -> ClientResult<()>;

    /// Upserts tags on an EC2 resource by id.
    async fn create_ec2_tags(&self, resource_id: &str, tags: &Tags) -> ClientResult<()>;
}
