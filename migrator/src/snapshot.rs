/*!

A file-backed client facade. A snapshot holds the native objects one or more clouds would return,
in the JSON shapes of their APIs, and answers the facade calls from them with the same filtering
the cloud applies. Tag writes are recorded in memory and never leave the process.

```yaml
aws:
  cluster: { name: prod, arn: "arn:aws:eks:...", ... }
  nodegroups: [ { nodegroupName: small, ... } ]
  vpcs: [ { VpcId: vpc-1, CidrBlock: 10.0.0.0/16 } ]
  subnets: [ { SubnetId: subnet-1, VpcId: vpc-1, AvailabilityZone: us-west-2a } ]
nodes: [ gke-prod-small-1a2b-xyz ]
```

!*/

use crate::aws::native::{
    Addon, AvailabilityZone, EksCluster, NatGateway, Nodegroup, RouteTable, SecurityGroup,
    Subnet, Vpc, VpcEndpoint,
};
use crate::aws::AwsApi;
use crate::azure::native::{ManagedCluster, VirtualNetwork};
use crate::azure::AzureApi;
use crate::error::{self, ClientResult, Result};
use crate::gcp::native::{resource_name, GkeCluster, Network, Subnetwork};
use crate::gcp::GcpApi;
use crate::nodes::NodeInventory;
use crate::Clients;
use async_trait::async_trait;
use log::info;
use migration_model::{ClusterProvider, Labels, Tags};
use serde::{Deserialize, Serialize};
use snafu::{ensure, OptionExt, ResultExt, Snafu};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Snafu)]
pub enum LookupError {
    #[snafu(display("The snapshot has no {} section", section))]
    NoSection { section: &'static str },

    #[snafu(display("{} '{}' not found in the snapshot", kind, name))]
    NotFound { kind: &'static str, name: String },
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    pub aws: Option<AwsSnapshot>,
    pub azure: Option<AzureSnapshot>,
    pub gcp: Option<GcpSnapshot>,
    /// Live node names, used as the node inventory.
    pub nodes: Option<Vec<String>>,
    #[serde(skip)]
    tag_writes: Mutex<Vec<TagWrite>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AwsSnapshot {
    pub cluster: EksCluster,
    pub addons: Vec<Addon>,
    pub nodegroups: Vec<Nodegroup>,
    pub vpcs: Vec<Vpc>,
    pub subnets: Vec<Subnet>,
    pub availability_zones: Vec<AvailabilityZone>,
    pub route_tables: Vec<RouteTable>,
    pub nat_gateways: Vec<NatGateway>,
    pub security_groups: Vec<SecurityGroup>,
    pub vpc_endpoints: Vec<VpcEndpoint>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AzureSnapshot {
    pub managed_cluster: ManagedCluster,
    pub virtual_networks: Vec<VirtualNetwork>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GcpSnapshot {
    pub cluster: GkeCluster,
    pub networks: Vec<Network>,
    pub subnetworks: Vec<Subnetwork>,
}

/// A tag or label write that would have been sent to the cloud.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagWrite {
    /// The ARN, resource id or resource path of the target.
    pub resource: String,
    pub tags: Tags,
}

impl Snapshot {
    /// Loads a YAML or JSON snapshot.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).context(error::SnapshotReadSnafu { path })?;
        serde_yaml::from_str(&contents).context(error::SnapshotParseSnafu { path })
    }

    /// The writes recorded so far, in the order they were made.
    pub async fn tag_writes(&self) -> Vec<TagWrite> {
        self.tag_writes.lock().await.clone()
    }

    /// Clients backed by this snapshot for `provider`, whose section must be present.
    pub fn clients(self: &Arc<Self>, provider: ClusterProvider) -> Result<Clients> {
        let clients = Clients::default();
        match provider {
            ClusterProvider::Aws => {
                ensure!(self.aws.is_some(), error::SnapshotSectionSnafu { provider });
                Ok(clients.with_aws(self.clone()))
            }
            ClusterProvider::Azure => {
                ensure!(self.azure.is_some(), error::SnapshotSectionSnafu { provider });
                Ok(clients.with_azure(self.clone()))
            }
            ClusterProvider::Google => {
                ensure!(self.gcp.is_some(), error::SnapshotSectionSnafu { provider });
                let clients = clients.with_gcp(self.clone());
                if self.nodes.is_some() {
                    Ok(clients.with_nodes(self.clone()))
                } else {
                    Ok(clients)
                }
            }
            ClusterProvider::Kind => Ok(clients),
        }
    }

    async fn record<S: Into<String>>(&self, resource: S, tags: &Tags) {
        let resource = resource.into();
        info!("Dry run: tagging '{}'", resource);
        self.tag_writes.lock().await.push(TagWrite {
            resource,
            tags: tags.clone(),
        });
    }

    fn aws_section(&self) -> ClientResult<&AwsSnapshot> {
        Ok(self.aws.as_ref().context(NoSectionSnafu { section: "aws" })?)
    }

    fn azure_section(&self) -> ClientResult<&AzureSnapshot> {
        Ok(self.azure.as_ref().context(NoSectionSnafu { section: "azure" })?)
    }

    fn gcp_section(&self) -> ClientResult<&GcpSnapshot> {
        Ok(self.gcp.as_ref().context(NoSectionSnafu { section: "gcp" })?)
    }
}

fn matching<T, F>(items: &[T], predicate: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> bool,
{
    items.iter().filter(|item| predicate(item)).cloned().collect()
}

fn is(value: &Option<String>, expected: &str) -> bool {
    value.as_deref() == Some(expected)
}

#[async_trait]
impl AwsApi for Snapshot {
    async fn describe_cluster(&self, name: &str) -> ClientResult<EksCluster> {
        let cluster = &self.aws_section()?.cluster;
        ensure!(
            cluster.name.is_none() || is(&cluster.name, name),
            NotFoundSnafu {
                kind: "EKS cluster",
                name
            }
        );
        Ok(cluster.clone())
    }

    async fn list_addons(&self, _: &str) -> ClientResult<Vec<Addon>> {
        Ok(self.aws_section()?.addons.clone())
    }

    async fn list_nodegroups(&self, _: &str) -> ClientResult<Vec<String>> {
        Ok(self
            .aws_section()?
            .nodegroups
            .iter()
            .filter_map(|nodegroup| nodegroup.nodegroup_name.clone())
            .collect())
    }

    async fn describe_nodegroup(&self, _: &str, nodegroup_name: &str) -> ClientResult<Nodegroup> {
        Ok(self
            .aws_section()?
            .nodegroups
            .iter()
            .find(|nodegroup| is(&nodegroup.nodegroup_name, nodegroup_name))
            .cloned()
            .context(NotFoundSnafu {
                kind: "nodegroup",
                name: nodegroup_name,
            })?)
    }

    async fn describe_vpcs(&self, vpc_id: &str) -> ClientResult<Vec<Vpc>> {
        Ok(matching(&self.aws_section()?.vpcs, |vpc| is(&vpc.vpc_id, vpc_id)))
    }

    async fn describe_vpc_subnets(&self, vpc_id: &str) -> ClientResult<Vec<Subnet>> {
        Ok(matching(&self.aws_section()?.subnets, |subnet| {
            is(&subnet.vpc_id, vpc_id)
        }))
    }

    async fn describe_subnet(&self, subnet_id: &str) -> ClientResult<Vec<Subnet>> {
        Ok(matching(&self.aws_section()?.subnets, |subnet| {
            is(&subnet.subnet_id, subnet_id)
        }))
    }

    async fn describe_availability_zones(
        &self,
        region: &str,
    ) -> ClientResult<Vec<AvailabilityZone>> {
        Ok(matching(&self.aws_section()?.availability_zones, |zone| {
            zone.region_name.is_none() || is(&zone.region_name, region)
        }))
    }

    async fn describe_route_tables(&self, subnet_id: &str) -> ClientResult<Vec<RouteTable>> {
        Ok(matching(&self.aws_section()?.route_tables, |table| {
            table
                .associations
                .iter()
                .any(|association| is(&association.subnet_id, subnet_id))
        }))
    }

    async fn describe_nat_gateways(&self, subnet_id: &str) -> ClientResult<Vec<NatGateway>> {
        Ok(matching(&self.aws_section()?.nat_gateways, |gateway| {
            is(&gateway.subnet_id, subnet_id)
        }))
    }

    async fn describe_security_groups(&self, vpc_id: &str) -> ClientResult<Vec<SecurityGroup>> {
        Ok(matching(&self.aws_section()?.security_groups, |group| {
            is(&group.vpc_id, vpc_id)
        }))
    }

    async fn describe_vpc_endpoints(&self, vpc_id: &str) -> ClientResult<Vec<VpcEndpoint>> {
        Ok(matching(&self.aws_section()?.vpc_endpoints, |endpoint| {
            is(&endpoint.vpc_id, vpc_id)
        }))
    }

    async fn tag_eks_resource(&self, arn: &str, tags: &Tags) -> ClientResult<()> {
        self.record(arn, tags).await;
        Ok(())
    }

    async fn create_ec2_tags(&self, resource_id: &str, tags: &Tags) -> ClientResult<()> {
        self.record(resource_id, tags).await;
        Ok(())
    }
}

#[async_trait]
impl AzureApi for Snapshot {
    async fn get_managed_cluster(&self, _: &str, name: &str) -> ClientResult<ManagedCluster> {
        let cluster = &self.azure_section()?.managed_cluster;
        ensure!(
            cluster.name.is_none() || is(&cluster.name, name),
            NotFoundSnafu {
                kind: "managed cluster",
                name
            }
        );
        Ok(cluster.clone())
    }

    async fn get_virtual_network(&self, _: &str, name: &str) -> ClientResult<VirtualNetwork> {
        Ok(self
            .azure_section()?
            .virtual_networks
            .iter()
            .find(|vnet| is(&vnet.name, name))
            .cloned()
            .context(NotFoundSnafu {
                kind: "virtual network",
                name,
            })?)
    }

    async fn tag_managed_cluster(
        &self,
        resource_group: &str,
        name: &str,
        tags: &Tags,
    ) -> ClientResult<()> {
        self.record(format!("{}/managedClusters/{}", resource_group, name), tags)
            .await;
        Ok(())
    }

    async fn tag_agent_pool(
        &self,
        resource_group: &str,
        cluster_name: &str,
        pool_name: &str,
        tags: &Tags,
    ) -> ClientResult<()> {
        self.record(
            format!(
                "{}/managedClusters/{}/agentPools/{}",
                resource_group, cluster_name, pool_name
            ),
            tags,
        )
        .await;
        Ok(())
    }

    async fn tag_virtual_network(
        &self,
        resource_group: &str,
        name: &str,
        tags: &Tags,
    ) -> ClientResult<()> {
        self.record(format!("{}/virtualNetworks/{}", resource_group, name), tags)
            .await;
        Ok(())
    }
}

#[async_trait]
impl GcpApi for Snapshot {
    async fn get_cluster(&self, cluster_path: &str) -> ClientResult<GkeCluster> {
        let cluster = &self.gcp_section()?.cluster;
        let name = resource_name(cluster_path);
        ensure!(
            cluster.name.is_none() || is(&cluster.name, name),
            NotFoundSnafu {
                kind: "GKE cluster",
                name: cluster_path
            }
        );
        Ok(cluster.clone())
    }

    async fn get_network(&self, _: &str, name: &str) -> ClientResult<Network> {
        Ok(self
            .gcp_section()?
            .networks
            .iter()
            .find(|network| is(&network.name, name))
            .cloned()
            .context(NotFoundSnafu {
                kind: "network",
                name,
            })?)
    }

    async fn list_subnetworks(&self, _: &str, region: &str) -> ClientResult<Vec<Subnetwork>> {
        Ok(matching(&self.gcp_section()?.subnetworks, |subnetwork| {
            subnetwork
                .region
                .as_deref()
                .map(|link| resource_name(link) == region)
                .unwrap_or(true)
        }))
    }

    async fn set_cluster_labels(&self, cluster_path: &str, labels: &Labels) -> ClientResult<()> {
        self.record(cluster_path, labels).await;
        Ok(())
    }

    async fn set_node_pool_labels(
        &self,
        cluster_path: &str,
        pool_name: &str,
        labels: &Labels,
    ) -> ClientResult<()> {
        self.record(format!("{}/nodePools/{}", cluster_path, pool_name), labels)
            .await;
        Ok(())
    }
}

#[async_trait]
impl NodeInventory for Snapshot {
    async fn node_names(&self) -> ClientResult<Vec<String>> {
        Ok(self.nodes.clone().context(NoSectionSnafu { section: "nodes" })?)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use maplit::btreemap;

    const SNAPSHOT: &str = r#"
aws:
  cluster:
    name: prod
  subnets:
    - SubnetId: subnet-1
      VpcId: vpc-1
      AvailabilityZone: us-west-2a
    - SubnetId: subnet-2
      VpcId: vpc-2
      AvailabilityZone: us-west-2b
  routeTables:
    - RouteTableId: rtb-1
      Associations:
        - SubnetId: subnet-1
nodes: []
"#;

    fn snapshot() -> Snapshot {
        serde_yaml::from_str(SNAPSHOT).unwrap()
    }

    #[tokio::test]
    async fn filters_like_the_cloud() {
        let snapshot = snapshot();
        assert_eq!(snapshot.describe_vpc_subnets("vpc-1").await.unwrap().len(), 1);
        assert_eq!(snapshot.describe_subnet("subnet-3").await.unwrap().len(), 0);
        let tables = snapshot.describe_route_tables("subnet-1").await.unwrap();
        assert_eq!(tables[0].route_table_id.as_deref(), Some("rtb-1"));
        assert!(snapshot.describe_route_tables("subnet-2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn wrong_cluster_name() {
        let snapshot = snapshot();
        assert!(snapshot.describe_cluster("prod").await.is_ok());
        assert!(snapshot.describe_cluster("staging").await.is_err());
    }

    #[tokio::test]
    async fn missing_section() {
        let snapshot = snapshot();
        assert!(snapshot.get_managed_cluster("rg", "aks").await.is_err());
        let snapshot = Arc::new(snapshot);
        assert!(matches!(
            snapshot.clients(ClusterProvider::Azure),
            Err(error::Error::SnapshotSection { .. })
        ));
        assert!(snapshot.clients(ClusterProvider::Aws).is_ok());
    }

    #[tokio::test]
    async fn records_tag_writes() {
        let snapshot = snapshot();
        let tags = btreemap! { "team".to_string() => "platform".to_string() };
        snapshot.create_ec2_tags("vpc-1", &tags).await.unwrap();
        snapshot
            .tag_eks_resource("arn:aws:eks:us-west-2:1:cluster/prod", &tags)
            .await
            .unwrap();
        let writes = snapshot.tag_writes().await;
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0].resource, "vpc-1");
        assert_eq!(writes[1].tags, tags);
    }

    #[tokio::test]
    async fn azure_nulls_load_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("azure.yaml");
        std::fs::write(
            &path,
            r#"
azure:
  managedCluster:
    name: aks
    tags: null
    properties:
      agentPoolProfiles:
        - name: p
          nodeTaints: null
          availabilityZones: null
"#,
        )
        .unwrap();
        let snapshot = Snapshot::from_path(&path).unwrap();
        let cluster = snapshot.get_managed_cluster("rg", "aks").await.unwrap();
        assert!(cluster.tags.is_empty());
        let pool = &cluster.properties.unwrap().agent_pool_profiles[0];
        assert!(pool.node_taints.is_empty());
        assert!(pool.availability_zones.is_empty());
    }
}
