use super::cluster::{self, ClusterInventory};
use super::native::{resource_name, GkeCluster};
use super::{worker, GcpApi};
use crate::accessor::ClusterAccessor;
use crate::error::{self, Result};
use crate::nodes::NodeInventory;
use async_trait::async_trait;
use log::{debug, info, trace};
use migration_model::constants::DEFAULT_WORKER_POOLS;
use migration_model::{Cluster, GcpConfiguration, Tags, Workers};
use snafu::{OptionExt, ResultExt};
use std::sync::Arc;

pub struct GcpAccessor {
    config: GcpConfiguration,
    api: Arc<dyn GcpApi>,
    nodes: Option<Arc<dyn NodeInventory>>,
    default_pools: Vec<String>,
}

impl GcpAccessor {
    pub fn new(config: GcpConfiguration, api: Arc<dyn GcpApi>) -> Self {
        Self {
            config,
            api,
            nodes: None,
            default_pools: DEFAULT_WORKER_POOLS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Counts pool replicas from the live nodes of the cluster.
    pub fn with_node_inventory(mut self, nodes: Arc<dyn NodeInventory>) -> Self {
        self.nodes = Some(nodes);
        self
    }

    pub fn with_default_pools<I, S>(mut self, pools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_pools = pools.into_iter().map(Into::into).collect();
        self
    }

    async fn gke_cluster(&self) -> Result<GkeCluster> {
        let path = self.config.cluster_path();
        debug!("Getting GKE cluster '{}'", path);
        let cluster = self
            .api
            .get_cluster(&path)
            .await
            .context(error::RemoteSnafu {
                operation: "GetCluster",
            })?;
        trace!("GKE cluster: {:?}", cluster);
        Ok(cluster)
    }
}

#[async_trait]
impl ClusterAccessor for GcpAccessor {
    async fn get_cluster(&self) -> Result<Cluster> {
        let cluster = self.gke_cluster().await?;
        let network_name = cluster
            .network
            .as_deref()
            .map(resource_name)
            .map(str::to_string)
            .context(error::MissingFieldSnafu {
                resource: format!("GKE cluster {}", self.config.name),
                field: "network",
            })?;

        info!("Getting network '{}'", network_name);
        let network = self
            .api
            .get_network(&self.config.project, &network_name)
            .await
            .context(error::RemoteSnafu {
                operation: "Networks.Get",
            })?;

        info!("Listing subnetworks in '{}'", self.config.region);
        let subnetworks = self
            .api
            .list_subnetworks(&self.config.project, &self.config.region)
            .await
            .context(error::RemoteSnafu {
                operation: "Subnetworks.List",
            })?;

        cluster::to_cluster(
            &self.config,
            &ClusterInventory {
                cluster,
                network,
                subnetworks,
            },
        )
    }

    async fn get_workers(&self) -> Result<Workers> {
        let cluster = self.gke_cluster().await?;
        let node_names = match &self.nodes {
            Some(nodes) => {
                info!("Listing cluster nodes");
                Some(nodes.node_names().await.context(error::RemoteSnafu {
                    operation: "ListNodes",
                })?)
            }
            None => {
                debug!("No node inventory; using initial node counts");
                None
            }
        };
        worker::to_workers(
            &self.default_pools,
            &cluster.node_pools,
            node_names.as_deref(),
        )
    }

    async fn add_cluster_tags(&self, tags: &Tags) -> Result<()> {
        let path = self.config.cluster_path();
        info!("Labeling GKE cluster '{}'", path);
        self.api
            .set_cluster_labels(&path, tags)
            .await
            .context(error::RemoteSnafu {
                operation: "SetLabels",
            })
    }

    async fn add_machine_pool_tags(&self, tags: &Tags) -> Result<()> {
        let path = self.config.cluster_path();
        let cluster = self.gke_cluster().await?;
        for pool in cluster.node_pools {
            let pool_name = pool.name.context(error::MissingFieldSnafu {
                resource: "node pool",
                field: "name",
            })?;
            info!("Labeling node pool '{}'", pool_name);
            self.api
                .set_node_pool_labels(&path, &pool_name, tags)
                .await
                .context(error::RemoteSnafu {
                    operation: "UpdateNodePool",
                })?;
        }
        Ok(())
    }

    async fn add_virtual_network_tags(&self, _: &Tags) -> Result<()> {
        debug!("VPC networks carry no labels; nothing to do");
        Ok(())
    }
}
