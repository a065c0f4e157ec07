/*!

GKE discovery. [`GcpAccessor`] reads the cluster, its VPC network and the regional subnetworks
through a [`GcpApi`] facade. Pool sizes come from an optional [`NodeInventory`].

[`NodeInventory`]: crate::NodeInventory

!*/

pub use accessor::GcpAccessor;

mod accessor;
pub mod cluster;
pub mod native;
pub mod worker;

use crate::error::ClientResult;
use async_trait::async_trait;
use migration_model::Labels;
use native::{GkeCluster, Network, Subnetwork};

/// The GKE and Compute Engine operations needed to discover and label a cluster. Clusters are
/// addressed by their relative resource name, `projects/<p>/locations/<l>/clusters/<c>`.
#[async_trait]
pub trait GcpApi: Send + Sync {
    async fn get_cluster(&self, cluster_path: &str) -> ClientResult<GkeCluster>;

    async fn get_network(&self, project: &str, name: &str) -> ClientResult<Network>;

    /// Every subnetwork in the region, across all pages.
    async fn list_subnetworks(&self, project: &str, region: &str)
        -> ClientResult<Vec<Subnetwork>>;

    /// Merges `labels` into the resource labels of the cluster.
    async fn set_cluster_labels(&self, cluster_path: &str, labels: &Labels) -> ClientResult<()>;

    /// Merges `labels` into the resource labels of a node pool.
    async fn set_node_pool_labels(
        &self,
        cluster_path: &str,
        pool_name: &str,
        labels: &Labels,
    ) -> ClientResult<()>;
}
