/*!

AKS discovery. [`AzureAccessor`] reads the managed cluster through an [`AzureApi`] facade and, when
the agent pools reference one, the virtual network the cluster runs in.

!*/

pub use accessor::AzureAccessor;

mod accessor;
pub mod cluster;
pub mod native;
pub mod network;
mod profiles;
pub mod worker;

use crate::error::ClientResult;
use async_trait::async_trait;
use migration_model::Tags;
use native::{ManagedCluster, VirtualNetwork};

/// The Azure Resource Manager operations needed to discover and tag an AKS cluster. Tag writes
/// merge into the existing tags of the resource.
#[async_trait]
pub trait AzureApi: Send + Sync {
    async fn get_managed_cluster(
        &self,
        resource_group: &str,
        name: &str,
    ) -> ClientResult<ManagedCluster>;

    async fn get_virtual_network(
        &self,
        resource_group: &str,
        name: &str,
    ) -> ClientResult<VirtualNetwork>;

    async fn tag_managed_cluster(
        &self,
        resource_group: &str,
        name: &str,
        tags: &Tags,
    ) -> ClientResult<()>;

    async fn tag_agent_pool(
        &self,
        resource_group: &str,
        cluster_name: &str,
        pool_name: &str,
        tags: &Tags,
    ) -> ClientResult<()>;

    async fn tag_virtual_network(
        &self,
        resource_group: &str,
        name: &str,
        tags: &Tags,
    ) -> ClientResult<()>;
}
