use crate::error::{self, Result};
use async_trait::async_trait;
use log::info;
use migration_model::{Cluster, ClusterProvider, Tags, Values, Workers};
use snafu::ResultExt;
use std::sync::Arc;

/// Discovers one cluster on one provider and stamps tags on its resources.
///
/// Every call is a complete rediscovery. Implementations fetch what they need in a fixed order,
/// hand the native objects to the provider's pure mappers, and fail on the first error without
/// returning anything partial.
#[async_trait]
pub trait ClusterAccessor: Send + Sync {
    /// Describes the control plane.
    async fn get_cluster(&self) -> Result<Cluster>;

    /// Describes the worker pools, overlaid on the well-known default pools.
    async fn get_workers(&self) -> Result<Workers>;

    async fn add_cluster_tags(&self, tags: &Tags) -> Result<()>;

    async fn add_machine_pool_tags(&self, tags: &Tags) -> Result<()>;

    async fn add_virtual_network_tags(&self, tags: &Tags) -> Result<()>;
}

#[async_trait]
impl<T: ClusterAccessor + ?Sized> ClusterAccessor for Arc<T> {
    async fn get_cluster(&self) -> Result<Cluster> {
        self.as_ref().get_cluster().await
    }

    async fn get_workers(&self) -> Result<Workers> {
        self.as_ref().get_workers().await
    }

    async fn add_cluster_tags(&self, tags: &Tags) -> Result<()> {
        self.as_ref().add_cluster_tags(tags).await
    }

    async fn add_machine_pool_tags(&self, tags: &Tags) -> Result<()> {
        self.as_ref().add_machine_pool_tags(tags).await
    }

    async fn add_virtual_network_tags(&self, tags: &Tags) -> Result<()> {
        self.as_ref().add_virtual_network_tags(tags).await
    }
}

/// Combines an accessor's cluster and worker descriptions into a [`Values`] document.
pub struct Migrator {
    provider: ClusterProvider,
    accessor: Box<dyn ClusterAccessor>,
}

impl Migrator {
    pub fn new(provider: ClusterProvider, accessor: Box<dyn ClusterAccessor>) -> Self {
        Self { provider, accessor }
    }

    pub fn provider(&self) -> ClusterProvider {
        self.provider
    }

    pub async fn convert(&self) -> Result<Values> {
        info!("Discovering {} cluster", self.provider);
        let cluster = self.accessor.get_cluster().await?;
        info!("Discovering {} worker pools", self.provider);
        let workers = self.accessor.get_workers().await?;
        Values::new(self.provider, cluster, workers).context(error::InvalidValuesSnafu)
    }

    /// Stamps `tags` on the cluster, its machine pools and its virtual network, in that order.
    /// The first failure stops the sequence; tags already written stay in place.
    pub async fn add_tags(&self, tags: &Tags) -> Result<()> {
        info!("Tagging {} cluster resources", self.provider);
        self.accessor.add_cluster_tags(tags).await?;
        info!("Tagging {} machine pools", self.provider);
        self.accessor.add_machine_pool_tags(tags).await?;
        info!("Tagging {} virtual network", self.provider);
        self.accessor.add_virtual_network_tags(tags).await
    }
}
