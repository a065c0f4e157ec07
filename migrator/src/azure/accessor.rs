use super::cluster::{self, ClusterInventory};
use super::native::ManagedCluster;
use super::network::subnet_reference;
use super::{worker, AzureApi};
use crate::accessor::ClusterAccessor;
use crate::error::{self, Result};
use async_trait::async_trait;
use log::{debug, info, trace};
use migration_model::constants::{AZURE_SYSTEM_LABEL_PREFIXES, DEFAULT_WORKER_POOLS};
use migration_model::{AzureConfiguration, Cluster, Tags, Workers};
use snafu::{OptionExt, ResultExt};
use std::sync::Arc;

pub struct AzureAccessor {
    config: AzureConfiguration,
    api: Arc<dyn AzureApi>,
    default_pools: Vec<String>,
    system_label_prefixes: Vec<&'static str>,
}

impl AzureAccessor {
    pub fn new(config: AzureConfiguration, api: Arc<dyn AzureApi>) -> Self {
        Self {
            config,
            api,
            default_pools: DEFAULT_WORKER_POOLS.iter().map(|s| s.to_string()).collect(),
            system_label_prefixes: AZURE_SYSTEM_LABEL_PREFIXES.to_vec(),
        }
    }

    pub fn with_default_pools<I, S>(mut self, pools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_pools = pools.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the label prefixes that mark platform-injected labels.
    pub fn with_system_label_prefixes(mut self, prefixes: Vec<&'static str>) -> Self {
        self.system_label_prefixes = prefixes;
        self
    }

    async fn managed_cluster(&self) -> Result<ManagedCluster> {
        debug!(
            "Getting managed cluster '{}' in '{}'",
            self.config.name, self.config.resource_group
        );
        let cluster = self
            .api
            .get_managed_cluster(&self.config.resource_group, &self.config.name)
            .await
            .context(error::RemoteSnafu {
                operation: "ManagedClusters.Get",
            })?;
        trace!("Managed cluster: {:?}", cluster);
        Ok(cluster)
    }
}

#[async_trait]
impl ClusterAccessor for AzureAccessor {
    async fn get_cluster(&self) -> Result<Cluster> {
        let cluster = self.managed_cluster().await?;
        let reference = cluster
            .properties
            .as_ref()
            .and_then(|properties| subnet_reference(&properties.agent_pool_profiles));

        let virtual_network = match reference {
            Some(reference) => {
                info!(
                    "Getting virtual network '{}' in '{}'",
                    reference.virtual_network, reference.resource_group
                );
                Some(
                    self.api
                        .get_virtual_network(&reference.resource_group, &reference.virtual_network)
                        .await
                        .context(error::RemoteSnafu {
                            operation: "VirtualNetworks.Get",
                        })?,
                )
            }
            None => {
                info!("No agent pool references a subnet; the virtual network is left empty");
                None
            }
        };

        cluster::to_cluster(
            &self.config,
            &ClusterInventory {
                cluster,
                virtual_network,
            },
        )
    }

    async fn get_workers(&self) -> Result<Workers> {
        let cluster = self.managed_cluster().await?;
        let pools = cluster
            .properties
            .map(|properties| properties.agent_pool_profiles)
            .unwrap_or_default();
        info!("Found {} agent pools", pools.len());
        worker::to_workers(&self.default_pools, &self.system_label_prefixes, &pools)
    }

    async fn add_cluster_tags(&self, tags: &Tags) -> Result<()> {
        info!("Tagging managed cluster '{}'", self.config.name);
        self.api
            .tag_managed_cluster(&self.config.resource_group, &self.config.name, tags)
            .await
            .context(error::RemoteSnafu {
                operation: "ManagedClusters.UpdateTags",
            })
    }

    async fn add_machine_pool_tags(&self, tags: &Tags) -> Result<()> {
        let cluster = self.managed_cluster().await?;
        let pools = cluster
            .properties
            .map(|properties| properties.agent_pool_profiles)
            .unwrap_or_default();
        for pool in pools {
            let pool_name = pool.name.context(error::MissingFieldSnafu {
                resource: "agent pool",
                field: "name",
            })?;
            info!("Tagging agent pool '{}'", pool_name);
            self.api
                .tag_agent_pool(
                    &self.config.resource_group,
                    &self.config.name,
                    &pool_name,
                    tags,
                )
                .await
                .context(error::RemoteSnafu {
                    operation: "AgentPools.CreateOrUpdate",
                })?;
        }
        Ok(())
    }

    async fn add_virtual_network_tags(&self, tags: &Tags) -> Result<()> {
        let cluster = self.managed_cluster().await?;
        let reference = cluster
            .properties
            .as_ref()
            .and_then(|properties| subnet_reference(&properties.agent_pool_profiles));
        let reference = match reference {
            Some(reference) => reference,
            None => {
                debug!("No virtual network to tag");
                return Ok(());
            }
        };
        info!("Tagging virtual network '{}'", reference.virtual_network);
        self.api
            .tag_virtual_network(&reference.resource_group, &reference.virtual_network, tags)
            .await
            .context(error::RemoteSnafu {
                operation: "VirtualNetworks.UpdateTags",
            })
    }
}
