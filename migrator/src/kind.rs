//! Local kind clusters. There is no cloud API to query, so only the cluster name is reported and
//! every tag write succeeds without doing anything.

use crate::accessor::ClusterAccessor;
use crate::error::Result;
use async_trait::async_trait;
use log::debug;
use migration_model::{CloudSpec, Cluster, KindConfiguration, Tags, Workers};

pub struct KindAccessor {
    config: KindConfiguration,
}

impl KindAccessor {
    pub fn new(config: KindConfiguration) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ClusterAccessor for KindAccessor {
    async fn get_cluster(&self) -> Result<Cluster> {
        Ok(Cluster {
            name: self.config.cluster_name.clone(),
            cloud_spec: CloudSpec::none(),
            ..Default::default()
        })
    }

    async fn get_workers(&self) -> Result<Workers> {
        Ok(Workers::default())
    }

    async fn add_cluster_tags(&self, _: &Tags) -> Result<()> {
        debug!("kind clusters have no taggable resources");
        Ok(())
    }

    async fn add_machine_pool_tags(&self, _: &Tags) -> Result<()> {
        Ok(())
    }

    async fn add_virtual_network_tags(&self, _: &Tags) -> Result<()> {
        Ok(())
    }
}
