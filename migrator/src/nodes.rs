//! Live node inventory, used to estimate GKE pool sizes.

use crate::error::{self, ClientResult, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Node;
use kube::api::ListParams;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Api, Client, Config, ResourceExt};
use log::debug;
use snafu::ResultExt;
use std::path::Path;

#[async_trait]
pub trait NodeInventory: Send + Sync {
    /// The names of every node currently registered with the cluster.
    async fn node_names(&self) -> ClientResult<Vec<String>>;
}

/// Lists `Node` objects through the Kubernetes API.
#[derive(Clone)]
pub struct KubeNodeInventory {
    client: Client,
}

impl KubeNodeInventory {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Create an inventory from the path to a kubeconfig file.
    pub async fn from_kubeconfig_path(path: &Path) -> Result<Self> {
        let kubeconfig = Kubeconfig::read_from(path).context(error::KubeconfigSnafu { path })?;
        let config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
            .await
            .context(error::KubeconfigSnafu { path })?;
        Ok(Self {
            client: Client::try_from(config).context(error::KubeClientSnafu)?,
        })
    }

    /// Create an inventory using the default `kube::Client`.
    pub async fn try_default() -> Result<Self> {
        Ok(Self {
            client: Client::try_default().await.context(error::KubeClientSnafu)?,
        })
    }
}

#[async_trait]
impl NodeInventory for KubeNodeInventory {
    async fn node_names(&self) -> ClientResult<Vec<String>> {
        let nodes = Api::<Node>::all(self.client.clone())
            .list(&ListParams::default())
            .await?;
        debug!("Listed {} nodes", nodes.items.len());
        Ok(nodes.items.iter().map(|node| node.name_any()).collect())
    }
}
