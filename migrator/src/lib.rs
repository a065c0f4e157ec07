/*!

`cluster-migrator` discovers a managed Kubernetes cluster on AWS, Azure, GCP or kind and
normalizes it into a [`migration_model::Values`] document. It can also stamp ownership tags on the
cluster's cloud resources.

Discovery goes through per-provider client facades ([`AwsApi`], [`AzureApi`], [`GcpApi`] and
[`NodeInventory`]). [`AwsSdk`] and [`KubeNodeInventory`] talk to live services, and [`Snapshot`]
answers every facade from a file for offline runs.

!*/

#![deny(
    clippy::expect_used,
    clippy::get_unwrap,
    clippy::panic,
    clippy::panic_in_result_fn,
    clippy::panicking_unwrap,
    clippy::unwrap_in_result,
    clippy::unwrap_used
)]

pub use accessor::{ClusterAccessor, Migrator};
pub use aws::{aws_config, AwsAccessor, AwsApi, AwsSdk};
pub use azure::{AzureAccessor, AzureApi};
pub use error::{ClientError, ClientResult, Error, Result};
pub use gcp::{GcpAccessor, GcpApi};
pub use kind::KindAccessor;
pub use nodes::{KubeNodeInventory, NodeInventory};
pub use snapshot::{Snapshot, TagWrite};

mod accessor;
pub mod aws;
pub mod azure;
mod error;
pub mod gcp;
mod kind;
mod nodes;
pub mod snapshot;

use log::debug;
use migration_model::{ClusterProvider, Configuration};
use snafu::{ensure, OptionExt, ResultExt};
use std::sync::Arc;

/// The client facades available to [`new_migrator`]. Only the one matching the provider is
/// required.
#[derive(Clone, Default)]
pub struct Clients {
    aws: Option<Arc<dyn AwsApi>>,
    azure: Option<Arc<dyn AzureApi>>,
    gcp: Option<Arc<dyn GcpApi>>,
    nodes: Option<Arc<dyn NodeInventory>>,
}

impl Clients {
    pub fn with_aws(mut self, api: Arc<dyn AwsApi>) -> Self {
        self.aws = Some(api);
        self
    }

    pub fn with_azure(mut self, api: Arc<dyn AzureApi>) -> Self {
        self.azure = Some(api);
        self
    }

    pub fn with_gcp(mut self, api: Arc<dyn GcpApi>) -> Self {
        self.gcp = Some(api);
        self
    }

    /// The live node inventory used to size GKE node pools.
    pub fn with_nodes(mut self, nodes: Arc<dyn NodeInventory>) -> Self {
        self.nodes = Some(nodes);
        self
    }
}

/// Builds a [`Migrator`] for `provider`. The provider is parsed, the configuration is checked
/// against it and validated, and the matching client is required, all before any remote call.
pub fn new_migrator(
    provider: &str,
    configuration: Configuration,
    clients: Clients,
) -> Result<Migrator> {
    let provider =
        ClusterProvider::parse(provider).context(error::UnsupportedProviderSnafu { provider })?;
    let configured = configuration.provider();
    ensure!(
        configured == provider,
        error::ConfigurationMismatchSnafu {
            provider,
            configured
        }
    );
    configuration
        .validate()
        .context(error::InvalidConfigurationSnafu { provider })?;
    debug!("Creating {} accessor for {:?}", provider, configuration);

    let accessor: Box<dyn ClusterAccessor> = match configuration {
        Configuration::Aws(config) => {
            let api = clients
                .aws
                .context(error::MissingClientSnafu { provider })?;
            Box::new(AwsAccessor::new(config, api))
        }
        Configuration::Azure(config) => {
            let api = clients
                .azure
                .context(error::MissingClientSnafu { provider })?;
            Box::new(AzureAccessor::new(config, api))
        }
        Configuration::Gcp(config) => {
            let api = clients
                .gcp
                .context(error::MissingClientSnafu { provider })?;
            let accessor = GcpAccessor::new(config, api);
            match clients.nodes {
                Some(nodes) => Box::new(accessor.with_node_inventory(nodes)),
                None => Box::new(accessor),
            }
        }
        Configuration::Kind(config) => Box::new(KindAccessor::new(config)),
    };
    Ok(Migrator::new(provider, accessor))
}

#[cfg(test)]
mod test {
    use super::*;
    use migration_model::{AwsConfiguration, KindConfiguration};

    fn aws() -> Configuration {
        Configuration::Aws(AwsConfiguration {
            cluster_name: "prod".to_string(),
            region: "us-west-2".to_string(),
        })
    }

    #[test]
    fn unknown_provider() {
        assert!(matches!(
            new_migrator("openstack", aws(), Clients::default()),
            Err(Error::UnsupportedProvider { .. })
        ));
    }

    #[test]
    fn mismatched_configuration() {
        assert!(matches!(
            new_migrator("azure", aws(), Clients::default()),
            Err(Error::ConfigurationMismatch {
                provider: ClusterProvider::Azure,
                configured: ClusterProvider::Aws,
            })
        ));
    }

    #[test]
    fn invalid_configuration_before_client() {
        let configuration = Configuration::Aws(AwsConfiguration {
            cluster_name: "prod".to_string(),
            region: " ".to_string(),
        });
        assert!(matches!(
            new_migrator("aws", configuration, Clients::default()),
            Err(Error::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn missing_client() {
        assert!(matches!(
            new_migrator("aws", aws(), Clients::default()),
            Err(Error::MissingClient {
                provider: ClusterProvider::Aws
            })
        ));
    }

    #[test]
    fn kind_needs_no_client() {
        let configuration = Configuration::Kind(KindConfiguration {
            cluster_name: "dev".to_string(),
        });
        let migrator = new_migrator("kind", configuration, Clients::default()).unwrap();
        assert_eq!(migrator.provider(), ClusterProvider::Kind);
    }
}
