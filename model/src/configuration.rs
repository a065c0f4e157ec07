use crate::error::{self, Result};
use crate::ClusterProvider;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};

/// The identifiers needed to locate a cluster on one provider. A `Configuration` is built once by
/// the caller and borrowed by the accessor for its whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Configuration {
    Aws(AwsConfiguration),
    Azure(AzureConfiguration),
    Gcp(GcpConfiguration),
    Kind(KindConfiguration),
}

impl Configuration {
    /// The provider this configuration can be used with.
    pub fn provider(&self) -> ClusterProvider {
        match self {
            Configuration::Aws(_) => ClusterProvider::Aws,
            Configuration::Azure(_) => ClusterProvider::Azure,
            Configuration::Gcp(_) => ClusterProvider::Google,
            Configuration::Kind(_) => ClusterProvider::Kind,
        }
    }

    /// Checks that every required identifier is present. No remote call may be made with a
    /// configuration that fails this check.
    pub fn validate(&self) -> Result<()> {
        match self {
            Configuration::Aws(config) => config.validate(),
            Configuration::Azure(config) => config.validate(),
            Configuration::Gcp(config) => config.validate(),
            Configuration::Kind(config) => config.validate(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwsConfiguration {
    pub cluster_name: String,
    pub region: String,
}

impl AwsConfiguration {
    pub fn validate(&self) -> Result<()> {
        require(
            &self.cluster_name,
            "cluster name",
            "it is passed with --cluster-name",
        )?;
        require(&self.region, "region", "AWS_REGION environment variable is set")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureConfiguration {
    pub subscription_id: String,
    pub resource_group: String,
    pub name: String,
}

impl AzureConfiguration {
    pub fn validate(&self) -> Result<()> {
        require(
            &self.subscription_id,
            "subscription ID",
            "AZURE_SUBSCRIPTION_ID environment variable is set",
        )?;
        require(&self.resource_group, "resource group", "it is set")?;
        require(&self.name, "name", "it is set")
    }
}

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GcpConfiguration {
    /// Service account credentials in JSON form. These are handed to the client facade and never
    /// copied into generated output.
    pub credentials: String,
    pub project: String,
    pub region: String,
    pub name: String,
}

impl GcpConfiguration {
    pub fn validate(&self) -> Result<()> {
        require(&self.project, "project", "it is set")?;
        require(&self.region, "region", "it is set")?;
        require(&self.name, "name", "it is set")
    }

    /// The fully qualified resource name of the cluster.
    pub fn cluster_path(&self) -> String {
        format!(
            "projects/{}/locations/{}/clusters/{}",
            self.project, self.region, self.name
        )
    }
}

impl Debug for GcpConfiguration {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcpConfiguration")
            .field("credentials", &"<redacted>")
            .field("project", &self.project)
            .field("region", &self.region)
            .field("name", &self.name)
            .finish()
    }
}

/// A local kind cluster. Only the name is carried through; nothing is discovered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KindConfiguration {
    pub cluster_name: String,
}

impl KindConfiguration {
    pub fn validate(&self) -> Result<()> {
        require(&self.cluster_name, "cluster name", "it is set")
    }
}

fn require(value: &str, field: &'static str, hint: &'static str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(error::MissingConfigurationSnafu { field, hint }
            .build()
            .into());
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::constants::ENV_AZURE_SUBSCRIPTION_ID;

    #[test]
    fn azure_subscription_is_required() {
        let config = AzureConfiguration {
            subscription_id: "".to_string(),
            resource_group: "rg".to_string(),
            name: "aks".to_string(),
        };
        let message = config.validate().unwrap_err().to_string();
        assert!(message.starts_with("subscription ID cannot be empty"));
        assert!(message.contains(ENV_AZURE_SUBSCRIPTION_ID));
    }

    #[test]
    fn configuration_provider_and_validation() {
        let config = Configuration::Gcp(GcpConfiguration {
            credentials: "{\"private_key\": \"secret\"}".to_string(),
            project: "proj".to_string(),
            region: "europe-west1".to_string(),
            name: "".to_string(),
        });
        assert_eq!(config.provider(), ClusterProvider::Google);
        assert!(config.validate().is_err());
        assert!(!format!("{:?}", config).contains("secret"));

        let config = Configuration::Aws(AwsConfiguration {
            cluster_name: "eks".to_string(),
            region: "us-west-2".to_string(),
        });
        assert!(config.validate().is_ok());
    }

    #[test]
    fn gcp_cluster_path() {
        let config = GcpConfiguration {
            project: "proj".to_string(),
            region: "europe-west1".to_string(),
            name: "gke".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.cluster_path(),
            "projects/proj/locations/europe-west1/clusters/gke"
        );
    }
}
