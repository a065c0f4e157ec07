use anyhow::{Context, Result};
use clap::Parser;
use migration_model::constants::{
    ENV_AWS_ASSUME_ROLE_ARN, ENV_AWS_REGION, ENV_AZURE_SUBSCRIPTION_ID, ENV_CLUSTER_NAME,
    ENV_GCP_B64ENCODED_CREDENTIALS,
};
use migration_model::{
    AwsConfiguration, AzureConfiguration, ClusterProvider, Configuration, GcpConfiguration,
    KindConfiguration,
};

/// The identifiers of the cluster to discover. Any that is not passed is read from its
/// environment variable, if there is one.
#[derive(Debug, Parser)]
pub(crate) struct Target {
    /// Name of the cluster. Also can be passed with the CLUSTER_NAME environment variable.
    #[clap(long = "cluster-name")]
    cluster_name: Option<String>,

    /// Region (AWS, GCP). For AWS this also can be passed with the AWS_REGION environment
    /// variable.
    #[clap(long = "region")]
    region: Option<String>,

    /// ARN of an IAM role to assume before calling AWS. Also can be passed with the
    /// AWS_ASSUME_ROLE_ARN environment variable.
    #[clap(long = "assume-role")]
    assume_role: Option<String>,

    /// Azure subscription ID. Also can be passed with the AZURE_SUBSCRIPTION_ID environment
    /// variable.
    #[clap(long = "subscription-id")]
    subscription_id: Option<String>,

    /// Azure resource group of the managed cluster.
    #[clap(long = "resource-group")]
    resource_group: Option<String>,

    /// GCP project of the cluster.
    #[clap(long = "project")]
    project: Option<String>,

    /// Base64 encoded GCP service account credentials. Also can be passed with the
    /// GCP_B64ENCODED_CREDENTIALS environment variable.
    #[clap(long = "gcp-credentials")]
    gcp_credentials: Option<String>,
}

impl Target {
    pub(crate) fn configuration(&self, provider: ClusterProvider) -> Result<Configuration> {
        let cluster_name = or_env(&self.cluster_name, ENV_CLUSTER_NAME);
        Ok(match provider {
            ClusterProvider::Aws => Configuration::Aws(AwsConfiguration {
                cluster_name,
                region: or_env(&self.region, ENV_AWS_REGION),
            }),
            ClusterProvider::Azure => Configuration::Azure(AzureConfiguration {
                subscription_id: or_env(&self.subscription_id, ENV_AZURE_SUBSCRIPTION_ID),
                resource_group: self.resource_group.clone().unwrap_or_default(),
                name: cluster_name,
            }),
            ClusterProvider::Google => Configuration::Gcp(GcpConfiguration {
                credentials: self.gcp_credentials()?,
                project: self.project.clone().unwrap_or_default(),
                region: self.region.clone().unwrap_or_default(),
                name: cluster_name,
            }),
            ClusterProvider::Kind => Configuration::Kind(KindConfiguration { cluster_name }),
        })
    }

    pub(crate) fn assume_role(&self) -> Option<String> {
        self.assume_role
            .clone()
            .or_else(|| std::env::var(ENV_AWS_ASSUME_ROLE_ARN).ok())
            .filter(|arn| !arn.is_empty())
    }

    fn gcp_credentials(&self) -> Result<String> {
        let encoded = or_env(&self.gcp_credentials, ENV_GCP_B64ENCODED_CREDENTIALS);
        if encoded.is_empty() {
            return Ok(encoded);
        }
        let decoded = base64::decode(encoded.trim().as_bytes())
            .context("Unable to base64 decode the GCP credentials")?;
        String::from_utf8(decoded).context("The GCP credentials are not valid UTF-8")
    }
}

fn or_env(value: &Option<String>, name: &str) -> String {
    value
        .clone()
        .or_else(|| std::env::var(name).ok())
        .unwrap_or_default()
}
