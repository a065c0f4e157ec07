use migration_model::ClusterProvider;
use snafu::Snafu;
use std::path::PathBuf;

/// The error type returned by the cloud client facades. Facades own transport, authentication
/// and retries; the accessors only record which operation failed.
pub type ClientError = Box<dyn std::error::Error + Send + Sync + 'static>;
pub type ClientResult<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("Unsupported cluster provider '{}'", provider))]
    UnsupportedProvider {
        provider: String,
        source: migration_model::Error,
    },

    #[snafu(display(
        "A {} configuration cannot be used with the '{}' provider",
        configured,
        provider
    ))]
    ConfigurationMismatch {
        provider: ClusterProvider,
        configured: ClusterProvider,
    },

    #[snafu(display("Invalid {} configuration: {}", provider, source))]
    InvalidConfiguration {
        provider: ClusterProvider,
        source: migration_model::Error,
    },

    #[snafu(display("No {} client was configured", provider))]
    MissingClient { provider: ClusterProvider },

    #[snafu(display("{} failed: {}", operation, source))]
    Remote {
        operation: String,
        source: ClientError,
    },

    #[snafu(display("{} is missing '{}'", resource, field))]
    MissingField {
        resource: String,
        field: &'static str,
    },

    #[snafu(display("Expected exactly one VPC with id '{}' but found {}", vpc_id, count))]
    VpcCount { vpc_id: String, count: usize },

    #[snafu(display("Unable to determine the availability zone of subnet '{}'", subnet_id))]
    SubnetZone { subnet_id: String },

    #[snafu(display("Unable to assemble the values document: {}", source))]
    InvalidValues { source: migration_model::Error },

    #[snafu(display("Unable to load kubeconfig '{}': {}", path.display(), source))]
    Kubeconfig {
        path: PathBuf,
        source: kube::config::KubeconfigError,
    },

    #[snafu(display("Unable to create a Kubernetes client: {}", source))]
    KubeClient { source: kube::Error },

    #[snafu(display("Unable to read snapshot '{}': {}", path.display(), source))]
    SnapshotRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Unable to parse snapshot '{}': {}", path.display(), source))]
    SnapshotParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[snafu(display("The snapshot has no {} section", provider))]
    SnapshotSection { provider: ClusterProvider },
}

pub type Result<T> = std::result::Result<T, Error>;
