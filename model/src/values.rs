use crate::aws::{AwsCloudSpec, AwsWorker};
use crate::azure::{AzureCloudSpec, AzureWorker};
use crate::error::{self, Result};
use crate::gcp::{GcpCloudSpec, GcpWorker};
use crate::{ClusterProvider, ClusterType, Taint, Taints, WorkerPools};
use serde::{Deserialize, Serialize};

/// The complete, provider-agnostic description of a discovered cluster. This is the document
/// handed to the cluster lifecycle system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Values {
    provider: ClusterProvider,
    #[serde(rename = "type")]
    cluster_type: ClusterType,
    cluster: Cluster,
    workers: Workers,
}

impl Values {
    /// Assembles a managed cluster document, rejecting cloud specs or worker maps that belong to
    /// a different provider.
    pub fn new(provider: ClusterProvider, cluster: Cluster, workers: Workers) -> Result<Self> {
        check_variant(provider, cluster.cloud_spec.provider())?;
        check_variant(provider, workers.provider())?;
        Ok(Self {
            provider,
            cluster_type: ClusterType::Managed,
            cluster,
            workers,
        })
    }

    pub fn provider(&self) -> ClusterProvider {
        self.provider
    }

    pub fn cluster_type(&self) -> ClusterType {
        self.cluster_type
    }

    pub fn cluster(&self) -> &Cluster {
        &self.cluster
    }

    pub fn workers(&self) -> &Workers {
        &self.workers
    }

    /// Lists the taints whose effect could not be mapped to a Kubernetes effect. A document with
    /// invalid taints should not be used to create machine pools.
    pub fn invalid_taints(&self) -> Vec<InvalidTaint> {
        let spec = &self.workers.spec;
        let mut invalid = Vec::new();
        for (pool, worker) in spec.aws.iter().flatten() {
            if let Some(worker) = worker {
                push_invalid(&mut invalid, pool, &worker.spec.taints);
            }
        }
        for (pool, worker) in spec.azure.iter().flatten() {
            if let Some(worker) = worker {
                push_invalid(&mut invalid, pool, &worker.spec.taints);
            }
        }
        for (pool, worker) in spec.gcp.iter().flatten() {
            if let Some(taints) = worker.as_ref().and_then(|w| w.spec.kubernetes_taints.as_ref()) {
                push_invalid(&mut invalid, pool, taints);
            }
        }
        invalid
    }
}

fn push_invalid(invalid: &mut Vec<InvalidTaint>, pool: &str, taints: &Taints) {
    invalid.extend(taints.iter().filter(|t| !t.is_valid()).map(|t| InvalidTaint {
        pool: pool.to_string(),
        taint: t.clone(),
    }));
}

fn check_variant(provider: ClusterProvider, populated: Option<ClusterProvider>) -> Result<()> {
    let expected = match provider {
        ClusterProvider::Kind => None,
        other => Some(other),
    };
    if populated != expected {
        return Err(error::ProviderMismatchSnafu {
            provider,
            populated: populated.map_or_else(|| "none".to_string(), |p| p.to_string()),
        }
        .build()
        .into());
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidTaint {
    pub pool: String,
    pub taint: Taint,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub name: String,
    #[serde(default)]
    pub pod_cidr_blocks: Vec<String>,
    #[serde(default)]
    pub service_cidr_blocks: Vec<String>,
    #[serde(default)]
    pub kubernetes_version: String,
    #[serde(flatten)]
    pub cloud_spec: CloudSpec,
}

/// Provider-specific control-plane settings. At most one variant is populated; the provider it
/// belongs to is recorded one level up, in [`Values`], which requires it for every cloud provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CloudSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    aws: Option<AwsCloudSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    azure: Option<AzureCloudSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    gcp: Option<GcpCloudSpec>,
}

impl CloudSpec {
    /// No provider-specific settings, as for kind clusters.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn aws(spec: AwsCloudSpec) -> Self {
        Self {
            aws: Some(spec),
            ..Default::default()
        }
    }

    pub fn azure(spec: AzureCloudSpec) -> Self {
        Self {
            azure: Some(spec),
            ..Default::default()
        }
    }

    pub fn gcp(spec: GcpCloudSpec) -> Self {
        Self {
            gcp: Some(spec),
            ..Default::default()
        }
    }

    pub fn as_aws(&self) -> Option<&AwsCloudSpec> {
        self.aws.as_ref()
    }

    pub fn as_azure(&self) -> Option<&AzureCloudSpec> {
        self.azure.as_ref()
    }

    pub fn as_gcp(&self) -> Option<&GcpCloudSpec> {
        self.gcp.as_ref()
    }

    /// The provider of the populated variant, if any.
    pub fn provider(&self) -> Option<ClusterProvider> {
        populated(
            self.aws.is_some(),
            self.azure.is_some(),
            self.gcp.is_some(),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workers {
    #[serde(default)]
    pub defaults: DefaultsWorker,
    #[serde(flatten)]
    pub spec: WorkersSpec,
}

impl Workers {
    pub fn aws(defaults: AwsWorker, pools: WorkerPools<AwsWorker>) -> Self {
        Self {
            defaults: DefaultsWorker {
                aws: Some(defaults),
                ..Default::default()
            },
            spec: WorkersSpec {
                aws: Some(pools),
                ..Default::default()
            },
        }
    }

    pub fn azure(defaults: AzureWorker, pools: WorkerPools<AzureWorker>) -> Self {
        Self {
            defaults: DefaultsWorker {
                azure: Some(defaults),
                ..Default::default()
            },
            spec: WorkersSpec {
                azure: Some(pools),
                ..Default::default()
            },
        }
    }

    pub fn gcp(defaults: GcpWorker, pools: WorkerPools<GcpWorker>) -> Self {
        Self {
            defaults: DefaultsWorker {
                gcp: Some(defaults),
                ..Default::default()
            },
            spec: WorkersSpec {
                gcp: Some(pools),
                ..Default::default()
            },
        }
    }

    /// The provider of the populated variant, if any.
    pub fn provider(&self) -> Option<ClusterProvider> {
        let defaults = &self.defaults;
        let spec = &self.spec;
        let defaults_provider = populated(
            defaults.aws.is_some(),
            defaults.azure.is_some(),
            defaults.gcp.is_some(),
        );
        let spec_provider = populated(spec.aws.is_some(), spec.azure.is_some(), spec.gcp.is_some());
        defaults_provider.or(spec_provider)
    }
}

/// The per-provider template every worker pool starts from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefaultsWorker {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    aws: Option<AwsWorker>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    azure: Option<AzureWorker>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    gcp: Option<GcpWorker>,
}

impl DefaultsWorker {
    pub fn as_aws(&self) -> Option<&AwsWorker> {
        self.aws.as_ref()
    }

    pub fn as_azure(&self) -> Option<&AzureWorker> {
        self.azure.as_ref()
    }

    pub fn as_gcp(&self) -> Option<&GcpWorker> {
        self.gcp.as_ref()
    }
}

/// Worker pools by name for the one populated provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkersSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    aws: Option<WorkerPools<AwsWorker>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    azure: Option<WorkerPools<AzureWorker>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    gcp: Option<WorkerPools<GcpWorker>>,
}

impl WorkersSpec {
    pub fn as_aws(&self) -> Option<&WorkerPools<AwsWorker>> {
        self.aws.as_ref()
    }

    pub fn as_azure(&self) -> Option<&WorkerPools<AzureWorker>> {
        self.azure.as_ref()
    }

    pub fn as_gcp(&self) -> Option<&WorkerPools<GcpWorker>> {
        self.gcp.as_ref()
    }
}

fn populated(aws: bool, azure: bool, gcp: bool) -> Option<ClusterProvider> {
    match (aws, azure, gcp) {
        (true, _, _) => Some(ClusterProvider::Aws),
        (_, true, _) => Some(ClusterProvider::Azure),
        (_, _, true) => Some(ClusterProvider::Google),
        _ => None,
    }
}
