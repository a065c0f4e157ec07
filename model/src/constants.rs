/// Builds a `kubernetes.io` scoped key. When given a string literal parameter it adds
/// `/parameter` to the end.
macro_rules! kubernetes_io {
    () => {
        "kubernetes.io"
    };
    ($s:literal) => {
        concat!(kubernetes_io!(), "/", $s)
    };
}

/// Builds a `plural.sh` scoped label key.
macro_rules! plural {
    ($s:literal) => {
        concat!("plural.sh/", $s)
    };
}

// Environment variables
pub const ENV_AWS_REGION: &str = "AWS_REGION";
pub const ENV_AWS_ASSUME_ROLE_ARN: &str = "AWS_ASSUME_ROLE_ARN";
pub const ENV_AZURE_SUBSCRIPTION_ID: &str = "AZURE_SUBSCRIPTION_ID";
pub const ENV_AZURE_CLIENT_ID: &str = "AZURE_CLIENT_ID";
pub const ENV_AZURE_CLIENT_SECRET: &str = "AZURE_CLIENT_SECRET";
pub const ENV_GCP_B64ENCODED_CREDENTIALS: &str = "GCP_B64ENCODED_CREDENTIALS";
pub const ENV_CLUSTER_NAME: &str = "CLUSTER_NAME";

// Cluster API annotations
pub const ANNOTATION_REPLICAS_MANAGED_BY: &str = "cluster.x-k8s.io/replicas-managed-by";
pub const EXTERNAL_AUTOSCALER: &str = "external-autoscaler";

// Tags stamped on cloud resources
pub const CLUSTER_TAG_PREFIX: &str = kubernetes_io!("cluster/");
pub const OWNED: &str = "owned";
pub const TAG_INTERNAL_ELB: &str = kubernetes_io!("role/internal-elb");
pub const TAG_AWS_ROLE: &str = "sigs.k8s.io/cluster-api-provider-aws/role";
pub const AWS_ROLE_COMMON: &str = "common";

// Labels injected by the platform that must never be re-applied
pub const AZURE_SYSTEM_LABEL_PREFIX: &str = "kubernetes.azure.com/";
pub const AZURE_SYSTEM_LABEL_PREFIXES: &[&str] = &[AZURE_SYSTEM_LABEL_PREFIX];

// Labels carried by the default Azure worker template
pub const LABEL_SCALING_GROUP: &str = plural!("scalingGroup");
pub const LABEL_CAPACITY_TYPE: &str = plural!("capacityType");
pub const LABEL_PERFORMANCE_TYPE: &str = plural!("performanceType");

/// Well-known worker pools every generated document mentions. A pool that the source cluster
/// does not have is emitted as `null`.
pub const DEFAULT_WORKER_POOLS: &[&str] = &[
    "small-burst-on-demand",
    "medium-burst-on-demand",
    "large-burst-on-demand",
];

// Fixed values emitted in place of identity material
pub const AZURE_CLUSTER_IDENTITY_TYPE: &str = "ServicePrincipal";
pub const AZURE_CLUSTER_IDENTITY_NAME: &str = "cluster-identity";
pub const AZURE_CLIENT_SECRET_NAME: &str = "cluster-identity-secret";
pub const AWS_IDENTITY_NAME: &str = "default";
pub const AWS_IDENTITY_KIND: &str = "AWSClusterControllerIdentity";
pub const AWS_SSH_KEY_NAME: &str = "default";
pub const AWS_TOKEN_METHOD: &str = "iam-authenticator";
pub const AWS_ADDON_CONFLICT_RESOLUTION: &str = "overwrite";
pub const AWS_AZ_SELECTION: &str = "Ordered";
pub const AWS_CONTROL_PLANE_PORT: i32 = 443;
