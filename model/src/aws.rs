//! Canonical control-plane and worker descriptions for EKS clusters.

use crate::constants::{ANNOTATION_REPLICAS_MANAGED_BY, EXTERNAL_AUTOSCALER};
use crate::{Labels, Taints, Tags};
use k8s_openapi::api::core::v1::EnvVar;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwsCloudSpec {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub region: String,
    #[serde(default)]
    pub secondary_cidr_block: String,
    #[serde(default)]
    pub role_additional_policies: Vec<String>,
    #[serde(default)]
    pub encryption_config: EncryptionConfig,
    #[serde(default)]
    pub additional_tags: Tags,
    #[serde(default)]
    pub iam_authenticator_config: IamAuthenticatorConfig,
    #[serde(default)]
    pub logging: ControlPlaneLogging,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ssh_key_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(default)]
    pub endpoint_access: EndpointAccess,
    /// The IAM role of the control plane, without its account and path prefix.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub role_name: String,
    #[serde(default)]
    pub control_plane_endpoint: ApiEndpoint,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: Labels,
    /// Always emitted, empty when the cluster has no managed addons.
    #[serde(default)]
    pub addons: Vec<Addon>,
    #[serde(
        default,
        rename = "associateOIDCProvider",
        skip_serializing_if = "std::ops::Not::not"
    )]
    pub associate_oidc_provider: bool,
    #[serde(default)]
    pub bastion: Bastion,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_ref: Option<IdentityReference>,
    #[serde(default)]
    pub network: NetworkSpec,
    #[serde(default)]
    pub kube_proxy: KubeProxy,
    #[serde(default)]
    pub vpc_cni: VpcCni,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token_method: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Addon {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub conflict_resolution: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KubeProxy {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VpcCni {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disable: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
}

/// Which control plane log types are shipped to CloudWatch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlPlaneLogging {
    pub api_server: bool,
    pub audit: bool,
    pub authenticator: bool,
    pub controller_manager: bool,
    pub scheduler: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionConfig {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub provider: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IamAuthenticatorConfig {
    #[serde(default, rename = "mapRoles", skip_serializing_if = "Vec::is_empty")]
    pub role_mappings: Vec<RoleMapping>,
    #[serde(default, rename = "mapUsers", skip_serializing_if = "Vec::is_empty")]
    pub user_mappings: Vec<UserMapping>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMapping {
    #[serde(rename = "rolearn")]
    pub role_arn: String,
    pub username: String,
    pub groups: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMapping {
    #[serde(rename = "userarn")]
    pub user_arn: String,
    pub username: String,
    pub groups: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointAccess {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub public: bool,
    #[serde(
        default,
        rename = "publicCIDRs",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub public_cidrs: Vec<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub private: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiEndpoint {
    pub host: String,
    pub port: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bastion {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub enabled: bool,
    #[serde(
        default,
        rename = "allowedCIDRBlocks",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub allowed_cidr_blocks: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityReference {
    pub name: String,
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSpec {
    #[serde(default)]
    pub vpc: VpcSpec,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subnets: Vec<SubnetSpec>,
    /// Present (and empty) when the VPC has security groups the cluster should keep using.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_group_overrides: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VpcSpec {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cidr_block: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6: Option<Ipv6>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: Tags,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_zone_usage_limit: Option<i32>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub availability_zone_selection: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ipv6 {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cidr_block: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pool_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubnetSpec {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cidr_block: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub availability_zone: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_table_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nat_gateway_id: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: Tags,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwsWorker {
    pub replicas: i32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: Labels,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    #[serde(
        default,
        rename = "isMultiAZ",
        skip_serializing_if = "std::ops::Not::not"
    )]
    pub is_multi_az: bool,
    pub spec: AwsWorkerSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwsWorkerSpec {
    #[serde(default)]
    pub labels: Labels,
    #[serde(default)]
    pub ami_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ami_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub capacity_type: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub disk_size: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaling: Option<Scaling>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub availability_zones: Vec<String>,
    #[serde(default, rename = "subnetIDs", skip_serializing_if = "Vec::is_empty")]
    pub subnet_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Taints::is_empty")]
    pub taints: Taints,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_config: Option<UpdateConfig>,
    #[serde(default)]
    pub additional_tags: Tags,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub role_additional_policies: Vec<String>,
}

/// Managed machine pool size bounds. `min_size <= max_size` is expected but not enforced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scaling {
    pub min_size: i32,
    pub max_size: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_unavailable: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_unavailable_percentage: Option<i32>,
}

/// The template applied to every AWS machine pool that does not override a field.
pub fn default_worker() -> AwsWorker {
    let mut annotations = BTreeMap::new();
    annotations.insert(
        ANNOTATION_REPLICAS_MANAGED_BY.to_string(),
        EXTERNAL_AUTOSCALER.to_string(),
    );
    AwsWorker {
        replicas: 0,
        annotations,
        spec: AwsWorkerSpec {
            ami_type: "AL2_x86_64".to_string(),
            capacity_type: "onDemand".to_string(),
            ..Default::default()
        },
        ..Default::default()
    }
}

fn is_zero(value: &i32) -> bool {
    *value == 0
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_worker_document() {
        let value = serde_json::to_value(default_worker()).unwrap();
        assert_eq!(
            value,
            json!({
                "replicas": 0,
                "annotations": {"cluster.x-k8s.io/replicas-managed-by": "external-autoscaler"},
                "spec": {
                    "labels": {},
                    "amiVersion": "",
                    "amiType": "AL2_x86_64",
                    "capacityType": "onDemand",
                    "additionalTags": {}
                }
            })
        );
    }

    #[test]
    fn empty_optional_fields_are_omitted() {
        let spec = AwsCloudSpec {
            region: "us-west-2".to_string(),
            ..Default::default()
        };
        let value = serde_json::to_value(spec).unwrap();
        let object = value.as_object().unwrap();
        for omitted in [
            "roleName",
            "associateOIDCProvider",
            "identityRef",
            "sshKeyName",
            "tokenMethod",
        ] {
            assert!(!object.contains_key(omitted), "{} should be omitted", omitted);
        }
        assert_eq!(object["secondaryCidrBlock"], json!(""));
        assert_eq!(object["addons"], json!([]));
        assert_eq!(object["endpointAccess"], json!({}));
        assert_eq!(object["controlPlaneEndpoint"], json!({"host": "", "port": 0}));
    }
}
