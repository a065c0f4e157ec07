//! Helpers for the plain key/value maps (labels and tags) that every provider attaches to its
//! resources.

use crate::constants::{
    AWS_ROLE_COMMON, AZURE_SYSTEM_LABEL_PREFIXES, CLUSTER_TAG_PREFIX, OWNED, TAG_AWS_ROLE,
    TAG_INTERNAL_ELB,
};
use std::collections::BTreeMap;

/// Cloud resource tags.
pub type Tags = BTreeMap<String, String>;

/// Kubernetes (or cloud) labels.
pub type Labels = BTreeMap<String, String>;

/// Returns the union of `defaults` and `caller`. On a key collision the caller's value wins.
pub fn merge_tags(defaults: &Tags, caller: &Tags) -> Tags {
    let mut merged = defaults.clone();
    merged.extend(caller.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

/// The tag marking a resource as owned by the named cluster.
pub fn ownership_tag(cluster_name: &str) -> Tags {
    let mut tags = Tags::new();
    tags.insert(format!("{}{}", CLUSTER_TAG_PREFIX, cluster_name), OWNED.to_string());
    tags
}

/// The default tags of a resource shared by the whole AWS cluster.
pub fn aws_common_role() -> Tags {
    let mut tags = Tags::new();
    tags.insert(TAG_AWS_ROLE.to_string(), AWS_ROLE_COMMON.to_string());
    tags
}

/// The default tags of a private AWS subnet.
pub fn aws_internal_elb_role() -> Tags {
    let mut tags = Tags::new();
    tags.insert(TAG_INTERNAL_ELB.to_string(), "1".to_string());
    tags
}

/// Drops every label whose key starts with one of `prefixes`.
pub fn filter_system_labels<I>(labels: I, prefixes: &[&str]) -> Labels
where
    I: IntoIterator<Item = (String, String)>,
{
    labels
        .into_iter()
        .filter(|(key, _)| !prefixes.iter().any(|prefix| key.starts_with(prefix)))
        .collect()
}

/// Drops the labels AKS injects into every agent pool.
pub fn filter_azure_system_labels<I>(labels: I) -> Labels
where
    I: IntoIterator<Item = (String, String)>,
{
    filter_system_labels(labels, AZURE_SYSTEM_LABEL_PREFIXES)
}

#[cfg(test)]
mod test {
    use super::*;
    use maplit::btreemap;

    #[test]
    fn caller_tags_win() {
        let caller = btreemap! {
            TAG_AWS_ROLE.to_string() => "custom".to_string(),
            "team".to_string() => "infra".to_string(),
        };
        let merged = merge_tags(&aws_common_role(), &caller);
        assert_eq!(merged, caller);

        let merged = merge_tags(&aws_internal_elb_role(), &caller);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[TAG_INTERNAL_ELB], "1");
    }

    #[test]
    fn owned_by_cluster() {
        assert_eq!(
            ownership_tag("prod"),
            btreemap! { "kubernetes.io/cluster/prod".to_string() => "owned".to_string() }
        );
    }

    #[test]
    fn azure_system_labels_are_dropped() {
        let labels = btreemap! {
            "kubernetes.azure.com/mode".to_string() => "system".to_string(),
            "kubernetes.azure.com/cluster".to_string() => "MC_rg".to_string(),
            "app".to_string() => "web".to_string(),
            "example.com/kubernetes.azure.com".to_string() => "kept".to_string(),
        };
        let filtered = filter_azure_system_labels(labels);
        assert_eq!(
            filtered,
            btreemap! {
                "app".to_string() => "web".to_string(),
                "example.com/kubernetes.azure.com".to_string() => "kept".to_string(),
            }
        );
    }
}
