//! Maps EKS managed nodegroups to canonical AWS workers.

use super::native::Nodegroup;
use crate::error::{self, Result};
use migration_model::aws::{self, AwsWorker, AwsWorkerSpec, Scaling, UpdateConfig};
use migration_model::tags::{merge_tags, ownership_tag};
use migration_model::taint::effect_from_aws;
use migration_model::{PoolOverlay, Taint, Workers};
use snafu::OptionExt;

/// A nodegroup together with the availability zones of the subnets it references.
#[derive(Debug, Clone, Default)]
pub struct NodegroupInventory {
    pub nodegroup: Nodegroup,
    pub availability_zones: Vec<String>,
}

/// Overlays the discovered nodegroups on the well-known pools named in `default_pools`.
pub fn to_workers<S: AsRef<str>>(
    cluster_name: &str,
    default_pools: &[S],
    nodegroups: &[NodegroupInventory],
) -> Result<Workers> {
    let mut overlay = PoolOverlay::seeded(default_pools.iter().map(|name| name.as_ref()));
    for inventory in nodegroups {
        let (name, worker) = to_worker(cluster_name, inventory)?;
        overlay.discovered(name, worker);
    }
    Ok(Workers::aws(aws::default_worker(), overlay.into_pools()))
}

pub fn to_worker(
    cluster_name: &str,
    inventory: &NodegroupInventory,
) -> Result<(String, AwsWorker)> {
    let nodegroup = &inventory.nodegroup;
    let name = nodegroup
        .nodegroup_name
        .clone()
        .context(error::MissingFieldSnafu {
            resource: "nodegroup",
            field: "nodegroupName",
        })?;
    let scaling = nodegroup
        .scaling_config
        .context(error::MissingFieldSnafu {
            resource: format!("nodegroup {}", name),
            field: "scalingConfig",
        })?;
    let replicas = scaling.desired_size.context(error::MissingFieldSnafu {
        resource: format!("nodegroup {}", name),
        field: "scalingConfig.desiredSize",
    })?;

    let worker = AwsWorker {
        replicas,
        is_multi_az: true,
        spec: AwsWorkerSpec {
            labels: nodegroup.labels.clone(),
            ami_type: nodegroup.ami_type.clone().unwrap_or_default(),
            capacity_type: nodegroup
                .capacity_type
                .as_deref()
                .map(capacity_type)
                .unwrap_or_default(),
            disk_size: nodegroup.disk_size.unwrap_or_default(),
            instance_type: nodegroup.instance_types.first().cloned(),
            scaling: scaling.min_size.zip(scaling.max_size).map(|(min_size, max_size)| {
                Scaling { min_size, max_size }
            }),
            availability_zones: inventory.availability_zones.clone(),
            subnet_ids: nodegroup.subnets.clone(),
            taints: nodegroup
                .taints
                .iter()
                .map(|taint| {
                    Taint::new(
                        taint.key.clone().unwrap_or_default(),
                        taint.value.clone().unwrap_or_default(),
                        effect_from_aws(taint.effect.as_deref().unwrap_or_default()),
                    )
                })
                .collect(),
            update_config: nodegroup.update_config.map(|config| UpdateConfig {
                max_unavailable: config.max_unavailable,
                max_unavailable_percentage: config.max_unavailable_percentage,
            }),
            additional_tags: merge_tags(&ownership_tag(cluster_name), &nodegroup.tags),
            ..Default::default()
        },
        ..Default::default()
    };
    Ok((name, worker))
}

/// Keeps the first occurrence of every zone, preserving order.
pub fn unique_zones<I>(zones: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut unique: Vec<String> = Vec::new();
    for zone in zones {
        if !unique.contains(&zone) {
            unique.push(zone);
        }
    }
    unique
}

fn capacity_type(native: &str) -> String {
    match native {
        "ON_DEMAND" => "onDemand".to_string(),
        "SPOT" => "spot".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::aws::native::{ScalingConfig, Taint as NativeTaint};
    use maplit::btreemap;
    use migration_model::TaintEffect;

    fn nodegroup(name: &str, desired: i32) -> NodegroupInventory {
        NodegroupInventory {
            nodegroup: Nodegroup {
                nodegroup_name: Some(name.to_string()),
                scaling_config: Some(ScalingConfig {
                    min_size: Some(1),
                    max_size: Some(5),
                    desired_size: Some(desired),
                }),
                instance_types: vec!["t3.large".to_string(), "t3a.large".to_string()],
                subnets: vec!["subnet-a".to_string(), "subnet-b".to_string()],
                ami_type: Some("AL2_x86_64".to_string()),
                capacity_type: Some("SPOT".to_string()),
                disk_size: Some(50),
                taints: vec![
                    NativeTaint {
                        key: Some("dedicated".to_string()),
                        value: Some("gpu".to_string()),
                        effect: Some("NO_SCHEDULE".to_string()),
                    },
                    NativeTaint {
                        key: Some("soft".to_string()),
                        value: None,
                        effect: None,
                    },
                ],
                tags: btreemap! { "team".to_string() => "infra".to_string() },
                ..Default::default()
            },
            availability_zones: vec!["us-west-2a".to_string(), "us-west-2b".to_string()],
        }
    }

    #[test]
    fn nodegroup_to_worker() {
        let (name, worker) = to_worker("prod", &nodegroup("gpu", 2)).unwrap();
        assert_eq!(name, "gpu");
        assert_eq!(worker.replicas, 2);
        assert!(worker.is_multi_az);
        assert_eq!(worker.spec.instance_type.as_deref(), Some("t3.large"));
        assert_eq!(worker.spec.capacity_type, "spot");
        assert_eq!(
            worker.spec.scaling,
            Some(Scaling {
                min_size: 1,
                max_size: 5
            })
        );
        assert_eq!(
            worker.spec.taints.0,
            vec![
                Taint::new("dedicated", "gpu", TaintEffect::NoSchedule),
                Taint::new("soft", "", TaintEffect::PreferNoSchedule),
            ]
        );
        assert_eq!(
            worker.spec.additional_tags,
            btreemap! {
                "kubernetes.io/cluster/prod".to_string() => "owned".to_string(),
                "team".to_string() => "infra".to_string(),
            }
        );
    }

    #[test]
    fn overlay_on_default_pools() {
        let defaults = ["small-burst-on-demand", "medium-burst-on-demand"];
        let workers = to_workers(
            "prod",
            &defaults,
            &[nodegroup("medium-burst-on-demand", 3), nodegroup("gpu", 1)],
        )
        .unwrap();
        let pools = workers.spec.as_aws().unwrap();
        assert_eq!(
            pools.keys().collect::<Vec<_>>(),
            vec!["gpu", "medium-burst-on-demand", "small-burst-on-demand"]
        );
        assert_eq!(pools["small-burst-on-demand"], None);
        assert_eq!(pools["medium-burst-on-demand"].as_ref().unwrap().replicas, 3);
        assert_eq!(workers.defaults.as_aws().unwrap().spec.ami_type, "AL2_x86_64");
    }

    #[test]
    fn nodegroup_without_desired_size_is_an_error() {
        let mut inventory = nodegroup("gpu", 1);
        inventory.nodegroup.scaling_config = None;
        assert!(to_worker("prod", &inventory).is_err());
    }

    #[test]
    fn zones_are_deduplicated_in_order() {
        let zones = ["az-a", "az-b", "az-a"].map(String::from);
        assert_eq!(unique_zones(zones), vec!["az-a", "az-b"]);
    }
}
