//! Maps GKE node pools to canonical GCP workers.

use super::native::{NodeConfig, NodePool};
use crate::error::{self, Result};
use migration_model::gcp::{self, GcpWorker, GcpWorkerSpec, Management, Scaling};
use migration_model::taint::effect_from_gcp;
use migration_model::{PoolOverlay, Taint, Taints, Workers};
use snafu::OptionExt;

/// Overlays the discovered node pools on the well-known pools named in `default_pools`.
///
/// `node_names` is the live node inventory of the cluster, if one is available. The control plane
/// API does not report per-pool node counts, so a pool's replica count is the number of nodes
/// whose name contains the pool name. GKE names nodes `gke-<cluster>-<pool>-<hash>`, so this is an
/// approximation: a pool whose name is a substring of another pool's name over-counts. Without an
/// inventory the pool's initial node count is used.
pub fn to_workers<S: AsRef<str>>(
    default_pools: &[S],
    pools: &[NodePool],
    node_names: Option<&[String]>,
) -> Result<Workers> {
    let mut overlay = PoolOverlay::seeded(default_pools.iter().map(|name| name.as_ref()));
    for pool in pools {
        let (name, worker) = to_worker(pool, node_names)?;
        overlay.discovered(name, worker);
    }
    Ok(Workers::gcp(gcp::default_worker(), overlay.into_pools()))
}

pub fn to_worker(pool: &NodePool, node_names: Option<&[String]>) -> Result<(String, GcpWorker)> {
    let name = pool.name.clone().context(error::MissingFieldSnafu {
        resource: "node pool",
        field: "name",
    })?;
    let replicas = match node_names {
        Some(nodes) => Some(replica_count(&name, nodes)),
        None => pool.initial_node_count,
    };
    let config = pool.config.as_ref();

    let worker = GcpWorker {
        replicas,
        kubernetes_version: pool.version.clone(),
        is_multi_az: pool.locations.len() > 1,
        spec: GcpWorkerSpec {
            scaling: pool.autoscaling.map(|autoscaling| Scaling {
                max_count: autoscaling.max_node_count,
                min_count: autoscaling.min_node_count,
            }),
            management: pool.management.map(|management| Management {
                auto_upgrade: management.auto_upgrade,
                auto_repair: management.auto_repair,
            }),
            kubernetes_labels: config.map(|config| config.labels.clone()),
            additional_labels: config.map(|config| config.metadata.clone()),
            kubernetes_taints: config.map(taints),
            provider_id_list: Vec::new(),
            machine_type: config
                .and_then(|config| config.machine_type.clone())
                .unwrap_or_default(),
            disk_size_gb: config.and_then(|config| config.disk_size_gb).unwrap_or(0),
            disk_type: config
                .and_then(|config| config.disk_type.clone())
                .unwrap_or_default(),
            image_type: config
                .and_then(|config| config.image_type.clone())
                .unwrap_or_default(),
            preemptible: config.map(|config| config.preemptible).unwrap_or(false),
            spot: config.map(|config| config.spot).unwrap_or(false),
        },
        ..Default::default()
    };
    Ok((name, worker))
}

/// The number of nodes whose name contains `pool_name`.
pub fn replica_count(pool_name: &str, node_names: &[String]) -> i32 {
    let count = node_names
        .iter()
        .filter(|node| node.contains(pool_name))
        .count();
    i32::try_from(count).unwrap_or(i32::MAX)
}

fn taints(config: &NodeConfig) -> Taints {
    config
        .taints
        .iter()
        .map(|taint| Taint::new(&taint.key, &taint.value, effect_from_gcp(&taint.effect)))
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::gcp::native::{NodeManagement, NodePoolAutoscaling, NodeTaint};
    use maplit::btreemap;
    use migration_model::TaintEffect;

    fn pool(name: &str) -> NodePool {
        NodePool {
            name: Some(name.to_string()),
            version: Some("1.26.3-gke.1000".to_string()),
            initial_node_count: Some(3),
            locations: vec!["europe-west1-b".to_string(), "europe-west1-c".to_string()],
            config: Some(NodeConfig {
                machine_type: Some("e2-standard-4".to_string()),
                disk_size_gb: Some(100),
                labels: btreemap! { "team".to_string() => "data".to_string() },
                taints: vec![
                    NodeTaint {
                        key: "dedicated".to_string(),
                        value: "batch".to_string(),
                        effect: "NO_EXECUTE".to_string(),
                    },
                    NodeTaint {
                        key: "odd".to_string(),
                        value: "x".to_string(),
                        effect: "EFFECT_UNSPECIFIED".to_string(),
                    },
                ],
                ..Default::default()
            }),
            autoscaling: Some(NodePoolAutoscaling {
                enabled: true,
                min_node_count: 1,
                max_node_count: 5,
            }),
            management: Some(NodeManagement {
                auto_upgrade: true,
                auto_repair: true,
            }),
        }
    }

    #[test]
    fn maps_node_pool() {
        let (name, worker) = to_worker(&pool("batch"), None).unwrap();
        assert_eq!(name, "batch");
        assert_eq!(worker.replicas, Some(3));
        assert!(worker.is_multi_az);
        assert_eq!(
            worker.spec.scaling,
            Some(Scaling {
                max_count: 5,
                min_count: 1
            })
        );
        assert_eq!(worker.spec.machine_type, "e2-standard-4");
        assert_eq!(worker.spec.disk_size_gb, 100);
        let taints = worker.spec.kubernetes_taints.unwrap();
        assert_eq!(taints.0[0].effect, TaintEffect::NoExecute);
        assert_eq!(taints.0[1].effect, TaintEffect::Unspecified);
    }

    #[test]
    fn replicas_from_node_names() {
        let nodes = vec![
            "gke-prod-batch-1a2b-abcd".to_string(),
            "gke-prod-batch-1a2b-efgh".to_string(),
            "gke-prod-web-3c4d-ijkl".to_string(),
        ];
        let (_, worker) = to_worker(&pool("batch"), Some(nodes.as_slice())).unwrap();
        assert_eq!(worker.replicas, Some(2));
        assert_eq!(replica_count("api", &nodes), 0);
    }

    #[test]
    fn pool_without_config() {
        let mut pool = pool("bare");
        pool.config = None;
        let (_, worker) = to_worker(&pool, None).unwrap();
        assert!(worker.spec.kubernetes_labels.is_none());
        assert!(worker.spec.kubernetes_taints.is_none());
        assert!(worker.spec.machine_type.is_empty());
    }

    #[test]
    fn overlay() {
        let workers = to_workers(&["batch", "spare"], &[pool("batch")], None).unwrap();
        let pools = workers.spec.as_gcp().unwrap();
        assert!(pools["batch"].is_some());
        assert!(pools["spare"].is_none());
    }
}
