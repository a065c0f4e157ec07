//! Maps AKS agent pools to canonical Azure workers.

use super::native::{self, AgentPoolProfile};
use crate::error::{self, Result};
use migration_model::azure::{self, AzureWorker, AzureWorkerSpec, LinuxOsConfig, SysctlConfig};
use migration_model::tags::filter_system_labels;
use migration_model::taint::decode_azure_taints;
use migration_model::{PoolOverlay, Workers};
use snafu::OptionExt;

/// Overlays the discovered agent pools on the well-known pools named in `default_pools`. Labels
/// starting with any of `system_label_prefixes` are dropped.
pub fn to_workers<S: AsRef<str>>(
    default_pools: &[S],
    system_label_prefixes: &[&str],
    pools: &[AgentPoolProfile],
) -> Result<Workers> {
    let mut overlay = PoolOverlay::seeded(default_pools.iter().map(|name| name.as_ref()));
    for pool in pools {
        let (name, worker) = to_worker(system_label_prefixes, pool)?;
        overlay.discovered(name, worker);
    }
    Ok(Workers::azure(azure::default_worker(), overlay.into_pools()))
}

pub fn to_worker(
    system_label_prefixes: &[&str],
    pool: &AgentPoolProfile,
) -> Result<(String, AzureWorker)> {
    let name = pool.name.clone().context(error::MissingFieldSnafu {
        resource: "agent pool",
        field: "name",
    })?;
    let replicas = pool.count.context(error::MissingFieldSnafu {
        resource: format!("agent pool {}", name),
        field: "count",
    })?;
    let scaling = match (pool.min_count, pool.max_count) {
        (Some(min_size), Some(max_size)) => Some(azure::Scaling { min_size, max_size }),
        _ => None,
    };

    let worker = AzureWorker {
        replicas,
        spec: AzureWorkerSpec {
            additional_tags: pool.tags.clone(),
            mode: pool.mode.clone().unwrap_or_default(),
            sku: pool.vm_size.clone().unwrap_or_default(),
            os_disk_size_gb: pool.os_disk_size_gb,
            availability_zones: pool.availability_zones.clone(),
            node_labels: filter_system_labels(pool.node_labels.clone(), system_label_prefixes),
            taints: decode_azure_taints(&pool.node_taints),
            scaling,
            max_pods: pool.max_pods,
            os_disk_type: pool.os_disk_type.clone(),
            os_type: pool.os_type.clone(),
            enable_node_public_ip: pool.enable_node_public_ip,
            node_public_ip_prefix_id: pool.node_public_ip_prefix_id.clone(),
            kubelet_disk_type: pool.kubelet_disk_type.clone(),
            linux_os_config: pool.linux_os_config.as_ref().map(linux_os_config),
            scale_set_priority: pool.scale_set_priority.clone(),
        },
        ..Default::default()
    };
    Ok((name, worker))
}

fn linux_os_config(config: &native::LinuxOsConfig) -> LinuxOsConfig {
    LinuxOsConfig {
        swap_file_size_mb: config.swap_file_size_mb,
        sysctls: config.sysctls.clone().map(sysctls),
        transparent_huge_page_defrag: config.transparent_huge_page_defrag.clone(),
        transparent_huge_page_enabled: config.transparent_huge_page_enabled.clone(),
    }
}

fn sysctls(s: native::SysctlConfig) -> SysctlConfig {
    SysctlConfig {
        fs_aio_max_nr: s.fs_aio_max_nr,
        fs_file_max: s.fs_file_max,
        fs_inotify_max_user_watches: s.fs_inotify_max_user_watches,
        fs_nr_open: s.fs_nr_open,
        kernel_threads_max: s.kernel_threads_max,
        net_core_netdev_max_backlog: s.net_core_netdev_max_backlog,
        net_core_optmem_max: s.net_core_optmem_max,
        net_core_rmem_default: s.net_core_rmem_default,
        net_core_rmem_max: s.net_core_rmem_max,
        net_core_somaxconn: s.net_core_somaxconn,
        net_core_wmem_default: s.net_core_wmem_default,
        net_core_wmem_max: s.net_core_wmem_max,
        net_ipv4_ip_local_port_range: s.net_ipv4_ip_local_port_range,
        net_ipv4_neigh_default_gc_thresh1: s.net_ipv4_neigh_default_gc_thresh1,
        net_ipv4_neigh_default_gc_thresh2: s.net_ipv4_neigh_default_gc_thresh2,
        net_ipv4_neigh_default_gc_thresh3: s.net_ipv4_neigh_default_gc_thresh3,
        net_ipv4_tcp_fin_timeout: s.net_ipv4_tcp_fin_timeout,
        net_ipv4_tcp_keepalive_probes: s.net_ipv4_tcp_keepalive_probes,
        net_ipv4_tcp_keepalive_time: s.net_ipv4_tcp_keepalive_time,
        net_ipv4_tcp_max_syn_backlog: s.net_ipv4_tcp_max_syn_backlog,
        net_ipv4_tcp_max_tw_buckets: s.net_ipv4_tcp_max_tw_buckets,
        net_ipv4_tcp_tw_reuse: s.net_ipv4_tcp_tw_reuse,
        net_ipv4_tcp_keepalive_intvl: s.net_ipv4_tcp_keepalive_intvl,
        net_netfilter_nf_conntrack_buckets: s.net_netfilter_nf_conntrack_buckets,
        net_netfilter_nf_conntrack_max: s.net_netfilter_nf_conntrack_max,
        vm_max_map_count: s.vm_max_map_count,
        vm_swappiness: s.vm_swappiness,
        vm_vfs_cache_pressure: s.vm_vfs_cache_pressure,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use maplit::btreemap;
    use migration_model::constants::AZURE_SYSTEM_LABEL_PREFIXES;
    use migration_model::{Taint, TaintEffect};

    fn pool() -> AgentPoolProfile {
        AgentPoolProfile {
            name: Some("small-burst-on-demand".to_string()),
            count: Some(2),
            vm_size: Some("Standard_D2s_v3".to_string()),
            mode: Some("User".to_string()),
            min_count: Some(1),
            max_count: Some(4),
            node_labels: btreemap! {
                "kubernetes.azure.com/agentpool".to_string() => "small".to_string(),
                "team".to_string() => "platform".to_string(),
            },
            node_taints: vec![
                "dedicated=gpu:NoSchedule".to_string(),
                "malformed".to_string(),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn maps_agent_pool() {
        let (name, worker) = to_worker(AZURE_SYSTEM_LABEL_PREFIXES, &pool()).unwrap();
        assert_eq!(name, "small-burst-on-demand");
        assert_eq!(worker.replicas, 2);
        assert_eq!(worker.spec.sku, "Standard_D2s_v3");
        assert_eq!(
            worker.spec.scaling,
            Some(azure::Scaling {
                min_size: 1,
                max_size: 4
            })
        );
        assert_eq!(
            worker.spec.node_labels,
            btreemap! { "team".to_string() => "platform".to_string() }
        );
        assert_eq!(
            worker.spec.taints.0,
            vec![Taint::new("dedicated", "gpu", TaintEffect::NoSchedule)]
        );
    }

    #[test]
    fn scaling_needs_both_bounds() {
        let mut pool = pool();
        pool.max_count = None;
        let (_, worker) = to_worker(AZURE_SYSTEM_LABEL_PREFIXES, &pool).unwrap();
        assert!(worker.spec.scaling.is_none());
    }

    #[test]
    fn count_is_required() {
        let mut pool = pool();
        pool.count = None;
        assert!(to_worker(AZURE_SYSTEM_LABEL_PREFIXES, &pool).is_err());
    }

    #[test]
    fn overlay_keeps_unmatched_defaults() {
        let defaults = ["small-burst-on-demand", "large-burst-on-demand"];
        let mut system = pool();
        system.name = Some("system".to_string());
        let workers =
            to_workers(&defaults, AZURE_SYSTEM_LABEL_PREFIXES, &[pool(), system]).unwrap();
        let pools = workers.spec.as_azure().unwrap();
        assert_eq!(pools.len(), 3);
        assert!(pools["small-burst-on-demand"].is_some());
        assert!(pools["large-burst-on-demand"].is_none());
        assert!(pools["system"].is_some());
    }
}
