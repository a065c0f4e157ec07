//! Optional AKS profile blocks. A profile the cluster does not report maps to `None`, which is
//! distinct from a reported profile with every knob unset.

use super::native;
use migration_model::azure::{
    AadProfile, AddonProfile, ApiServerAccessProfile, AutoScalerProfile, LoadBalancerProfile,
};
use std::collections::BTreeMap;

pub fn auto_scaler_profile(
    profile: Option<&native::AutoScalerProfile>,
) -> Option<AutoScalerProfile> {
    let profile = profile?.clone();
    Some(AutoScalerProfile {
        balance_similar_node_groups: profile.balance_similar_node_groups,
        expander: profile.expander,
        max_empty_bulk_delete: profile.max_empty_bulk_delete,
        max_graceful_termination_sec: profile.max_graceful_termination_sec,
        max_node_provision_time: profile.max_node_provision_time,
        max_total_unready_percentage: profile.max_total_unready_percentage,
        new_pod_scale_up_delay: profile.new_pod_scale_up_delay,
        ok_total_unready_count: profile.ok_total_unready_count,
        scale_down_delay_after_add: profile.scale_down_delay_after_add,
        scale_down_delay_after_delete: profile.scale_down_delay_after_delete,
        scale_down_delay_after_failure: profile.scale_down_delay_after_failure,
        scale_down_unneeded_time: profile.scale_down_unneeded_time,
        scale_down_unready_time: profile.scale_down_unready_time,
        scale_down_utilization_threshold: profile.scale_down_utilization_threshold,
        scan_interval: profile.scan_interval,
        skip_nodes_with_local_storage: profile.skip_nodes_with_local_storage,
        skip_nodes_with_system_pods: profile.skip_nodes_with_system_pods,
    })
}

pub fn api_server_access_profile(
    profile: Option<&native::ApiServerAccessProfile>,
) -> Option<ApiServerAccessProfile> {
    profile.map(|profile| ApiServerAccessProfile {
        authorized_ip_ranges: profile.authorized_ip_ranges.clone(),
        enable_private_cluster: profile.enable_private_cluster,
        private_dns_zone: profile.private_dns_zone.clone(),
        enable_private_cluster_public_fqdn: profile.enable_private_cluster_public_fqdn,
    })
}

pub fn load_balancer_profile(
    profile: Option<&native::LoadBalancerProfile>,
) -> Option<LoadBalancerProfile> {
    fn ids(references: &[native::ResourceReference]) -> Vec<String> {
        references.iter().filter_map(|r| r.id.clone()).collect()
    }

    profile.map(|profile| LoadBalancerProfile {
        managed_outbound_ips: profile
            .managed_outbound_ips
            .as_ref()
            .and_then(|ips| ips.count),
        outbound_ip_prefixes: profile
            .outbound_ip_prefixes
            .as_ref()
            .map(|prefixes| ids(&prefixes.public_ip_prefixes))
            .unwrap_or_default(),
        outbound_ips: profile
            .outbound_ips
            .as_ref()
            .map(|ips| ids(&ips.public_ips))
            .unwrap_or_default(),
        allocated_outbound_ports: profile.allocated_outbound_ports,
        idle_timeout_in_minutes: profile.idle_timeout_in_minutes,
    })
}

pub fn aad_profile(profile: Option<&native::AadProfile>) -> Option<AadProfile> {
    profile.map(|profile| AadProfile {
        managed: profile.managed.unwrap_or(false),
        admin_group_object_ids: profile.admin_group_object_ids.clone(),
    })
}

/// One entry per addon, sorted by addon name. An absent collection gives an empty list.
pub fn addon_profiles(profiles: &BTreeMap<String, native::AddonProfile>) -> Vec<AddonProfile> {
    profiles
        .iter()
        .map(|(name, profile)| AddonProfile {
            name: name.clone(),
            enabled: profile.enabled,
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use maplit::btreemap;

    #[test]
    fn absent_profiles_are_none() {
        assert!(auto_scaler_profile(None).is_none());
        assert!(api_server_access_profile(None).is_none());
        assert!(load_balancer_profile(None).is_none());
        assert!(aad_profile(None).is_none());
    }

    #[test]
    fn empty_profile_is_some() {
        let profile = auto_scaler_profile(Some(&native::AutoScalerProfile::default())).unwrap();
        assert_eq!(profile, AutoScalerProfile::default());
    }

    #[test]
    fn load_balancer_ids() {
        let profile = native::LoadBalancerProfile {
            managed_outbound_ips: Some(native::ManagedOutboundIps { count: Some(2) }),
            outbound_ips: Some(native::OutboundIps {
                public_ips: vec![
                    native::ResourceReference {
                        id: Some("ip-1".to_string()),
                    },
                    native::ResourceReference { id: None },
                ],
            }),
            ..Default::default()
        };
        let converted = load_balancer_profile(Some(&profile)).unwrap();
        assert_eq!(converted.managed_outbound_ips, Some(2));
        assert_eq!(converted.outbound_ips, vec!["ip-1".to_string()]);
        assert!(converted.outbound_ip_prefixes.is_empty());
    }

    #[test]
    fn addons_sorted_by_name() {
        let profiles = btreemap! {
            "omsagent".to_string() => native::AddonProfile {
                enabled: false,
                ..Default::default()
            },
            "azurepolicy".to_string() => native::AddonProfile {
                enabled: true,
                ..Default::default()
            },
        };
        let addons = addon_profiles(&profiles);
        assert_eq!(addons[0].name, "azurepolicy");
        assert!(addons[0].enabled);
        assert_eq!(addons[1].name, "omsagent");
        assert!(addon_profiles(&BTreeMap::new()).is_empty());
    }
}
