use async_trait::async_trait;
use cluster_migrator::{new_migrator, ClientResult, Clients, Error, NodeInventory, Snapshot};
use maplit::btreemap;
use migration_model::{
    AwsConfiguration, AzureConfiguration, ClusterProvider, ClusterType, Configuration,
    GcpConfiguration, Taint, TaintEffect, Values,
};
use std::sync::Arc;

fn sample(name: &str) -> Snapshot {
    let path = format!("{}/samples/{}.yaml", env!("CARGO_MANIFEST_DIR"), name);
    Snapshot::from_path(path).unwrap()
}

fn aws_configuration() -> Configuration {
    Configuration::Aws(AwsConfiguration {
        cluster_name: "prod".to_string(),
        region: "us-west-2".to_string(),
    })
}

fn azure_configuration() -> Configuration {
    Configuration::Azure(AzureConfiguration {
        subscription_id: "00000000-0000-0000-0000-000000000000".to_string(),
        resource_group: "prod-rg".to_string(),
        name: "prod".to_string(),
    })
}

fn gcp_configuration() -> Configuration {
    Configuration::Gcp(GcpConfiguration {
        credentials: String::new(),
        project: "acme".to_string(),
        region: "us-central1".to_string(),
        name: "prod".to_string(),
    })
}

async fn convert(
    snapshot: Snapshot,
    provider: ClusterProvider,
    configuration: Configuration,
) -> Result<Values, Error> {
    let snapshot = Arc::new(snapshot);
    let clients = snapshot.clients(provider)?;
    new_migrator(&provider.to_string(), configuration, clients)?
        .convert()
        .await
}

#[tokio::test]
async fn aws_values() {
    let values = convert(sample("aws"), ClusterProvider::Aws, aws_configuration())
        .await
        .unwrap();
    assert_eq!(values.provider(), ClusterProvider::Aws);
    assert_eq!(values.cluster_type(), ClusterType::Managed);

    let cluster = values.cluster();
    assert_eq!(cluster.kubernetes_version, "v1.24");
    assert_eq!(cluster.pod_cidr_blocks, vec!["10.0.0.0/16"]);
    assert_eq!(cluster.service_cidr_blocks, vec!["172.20.0.0/16"]);
    assert!(cluster.cloud_spec.as_azure().is_none());

    let spec = cluster.cloud_spec.as_aws().unwrap();
    assert_eq!(spec.role_name, "service-role/eks-prod");
    assert!(spec.associate_oidc_provider);
    assert_eq!(spec.addons.len(), 2);
    assert_eq!(spec.network.vpc.id, "vpc-0a1");
    assert_eq!(spec.network.vpc.availability_zone_usage_limit, Some(3));
    let subnets = &spec.network.subnets;
    assert_eq!(subnets.len(), 2);
    assert_eq!(subnets[0].route_table_id.as_deref(), Some("rtb-0a1"));
    assert_eq!(subnets[0].nat_gateway_id.as_deref(), Some("nat-0a1"));
    assert_eq!(subnets[1].nat_gateway_id, None);

    let pools = values.workers().spec.as_aws().unwrap();
    assert_eq!(pools["medium-burst-on-demand"], None);
    let small = pools["small-burst-on-demand"].as_ref().unwrap();
    assert_eq!(small.replicas, 3);
    assert_eq!(
        small.spec.availability_zones,
        vec!["us-west-2a", "us-west-2b"]
    );
    assert!(small
        .spec
        .taints
        .contains(&Taint::new("dedicated", "batch", TaintEffect::NoSchedule)));
    assert!(values.invalid_taints().is_empty());
}

#[tokio::test]
async fn json_snapshot() {
    let file = tempfile::NamedTempFile::new().unwrap();
    serde_json::to_writer_pretty(file.as_file(), &sample("aws")).unwrap();
    let snapshot = Snapshot::from_path(file.path()).unwrap();
    let values = convert(snapshot, ClusterProvider::Aws, aws_configuration())
        .await
        .unwrap();
    assert_eq!(values.cluster().name, "prod");
}

#[tokio::test]
async fn aws_requires_exactly_one_vpc() {
    let mut snapshot = sample("aws");
    snapshot.aws.as_mut().unwrap().vpcs.clear();
    assert!(matches!(
        convert(snapshot, ClusterProvider::Aws, aws_configuration()).await,
        Err(Error::VpcCount { count: 0, .. })
    ));

    let mut snapshot = sample("aws");
    let aws = snapshot.aws.as_mut().unwrap();
    let vpc = aws.vpcs[0].clone();
    aws.vpcs.push(vpc);
    assert!(matches!(
        convert(snapshot, ClusterProvider::Aws, aws_configuration()).await,
        Err(Error::VpcCount { count: 2, .. })
    ));
}

#[tokio::test]
async fn aws_subnet_without_zone() {
    let mut snapshot = sample("aws");
    snapshot.aws.as_mut().unwrap().nodegroups[0]
        .subnets
        .push("subnet-0ff".to_string());
    assert!(matches!(
        convert(snapshot, ClusterProvider::Aws, aws_configuration()).await,
        Err(Error::SubnetZone { subnet_id }) if subnet_id == "subnet-0ff"
    ));
}

#[tokio::test]
async fn azure_values() {
    let values = convert(
        sample("azure"),
        ClusterProvider::Azure,
        azure_configuration(),
    )
    .await
    .unwrap();
    assert_eq!(values.provider(), ClusterProvider::Azure);

    let cluster = values.cluster();
    assert_eq!(cluster.kubernetes_version, "1.25.5");
    assert_eq!(cluster.service_cidr_blocks, vec!["10.0.0.0/16"]);
    let spec = cluster.cloud_spec.as_azure().unwrap();
    assert_eq!(spec.tenant_id, "22222222-2222-2222-2222-222222222222");
    assert_eq!(spec.location, "eastus");
    assert_eq!(spec.resource_group_name, "prod-rg");
    assert!(spec.client_secret.is_empty());
    let vnet = &spec.virtual_network;
    assert_eq!(vnet.name, "prod-vnet");
    assert_eq!(vnet.resource_group, "net-rg");
    assert_eq!(vnet.cidr_block, "10.240.0.0/16");
    assert_eq!(vnet.subnet.name, "nodes");
    assert_eq!(vnet.subnet.cidr_block, "10.240.0.0/22");

    let pools = values.workers().spec.as_azure().unwrap();
    let system = pools["system"].as_ref().unwrap();
    assert_eq!(system.replicas, 2);
    assert!(system.spec.scaling.is_some());
    assert_eq!(
        system.spec.node_labels,
        btreemap! { "workload".to_string() => "general".to_string() }
    );
    assert!(system.spec.taints.contains(&Taint::new(
        "CriticalAddonsOnly",
        "true",
        TaintEffect::NoSchedule
    )));
}

#[tokio::test]
async fn gcp_values_with_node_inventory() {
    let values = convert(sample("gcp"), ClusterProvider::Google, gcp_configuration())
        .await
        .unwrap();
    assert_eq!(values.provider(), ClusterProvider::Google);

    let cluster = values.cluster();
    assert_eq!(cluster.pod_cidr_blocks, vec!["10.4.0.0/14"]);
    let spec = cluster.cloud_spec.as_gcp().unwrap();
    assert_eq!(spec.project, "acme");
    assert!(spec.enable_workload_identity);
    assert_eq!(spec.subnets.len(), 1);
    assert_eq!(spec.subnets[0].name, "prod-nodes");
    assert!(spec.subnets[0].enable_flow_logs);

    let pools = values.workers().spec.as_gcp().unwrap();
    let medium = pools["medium-burst-on-demand"].as_ref().unwrap();
    assert_eq!(medium.replicas, Some(3));
    assert!(medium.is_multi_az);
    assert_eq!(pools["small-burst-on-demand"], None);
}

#[tokio::test]
async fn gcp_without_node_inventory() {
    let mut snapshot = sample("gcp");
    snapshot.nodes = None;
    let values = convert(snapshot, ClusterProvider::Google, gcp_configuration())
        .await
        .unwrap();
    let pools = values.workers().spec.as_gcp().unwrap();
    let medium = pools["medium-burst-on-demand"].as_ref().unwrap();
    assert_eq!(medium.replicas, Some(1));
}

struct UnreachableNodes;

#[async_trait]
impl NodeInventory for UnreachableNodes {
    async fn node_names(&self) -> ClientResult<Vec<String>> {
        Err("connection refused".into())
    }
}

#[tokio::test]
async fn node_inventory_failure_names_the_operation() {
    let snapshot = Arc::new(sample("gcp"));
    let clients = Clients::default()
        .with_gcp(snapshot)
        .with_nodes(Arc::new(UnreachableNodes));
    let migrator = new_migrator("google", gcp_configuration(), clients).unwrap();
    match migrator.convert().await {
        Err(Error::Remote { operation, .. }) => assert_eq!(operation, "ListNodes"),
        other => panic!("expected a remote error, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn missing_snapshot_section() {
    let snapshot = Arc::new(sample("aws"));
    assert!(matches!(
        snapshot.clients(ClusterProvider::Google),
        Err(Error::SnapshotSection {
            provider: ClusterProvider::Google
        })
    ));
}

#[tokio::test]
async fn aws_tag_writes() {
    let snapshot = Arc::new(sample("aws"));
    let migrator = new_migrator(
        "aws",
        aws_configuration(),
        snapshot.clients(ClusterProvider::Aws).unwrap(),
    )
    .unwrap();
    let tags = btreemap! { "owner".to_string() => "capi".to_string() };
    migrator.add_tags(&tags).await.unwrap();

    let writes = snapshot.tag_writes().await;
    let resources: Vec<&str> = writes.iter().map(|w| w.resource.as_str()).collect();
    assert_eq!(
        resources,
        vec![
            "arn:aws:eks:us-west-2:111122223333:cluster/prod",
            "vpc-0a1",
            "vpce-0e5",
            "rtb-0a1",
            "subnet-0a1",
            "nat-0a1",
            "rtb-0b2",
            "subnet-0b2",
            "sg-0c3",
            "arn:aws:eks:us-west-2:111122223333:nodegroup/prod/small-burst-on-demand/1a",
        ]
    );
    assert_eq!(
        writes[0].tags,
        btreemap! {
            "owner".to_string() => "capi".to_string(),
            "sigs.k8s.io/cluster-api-provider-aws/role".to_string() => "common".to_string(),
        }
    );
    assert_eq!(
        writes[4].tags["kubernetes.io/role/internal-elb"],
        "1".to_string()
    );
    assert_eq!(writes[3].tags, tags);
}

#[tokio::test]
async fn gcp_label_writes() {
    let snapshot = Arc::new(sample("gcp"));
    let migrator = new_migrator(
        "google",
        gcp_configuration(),
        snapshot.clients(ClusterProvider::Google).unwrap(),
    )
    .unwrap();
    migrator
        .add_tags(&btreemap! { "owner".to_string() => "capi".to_string() })
        .await
        .unwrap();
    let writes = snapshot.tag_writes().await;
    assert_eq!(writes.len(), 2);
    assert_eq!(
        writes[1].resource,
        "projects/acme/locations/us-central1/clusters/prod/nodePools/medium-burst-on-demand"
    );
}
