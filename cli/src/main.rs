/*!

This is the command line interface for converting a managed Kubernetes cluster into a cluster
lifecycle values document and for tagging the cluster's cloud resources.

!*/

mod convert;
mod tag;
mod target;

use anyhow::{Context, Result};
use clap::Parser;
use cluster_migrator::{
    aws_config, new_migrator, AwsSdk, Clients, KubeNodeInventory, Migrator, Snapshot,
};
use env_logger::Builder;
use log::{info, LevelFilter};
use migration_model::{ClusterProvider, Configuration};
use std::path::PathBuf;
use std::sync::Arc;

/// Discover a managed Kubernetes cluster on AWS, Azure, GCP or kind and describe it as a
/// provider-neutral values document.
#[derive(Debug, Parser)]
#[clap(author, version, about)]
struct Args {
    /// Set logging verbosity [trace|debug|info|warn|error]. If the environment variable `RUST_LOG`
    /// is present, it overrides the default logging behavior. See https://docs.rs/env_logger/latest
    #[clap(long = "log-level", default_value = "info")]
    log_level: LevelFilter,
    /// The cluster provider [aws|azure|google|kind].
    #[clap(long = "provider")]
    provider: String,
    /// Answer every cloud call from this YAML or JSON snapshot instead of the live provider. Tag
    /// writes are recorded and printed rather than sent.
    #[clap(long = "snapshot")]
    snapshot: Option<PathBuf>,
    /// Path to the kubeconfig of the cluster, used to count GKE nodes per pool.
    #[clap(long = "kubeconfig")]
    kubeconfig: Option<PathBuf>,
    #[clap(flatten)]
    target: target::Target,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Parser)]
enum Command {
    /// Print the values document of the cluster.
    Convert(convert::Convert),
    /// Add tags to the cluster, its machine pools and its network.
    Tag(tag::Tag),
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logger(args.log_level);
    if let Err(e) = run(args).await {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let snapshot = match &args.snapshot {
        Some(path) => Some(Arc::new(Snapshot::from_path(path).context(format!(
            "Unable to load snapshot from path '{}'",
            path.display()
        ))?)),
        None => None,
    };
    let migrator = migrator(&args, snapshot.as_ref()).await?;
    match args.command {
        Command::Convert(convert) => convert.run(migrator).await,
        Command::Tag(tag) => tag.run(migrator, snapshot).await,
    }
}

async fn migrator(args: &Args, snapshot: Option<&Arc<Snapshot>>) -> Result<Migrator> {
    let provider = ClusterProvider::parse(&args.provider)
        .context(format!("Unable to use provider '{}'", args.provider))?;
    let configuration = args.target.configuration(provider)?;

    let mut clients = match snapshot {
        Some(snapshot) => snapshot
            .clients(provider)
            .context("Unable to use the snapshot")?,
        None => live_clients(&configuration, args.target.assume_role()).await,
    };
    if let Some(path) = &args.kubeconfig {
        let nodes = KubeNodeInventory::from_kubeconfig_path(path)
            .await
            .context(format!(
                "Unable to create a node inventory from path '{}'",
                path.display()
            ))?;
        clients = clients.with_nodes(Arc::new(nodes));
    }

    new_migrator(&args.provider, configuration, clients).context("Unable to create the migrator")
}

/// Only AWS has a live client; other providers need `--snapshot`.
async fn live_clients(configuration: &Configuration, assume_role: Option<String>) -> Clients {
    match configuration {
        Configuration::Aws(config) => {
            let sdk_config = aws_config(&config.region, assume_role.as_deref()).await;
            Clients::default().with_aws(Arc::new(AwsSdk::new(&sdk_config)))
        }
        _ => {
            info!("No live client for this provider");
            Clients::default()
        }
    }
}

/// Initialize the logger with the value passed by `--log-level` (or its default) when the
/// `RUST_LOG` environment variable is not present. If present, the `RUST_LOG` environment variable
/// overrides `--log-level`/`level`.
fn init_logger(level: LevelFilter) {
    match std::env::var(env_logger::DEFAULT_FILTER_ENV).ok() {
        Some(_) => {
            // RUST_LOG exists; env_logger will use it.
            Builder::from_default_env().init();
        }
        None => {
            // RUST_LOG does not exist; use the default level for the workspace crates only.
            Builder::new()
                .filter_level(LevelFilter::Warn)
                .filter(Some(env!("CARGO_CRATE_NAME")), level)
                .filter(Some("cluster_migrator"), level)
                .filter(Some("migration_model"), level)
                .init();
        }
    }
}
