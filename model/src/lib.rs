/*!

This library provides the canonical, provider-agnostic description of a managed Kubernetes
cluster: the `Values` document, the per-provider cloud specs and worker templates, and the
taint/label/tag codec used to translate each cloud's native encodings into it.

!*/

#![deny(
    clippy::expect_used,
    clippy::get_unwrap,
    clippy::panic,
    clippy::panic_in_result_fn,
    clippy::panicking_unwrap,
    clippy::unwrap_in_result,
    clippy::unwrap_used
)]

pub use configuration::{
    AwsConfiguration, AzureConfiguration, Configuration, GcpConfiguration, KindConfiguration,
};
pub use error::{Error, Result};
pub use overlay::{PoolOverlay, WorkerPools};
pub use provider::{ClusterProvider, ClusterType};
pub use tags::{Labels, Tags};
pub use taint::{Taint, TaintEffect, Taints};
pub use values::{Cluster, CloudSpec, DefaultsWorker, InvalidTaint, Values, Workers, WorkersSpec};

pub mod aws;
pub mod azure;
mod configuration;
pub mod constants;
mod error;
pub mod gcp;
mod overlay;
mod provider;
pub mod tags;
pub mod taint;
mod values;
