use anyhow::{Context, Result};
use clap::Parser;
use cluster_migrator::Migrator;
use log::warn;
use serde::{Deserialize, Serialize};
use serde_plain::{derive_display_from_serialize, derive_fromstr_from_deserialize};

/// Discover the cluster and print its values document.
#[derive(Debug, Parser)]
pub(crate) struct Convert {
    /// The output format [yaml|json].
    #[clap(long = "output", short = 'o', default_value = "yaml")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum OutputFormat {
    Yaml,
    Json,
}

derive_display_from_serialize!(OutputFormat);
derive_fromstr_from_deserialize!(OutputFormat);

impl Convert {
    pub(crate) async fn run(self, migrator: Migrator) -> Result<()> {
        let values = migrator
            .convert()
            .await
            .context("Unable to convert the cluster")?;
        for invalid in values.invalid_taints() {
            warn!(
                "Pool '{}' has taint '{}' with an effect that could not be mapped",
                invalid.pool, invalid.taint.key
            );
        }
        let output = match self.output {
            OutputFormat::Yaml => {
                serde_yaml::to_string(&values).context("Could not create YAML from values")?
            }
            OutputFormat::Json => serde_json::to_string_pretty(&values)
                .context("Could not create JSON from values")?,
        };
        println!("{}", output);
        Ok(())
    }
}
