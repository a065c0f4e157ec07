use crate::error::{self, Result};
use serde::{Deserialize, Serialize};
use serde_plain::{derive_display_from_serialize, derive_fromstr_from_deserialize};
use snafu::ResultExt;

/// The cloud (or local) platform a cluster is discovered on. The string form is the identifier
/// accepted on the command line and written to the `provider` field of the output.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterProvider {
    Aws,
    Azure,
    Google,
    Kind,
}

derive_display_from_serialize!(ClusterProvider);
derive_fromstr_from_deserialize!(ClusterProvider);

impl ClusterProvider {
    pub const ALL: [ClusterProvider; 4] = [
        ClusterProvider::Aws,
        ClusterProvider::Azure,
        ClusterProvider::Google,
        ClusterProvider::Kind,
    ];

    /// Parses a provider identifier, rejecting anything outside the closed set.
    pub fn parse(provider: &str) -> Result<Self> {
        Ok(serde_plain::from_str(provider).context(error::UnsupportedProviderSnafu { provider })?)
    }
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterType {
    #[default]
    Managed,
}

derive_display_from_serialize!(ClusterType);

#[cfg(test)]
mod test {
    use super::ClusterProvider;

    #[test]
    fn provider_identifiers() {
        assert_eq!(ClusterProvider::parse("google").unwrap(), ClusterProvider::Google);
        assert_eq!(ClusterProvider::Aws.to_string(), "aws");
        assert!(ClusterProvider::parse("gcp").is_err());
        assert!(ClusterProvider::parse("").is_err());
        for provider in ClusterProvider::ALL {
            assert_eq!(
                ClusterProvider::parse(&provider.to_string()).unwrap(),
                provider
            );
        }
    }
}
