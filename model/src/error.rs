use crate::ClusterProvider;
use snafu::Snafu;

#[derive(Debug, Snafu)]
pub struct Error(OpaqueError);
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub(crate) enum OpaqueError {
    #[snafu(display("{} cannot be empty, ensure that {}", field, hint))]
    MissingConfiguration {
        field: &'static str,
        hint: &'static str,
    },

    #[snafu(display(
        "A '{}' values document carries a cloud spec for '{}'",
        provider,
        populated
    ))]
    ProviderMismatch {
        provider: ClusterProvider,
        populated: String,
    },

    #[snafu(display("Unsupported cluster provider '{}': {}", provider, source))]
    UnsupportedProvider {
        provider: String,
        source: serde_plain::Error,
    },
}
