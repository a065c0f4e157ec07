use anyhow::{Context, Result};
use clap::Parser;
use cluster_migrator::{Migrator, Snapshot};
use log::info;
use migration_model::Tags;
use std::sync::Arc;

/// Add tags to the cluster resources.
#[derive(Debug, Parser)]
pub(crate) struct Tag {
    /// A tag to add (key=value). May be repeated.
    #[clap(long = "tag", parse(try_from_str = parse_key_val), required = true)]
    tags: Vec<(String, String)>,
}

impl Tag {
    pub(crate) async fn run(
        self,
        migrator: Migrator,
        snapshot: Option<Arc<Snapshot>>,
    ) -> Result<()> {
        let tags: Tags = self.tags.into_iter().collect();
        migrator
            .add_tags(&tags)
            .await
            .context("Unable to tag the cluster")?;
        match snapshot {
            Some(snapshot) => println!(
                "{}",
                serde_json::to_string_pretty(&snapshot.tag_writes().await)
                    .context("Could not create JSON from tag writes")?
            ),
            None => info!("Tagged {} cluster resources", migrator.provider()),
        }
        Ok(())
    }
}

fn parse_key_val(s: &str) -> Result<(String, String)> {
    let (key, value) = s
        .split_once('=')
        .context(format!("Tag '{}' is not of the form key=value", s))?;
    anyhow::ensure!(!key.is_empty(), "Tag '{}' has an empty key", s);
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod test {
    use super::parse_key_val;

    #[test]
    fn key_value_tags() {
        assert_eq!(
            parse_key_val("team=platform=core").unwrap(),
            ("team".to_string(), "platform=core".to_string())
        );
        assert_eq!(
            parse_key_val("empty=").unwrap(),
            ("empty".to_string(), String::new())
        );
        assert!(parse_key_val("team").is_err());
        assert!(parse_key_val("=x").is_err());
    }
}
