use anyhow::{Context, Result};
use clap::{Args, Subcommand, ValueEnum};
use serde_json::{Map, Value};
use std::path::Path;
use trailhead::storage::{CacheStrategy, StorageClient, StorageConfig, StorageKind};

#[derive(Args)]
pub struct StorageOptions {
    /// Backing store
    #[arg(long, value_enum, default_value = "datastore")]
    kind: Kind,

    /// File name under the state directory
    #[arg(long)]
    file_name: Option<String>,

    /// Read cache in front of the file
    #[arg(long, value_enum, default_value = "no-cache")]
    cache: Cache,
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    Memory,
    Datastore,
    Encrypted,
}

#[derive(Clone, Copy, ValueEnum)]
enum Cache {
    NoCache,
    Cache,
    CacheOnFailure,
}

#[derive(Subcommand)]
pub enum StorageAction {
    /// Save `key=value` pairs as the stored item
    Save {
        #[arg(required = true)]
        pairs: Vec<String>,
    },
    /// Print the stored item
    Get,
    /// Remove the stored item
    Delete,
}

impl StorageOptions {
    fn to_config(&self) -> StorageConfig {
        StorageConfig {
            kind: match self.kind {
                Kind::Memory => StorageKind::Memory,
                Kind::Datastore => StorageKind::Datastore,
                Kind::Encrypted => StorageKind::Encrypted,
            },
            file_name: self.file_name.clone(),
            cache_strategy: match self.cache {
                Cache::NoCache => CacheStrategy::NoCache,
                Cache::Cache => CacheStrategy::Cache,
                Cache::CacheOnFailure => CacheStrategy::CacheOnFailure,
            },
            ..StorageConfig::default()
        }
    }
}

fn parse_pairs(pairs: &[String]) -> Result<Map<String, Value>> {
    pairs
        .iter()
        .map(|pair| {
            let (key, value) = pair
                .split_once('=')
                .with_context(|| format!("Expected key=value, got '{pair}'"))?;
            Ok((key.to_string(), Value::String(value.to_string())))
        })
        .collect()
}

pub async fn run_storage_command(
    state_dir: &Path,
    options: &StorageOptions,
    action: StorageAction,
) -> Result<()> {
    let client = StorageClient::new(state_dir);
    client.configure(&options.to_config())?;

    match action {
        StorageAction::Save { pairs } => {
            let item = parse_pairs(&pairs)?;
            client.save(&item).await?;
            println!("Saved {} field(s).", item.len());
        }
        StorageAction::Get => match client.get().await? {
            Some(item) => println!("{}", serde_json::to_string_pretty(&item)?),
            None => println!("No item stored."),
        },
        StorageAction::Delete => {
            client.delete().await?;
            println!("Deleted.");
        }
    }
    Ok(())
}
