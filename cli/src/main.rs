//! Trailhead CLI - run authentication journeys from a terminal
//!
//! # Commands
//! - `trailhead login [journey]` - Run a journey interactively
//! - `trailhead resume <uri>` - Continue a suspended journey from its link
//! - `trailhead check` - Validate the journey configuration
//! - `trailhead storage <save|get|delete>` - Manage the local storage item

mod journey;
mod storage;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use trailhead::JourneyConfig;

/// Trailhead journey CLI
#[derive(Parser)]
#[command(name = "trailhead")]
#[command(author, version, about = "Run resumable authentication journeys")]
struct Cli {
    /// Journey configuration file (TOML or JSON)
    #[arg(short, long, global = true, default_value = "trailhead.toml")]
    config: PathBuf,

    /// Override the configured server url
    #[arg(long, global = true)]
    server_url: Option<String>,

    /// Directory for file-backed storage
    #[arg(long, global = true, default_value = ".trailhead")]
    state_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a journey interactively
    Login {
        /// Journey name
        #[arg(default_value = "Login")]
        journey: String,

        /// Authenticate again even with an existing session
        #[arg(long)]
        force_auth: bool,

        /// Complete the journey without creating a session
        #[arg(long)]
        no_session: bool,

        /// End the session once the journey succeeds
        #[arg(long)]
        logout: bool,
    },

    /// Continue a suspended journey from its out-of-band link
    Resume {
        /// The resume link, e.g. from a magic-link email
        uri: String,
    },

    /// Validate the journey configuration and print the resolved values
    Check,

    /// Manage the local storage item
    Storage {
        #[command(flatten)]
        options: storage::StorageOptions,

        #[command(subcommand)]
        action: storage::StorageAction,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    trailhead::observe::init_stdout_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Login {
            journey,
            force_auth,
            no_session,
            logout,
        } => {
            let config = load_config(&cli.config, cli.server_url)?;
            let options = trailhead::StartOptions {
                force_auth,
                no_session,
            };
            journey::run_login(config, &journey, options, logout).await
        }
        Commands::Resume { uri } => {
            let config = load_config(&cli.config, cli.server_url)?;
            journey::run_resume(config, &uri).await
        }
        Commands::Check => run_check_command(&cli.config, cli.server_url),
        Commands::Storage { options, action } => {
            storage::run_storage_command(&cli.state_dir, &options, action).await
        }
    }
}

/// Load the configuration file, or start empty when it does not exist and a
/// server url was given on the command line.
fn load_config(path: &Path, server_url: Option<String>) -> Result<JourneyConfig> {
    let mut config = if path.exists() {
        JourneyConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?
    } else if server_url.is_some() {
        JourneyConfig::default()
    } else {
        anyhow::bail!(
            "No configuration at {} and no --server-url given",
            path.display()
        );
    };
    if let Some(url) = server_url {
        config.server_url = Some(url);
    }
    Ok(config)
}

fn run_check_command(path: &Path, server_url: Option<String>) -> Result<()> {
    let resolved = load_config(path, server_url)?
        .resolve()
        .context("Configuration is invalid")?;

    println!("serverUrl: {}", resolved.server_url);
    println!("realm:     {}", resolved.realm);
    println!("cookie:    {}", resolved.cookie);
    println!("timeout:   {:?}", resolved.timeout);
    match &resolved.oidc {
        Some(oidc) => {
            println!("oidc:      client {} via {}", oidc.client_id, oidc.discovery_endpoint);
            println!("scopes:    {}", oidc.scopes.join(" "));
        }
        None => println!("oidc:      not configured (sessions will not yield tokens)"),
    }
    Ok(())
}
