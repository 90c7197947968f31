//! ceph-auth command-line tool
//!
//! Drives the ceph provider resources from the shell: manage cephx
//! entities and wait for a cluster to come online.

use anyhow::{anyhow, Context, Result};
use auth::{Caps, EntityName};
use clap::{Parser, Subcommand};
use monclient::{ClusterLibrary, WaitOptions};
use provider::{
    AuthConfig, AuthLookup, DataSource, Plan, Provider, ProviderConfig, Resource,
    WaitOnlineConfig,
};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ceph-auth")]
#[command(about = "Manage Ceph cephx entities", long_about = None)]
struct Cli {
    /// Ceph configuration file path
    /// If not specified, the default locations are searched
    #[arg(short = 'c', long, env = "CEPH_CONF")]
    conf: Option<PathBuf>,

    /// Entity to connect as (e.g., "client.admin")
    #[arg(short = 'n', long, env = "CEPH_ENTITY")]
    name: Option<String>,

    /// Cluster name
    #[arg(long, env = "CEPH_CLUSTER", default_value = cephconfig::DEFAULT_CLUSTER)]
    cluster: String,

    /// Keyring contents (not a path); requires --mon-host
    #[arg(long, env = "CEPH_KEYRING_DATA", hide_env_values = true)]
    keyring: Option<String>,

    /// Base64 cephx key
    #[arg(long, env = "CEPH_KEY", hide_env_values = true)]
    key: Option<String>,

    /// Monitor addresses (comma-separated, e.g., "v2:127.0.0.1:3300")
    /// If not specified, will be read from ceph.conf
    #[arg(long, env = "MON_HOST")]
    mon_host: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the provider schema as JSON
    Schema,
    #[command(flatten)]
    Cluster(ClusterCommands),
}

/// Commands that talk to the cluster
#[derive(Subcommand)]
enum ClusterCommands {
    /// Read an existing entity
    Get {
        /// Entity name
        entity: EntityName,
        /// Print only the keyring text
        #[arg(long)]
        keyring: bool,
    },
    /// Create an entity, or fetch it if it already exists
    Create {
        /// Entity name
        entity: EntityName,
        /// Capability as service=permission (repeatable)
        #[arg(long = "cap", value_parser = parse_cap)]
        caps: Vec<(String, String)>,
    },
    /// Replace the capabilities of an entity
    Update {
        /// Entity name
        entity: EntityName,
        /// Capability as service=permission (repeatable)
        #[arg(long = "cap", value_parser = parse_cap)]
        caps: Vec<(String, String)>,
    },
    /// Remove an entity
    Rm {
        /// Entity name
        entity: EntityName,
    },
    /// Import an existing entity and print its state
    Import {
        /// Entity name
        entity: EntityName,
    },
    /// Block until the cluster accepts a connection
    WaitOnline {
        /// Maximum time to wait (e.g., "30s", "5m", "1h")
        #[arg(long, value_parser = parse_duration, default_value = "1h")]
        timeout: Duration,
        /// Pause between attempts
        #[arg(long, value_parser = parse_duration, default_value = "1m")]
        interval: Duration,
        /// Record the result as a ceph_wait_online resource with this label
        #[arg(long)]
        label: Option<String>,
    },
}

fn parse_cap(s: &str) -> Result<(String, String), String> {
    Caps::parse_assignment(s).map_err(|e| e.to_string())
}

fn parse_duration(s: &str) -> Result<Duration, String> {
    cephconfig::parse_duration(s).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let command = match cli.command {
        Commands::Schema => return print_json(&Provider::schema()),
        Commands::Cluster(command) => command,
    };

    let config = ProviderConfig {
        config_path: cli.conf,
        entity: cli.name,
        cluster: Some(cli.cluster),
        keyring: cli.keyring,
        key: cli.key,
        mon_host: cli.mon_host,
    };
    debug!(?config, "provider configuration");

    let provider = Provider::configure(&config, cluster_library()?)
        .context("Failed to configure provider")?;

    match command {
        ClusterCommands::Get { entity, keyring } => {
            let state = provider
                .auth_data_source()
                .read(&AuthLookup { entity })
                .await
                .context("Failed to read entity")?;

            if keyring {
                write_stdout(state.keyring.as_bytes())?;
            } else {
                print_json(&state)?;
            }
        }
        ClusterCommands::Create { entity, caps } => {
            let config = AuthConfig {
                entity,
                caps: caps.into_iter().collect(),
            };
            let state = provider
                .auth_resource()
                .create(&config)
                .await
                .context("Failed to create entity")?;
            print_json(&state)?;
        }
        ClusterCommands::Update { entity, caps } => {
            let resource = provider.auth_resource();
            let prior = read_existing(&resource, &entity).await?;
            let config = AuthConfig {
                entity,
                caps: caps.into_iter().collect(),
            };

            let state = match provider::AuthResource::plan(&prior, &config) {
                Plan::NoOp => {
                    info!(entity = %config.entity, "caps already match");
                    prior
                }
                Plan::Update => resource
                    .update(&prior, &config)
                    .await
                    .context("Failed to update entity")?,
                Plan::Replace => return Err(anyhow!("Entity name cannot be changed in place")),
            };
            print_json(&state)?;
        }
        ClusterCommands::Rm { entity } => {
            let resource = provider.auth_resource();
            let state = resource
                .import(&entity.to_string())
                .await
                .context("Invalid entity")?;
            resource
                .delete(&state)
                .await
                .context("Failed to remove entity")?;
            info!(entity = %entity, "removed entity");
        }
        ClusterCommands::Import { entity } => {
            let state = read_existing(&provider.auth_resource(), &entity).await?;
            print_json(&state)?;
        }
        ClusterCommands::WaitOnline {
            timeout,
            interval,
            label,
        } => {
            let wait = WaitOptions::new(timeout, interval).context("Invalid wait options")?;
            debug!(?timeout, ?interval, "waiting for ceph");

            match label {
                Some(label) => {
                    let config = WaitOnlineConfig {
                        cluster_name: label,
                        wait,
                    };
                    let state = provider
                        .wait_online_resource()
                        .create(&config)
                        .await
                        .context("Ceph did not come online")?;
                    print_json(&state)?;
                }
                None => {
                    let status = provider
                        .wait_online_data_source()
                        .read(&wait)
                        .await
                        .context("Ceph did not come online")?;
                    print_json(&status)?;
                }
            }
        }
    }

    Ok(())
}

/// Import an entity by name and refresh it from the cluster
async fn read_existing(
    resource: &provider::AuthResource,
    entity: &EntityName,
) -> Result<provider::AuthState> {
    let seeded = resource
        .import(&entity.to_string())
        .await
        .context("Invalid entity")?;
    resource
        .read(&seeded)
        .await
        .context("Failed to read entity")?
        .ok_or_else(|| anyhow!("Entity {} does not exist", entity))
}

#[cfg(feature = "librados")]
fn cluster_library() -> Result<Arc<dyn ClusterLibrary>> {
    debug!("using librados {}", monclient::librados::version());
    Ok(Arc::new(monclient::Librados))
}

#[cfg(not(feature = "librados"))]
fn cluster_library() -> Result<Arc<dyn ClusterLibrary>> {
    Err(anyhow!(
        "No cluster backend compiled in; rebuild with --features librados"
    ))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let mut out = serde_json::to_vec_pretty(value).context("Failed to encode output")?;
    out.push(b'\n');
    write_stdout(&out)
}

fn write_stdout(data: &[u8]) -> Result<()> {
    let mut stdout = io::stdout();
    stdout
        .write_all(data)
        .context("Failed to write to stdout")?;
    stdout.flush().context("Failed to flush stdout")?;
    Ok(())
}
