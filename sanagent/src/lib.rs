//! Inventory sync agent for storage arrays.
//!
//! Pulls controllers, disk zones, storage pools, LUNs, hosts, host groups
//! and mapping views from each array's management API, normalizes them and
//! reconciles the result into the CMDB.

pub mod collect;
pub mod naming;
pub mod objects;
pub mod relations;
pub mod run;

use clap::{Args, Parser, Subcommand};
use cmdbstore::StoreConfig;
use tracing_subscriber::{fmt, EnvFilter};

use crate::run::{run_sync, RunConfig};

/// Runs the command line interface for the sync agent.
pub async fn run_cli() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Some(Command::Sync(args)) => {
            let config = args.into_run_config();
            let summary = run_sync(&config).await?;
            println!(
                "synced {} array(s) ({} failed logins, {} skipped), {} stale records removed",
                summary.completed, summary.failed_logins, summary.skipped, summary.stale_deleted
            );
        }
        None => {
            println!("No subcommand provided. Use --help to see available commands.");
        }
    }

    Ok(())
}

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Collects array inventory and reconciles it into the CMDB
    Sync(SyncArgs),
}

#[derive(Args)]
struct SyncArgs {
    /// CMDB base URL
    #[arg(long, env = "CMDB_ENDPOINT")]
    cmdb_endpoint: String,
    /// Virtual-host header for the CMDB ingress
    #[arg(long, env = "CMDB_HOST_HEADER")]
    cmdb_host: Option<String>,
    /// Organization header sent to the CMDB
    #[arg(long, env = "CMDB_ORG")]
    org: Option<String>,
    /// Array management account
    #[arg(long, env = "ARRAY_USERNAME")]
    username: String,
    /// Array management password
    #[arg(long, env = "ARRAY_PASSWORD")]
    password: String,
    /// Array management port
    #[arg(long, default_value_t = 8088)]
    device_port: u16,
    /// Only collect the array with this management IP
    #[arg(long)]
    target_ip: Option<String>,
    /// Accept self-signed array certificates
    #[arg(long, default_value_t = false)]
    insecure: bool,
}

impl SyncArgs {
    fn into_run_config(self) -> RunConfig {
        let mut store = StoreConfig::new(self.cmdb_endpoint);
        if let Some(host) = self.cmdb_host {
            store.api_host = host;
        }
        if let Some(org) = self.org {
            store.org = org;
        }
        RunConfig {
            store,
            username: self.username,
            password: self.password,
            device_scheme: "https".to_string(),
            device_port: self.device_port,
            target_ip: self.target_ip,
            accept_invalid_certs: self.insecure,
        }
    }
}

fn init_tracing() {
    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}
