//! vmgridd — the vmgrid daemon.
//!
//! # Usage
//!
//! ```text
//! vmgridd bootstrap --config vmgrid.toml --ca-file ca.crt --decode
//! vmgridd select --catalog skus.json --zone westus-2 --capacity-type spot
//! vmgridd gc --data-dir /var/lib/vmgrid --inventory inventory.json
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;
use vmgrid_catalog::CapacityType;
use vmgridd::ProvisionerConfig;
use vmgridd::commands;

#[derive(Parser)]
#[command(name = "vmgridd", about = "vmgrid daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render the custom-data payload for a new node.
    Bootstrap {
        /// Path to vmgrid.toml.
        #[arg(long)]
        config: PathBuf,

        /// TLS bootstrap token.
        #[arg(long, env = "VMGRID_BOOTSTRAP_TOKEN", hide_env_values = true)]
        token: String,

        /// PEM CA bundle of the API server.
        #[arg(long)]
        ca_file: PathBuf,

        /// Print the plain script instead of the base64 payload.
        #[arg(long)]
        decode: bool,
    },

    /// Pick the cheapest offering from a JSON catalog.
    Select {
        /// Path to a JSON array of instance types.
        #[arg(long)]
        catalog: PathBuf,

        #[arg(long)]
        zone: Option<String>,

        /// `spot` or `regular`.
        #[arg(long)]
        capacity_type: Option<CapacityType>,

        #[arg(long, default_value = "0")]
        min_cpu_millis: u64,

        #[arg(long, default_value = "0")]
        min_memory_bytes: u64,

        #[arg(long, default_value = "0")]
        min_gpus: u32,
    },

    /// Run the machine garbage collector until Ctrl-C.
    Gc {
        /// Data directory for persistent state.
        #[arg(long, default_value = "/var/lib/vmgrid")]
        data_dir: PathBuf,

        /// JSON inventory file, re-read every pass.
        #[arg(long)]
        inventory: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,vmgridd=debug,vmgrid=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Bootstrap {
            config,
            token,
            ca_file,
            decode,
        } => {
            let config = ProvisionerConfig::from_file(&config)?;
            let ca_bundle = commands::read_ca_bundle(&ca_file)?;
            let payload = commands::bootstrap(&config, &token, &ca_bundle, decode)?;
            debug!(bytes = payload.len(), decode, "rendered bootstrap payload");
            println!("{payload}");
            Ok(())
        }
        Command::Select {
            catalog,
            zone,
            capacity_type,
            min_cpu_millis,
            min_memory_bytes,
            min_gpus,
        } => {
            let selected = commands::select(
                &catalog,
                zone,
                capacity_type,
                min_cpu_millis,
                min_memory_bytes,
                min_gpus,
            )?;
            println!("{}", serde_json::to_string_pretty(&selected)?);
            Ok(())
        }
        Command::Gc {
            data_dir,
            inventory,
        } => commands::run_gc(&data_dir, &inventory).await,
    }
}
