//! Subcommand implementations.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use tokio::sync::watch;
use tracing::info;
use vmgrid_bootstrap::{StaticBaseline, render, render_script, synthesize};
use vmgrid_catalog::{CapacityType, SelectionConstraints, StaticCatalog, select_offering};
use vmgrid_gc::{GarbageCollector, SystemClock};
use vmgrid_state::StateStore;

use crate::config::ProvisionerConfig;
use crate::inventory::FileInventory;

/// Synthesize and render the custom data for one node.
///
/// With `decode` the plain script is returned instead of the base64 payload.
pub fn bootstrap(
    config: &ProvisionerConfig,
    tls_bootstrap_token: &str,
    ca_bundle: &str,
    decode: bool,
) -> anyhow::Result<String> {
    let computed = config.computed_inputs(tls_bootstrap_token, ca_bundle);
    let vars = synthesize(&StaticBaseline::default(), &computed, &config.node)?;
    let payload = if decode {
        render_script(&vars)?
    } else {
        render(&vars)?
    };
    Ok(payload)
}

/// Read a CA bundle file and base64-encode it for the bootstrap record.
pub fn read_ca_bundle(path: &Path) -> anyhow::Result<String> {
    let pem = std::fs::read(path).with_context(|| format!("reading CA bundle {}", path.display()))?;
    Ok(STANDARD.encode(pem))
}

#[derive(Debug, Serialize)]
pub struct SelectedOffering {
    pub instance_type: String,
    pub zone: String,
    pub capacity_type: CapacityType,
    pub price: f64,
}

pub fn select(
    catalog_path: &Path,
    zone: Option<String>,
    capacity_type: Option<CapacityType>,
    min_cpu_millis: u64,
    min_memory_bytes: u64,
    min_gpus: u32,
) -> anyhow::Result<SelectedOffering> {
    let catalog = StaticCatalog::from_file(catalog_path)?;
    let constraints = SelectionConstraints {
        zone,
        capacity_type,
        min_resources: vmgrid_catalog::Resources::new(min_cpu_millis, min_memory_bytes, min_gpus),
    };
    let selection = select_offering(catalog.instance_types(), &constraints)?;
    Ok(SelectedOffering {
        instance_type: selection.instance_type.name.clone(),
        zone: selection.offering.zone.clone(),
        capacity_type: selection.offering.capacity_type,
        price: selection.offering.price,
    })
}

/// Build the garbage collector over an on-disk store and a file inventory.
pub fn garbage_collector(data_dir: &Path, inventory: &Path) -> anyhow::Result<GarbageCollector> {
    std::fs::create_dir_all(data_dir)?;
    let db_path = data_dir.join("vmgrid.redb");
    let store = StateStore::open(&db_path)?;
    info!(path = ?db_path, "state store opened");

    Ok(GarbageCollector::new(
        Arc::new(store),
        Arc::new(FileInventory::new(inventory)),
        Arc::new(SystemClock),
    ))
}

/// Run the garbage collector until Ctrl-C.
pub async fn run_gc(data_dir: &Path, inventory: &Path) -> anyhow::Result<()> {
    let gc = garbage_collector(data_dir, inventory)?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let handle = tokio::spawn(async move {
        gc.run(shutdown_rx).await;
    });

    tokio::signal::ctrl_c()
        .await
        .context("failed to install CTRL+C handler")?;
    info!("shutdown signal received");
    let _ = shutdown_tx.send(true);
    let _ = handle.await;

    info!("vmgrid daemon stopped");
    Ok(())
}
