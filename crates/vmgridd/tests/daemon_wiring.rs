//! End-to-end wiring of the daemon subcommands over real files.

use std::io::Write;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{TimeDelta, Utc};
use vmgrid_catalog::CapacityType;
use vmgrid_gc::{GcError, HEARTBEAT_ANNOTATION};
use vmgrid_state::{CONDITION_LAUNCHED, CONDITION_READY, ConditionStatus, Machine, StateStore};
use vmgridd::ProvisionerConfig;
use vmgridd::commands;

const CONFIG: &str = r#"
[cluster]
tenant_id = "tenant"
subscription_id = "sub"
location = "westus"
resource_group = "MC_rg_cluster_westus"
cluster_id = "12345678"
api_server_name = "cluster-dns.hcp.westus.azmk8s.io"
kubernetes_version = "1.29.1"

[node]
agent_pool_name = "gpu"

[node.labels]
team = "ml"

[kube_binary]
latest = "1.29.1-hotfix.20240101"
"#;

#[test]
fn bootstrap_from_config_file() {
    let mut config_file = tempfile::NamedTempFile::new().unwrap();
    config_file.write_all(CONFIG.as_bytes()).unwrap();
    let mut ca_file = tempfile::NamedTempFile::new().unwrap();
    ca_file.write_all(b"-----BEGIN CERTIFICATE-----\n").unwrap();

    let config = ProvisionerConfig::from_file(config_file.path()).unwrap();
    let ca_bundle = commands::read_ca_bundle(ca_file.path()).unwrap();
    assert_eq!(
        STANDARD.decode(&ca_bundle).unwrap(),
        b"-----BEGIN CERTIFICATE-----\n"
    );

    let payload = commands::bootstrap(&config, "abc.def", &ca_bundle, false).unwrap();
    let script = String::from_utf8(STANDARD.decode(payload.trim()).unwrap()).unwrap();
    assert!(script.starts_with("#!/bin/bash"));
    assert!(script.contains("1.29.1-hotfix.20240101"));
    assert!(script.contains("TLS_BOOTSTRAP_TOKEN=\"abc.def\""));
    assert!(script.contains("team=ml"));

    let plain = commands::bootstrap(&config, "abc.def", &ca_bundle, true).unwrap();
    assert_eq!(plain, script);
}

#[test]
fn select_from_catalog_file() {
    let mut catalog = tempfile::NamedTempFile::new().unwrap();
    catalog
        .write_all(
            br#"[
  {
    "name": "Standard_D2s_v3",
    "capacity": {"cpu_millis": 2000, "memory_bytes": 8589934592},
    "allocatable": {"cpu_millis": 1900, "memory_bytes": 7000000000},
    "offerings": [
      {"price": 0.096, "zone": "westus-1", "capacity_type": "regular", "available": true},
      {"price": 0.019, "zone": "westus-2", "capacity_type": "spot", "available": true}
    ]
  },
  {
    "name": "Standard_D4s_v3",
    "capacity": {"cpu_millis": 4000, "memory_bytes": 17179869184},
    "allocatable": {"cpu_millis": 3860, "memory_bytes": 14000000000},
    "offerings": [
      {"price": 0.038, "zone": "westus-2", "capacity_type": "spot", "available": true},
      {"price": 0.192, "zone": "westus-3", "capacity_type": "regular", "available": true}
    ]
  }
]"#,
        )
        .unwrap();

    let cheapest = commands::select(catalog.path(), None, None, 0, 0, 0).unwrap();
    assert_eq!(cheapest.instance_type, "Standard_D2s_v3");
    assert_eq!(cheapest.capacity_type, CapacityType::Spot);

    let regular = commands::select(
        catalog.path(),
        None,
        Some(CapacityType::Regular),
        3000,
        0,
        0,
    )
    .unwrap();
    assert_eq!(regular.instance_type, "Standard_D4s_v3");
    assert_eq!(regular.zone, "westus-3");

    let json = serde_json::to_value(&regular).unwrap();
    assert_eq!(json["capacity_type"], "regular");

    assert!(commands::select(catalog.path(), Some("eastus-1".into()), None, 0, 0, 0).is_err());
}

fn launched(name: &str, provider_id: &str) -> Machine {
    let mut machine = Machine::new(name);
    machine.status.provider_id = Some(provider_id.to_string());
    machine.mark_true(CONDITION_LAUNCHED, Utc::now());
    machine
}

#[tokio::test]
async fn gc_pass_over_disk_store_and_inventory_file() {
    let data_dir = tempfile::tempdir().unwrap();
    let db_path = data_dir.path().join("vmgrid.redb");

    {
        let store = StateStore::open(&db_path).unwrap();
        store.put_machine(&launched("alive", "azure:///vms/alive")).unwrap();
        store.put_machine(&launched("fresh", "azure:///vms/fresh")).unwrap();

        let mut stale = launched("stale", "azure:///vms/stale");
        stale.mark_false(
            CONDITION_READY,
            "NodeNotReady",
            "Node status is NotReady",
            Utc::now() - TimeDelta::minutes(10),
        );
        store.put_machine(&stale).unwrap();
    }

    let mut inventory = tempfile::NamedTempFile::new().unwrap();
    inventory
        .write_all(br#"[{"provider_id": "azure:///vms/alive"}]"#)
        .unwrap();

    let gc = commands::garbage_collector(data_dir.path(), inventory.path()).unwrap();
    let report = gc.reconcile().await.unwrap();
    assert_eq!(report.heartbeats, 1);
    assert_eq!(report.not_ready, 2);
    assert_eq!(report.collected, vec!["stale".to_string()]);
    drop(gc);

    let store = StateStore::open(&db_path).unwrap();
    let alive = store.get_machine("alive").unwrap().unwrap();
    assert!(alive.annotations.contains_key(HEARTBEAT_ANNOTATION));
    assert!(alive.is_happy());

    let fresh = store.get_machine("fresh").unwrap().unwrap();
    assert_eq!(
        fresh.get_condition(CONDITION_READY).unwrap().status,
        ConditionStatus::False
    );
    assert!(store.get_machine("stale").unwrap().is_none());
}

#[tokio::test]
async fn gc_pass_fails_on_missing_inventory() {
    let data_dir = tempfile::tempdir().unwrap();
    let missing = data_dir.path().join("missing.json");
    let gc = commands::garbage_collector(data_dir.path(), &missing).unwrap();
    assert!(matches!(
        gc.reconcile().await,
        Err(GcError::ListInventory(_))
    ));
}
