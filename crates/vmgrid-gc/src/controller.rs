//! Machine heartbeat and garbage collection.
//!
//! One pass:
//!
//! 1. list machines and live cloud inventory; either failing aborts the pass
//! 2. for every launched machine not already being deleted, stamp a
//!    heartbeat and mark `Ready` if its provider id is live, otherwise
//!    mark it `NotReady`
//! 3. machines unready for longer than [`GC_THRESHOLD`] are deleted
//!
//! Steps 2 and 3 each fan out over [`MAX_WORKERS`] workers and finish
//! before the next step starts. Per-machine failures are collected into a
//! [`CombinedError`] without stopping sibling work, and a machine that
//! disappears mid-pass is not a failure. Passes repeat every
//! [`REQUEUE_AFTER`] whatever the outcome.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use tokio::sync::watch;
use tracing::{debug, error, info};
use vmgrid_instance::InventorySource;
use vmgrid_instance::labels::LABEL_PROVISIONER_NAME;
use vmgrid_state::{CONDITION_READY, ConditionStatus, Machine, MachineClient, StateError};

use crate::clock::Clock;
use crate::error::{CombinedError, GcError, GcResult, Phase, RecordFailure};
use crate::parallel::parallelize;

/// Annotation stamped with the time a machine was last seen in inventory.
pub const HEARTBEAT_ANNOTATION: &str = "NodeHeartBeatTimeStamp";

/// How long a machine may stay unready before it is collected.
pub const GC_THRESHOLD: Duration = Duration::from_secs(6 * 60);

/// Delay between passes.
pub const REQUEUE_AFTER: Duration = Duration::from_secs(2 * 60);

/// Concurrent heartbeat or delete calls per phase.
pub const MAX_WORKERS: usize = 20;

const NOT_READY_REASON: &str = "NodeNotReady";
const NOT_READY_MESSAGE: &str = "Node status is NotReady";

/// Whether a machine with this `Ready` condition should be collected at `now`.
pub fn should_collect(
    status: ConditionStatus,
    last_transition_time: DateTime<Utc>,
    now: DateTime<Utc>,
) -> bool {
    if status == ConditionStatus::True {
        return false;
    }
    now.signed_duration_since(last_transition_time)
        .to_std()
        .is_ok_and(|unready_for| unready_for > GC_THRESHOLD)
}

/// What one pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Machines whose heartbeat was refreshed.
    pub heartbeats: usize,
    /// Machines marked `NotReady` this pass.
    pub not_ready: usize,
    /// Machines selected for collection, in list order.
    pub collected: Vec<String>,
}

struct Heartbeat {
    seen: bool,
    collect: Option<Machine>,
}

/// Keeps machine liveness in step with cloud inventory and deletes
/// machines whose VM has been gone for longer than [`GC_THRESHOLD`].
pub struct GarbageCollector {
    machines: Arc<dyn MachineClient>,
    inventory: Arc<dyn InventorySource>,
    clock: Arc<dyn Clock>,
}

impl GarbageCollector {
    pub fn new(
        machines: Arc<dyn MachineClient>,
        inventory: Arc<dyn InventorySource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            machines,
            inventory,
            clock,
        }
    }

    /// Run one heartbeat and collection pass.
    pub async fn reconcile(&self) -> GcResult<PassReport> {
        let machines = self.machines.list().await.map_err(GcError::ListMachines)?;
        let inventory = self
            .inventory
            .list()
            .await
            .map_err(GcError::ListInventory)?;

        let live: HashSet<String> = inventory
            .into_iter()
            .filter(|entry| !entry.deleting)
            .map(|entry| entry.provider_id)
            .collect();
        let eligible: Vec<Machine> = machines
            .into_iter()
            .filter(|m| m.is_launched() && !m.deletion_requested)
            .collect();

        let mut report = PassReport::default();
        let mut failures = CombinedError::default();
        let mut doomed = Vec::new();

        let live = &live;
        let heartbeats =
            parallelize(MAX_WORKERS, eligible, |machine| self.heartbeat(machine, live)).await;
        for outcome in heartbeats {
            match outcome {
                Ok(hb) => {
                    if hb.seen {
                        report.heartbeats += 1;
                    } else {
                        report.not_ready += 1;
                    }
                    doomed.extend(hb.collect);
                }
                Err(failure) => failures.failures.push(failure),
            }
        }
        debug!(heartbeats = report.heartbeats, "updated machine heartbeats");

        report.collected = doomed.iter().map(|m| m.name.clone()).collect();
        let deletions = parallelize(MAX_WORKERS, doomed, |machine| self.collect(machine)).await;
        failures.failures.extend(deletions.into_iter().filter_map(Result::err));

        if failures.is_empty() {
            Ok(report)
        } else {
            Err(GcError::Records(failures))
        }
    }

    async fn heartbeat(
        &self,
        machine: Machine,
        live: &HashSet<String>,
    ) -> Result<Heartbeat, RecordFailure> {
        let now = self.clock.now();
        let seen = machine.provider_id().is_some_and(|id| live.contains(id));

        let mut updated = machine.clone();
        if seen {
            updated.annotations.insert(
                HEARTBEAT_ANNOTATION.to_string(),
                now.to_rfc3339_opts(SecondsFormat::Secs, true),
            );
            updated.mark_true(CONDITION_READY, now);
        } else {
            updated.mark_false(CONDITION_READY, NOT_READY_REASON, NOT_READY_MESSAGE, now);
        }

        if let Err(e) = self.machines.patch(&updated, &machine).await {
            return heartbeat_error(&machine, seen, e);
        }
        if let Err(e) = self.machines.patch_status(&updated, &machine).await {
            return heartbeat_error(&machine, seen, e);
        }

        let collect = updated
            .get_condition(CONDITION_READY)
            .is_some_and(|ready| should_collect(ready.status, ready.last_transition_time, now))
            .then_some(updated);
        Ok(Heartbeat { seen, collect })
    }

    async fn collect(&self, machine: Machine) -> Result<(), RecordFailure> {
        match self.machines.delete(&machine).await {
            Ok(()) => {
                let provisioner = machine
                    .labels
                    .get(LABEL_PROVISIONER_NAME)
                    .map(String::as_str)
                    .unwrap_or_default();
                debug!(
                    provisioner,
                    machine = %machine.name,
                    provider_id = machine.provider_id().unwrap_or_default(),
                    "garbage collecting machine with no cloud representation for more than 6 minutes"
                );
                Ok(())
            }
            Err(e) if e.is_not_found() => Ok(()),
            Err(error) => Err(RecordFailure {
                machine: machine.name,
                phase: Phase::Delete,
                error,
            }),
        }
    }

    /// Run passes every [`REQUEUE_AFTER`] until `shutdown` changes.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            requeue_secs = REQUEUE_AFTER.as_secs(),
            "machine garbage collector started"
        );

        loop {
            match self.reconcile().await {
                Ok(report) => debug!(
                    heartbeats = report.heartbeats,
                    not_ready = report.not_ready,
                    collected = report.collected.len(),
                    "garbage collection pass complete"
                ),
                Err(e) => error!(error = %e, "garbage collection pass failed"),
            }

            tokio::select! {
                _ = tokio::time::sleep(REQUEUE_AFTER) => {}
                _ = shutdown.changed() => {
                    info!("machine garbage collector shutting down");
                    break;
                }
            }
        }
    }
}

/// A machine deleted mid-pass is already resolved.
fn heartbeat_error(
    machine: &Machine,
    seen: bool,
    error: StateError,
) -> Result<Heartbeat, RecordFailure> {
    if error.is_not_found() {
        Ok(Heartbeat {
            seen,
            collect: None,
        })
    } else {
        Err(RecordFailure {
            machine: machine.name.clone(),
            phase: Phase::Heartbeat,
            error,
        })
    }
}
