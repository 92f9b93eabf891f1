//! vmgrid-gc — machine heartbeats and garbage collection.
//!
//! Periodically compares the desired-state machines against live cloud
//! inventory. Machines whose VM is visible get a fresh heartbeat and a
//! `Ready` condition; machines whose VM has been missing for more than six
//! minutes are deleted.

pub mod clock;
pub mod controller;
pub mod error;
pub mod parallel;

pub use clock::{Clock, FakeClock, SystemClock};
pub use controller::{
    GC_THRESHOLD, GarbageCollector, HEARTBEAT_ANNOTATION, MAX_WORKERS, PassReport, REQUEUE_AFTER,
    should_collect,
};
pub use error::{CombinedError, GcError, GcResult, Phase, RecordFailure};
pub use parallel::parallelize;
