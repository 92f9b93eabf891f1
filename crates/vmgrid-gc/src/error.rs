//! Error types for the garbage collector.

use std::fmt;

use thiserror::Error;
use vmgrid_instance::InstanceError;
use vmgrid_state::StateError;

/// Result type alias for garbage collection passes.
pub type GcResult<T> = Result<T, GcError>;

#[derive(Debug, Error)]
pub enum GcError {
    /// Nothing was touched; the next pass retries.
    #[error("failed to list machines: {0}")]
    ListMachines(StateError),

    /// Nothing was touched; the next pass retries.
    #[error("failed to list cloud inventory: {0}")]
    ListInventory(InstanceError),

    /// Some machines failed; their siblings were still processed.
    #[error(transparent)]
    Records(CombinedError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Heartbeat,
    Delete,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Heartbeat => write!(f, "heartbeat"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

#[derive(Debug)]
pub struct RecordFailure {
    pub machine: String,
    pub phase: Phase,
    pub error: StateError,
}

impl fmt::Display for RecordFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "machine {} ({}): {}", self.machine, self.phase, self.error)
    }
}

/// Every per-machine failure of one pass.
#[derive(Debug, Default)]
pub struct CombinedError {
    pub failures: Vec<RecordFailure>,
}

impl CombinedError {
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn machines(&self) -> impl Iterator<Item = &str> {
        self.failures.iter().map(|f| f.machine.as_str())
    }
}

impl fmt::Display for CombinedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} machine operation(s) failed", self.failures.len())?;
        for (i, failure) in self.failures.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{failure}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CombinedError {}
