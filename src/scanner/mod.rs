//! Scanner module containing the probe dispatcher

pub mod engine;

use crate::network::{PortStatus, ProbeKind};
use crate::target::Target;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use engine::{probe_many, probe_one, ProbeCallback, ProbeEngine};

/// Ordered results of one probe batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeReport {
    /// Targets in the order they were supplied
    pub targets: Vec<Target>,

    /// One result per target, same order
    pub results: Vec<bool>,

    /// Wall-clock duration of the whole batch
    pub duration: Duration,
}

impl ProbeReport {
    pub fn new(targets: Vec<Target>, results: Vec<bool>, duration: Duration) -> Self {
        debug_assert_eq!(targets.len(), results.len());
        Self {
            targets,
            results,
            duration,
        }
    }

    /// Iterate over `(target, status)` pairs in input order
    pub fn entries(&self) -> impl Iterator<Item = (&Target, PortStatus)> + '_ {
        self.targets
            .iter()
            .zip(self.results.iter())
            .map(|(target, &result)| (target, PortStatus::new(ProbeKind::of(target), result)))
    }

    /// Number of targets that were reachable or occupied
    pub fn up_count(&self) -> usize {
        self.results.iter().filter(|&&up| up).count()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
