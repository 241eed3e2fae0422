//! Network module for socket probes and local interface lookup

pub mod interface;
pub mod socket;

use crate::target::Target;
use serde::{Deserialize, Serialize};

/// Probe kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProbeKind {
    /// Outbound TCP connect to a remote endpoint
    External,
    /// Bind attempt on a local port
    Internal,
}

impl ProbeKind {
    pub fn of(target: &Target) -> Self {
        match target {
            Target::Address(_) => ProbeKind::External,
            Target::Port(_) => ProbeKind::Internal,
        }
    }
}

/// Human readable reading of a probe result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortStatus {
    /// Remote endpoint accepted a connection
    Open,
    /// Remote endpoint refused, was unreachable or timed out
    Closed,
    /// Local port is bound by someone else
    InUse,
    /// Local port could be bound
    Free,
}

impl PortStatus {
    pub fn new(kind: ProbeKind, result: bool) -> Self {
        match (kind, result) {
            (ProbeKind::External, true) => PortStatus::Open,
            (ProbeKind::External, false) => PortStatus::Closed,
            (ProbeKind::Internal, true) => PortStatus::InUse,
            (ProbeKind::Internal, false) => PortStatus::Free,
        }
    }

    /// The boolean this status was derived from
    pub fn is_up(&self) -> bool {
        matches!(self, PortStatus::Open | PortStatus::InUse)
    }
}

impl std::fmt::Display for PortStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortStatus::Open => write!(f, "open"),
            PortStatus::Closed => write!(f, "closed"),
            PortStatus::InUse => write!(f, "in use"),
            PortStatus::Free => write!(f, "free"),
        }
    }
}
