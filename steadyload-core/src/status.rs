#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a single run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[repr(u8)]
pub enum RunState {
    /// Accepted and holding the run slot, pacing not started yet.
    Idle = 0,
    Active = 1,
    /// Pacing stopped; waiting on in-flight requests.
    Draining = 2,
    Completed = 3,
}

impl From<u8> for RunState {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Active,
            2 => Self::Draining,
            _ => Self::Completed,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Active => "active",
            Self::Draining => "draining",
            Self::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Point-in-time view of a run, for progress reporting.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RunStatus {
    pub id: String,
    pub url: String,
    pub qps: u32,
    pub duration: u32,
    pub state: RunState,
    pub planned: u64,
    pub dispatched: u64,
    pub completed: u64,
    pub cancelled: bool,
    pub elapsed_seconds: f64,
}
