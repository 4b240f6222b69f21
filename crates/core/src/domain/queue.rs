// Queue Domain Model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Queue identifier
pub type QueueName = String;

/// What happens when a batch submits requests to a queue that is already running
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdmissionPolicy {
    /// Wait in FIFO order behind the requests already admitted
    #[default]
    Wait,
    /// Fail the new batch's requests for that queue without performing I/O
    Reject,
    /// No mutual exclusion; only the running state is tracked
    Concurrent,
}

impl fmt::Display for AdmissionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdmissionPolicy::Wait => write!(f, "wait"),
            AdmissionPolicy::Reject => write!(f, "reject"),
            AdmissionPolicy::Concurrent => write!(f, "concurrent"),
        }
    }
}

impl FromStr for AdmissionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wait" => Ok(AdmissionPolicy::Wait),
            "reject" => Ok(AdmissionPolicy::Reject),
            "concurrent" => Ok(AdmissionPolicy::Concurrent),
            other => Err(format!("unknown queue admission policy: {}", other)),
        }
    }
}

/// Point-in-time view of a registered queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStatus {
    pub name: QueueName,
    pub running: bool,
    /// Requests admitted and not yet completed
    pub pending: usize,
}
