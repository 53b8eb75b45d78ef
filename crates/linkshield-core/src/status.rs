//! Link status updates emitted by the supervision worker

use serde::{Deserialize, Serialize};

/// A snapshot of the protected link's authentication state
///
/// One update is emitted per worker cycle on monitored runs: successful
/// authentication, failed attempts, and steady-state re-verification alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkStatus {
    /// Whether the link is currently authenticated
    pub authenticated: bool,
    /// Worker cycle that produced this update, starting at 1 for the
    /// first cycle of a run
    pub cycle: u64,
}

impl LinkStatus {
    /// Create a status snapshot for a given worker cycle
    pub fn new(authenticated: bool, cycle: u64) -> Self {
        Self {
            authenticated,
            cycle,
        }
    }
}
