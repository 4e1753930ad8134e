use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::FocusError;
use super::frame::{AeState, AfState};

/// Summary of a focus sequence that reached `Ready`.
///
/// Serializable for JSON export to whoever drives the still capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusReport {
    pub sequence: u64,
    pub started_at: DateTime<Utc>,
    pub ready_at: DateTime<Utc>,
    pub frames_evaluated: u64,
    pub precapture_used: bool,
    pub af_state: Option<AfState>,
    pub ae_state: Option<AeState>,
}

impl FocusReport {
    pub fn to_json(&self) -> Result<String, FocusError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| FocusError::Serialization(format!("failed to serialize report: {}", e)))
    }

    /// Milliseconds from the lock command to the ready frame.
    pub fn lock_latency_ms(&self) -> i64 {
        (self.ready_at - self.started_at).num_milliseconds()
    }
}

/// Counters for debugging controller behaviour.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerDiagnostics {
    pub frames_received: u64,
    pub frames_ignored: u64,
    pub single_shot_submissions: u64,
    pub repeating_submissions: u64,
    pub device_errors: u64,
}
