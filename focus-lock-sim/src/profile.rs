//! Simulation profiles describing how a fake camera's 3A behaves.
//!
//! Profiles are plain JSON so odd device behaviour (no AE reporting, focus
//! that never locks) can be reproduced without hardware.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("failed to read profile: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse profile: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid profile: {0}")]
    Invalid(String),
}

/// How the simulated camera reports autofocus and auto-exposure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationProfile {
    /// Partial results emitted before each request's complete result.
    pub partials_per_request: u32,

    /// Frames spent in `ActiveScan` after an AF start trigger.
    pub af_scan_frames: u32,

    /// The scan ends `NotFocusedLocked` instead of `FocusedLocked`.
    pub focus_fails: bool,

    /// Include the AF state field in frame metadata.
    pub report_af: bool,

    /// Include the AE state field in frame metadata.
    pub report_ae: bool,

    /// Partial results carry the 3A fields too. When false only the complete
    /// result of each request reports them.
    pub fields_on_partials: bool,

    /// Exposure is already converged before any precapture.
    pub ae_converged: bool,

    /// Frames spent in `Precapture` after an AE precapture trigger.
    pub ae_precapture_frames: u32,

    /// Report every single-shot request as failed instead of emitting frames.
    pub fail_captures: bool,

    /// Delay between emitted frames.
    pub frame_interval_ms: u64,
}

impl SimulationProfile {
    pub fn from_json(json: &str) -> Result<Self, ProfileError> {
        let profile: Self = serde_json::from_str(json)?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn load(path: &Path) -> Result<Self, ProfileError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.partials_per_request > 64 {
            return Err(ProfileError::Invalid(format!(
                "too many partial results per request: {}",
                self.partials_per_request
            )));
        }
        if self.frame_interval_ms > 1000 {
            return Err(ProfileError::Invalid(format!(
                "frame interval too long: {} ms",
                self.frame_interval_ms
            )));
        }
        Ok(())
    }

    /// A device that omits the AE field entirely.
    pub fn without_ae() -> Self {
        Self {
            report_ae: false,
            ..Self::default()
        }
    }

    /// A device that only fills in 3A metadata on complete results.
    pub fn fields_on_complete_only() -> Self {
        Self {
            fields_on_partials: false,
            ..Self::default()
        }
    }

    /// A device whose exposure needs a precapture before it converges.
    pub fn needs_precapture() -> Self {
        Self {
            ae_converged: false,
            ..Self::default()
        }
    }
}

impl Default for SimulationProfile {
    fn default() -> Self {
        Self {
            partials_per_request: 3,
            af_scan_frames: 2,
            focus_fails: false,
            report_af: true,
            report_ae: true,
            fields_on_partials: true,
            ae_converged: true,
            ae_precapture_frames: 2,
            fail_captures: false,
            frame_interval_ms: 2,
        }
    }
}
