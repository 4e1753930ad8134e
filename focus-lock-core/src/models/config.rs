use serde::{Deserialize, Serialize};

use super::request::Baseline;

/// Configuration for a focus controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfiguration {
    /// JPEG orientation written into every request (default: 270).
    pub jpeg_orientation: u32,

    /// Continuous autofocus in the preview stream (default: true).
    pub auto_focus: bool,

    /// Torch on in the preview stream (default: false).
    pub flash: bool,

    /// Capacity of the bounded queue feeding the controller thread (default: 64).
    pub frame_queue_capacity: usize,
}

impl ControllerConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if ![0, 90, 180, 270].contains(&self.jpeg_orientation) {
            return Err(format!("unsupported orientation: {}", self.jpeg_orientation));
        }
        if self.frame_queue_capacity == 0 {
            return Err("frame queue capacity must be positive".into());
        }
        Ok(())
    }

    pub fn baseline(&self) -> Baseline {
        Baseline {
            jpeg_orientation: self.jpeg_orientation,
            flash: self.flash,
            auto_focus: self.auto_focus,
        }
    }
}

impl Default for ControllerConfiguration {
    fn default() -> Self {
        Self {
            jpeg_orientation: 270,
            auto_focus: true,
            flash: false,
            frame_queue_capacity: 64,
        }
    }
}
