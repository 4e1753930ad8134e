use serde::{Deserialize, Serialize};

/// Template a capture request is created from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestTemplate {
    Preview,
    StillCapture,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashMode {
    #[default]
    Off,
    Torch,
}

impl FlashMode {
    pub fn from_toggle(enabled: bool) -> Self {
        if enabled {
            Self::Torch
        } else {
            Self::Off
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AfMode {
    Off,
    #[default]
    ContinuousPicture,
}

impl AfMode {
    pub fn from_toggle(enabled: bool) -> Self {
        if enabled {
            Self::ContinuousPicture
        } else {
            Self::Off
        }
    }
}

/// One-shot autofocus command embedded in a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AfTrigger {
    #[default]
    Idle,
    Start,
    Cancel,
}

/// One-shot auto-exposure precapture command embedded in a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrecaptureTrigger {
    #[default]
    Idle,
    Start,
}

/// User-facing settings the preview stream is rebuilt from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Baseline {
    pub jpeg_orientation: u32,
    pub flash: bool,
    pub auto_focus: bool,
}

/// The request handed to the capture device.
///
/// The controller keeps one live value and derives every submission from it
/// with the `with_*` transforms; the device receives a snapshot by value.
/// `revision` only moves when a transform actually changes a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRequest {
    pub template: RequestTemplate,
    pub revision: u64,
    /// Focus sequence this request belongs to. Echoed back in frames.
    pub tag: u64,
    pub jpeg_orientation: u32,
    pub flash_mode: FlashMode,
    pub af_mode: AfMode,
    pub af_trigger: AfTrigger,
    pub precapture_trigger: PrecaptureTrigger,
}

impl CaptureRequest {
    pub fn new(template: RequestTemplate) -> Self {
        Self {
            template,
            revision: 0,
            tag: 0,
            jpeg_orientation: 0,
            flash_mode: FlashMode::default(),
            af_mode: AfMode::default(),
            af_trigger: AfTrigger::default(),
            precapture_trigger: PrecaptureTrigger::default(),
        }
    }

    /// Orientation, flash and AF mode from `baseline`; both triggers back to idle.
    pub fn with_baseline(self, baseline: &Baseline) -> Self {
        let mut next = self.clone();
        next.jpeg_orientation = baseline.jpeg_orientation;
        next.flash_mode = FlashMode::from_toggle(baseline.flash);
        next.af_mode = AfMode::from_toggle(baseline.auto_focus);
        next.af_trigger = AfTrigger::Idle;
        next.precapture_trigger = PrecaptureTrigger::Idle;
        self.advance(next)
    }

    pub fn with_af_trigger(self, trigger: AfTrigger) -> Self {
        let mut next = self.clone();
        next.af_trigger = trigger;
        self.advance(next)
    }

    pub fn with_precapture_trigger(self, trigger: PrecaptureTrigger) -> Self {
        let mut next = self.clone();
        next.precapture_trigger = trigger;
        self.advance(next)
    }

    pub fn with_tag(self, tag: u64) -> Self {
        let mut next = self.clone();
        next.tag = tag;
        self.advance(next)
    }

    /// Whether any one-shot trigger is armed.
    pub fn has_trigger(&self) -> bool {
        self.af_trigger != AfTrigger::Idle || self.precapture_trigger != PrecaptureTrigger::Idle
    }

    fn advance(self, mut next: Self) -> Self {
        if next == self {
            return self;
        }
        next.revision = self.revision + 1;
        next
    }
}
