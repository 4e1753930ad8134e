use serde::{Deserialize, Serialize};

/// Autofocus state reported in a frame's metadata.
///
/// Discriminants follow the camera HAL numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AfState {
    Inactive,
    PassiveScan,
    PassiveFocused,
    ActiveScan,
    FocusedLocked,
    NotFocusedLocked,
    PassiveUnfocused,
}

impl AfState {
    /// Unknown values are treated as an absent field.
    pub fn from_raw(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Inactive),
            1 => Some(Self::PassiveScan),
            2 => Some(Self::PassiveFocused),
            3 => Some(Self::ActiveScan),
            4 => Some(Self::FocusedLocked),
            5 => Some(Self::NotFocusedLocked),
            6 => Some(Self::PassiveUnfocused),
            _ => None,
        }
    }
}

/// Auto-exposure state reported in a frame's metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AeState {
    Inactive,
    Searching,
    Converged,
    Locked,
    FlashRequired,
    Precapture,
}

impl AeState {
    pub fn from_raw(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Inactive),
            1 => Some(Self::Searching),
            2 => Some(Self::Converged),
            3 => Some(Self::Locked),
            4 => Some(Self::FlashRequired),
            5 => Some(Self::Precapture),
            _ => None,
        }
    }

    /// Exposure will not move any further without a new trigger.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Converged | Self::Locked | Self::FlashRequired)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameKind {
    /// Delivered before the request's final result.
    Partial,
    /// The request's final result.
    Complete,
}

/// Per-frame capture metadata delivered by the device.
///
/// Both 3A fields are optional: devices without the capability omit them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureFrame {
    pub kind: FrameKind,
    /// Tag of the request that produced this frame.
    pub tag: u64,
    pub frame_number: u64,
    #[serde(default)]
    pub af_state: Option<AfState>,
    #[serde(default)]
    pub ae_state: Option<AeState>,
}

impl CaptureFrame {
    pub fn partial(tag: u64, frame_number: u64) -> Self {
        Self {
            kind: FrameKind::Partial,
            tag,
            frame_number,
            af_state: None,
            ae_state: None,
        }
    }

    pub fn complete(tag: u64, frame_number: u64) -> Self {
        Self {
            kind: FrameKind::Complete,
            ..Self::partial(tag, frame_number)
        }
    }

    pub fn with_af(mut self, state: AfState) -> Self {
        self.af_state = Some(state);
        self
    }

    pub fn with_ae(mut self, state: AeState) -> Self {
        self.ae_state = Some(state);
        self
    }

    pub fn is_partial(&self) -> bool {
        self.kind == FrameKind::Partial
    }
}
