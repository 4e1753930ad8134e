use serde::{Deserialize, Serialize};

/// Focus/exposure lock state machine.
///
/// State transitions:
/// ```text
/// idle → awaiting_focus_lock → ready → releasing → idle
///               ↓                ↑
///        awaiting_precapture ────┘
///
/// any state → idle   (session configure failure, unlock)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerState {
    /// No focus sequence running.
    #[default]
    Idle,
    /// AF trigger sent, waiting for a frame reporting a locked lens.
    AwaitingFocusLock,
    /// AE precapture trigger sent, waiting for exposure to settle.
    AwaitingPrecapture,
    /// Focus (and exposure) locked; still capture may proceed.
    Ready,
    /// Cancel + baseline restore in progress.
    Releasing,
}

impl ControllerState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Whether frames delivered in this state are evaluated.
    pub fn is_awaiting_frames(&self) -> bool {
        matches!(self, Self::AwaitingFocusLock | Self::AwaitingPrecapture)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingFocusLock => "awaiting_focus_lock",
            Self::AwaitingPrecapture => "awaiting_precapture",
            Self::Ready => "ready",
            Self::Releasing => "releasing",
        }
    }
}

impl std::fmt::Display for ControllerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// State-change signals delivered by the session host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostSignal {
    /// The host wants a still once focus is ready. Informational only.
    RequestPhoto,
    /// The still has been taken (or abandoned); drop the lock.
    ReleaseFocus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_idle() {
        assert_eq!(ControllerState::default(), ControllerState::Idle);
        assert!(ControllerState::default().is_idle());
    }

    #[test]
    fn only_awaiting_states_evaluate_frames() {
        assert!(ControllerState::AwaitingFocusLock.is_awaiting_frames());
        assert!(ControllerState::AwaitingPrecapture.is_awaiting_frames());
        assert!(!ControllerState::Idle.is_awaiting_frames());
        assert!(!ControllerState::Ready.is_awaiting_frames());
        assert!(!ControllerState::Releasing.is_awaiting_frames());
    }

    #[test]
    fn serializes_snake_case() {
        let json = serde_json::to_string(&ControllerState::AwaitingFocusLock).unwrap();
        assert_eq!(json, "\"awaiting_focus_lock\"");
        assert_eq!(ControllerState::AwaitingPrecapture.to_string(), "awaiting_precapture");
    }
}
