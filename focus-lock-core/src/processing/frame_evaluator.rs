//! Per-frame 3A evaluation.
//!
//! Pure decision logic: given the controller state and one frame, say what
//! the controller should do next. Side effects live in `FocusSession`.

use crate::models::frame::{AeState, AfState, CaptureFrame};
use crate::models::state::ControllerState;

/// Outcome of evaluating one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameVerdict {
    /// Not running a sequence; the frame is stray.
    Ignore,
    /// Nothing conclusive yet (field absent, scanning, not focused).
    KeepWaiting,
    /// Lens locked but exposure still moving: fire the precapture trigger.
    RunPrecapture,
    /// Focus and exposure are both settled.
    Ready,
}

/// Decide what `frame` means for a controller in `state`.
///
/// While awaiting focus lock, only `FocusedLocked` is conclusive. A missing AE
/// field is read as converged since some devices never report it. While
/// awaiting precapture the device is known to report AE, so only a frame
/// carrying a settled AE state completes the sequence.
pub fn evaluate(state: ControllerState, frame: &CaptureFrame) -> FrameVerdict {
    match state {
        ControllerState::AwaitingFocusLock => evaluate_focus_lock(frame),
        ControllerState::AwaitingPrecapture => evaluate_precapture(frame.ae_state),
        ControllerState::Idle | ControllerState::Ready | ControllerState::Releasing => {
            FrameVerdict::Ignore
        }
    }
}

fn evaluate_focus_lock(frame: &CaptureFrame) -> FrameVerdict {
    match frame.af_state {
        Some(AfState::FocusedLocked) => match frame.ae_state {
            None | Some(AeState::Converged) => FrameVerdict::Ready,
            Some(_) => FrameVerdict::RunPrecapture,
        },
        // NotFocusedLocked is final for this scan, but the sequence keeps
        // waiting rather than failing.
        Some(_) | None => FrameVerdict::KeepWaiting,
    }
}

fn evaluate_precapture(ae_state: Option<AeState>) -> FrameVerdict {
    match ae_state {
        Some(ae) if ae.is_settled() => FrameVerdict::Ready,
        Some(_) | None => FrameVerdict::KeepWaiting,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(af: Option<AfState>, ae: Option<AeState>) -> CaptureFrame {
        CaptureFrame {
            af_state: af,
            ae_state: ae,
            ..CaptureFrame::partial(1, 0)
        }
    }

    #[test]
    fn idle_ignores_everything() {
        let f = frame(Some(AfState::FocusedLocked), Some(AeState::Converged));
        assert_eq!(evaluate(ControllerState::Idle, &f), FrameVerdict::Ignore);
        assert_eq!(evaluate(ControllerState::Ready, &f), FrameVerdict::Ignore);
        assert_eq!(evaluate(ControllerState::Releasing, &f), FrameVerdict::Ignore);
    }

    #[test]
    fn locked_without_ae_is_ready() {
        let f = frame(Some(AfState::FocusedLocked), None);
        assert_eq!(evaluate(ControllerState::AwaitingFocusLock, &f), FrameVerdict::Ready);
    }

    #[test]
    fn locked_with_converged_ae_is_ready() {
        let f = frame(Some(AfState::FocusedLocked), Some(AeState::Converged));
        assert_eq!(evaluate(ControllerState::AwaitingFocusLock, &f), FrameVerdict::Ready);
    }

    #[test]
    fn locked_with_moving_ae_runs_precapture() {
        for ae in [
            AeState::Inactive,
            AeState::Searching,
            AeState::Locked,
            AeState::FlashRequired,
            AeState::Precapture,
        ] {
            let f = frame(Some(AfState::FocusedLocked), Some(ae));
            assert_eq!(
                evaluate(ControllerState::AwaitingFocusLock, &f),
                FrameVerdict::RunPrecapture,
                "ae = {:?}",
                ae
            );
        }
    }

    #[test]
    fn inconclusive_af_keeps_waiting() {
        for af in [
            None,
            Some(AfState::Inactive),
            Some(AfState::PassiveScan),
            Some(AfState::ActiveScan),
            Some(AfState::PassiveFocused),
            Some(AfState::PassiveUnfocused),
            Some(AfState::NotFocusedLocked),
        ] {
            let f = frame(af, Some(AeState::Converged));
            assert_eq!(
                evaluate(ControllerState::AwaitingFocusLock, &f),
                FrameVerdict::KeepWaiting,
                "af = {:?}",
                af
            );
        }
    }

    #[test]
    fn precapture_waits_for_settled_exposure() {
        let searching = frame(None, Some(AeState::Searching));
        let precapture = frame(None, Some(AeState::Precapture));
        let converged = frame(None, Some(AeState::Converged));
        let flash = frame(None, Some(AeState::FlashRequired));
        let absent = frame(Some(AfState::ActiveScan), None);

        let state = ControllerState::AwaitingPrecapture;
        assert_eq!(evaluate(state, &searching), FrameVerdict::KeepWaiting);
        assert_eq!(evaluate(state, &precapture), FrameVerdict::KeepWaiting);
        assert_eq!(evaluate(state, &converged), FrameVerdict::Ready);
        assert_eq!(evaluate(state, &flash), FrameVerdict::Ready);
        assert_eq!(evaluate(state, &absent), FrameVerdict::KeepWaiting);
    }
}
