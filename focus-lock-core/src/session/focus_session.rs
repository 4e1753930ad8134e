use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::models::config::ControllerConfiguration;
use crate::models::error::FocusError;
use crate::models::frame::CaptureFrame;
use crate::models::report::{ControllerDiagnostics, FocusReport};
use crate::models::request::{AfTrigger, CaptureRequest, PrecaptureTrigger, RequestTemplate};
use crate::models::session::SessionHandle;
use crate::models::state::{ControllerState, HostSignal};
use crate::processing::frame_evaluator::{self, FrameVerdict};
use crate::traits::capture_device::{CaptureDevice, CaptureListener};
use crate::traits::focus_delegate::FocusDelegate;

/// Bookkeeping for the focus sequence currently in flight.
struct SequenceStats {
    started_at: DateTime<Utc>,
    frames_evaluated: u64,
    precapture_used: bool,
}

impl SequenceStats {
    fn new() -> Self {
        Self {
            started_at: Utc::now(),
            frames_evaluated: 0,
            precapture_used: false,
        }
    }
}

/// Focus/exposure lock state machine.
///
/// Owns the live capture request and the controller state. Every method runs
/// on the caller's thread and mutates in place, so a `FocusSession` must have
/// a single owner; `FocusController` wraps one in an actor thread.
///
/// ```text
/// lock_focus ─→ [AF trigger START, single-shot] ─→ frames ─→ evaluate
///                                                     │
///               [AE precapture START, single-shot] ←──┤ locked, AE moving
///                                                     │
///                                   Ready + on_ready ←┘ locked, AE settled
/// ```
pub struct FocusSession<D: CaptureDevice> {
    device: Arc<D>,
    listener: Arc<dyn CaptureListener>,
    delegate: Option<Arc<dyn FocusDelegate>>,
    settings: ControllerConfiguration,
    request: CaptureRequest,
    state: Arc<Mutex<ControllerState>>,
    session: Option<SessionHandle>,
    sequence: u64,
    stats: Option<SequenceStats>,
    diagnostics: ControllerDiagnostics,
}

impl<D: CaptureDevice> FocusSession<D> {
    pub fn new(
        device: Arc<D>,
        listener: Arc<dyn CaptureListener>,
        settings: ControllerConfiguration,
    ) -> Result<Self, FocusError> {
        settings.validate().map_err(FocusError::ConfigurationFailed)?;

        let request = device
            .create_capture_request(RequestTemplate::Preview)?
            .with_baseline(&settings.baseline());

        Ok(Self {
            device,
            listener,
            delegate: None,
            settings,
            request,
            state: Arc::new(Mutex::new(ControllerState::Idle)),
            session: None,
            sequence: 0,
            stats: None,
            diagnostics: ControllerDiagnostics::default(),
        })
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn FocusDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn state(&self) -> ControllerState {
        *self.state.lock()
    }

    /// Shared slot other threads can read the state from.
    pub fn state_slot(&self) -> Arc<Mutex<ControllerState>> {
        Arc::clone(&self.state)
    }

    /// The live request every submission is derived from.
    pub fn request(&self) -> &CaptureRequest {
        &self.request
    }

    pub fn session_handle(&self) -> Option<&SessionHandle> {
        self.session.as_ref()
    }

    /// Number of the current (or last) focus sequence.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn diagnostics(&self) -> &ControllerDiagnostics {
        &self.diagnostics
    }

    // --- Commands ---

    /// Start a focus sequence. Transitions: idle → awaiting_focus_lock.
    pub fn lock_focus(&mut self) -> Result<(), FocusError> {
        let state = self.state();
        if !state.is_idle() {
            return Err(FocusError::InvalidState(format!(
                "can only lock focus from idle state (currently {})",
                state
            )));
        }
        if self.session.is_none() {
            return Err(FocusError::SessionUnavailable);
        }

        self.sequence += 1;
        self.stats = Some(SequenceStats::new());
        self.request = self
            .request
            .clone()
            .with_tag(self.sequence)
            .with_af_trigger(AfTrigger::Start);
        self.set_state(ControllerState::AwaitingFocusLock);

        let result = self.submit_once();
        self.report("lock_focus", result);
        Ok(())
    }

    /// Drop the lock and restore the preview stream. Valid from any state.
    ///
    /// Sends the AF cancel as its own single-shot request, then the baseline
    /// (triggers cleared) as the new repeating request.
    pub fn unlock_focus(&mut self) {
        self.set_state(ControllerState::Releasing);

        self.request = self
            .request
            .clone()
            .with_precapture_trigger(PrecaptureTrigger::Idle)
            .with_af_trigger(AfTrigger::Cancel);
        if self.session.is_some() {
            let result = self.submit_once();
            self.report("unlock_focus: cancel", result);
        }

        self.apply_baseline();
        if self.session.is_some() {
            let result = self.submit_repeating();
            self.report("unlock_focus: preview", result);
        } else {
            log::debug!("unlock_focus: no session, preview not restored");
        }

        self.stats = None;
        self.set_state(ControllerState::Idle);
    }

    pub fn set_auto_focus(&mut self, enabled: bool) {
        self.settings.auto_focus = enabled;
        self.refresh_preview("set_auto_focus");
    }

    pub fn set_flash(&mut self, enabled: bool) {
        self.settings.flash = enabled;
        self.refresh_preview("set_flash");
    }

    /// Rebuild orientation, flash and AF mode from the current settings.
    /// Clears both triggers; idempotent.
    pub fn apply_baseline(&mut self) {
        let baseline = self.settings.baseline();
        self.request = self.request.clone().with_baseline(&baseline);
    }

    // --- Session host events ---

    pub fn on_session_established(&mut self, handle: SessionHandle) {
        log::info!("capture session established: {}", handle);
        self.session = Some(handle);
        self.apply_baseline();
        let result = self.submit_repeating();
        self.report("on_session_established", result);
    }

    /// Forced reset: clear the handle and go idle. Later submissions are
    /// rejected until the session is established again.
    pub fn on_session_failed(&mut self) {
        log::warn!("capture session failed to configure");
        self.session = None;
        self.stats = None;
        self.apply_baseline();
        self.set_state(ControllerState::Idle);

        if let Some(ref delegate) = self.delegate {
            delegate.on_error(&FocusError::ConfigurationFailed(
                "capture session failed to configure".into(),
            ));
        }
    }

    pub fn on_external_signal(&mut self, signal: HostSignal) {
        match signal {
            HostSignal::ReleaseFocus => {
                let state = self.state();
                if !state.is_ready() {
                    log::debug!("release requested while {}", state);
                }
                self.unlock_focus();
            }
            HostSignal::RequestPhoto => {
                log::debug!("photo requested while {}", self.state());
            }
        }
    }

    // --- Device results ---

    /// Run one frame (partial or complete) through the evaluator.
    ///
    /// Frames arriving while idle, or tagged with a superseded sequence,
    /// change nothing.
    pub fn process_frame(&mut self, frame: &CaptureFrame) -> FrameVerdict {
        self.diagnostics.frames_received += 1;

        let state = self.state();
        if !state.is_awaiting_frames() || frame.tag != self.sequence {
            self.diagnostics.frames_ignored += 1;
            log::debug!(
                "ignoring frame {} (tag {}, sequence {}, state {})",
                frame.frame_number,
                frame.tag,
                self.sequence,
                state
            );
            return FrameVerdict::Ignore;
        }

        if let Some(ref mut stats) = self.stats {
            stats.frames_evaluated += 1;
        }

        let verdict = frame_evaluator::evaluate(state, frame);
        log::debug!(
            "frame {} ({:?}) af={:?} ae={:?} → {:?}",
            frame.frame_number,
            frame.kind,
            frame.af_state,
            frame.ae_state,
            verdict
        );

        match verdict {
            FrameVerdict::RunPrecapture => self.run_precapture(),
            FrameVerdict::Ready => self.finish_sequence(frame),
            FrameVerdict::KeepWaiting | FrameVerdict::Ignore => {}
        }
        verdict
    }

    /// A single-shot request was dropped. The sequence halts where it is.
    pub fn on_capture_failed(&mut self, tag: u64, reason: &str) {
        if tag != self.sequence || !self.state().is_awaiting_frames() {
            log::debug!("ignoring failure of stale request {}: {}", tag, reason);
            return;
        }
        log::error!("capture for sequence {} failed: {}", tag, reason);
        if let Some(ref delegate) = self.delegate {
            delegate.on_error(&FocusError::CaptureFailed(reason.to_string()));
        }
    }

    // --- Internal helpers ---

    fn run_precapture(&mut self) {
        self.request = self
            .request
            .clone()
            .with_precapture_trigger(PrecaptureTrigger::Start);
        if let Some(ref mut stats) = self.stats {
            stats.precapture_used = true;
        }
        self.set_state(ControllerState::AwaitingPrecapture);

        let result = self.submit_once();
        self.report("run_precapture", result);
    }

    fn finish_sequence(&mut self, frame: &CaptureFrame) {
        self.set_state(ControllerState::Ready);

        let Some(stats) = self.stats.take() else {
            return;
        };
        let report = FocusReport {
            sequence: self.sequence,
            started_at: stats.started_at,
            ready_at: Utc::now(),
            frames_evaluated: stats.frames_evaluated,
            precapture_used: stats.precapture_used,
            af_state: frame.af_state,
            ae_state: frame.ae_state,
        };
        log::info!(
            "sequence {} ready after {} frames ({} ms)",
            report.sequence,
            report.frames_evaluated,
            report.lock_latency_ms()
        );
        if let Some(ref delegate) = self.delegate {
            delegate.on_ready(&report);
        }
    }

    /// Push toggle changes to the preview. Deferred while a sequence runs so
    /// the armed triggers are not overwritten; release reapplies the baseline.
    fn refresh_preview(&mut self, context: &str) {
        let state = self.state();
        if !state.is_idle() {
            log::debug!("{}: deferred until release ({})", context, state);
            return;
        }
        self.apply_baseline();
        if self.session.is_none() {
            log::debug!("{}: no session, preview not refreshed", context);
            return;
        }
        let result = self.submit_repeating();
        self.report(context, result);
    }

    fn submit_once(&mut self) -> Result<(), FocusError> {
        let session = self.session.as_ref().ok_or(FocusError::SessionUnavailable)?;
        self.device
            .submit_once(session, self.request.clone(), Arc::clone(&self.listener))?;
        self.diagnostics.single_shot_submissions += 1;
        Ok(())
    }

    fn submit_repeating(&mut self) -> Result<(), FocusError> {
        let session = self.session.as_ref().ok_or(FocusError::SessionUnavailable)?;
        self.device.submit_repeating(session, self.request.clone())?;
        self.diagnostics.repeating_submissions += 1;
        Ok(())
    }

    /// Submission failures are logged and swallowed; the sequence halts.
    fn report(&mut self, context: &str, result: Result<(), FocusError>) {
        let Err(error) = result else {
            return;
        };
        log::error!("{}: {}", context, error);
        if matches!(error, FocusError::DeviceAccess(_)) {
            self.diagnostics.device_errors += 1;
        }
        if let Some(ref delegate) = self.delegate {
            delegate.on_error(&error);
        }
    }

    fn set_state(&self, new_state: ControllerState) {
        let previous = {
            let mut slot = self.state.lock();
            std::mem::replace(&mut *slot, new_state)
        };
        if previous != new_state {
            log::info!("focus state: {} → {}", previous, new_state);
        }
        if let Some(ref delegate) = self.delegate {
            delegate.on_state_changed(&new_state);
        }
    }
}
