//! Simulated camera device.
//!
//! Accepts capture requests like a real device and produces 3A metadata on a
//! dedicated result thread, following a `SimulationProfile`.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use focus_lock_core::models::error::FocusError;
use focus_lock_core::models::frame::{AeState, AfState, CaptureFrame, FrameKind};
use focus_lock_core::models::request::{AfMode, AfTrigger, CaptureRequest, PrecaptureTrigger, RequestTemplate};
use focus_lock_core::models::session::SessionHandle;
use focus_lock_core::traits::capture_device::{CaptureDevice, CaptureListener};

use crate::profile::SimulationProfile;

/// A single-shot request waiting for the result thread.
struct Job {
    request: CaptureRequest,
    listener: Arc<dyn CaptureListener>,
}

/// Autofocus / auto-exposure behaviour, advanced one step per emitted frame.
struct ThreeAModel {
    profile: SimulationProfile,
    frame_number: u64,
    af_mode: AfMode,
    scan_remaining: Option<u32>,
    af_result: Option<AfState>,
    ae_converged: bool,
    precapture_remaining: Option<u32>,
}

impl ThreeAModel {
    fn new(profile: SimulationProfile) -> Self {
        let ae_converged = profile.ae_converged;
        Self {
            profile,
            frame_number: 0,
            af_mode: AfMode::ContinuousPicture,
            scan_remaining: None,
            af_result: None,
            ae_converged,
            precapture_remaining: None,
        }
    }

    /// Latch the triggers carried by `request`.
    fn apply(&mut self, request: &CaptureRequest) {
        self.af_mode = request.af_mode;

        match request.af_trigger {
            AfTrigger::Start => {
                self.scan_remaining = Some(self.profile.af_scan_frames);
                self.af_result = None;
            }
            AfTrigger::Cancel => {
                self.scan_remaining = None;
                self.af_result = None;
                self.ae_converged = self.profile.ae_converged;
                self.precapture_remaining = None;
            }
            AfTrigger::Idle => {}
        }

        if request.precapture_trigger == PrecaptureTrigger::Start
            && !self.ae_converged
            && self.precapture_remaining.is_none()
        {
            self.precapture_remaining = Some(self.profile.ae_precapture_frames);
        }
    }

    fn next_frame(&mut self, kind: FrameKind, tag: u64) -> CaptureFrame {
        self.frame_number += 1;
        let af = self.step_af();
        let ae = self.step_ae();
        let carries_fields = kind == FrameKind::Complete || self.profile.fields_on_partials;
        CaptureFrame {
            kind,
            tag,
            frame_number: self.frame_number,
            af_state: (carries_fields && self.profile.report_af).then_some(af),
            ae_state: (carries_fields && self.profile.report_ae).then_some(ae),
        }
    }

    fn step_af(&mut self) -> AfState {
        if let Some(result) = self.af_result {
            return result;
        }
        match self.scan_remaining {
            Some(0) => {
                let result = if self.profile.focus_fails {
                    AfState::NotFocusedLocked
                } else {
                    AfState::FocusedLocked
                };
                self.scan_remaining = None;
                self.af_result = Some(result);
                result
            }
            Some(n) => {
                self.scan_remaining = Some(n - 1);
                AfState::ActiveScan
            }
            None => match self.af_mode {
                AfMode::ContinuousPicture => AfState::PassiveFocused,
                AfMode::Off => AfState::Inactive,
            },
        }
    }

    fn step_ae(&mut self) -> AeState {
        if self.ae_converged {
            return AeState::Converged;
        }
        match self.precapture_remaining {
            Some(0) => {
                self.precapture_remaining = None;
                self.ae_converged = true;
                AeState::Converged
            }
            Some(n) => {
                self.precapture_remaining = Some(n - 1);
                AeState::Precapture
            }
            None => AeState::Searching,
        }
    }
}

/// In-process stand-in for a camera device.
///
/// Single-shot requests are queued to a result thread that emits
/// `partials_per_request` progressed frames and one completed frame each.
/// Repeating requests are only recorded.
pub struct SimulatedCamera {
    connected: AtomicBool,
    session: Mutex<Option<SessionHandle>>,
    preview: Mutex<Option<CaptureRequest>>,
    jobs: Mutex<Option<Sender<Job>>>,
    worker_handle: Mutex<Option<thread::JoinHandle<()>>>,
    single_shots: AtomicU64,
}

impl SimulatedCamera {
    /// Validate `profile` and start the result thread.
    pub fn start(profile: SimulationProfile) -> Result<Self, FocusError> {
        profile
            .validate()
            .map_err(|e| FocusError::ConfigurationFailed(e.to_string()))?;

        let (tx, rx) = mpsc::channel::<Job>();

        let handle = thread::Builder::new()
            .name("sim-camera-results".into())
            .spawn(move || {
                let interval = Duration::from_millis(profile.frame_interval_ms);
                let mut model = ThreeAModel::new(profile);
                while let Ok(job) = rx.recv() {
                    deliver(&mut model, job, interval);
                }
                log::debug!("simulated camera result thread stopped");
            })
            .map_err(|e| FocusError::DeviceAccess(format!("failed to spawn result thread: {}", e)))?;

        Ok(Self {
            connected: AtomicBool::new(true),
            session: Mutex::new(None),
            preview: Mutex::new(None),
            jobs: Mutex::new(Some(tx)),
            worker_handle: Mutex::new(Some(handle)),
            single_shots: AtomicU64::new(0),
        })
    }

    /// Configure a capture session, as a session host would.
    pub fn open_session(&self) -> Result<SessionHandle, FocusError> {
        if !self.is_connected() {
            return Err(FocusError::ConfigurationFailed("camera disconnected".into()));
        }
        let handle = SessionHandle::new();
        *self.session.lock() = Some(handle.clone());
        log::info!("simulated session opened: {}", handle);
        Ok(handle)
    }

    pub fn close_session(&self) {
        if let Some(handle) = self.session.lock().take() {
            log::info!("simulated session closed: {}", handle);
        }
        *self.preview.lock() = None;
    }

    /// The repeating request currently driving the preview.
    pub fn preview_request(&self) -> Option<CaptureRequest> {
        self.preview.lock().clone()
    }

    pub fn single_shot_count(&self) -> u64 {
        self.single_shots.load(Ordering::SeqCst)
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Simulate the device going away. Later submissions fail; requests
    /// already queued still deliver their results before the thread stops.
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
        self.jobs.lock().take();
        if let Some(handle) = self.worker_handle.lock().take() {
            let _ = handle.join();
        }
    }

    fn check_session(&self, session: &SessionHandle) -> Result<(), FocusError> {
        if !self.is_connected() {
            return Err(FocusError::DeviceAccess("camera disconnected".into()));
        }
        match self.session.lock().as_ref() {
            Some(active) if active == session => Ok(()),
            _ => Err(FocusError::DeviceAccess(format!("session {} is closed", session))),
        }
    }
}

impl CaptureDevice for SimulatedCamera {
    fn create_capture_request(&self, template: RequestTemplate) -> Result<CaptureRequest, FocusError> {
        if !self.is_connected() {
            return Err(FocusError::DeviceAccess("camera disconnected".into()));
        }
        Ok(CaptureRequest::new(template))
    }

    fn submit_once(
        &self,
        session: &SessionHandle,
        request: CaptureRequest,
        listener: Arc<dyn CaptureListener>,
    ) -> Result<(), FocusError> {
        self.check_session(session)?;
        let jobs = self.jobs.lock();
        let tx = jobs
            .as_ref()
            .ok_or_else(|| FocusError::DeviceAccess("result thread stopped".into()))?;
        tx.send(Job { request, listener })
            .map_err(|_| FocusError::DeviceAccess("result thread stopped".into()))?;
        self.single_shots.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn submit_repeating(&self, session: &SessionHandle, request: CaptureRequest) -> Result<(), FocusError> {
        self.check_session(session)?;
        log::debug!(
            "preview request r{}: af={:?} flash={:?} af_trigger={:?}",
            request.revision,
            request.af_mode,
            request.flash_mode,
            request.af_trigger
        );
        *self.preview.lock() = Some(request);
        Ok(())
    }
}

impl Drop for SimulatedCamera {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Emit the results of one single-shot request.
fn deliver(model: &mut ThreeAModel, job: Job, interval: Duration) {
    let tag = job.request.tag;
    model.apply(&job.request);

    if model.profile.fail_captures {
        job.listener
            .on_capture_failed(tag, "simulated capture failure".into());
        return;
    }

    for _ in 0..model.profile.partials_per_request {
        let frame = model.next_frame(FrameKind::Partial, tag);
        job.listener.on_capture_progressed(frame);
        if !interval.is_zero() {
            thread::sleep(interval);
        }
    }

    let frame = model.next_frame(FrameKind::Complete, tag);
    job.listener.on_capture_completed(frame);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CollectingListener {
        frames: Mutex<Vec<CaptureFrame>>,
        failures: Mutex<Vec<(u64, String)>>,
    }

    impl CaptureListener for CollectingListener {
        fn on_capture_progressed(&self, frame: CaptureFrame) {
            self.frames.lock().push(frame);
        }

        fn on_capture_completed(&self, frame: CaptureFrame) {
            self.frames.lock().push(frame);
        }

        fn on_capture_failed(&self, tag: u64, reason: String) {
            self.failures.lock().push((tag, reason));
        }
    }

    fn af_start(tag: u64) -> CaptureRequest {
        CaptureRequest::new(RequestTemplate::Preview)
            .with_tag(tag)
            .with_af_trigger(AfTrigger::Start)
    }

    #[test]
    fn model_scans_then_locks() {
        let mut model = ThreeAModel::new(SimulationProfile::default());
        model.apply(&af_start(1));

        let states: Vec<_> = (0..4)
            .map(|_| model.next_frame(FrameKind::Partial, 1).af_state)
            .collect();

        assert_eq!(
            states,
            vec![
                Some(AfState::ActiveScan),
                Some(AfState::ActiveScan),
                Some(AfState::FocusedLocked),
                Some(AfState::FocusedLocked),
            ]
        );
    }

    #[test]
    fn model_runs_precapture_until_converged() {
        let mut model = ThreeAModel::new(SimulationProfile::needs_precapture());
        model.apply(&af_start(1));
        assert_eq!(model.next_frame(FrameKind::Partial, 1).ae_state, Some(AeState::Searching));

        model.apply(&af_start(1).with_precapture_trigger(PrecaptureTrigger::Start));
        let states: Vec<_> = (0..3)
            .map(|_| model.next_frame(FrameKind::Partial, 1).ae_state)
            .collect();

        assert_eq!(
            states,
            vec![
                Some(AeState::Precapture),
                Some(AeState::Precapture),
                Some(AeState::Converged),
            ]
        );
    }

    #[test]
    fn model_omits_unreported_fields() {
        let profile = SimulationProfile {
            report_af: false,
            report_ae: false,
            ..SimulationProfile::default()
        };
        let mut model = ThreeAModel::new(profile);
        let frame = model.next_frame(FrameKind::Complete, 0);

        assert_eq!(frame.af_state, None);
        assert_eq!(frame.ae_state, None);
        assert_eq!(frame.frame_number, 1);
    }

    #[test]
    fn complete_only_profile_leaves_partials_bare() {
        let mut model = ThreeAModel::new(SimulationProfile::fields_on_complete_only());
        model.apply(&af_start(1));

        let partial = model.next_frame(FrameKind::Partial, 1);
        assert_eq!(partial.af_state, None);
        assert_eq!(partial.ae_state, None);

        model.next_frame(FrameKind::Partial, 1);
        let complete = model.next_frame(FrameKind::Complete, 1);
        assert_eq!(complete.af_state, Some(AfState::FocusedLocked));
        assert_eq!(complete.ae_state, Some(AeState::Converged));
    }

    #[test]
    fn cancel_resets_focus() {
        let mut model = ThreeAModel::new(SimulationProfile::default());
        model.apply(&af_start(1));
        for _ in 0..3 {
            model.next_frame(FrameKind::Partial, 1);
        }

        model.apply(&af_start(1).with_af_trigger(AfTrigger::Cancel));
        assert_eq!(
            model.next_frame(FrameKind::Partial, 1).af_state,
            Some(AfState::PassiveFocused)
        );
    }

    #[test]
    fn single_shot_emits_partials_then_complete() {
        let profile = SimulationProfile {
            frame_interval_ms: 0,
            ..SimulationProfile::default()
        };
        let camera = SimulatedCamera::start(profile).unwrap();
        let session = camera.open_session().unwrap();
        let listener = Arc::new(CollectingListener::default());

        camera.submit_once(&session, af_start(7), listener.clone()).unwrap();
        camera.disconnect();

        let frames = listener.frames.lock();
        assert_eq!(frames.len(), 4);
        assert!(frames[..3].iter().all(|f| f.kind == FrameKind::Partial));
        assert_eq!(frames[3].kind, FrameKind::Complete);
        assert!(frames.iter().all(|f| f.tag == 7));
        assert_eq!(camera.single_shot_count(), 1);
    }

    #[test]
    fn failing_profile_reports_failure() {
        let profile = SimulationProfile {
            fail_captures: true,
            ..SimulationProfile::default()
        };
        let camera = SimulatedCamera::start(profile).unwrap();
        let session = camera.open_session().unwrap();
        let listener = Arc::new(CollectingListener::default());

        camera.submit_once(&session, af_start(3), listener.clone()).unwrap();
        camera.disconnect();

        assert!(listener.frames.lock().is_empty());
        assert_eq!(listener.failures.lock()[0].0, 3);
    }

    #[test]
    fn repeating_request_is_recorded() {
        let camera = SimulatedCamera::start(SimulationProfile::default()).unwrap();
        let session = camera.open_session().unwrap();
        let request = CaptureRequest::new(RequestTemplate::Preview).with_tag(2);

        camera.submit_repeating(&session, request.clone()).unwrap();

        assert_eq!(camera.preview_request(), Some(request));
    }

    #[test]
    fn closed_session_rejects_submissions() {
        let camera = SimulatedCamera::start(SimulationProfile::default()).unwrap();
        let session = camera.open_session().unwrap();
        camera.close_session();

        let result = camera.submit_repeating(&session, CaptureRequest::new(RequestTemplate::Preview));
        assert!(matches!(result, Err(FocusError::DeviceAccess(_))));
    }

    #[test]
    fn disconnected_camera_rejects_everything() {
        let camera = SimulatedCamera::start(SimulationProfile::default()).unwrap();
        let session = camera.open_session().unwrap();
        camera.disconnect();

        let listener = Arc::new(CollectingListener::default());
        assert!(matches!(
            camera.submit_once(&session, af_start(1), listener),
            Err(FocusError::DeviceAccess(_))
        ));
        assert!(camera.create_capture_request(RequestTemplate::Preview).is_err());
        assert!(camera.open_session().is_err());
    }
}
