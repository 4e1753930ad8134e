//! End-to-end focus sequences: `FocusController` driving a `SimulatedCamera`.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use focus_lock_core::{
    AeState, AfState, ControllerConfiguration, ControllerState, FocusController, FocusDelegate,
    FocusError, FocusReport, HostSignal, PrecaptureTrigger,
};
use focus_lock_sim::{SimulatedCamera, SimulationProfile};

const TIMEOUT: Duration = Duration::from_secs(5);

struct ReportDelegate {
    reports: Mutex<Sender<FocusReport>>,
    errors: Mutex<Vec<FocusError>>,
}

impl FocusDelegate for ReportDelegate {
    fn on_state_changed(&self, _state: &ControllerState) {}

    fn on_ready(&self, report: &FocusReport) {
        let _ = self.reports.lock().send(report.clone());
    }

    fn on_error(&self, error: &FocusError) {
        self.errors.lock().push(error.clone());
    }
}

struct Harness {
    camera: Arc<SimulatedCamera>,
    controller: FocusController,
    delegate: Arc<ReportDelegate>,
    reports: Receiver<FocusReport>,
}

fn start(profile: SimulationProfile) -> Harness {
    let camera = Arc::new(SimulatedCamera::start(profile).unwrap());
    let (tx, reports) = mpsc::channel();
    let delegate = Arc::new(ReportDelegate {
        reports: Mutex::new(tx),
        errors: Mutex::new(Vec::new()),
    });
    let controller = FocusController::spawn(
        Arc::clone(&camera),
        ControllerConfiguration::default(),
        Some(delegate.clone() as Arc<dyn FocusDelegate>),
    )
    .unwrap();
    controller
        .on_session_established(camera.open_session().unwrap())
        .unwrap();
    controller.sync().unwrap();

    Harness {
        camera,
        controller,
        delegate,
        reports,
    }
}

#[test]
fn converged_device_reaches_ready_without_precapture() {
    let h = start(SimulationProfile::default());

    h.controller.lock_focus().unwrap();
    let report = h.reports.recv_timeout(TIMEOUT).unwrap();

    assert_eq!(h.controller.state(), ControllerState::Ready);
    assert!(!report.precapture_used);
    assert_eq!(report.af_state, Some(AfState::FocusedLocked));
    assert_eq!(report.ae_state, Some(AeState::Converged));
    assert_eq!(h.camera.single_shot_count(), 1);
}

#[test]
fn device_without_ae_treats_exposure_as_converged() {
    let h = start(SimulationProfile::without_ae());

    h.controller.lock_focus().unwrap();
    let report = h.reports.recv_timeout(TIMEOUT).unwrap();

    assert!(!report.precapture_used);
    assert_eq!(report.ae_state, None);
}

#[test]
fn searching_exposure_runs_precapture() {
    let h = start(SimulationProfile::needs_precapture());

    h.controller.lock_focus().unwrap();
    let report = h.reports.recv_timeout(TIMEOUT).unwrap();

    assert!(report.precapture_used);
    assert_eq!(report.ae_state, Some(AeState::Converged));
    assert_eq!(h.camera.single_shot_count(), 2);
}

#[test]
fn lock_reacts_to_first_frame_carrying_fields() {
    let h = start(SimulationProfile::fields_on_complete_only());

    h.controller.lock_focus().unwrap();
    let report = h.reports.recv_timeout(TIMEOUT).unwrap();

    assert!(!report.precapture_used);
    assert_eq!(report.frames_evaluated, 4);
    assert_eq!(report.af_state, Some(AfState::FocusedLocked));
    assert_eq!(report.ae_state, Some(AeState::Converged));
}

#[test]
fn precapture_waits_for_frame_carrying_converged_exposure() {
    let profile = SimulationProfile {
        fields_on_partials: false,
        ..SimulationProfile::needs_precapture()
    };
    let h = start(profile);

    h.controller.lock_focus().unwrap();
    let report = h.reports.recv_timeout(TIMEOUT).unwrap();

    assert!(report.precapture_used);
    assert_eq!(report.ae_state, Some(AeState::Converged));
    assert_eq!(report.frames_evaluated, 8);
    assert_eq!(h.camera.single_shot_count(), 2);
}

#[test]
fn release_restores_preview_and_allows_next_cycle() {
    let h = start(SimulationProfile::needs_precapture());

    for _ in 0..3 {
        h.controller.lock_focus().unwrap();
        h.reports.recv_timeout(TIMEOUT).unwrap();

        h.controller.on_external_signal(HostSignal::ReleaseFocus).unwrap();
        h.controller.sync().unwrap();

        assert_eq!(h.controller.state(), ControllerState::Idle);
        let preview = h.camera.preview_request().unwrap();
        assert!(!preview.has_trigger());
        assert_eq!(preview.precapture_trigger, PrecaptureTrigger::Idle);
    }
}

#[test]
fn focus_that_never_locks_keeps_waiting() {
    let profile = SimulationProfile {
        focus_fails: true,
        ..SimulationProfile::default()
    };
    let h = start(profile);

    h.controller.lock_focus().unwrap();
    assert!(h.reports.recv_timeout(Duration::from_millis(200)).is_err());
    h.controller.sync().unwrap();

    assert_eq!(h.controller.state(), ControllerState::AwaitingFocusLock);

    h.controller.unlock_focus().unwrap();
    h.controller.sync().unwrap();
    assert_eq!(h.controller.state(), ControllerState::Idle);
}

#[test]
fn slow_scan_outlasting_one_request_hangs_until_unlocked() {
    let profile = SimulationProfile {
        partials_per_request: 1,
        af_scan_frames: 10,
        ..SimulationProfile::default()
    };
    let h = start(profile);

    h.controller.lock_focus().unwrap();
    assert!(h.reports.recv_timeout(Duration::from_millis(200)).is_err());
    h.controller.sync().unwrap();

    assert_eq!(h.controller.state(), ControllerState::AwaitingFocusLock);
    assert_eq!(h.controller.diagnostics().frames_received, 2);
}

#[test]
fn failed_captures_halt_the_sequence() {
    let profile = SimulationProfile {
        fail_captures: true,
        ..SimulationProfile::default()
    };
    let h = start(profile);

    h.controller.lock_focus().unwrap();
    assert!(h.reports.recv_timeout(Duration::from_millis(200)).is_err());
    h.controller.sync().unwrap();

    assert_eq!(h.controller.state(), ControllerState::AwaitingFocusLock);
    assert!(h
        .delegate
        .errors
        .lock()
        .iter()
        .any(|e| matches!(e, FocusError::CaptureFailed(_))));
}

#[test]
fn disconnected_camera_is_logged_and_swallowed() {
    let h = start(SimulationProfile::default());
    h.camera.disconnect();

    h.controller.lock_focus().unwrap();
    h.controller.sync().unwrap();

    assert_eq!(h.controller.state(), ControllerState::AwaitingFocusLock);
    assert_eq!(h.controller.diagnostics().device_errors, 1);
    assert!(h
        .delegate
        .errors
        .lock()
        .iter()
        .any(|e| matches!(e, FocusError::DeviceAccess(_))));
}

#[test]
fn session_failure_then_reestablish() {
    let h = start(SimulationProfile::default());

    h.controller.on_session_failed().unwrap();
    h.controller.lock_focus().unwrap();
    h.controller.sync().unwrap();
    assert_eq!(h.controller.state(), ControllerState::Idle);
    assert_eq!(h.camera.single_shot_count(), 0);

    h.controller
        .on_session_established(h.camera.open_session().unwrap())
        .unwrap();
    h.controller.lock_focus().unwrap();
    h.reports.recv_timeout(TIMEOUT).unwrap();
    assert_eq!(h.controller.state(), ControllerState::Ready);
}

#[test]
fn toggles_reach_preview_stream() {
    let h = start(SimulationProfile::default());

    h.controller.set_flash(true).unwrap();
    h.controller.set_auto_focus(false).unwrap();
    h.controller.sync().unwrap();

    let preview = h.camera.preview_request().unwrap();
    assert_eq!(preview.flash_mode, focus_lock_core::FlashMode::Torch);
    assert_eq!(preview.af_mode, focus_lock_core::AfMode::Off);
    assert_eq!(h.controller.state(), ControllerState::Idle);
}
