//! Runs lock → ready → release cycles against a simulated camera.
//!
//! Usage: `focus-lock-demo [profile.json] [cycles]`. Set `RUST_LOG=debug`
//! to watch every frame being evaluated.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use focus_lock_core::{
    ControllerConfiguration, ControllerState, FocusController, FocusDelegate, FocusError,
    FocusReport, HostSignal,
};
use focus_lock_sim::{SimulatedCamera, SimulationProfile};

const READY_TIMEOUT: Duration = Duration::from_secs(5);

/// Forwards ready reports to the main thread.
struct ChannelDelegate {
    reports: Mutex<Sender<FocusReport>>,
}

impl FocusDelegate for ChannelDelegate {
    fn on_state_changed(&self, state: &ControllerState) {
        log::debug!("state changed: {}", state);
    }

    fn on_ready(&self, report: &FocusReport) {
        let _ = self.reports.lock().send(report.clone());
    }

    fn on_error(&self, error: &FocusError) {
        log::warn!("controller error: {}", error);
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let profile = match args.next().map(PathBuf::from) {
        Some(path) => match SimulationProfile::load(&path) {
            Ok(profile) => profile,
            Err(e) => {
                log::error!("{}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => SimulationProfile::default(),
    };
    let cycles = args.next().and_then(|c| c.parse::<u32>().ok()).unwrap_or(1);

    match run(profile, cycles) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("demo failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(profile: SimulationProfile, cycles: u32) -> Result<(), FocusError> {
    let camera = Arc::new(SimulatedCamera::start(profile)?);
    let (tx, rx) = mpsc::channel();
    let delegate: Arc<dyn FocusDelegate> = Arc::new(ChannelDelegate {
        reports: Mutex::new(tx),
    });

    let controller = FocusController::spawn(
        Arc::clone(&camera),
        ControllerConfiguration::default(),
        Some(delegate),
    )?;
    controller.on_session_established(camera.open_session()?)?;

    for cycle in 1..=cycles {
        controller.lock_focus()?;

        // The controller itself never gives up on a sequence; the caller decides.
        match rx.recv_timeout(READY_TIMEOUT) {
            Ok(report) => match report.to_json() {
                Ok(json) => println!("{}", json),
                Err(e) => log::warn!("cycle {}: {}", cycle, e),
            },
            Err(_) => {
                log::error!(
                    "cycle {}: focus not ready after {:?} (state {})",
                    cycle,
                    READY_TIMEOUT,
                    controller.state()
                );
                controller.unlock_focus()?;
                controller.sync()?;
                return Err(FocusError::InvalidState("focus sequence did not complete".into()));
            }
        }

        controller.on_external_signal(HostSignal::ReleaseFocus)?;
        controller.sync()?;
    }

    log::info!("diagnostics: {:?}", controller.diagnostics());
    Ok(())
}
