//! # focus-lock-sim
//!
//! Simulated camera backend for focus-lock-core.
//!
//! Provides:
//! - `SimulatedCamera` — `CaptureDevice` emitting 3A metadata on a result thread
//! - `SimulationProfile` — JSON-loadable description of the device's AF/AE behaviour
//!
//! ## Usage
//! ```ignore
//! use std::sync::Arc;
//! use focus_lock_core::{ControllerConfiguration, FocusController};
//! use focus_lock_sim::{SimulatedCamera, SimulationProfile};
//!
//! let camera = Arc::new(SimulatedCamera::start(SimulationProfile::default())?);
//! let controller = FocusController::spawn(Arc::clone(&camera), ControllerConfiguration::default(), None)?;
//! controller.on_session_established(camera.open_session()?)?;
//! controller.lock_focus()?;
//! ```

pub mod profile;
pub mod simulated_camera;

pub use profile::{ProfileError, SimulationProfile};
pub use simulated_camera::SimulatedCamera;
