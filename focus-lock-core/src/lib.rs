//! # focus-lock-core
//!
//! Platform-agnostic autofocus / auto-exposure lock controller.
//!
//! Drives the "focus, then meter, then shoot" protocol over a camera that
//! streams per-frame 3A metadata. Camera backends implement the
//! `CaptureDevice` trait and plug into the generic `FocusSession`, or into
//! `FocusController` when commands and results arrive on different threads.
//!
//! ## Architecture
//!
//! ```text
//! focus-lock-core (this crate)
//! ├── traits/       ← CaptureDevice, CaptureListener, FocusDelegate
//! ├── models/       ← FocusError, ControllerState, CaptureRequest, CaptureFrame, etc.
//! ├── processing/   ← frame evaluator (pure 3A decisions)
//! └── session/      ← FocusSession (state machine), FocusController (actor thread)
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::config::ControllerConfiguration;
pub use models::error::FocusError;
pub use models::frame::{AeState, AfState, CaptureFrame, FrameKind};
pub use models::report::{ControllerDiagnostics, FocusReport};
pub use models::request::{AfMode, AfTrigger, Baseline, CaptureRequest, FlashMode, PrecaptureTrigger, RequestTemplate};
pub use models::session::SessionHandle;
pub use models::state::{ControllerState, HostSignal};
pub use processing::frame_evaluator::FrameVerdict;
pub use session::controller::FocusController;
pub use session::focus_session::FocusSession;
pub use traits::capture_device::{CaptureDevice, CaptureListener};
pub use traits::focus_delegate::FocusDelegate;
