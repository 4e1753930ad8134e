use std::sync::Arc;

use crate::models::error::FocusError;
use crate::models::frame::CaptureFrame;
use crate::models::request::{CaptureRequest, RequestTemplate};
use crate::models::session::SessionHandle;

/// Receives the results of a single-shot submission.
///
/// Called on the device's result thread. For each request the device delivers
/// zero or more progressed frames followed by exactly one completed frame, or
/// a single failure.
pub trait CaptureListener: Send + Sync {
    /// A partial result; may already carry the 3A fields.
    fn on_capture_progressed(&self, frame: CaptureFrame);

    /// The request's final result.
    fn on_capture_completed(&self, frame: CaptureFrame);

    /// The request was dropped by the device.
    fn on_capture_failed(&self, tag: u64, reason: String) {
        let _ = (tag, reason);
    }
}

/// Interface for a camera device accepting capture requests.
///
/// Implemented by:
/// - `SimulatedCamera` (focus-lock-sim)
/// - test doubles recording every submission
///
/// Submissions are asynchronous: `Ok` only means the request was queued.
/// Results must be delivered from the device's own thread, never from inside
/// `submit_once`.
pub trait CaptureDevice: Send + Sync {
    /// Build a fresh request from one of the device's templates.
    fn create_capture_request(&self, template: RequestTemplate) -> Result<CaptureRequest, FocusError>;

    /// Queue exactly one request; its results go to `listener`.
    fn submit_once(
        &self,
        session: &SessionHandle,
        request: CaptureRequest,
        listener: Arc<dyn CaptureListener>,
    ) -> Result<(), FocusError>;

    /// Replace the repeating (preview) request. No results are reported.
    fn submit_repeating(&self, session: &SessionHandle, request: CaptureRequest) -> Result<(), FocusError>;
}
