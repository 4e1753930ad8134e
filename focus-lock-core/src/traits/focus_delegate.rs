use crate::models::error::FocusError;
use crate::models::report::FocusReport;
use crate::models::state::ControllerState;

/// Event delegate for focus controller notifications.
///
/// All methods are called from the controller thread, not the caller's.
/// Implementations should marshal to the UI thread if needed.
pub trait FocusDelegate: Send + Sync {
    /// Called when the controller state changes.
    fn on_state_changed(&self, state: &ControllerState);

    /// Called once per focus sequence when focus (and exposure) locked.
    fn on_ready(&self, report: &FocusReport);

    /// Called when a submission or capture fails.
    fn on_error(&self, error: &FocusError);
}
