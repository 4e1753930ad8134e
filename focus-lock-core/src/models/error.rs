use thiserror::Error;

/// Errors surfaced by the focus controller and its collaborators.
///
/// None of these are fatal to the host process. A failure halts the current
/// focus sequence, which then simply never reaches `Ready`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FocusError {
    /// The device rejected a submission (channel closed, device disconnected).
    #[error("device access failed: {0}")]
    DeviceAccess(String),

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    /// No capture session is established, so nothing can be submitted.
    #[error("capture session unavailable")]
    SessionUnavailable,

    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The device reported that a single-shot capture did not complete.
    #[error("capture failed: {0}")]
    CaptureFailed(String),

    /// A report could not be encoded for export.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The controller's message queue is gone (actor stopped).
    #[error("controller channel closed")]
    ChannelClosed,
}
