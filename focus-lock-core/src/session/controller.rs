use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use crate::models::config::ControllerConfiguration;
use crate::models::error::FocusError;
use crate::models::frame::CaptureFrame;
use crate::models::report::ControllerDiagnostics;
use crate::models::session::SessionHandle;
use crate::models::state::{ControllerState, HostSignal};
use crate::session::focus_session::FocusSession;
use crate::traits::capture_device::{CaptureDevice, CaptureListener};
use crate::traits::focus_delegate::FocusDelegate;

/// Everything the controller thread reacts to, in arrival order.
enum ControllerMessage {
    LockFocus,
    UnlockFocus,
    SetAutoFocus(bool),
    SetFlash(bool),
    SessionEstablished(SessionHandle),
    SessionFailed,
    Signal(HostSignal),
    Frame(CaptureFrame),
    CaptureFailed { tag: u64, reason: String },
    Sync(SyncSender<()>),
    Shutdown,
}

/// Listener handed to the device: forwards results into the controller queue.
///
/// Sending blocks while the queue is full, so the device's result thread is
/// throttled to the controller's pace instead of frames being dropped.
struct ChannelListener {
    tx: SyncSender<ControllerMessage>,
}

impl ChannelListener {
    fn forward(&self, message: ControllerMessage) {
        if self.tx.send(message).is_err() {
            log::debug!("controller stopped, dropping capture result");
        }
    }
}

impl CaptureListener for ChannelListener {
    fn on_capture_progressed(&self, frame: CaptureFrame) {
        self.forward(ControllerMessage::Frame(frame));
    }

    fn on_capture_completed(&self, frame: CaptureFrame) {
        self.forward(ControllerMessage::Frame(frame));
    }

    fn on_capture_failed(&self, tag: u64, reason: String) {
        self.forward(ControllerMessage::CaptureFailed { tag, reason });
    }
}

/// Thread-safe handle to a focus session running on its own thread.
///
/// Commands and device results share one bounded queue consumed by a single
/// thread that owns the state and the live request:
/// ```text
/// [caller] ──commands──┐
///                      ├→ [bounded queue] → [focus-controller thread] → FocusSession
/// [device] ──frames────┘
/// ```
/// Command methods return once the message is queued. Use `sync` to wait
/// until everything queued before it has been handled.
pub struct FocusController {
    tx: SyncSender<ControllerMessage>,
    state: Arc<Mutex<ControllerState>>,
    diagnostics: Arc<Mutex<ControllerDiagnostics>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl FocusController {
    pub fn spawn<D>(
        device: Arc<D>,
        config: ControllerConfiguration,
        delegate: Option<Arc<dyn FocusDelegate>>,
    ) -> Result<Self, FocusError>
    where
        D: CaptureDevice + 'static,
    {
        let (tx, rx) = mpsc::sync_channel(config.frame_queue_capacity);
        let listener = Arc::new(ChannelListener { tx: tx.clone() });

        let mut session = FocusSession::new(device, listener, config)?;
        if let Some(delegate) = delegate {
            session.set_delegate(delegate);
        }

        let state = session.state_slot();
        let diagnostics = Arc::new(Mutex::new(ControllerDiagnostics::default()));
        let shared_diagnostics = Arc::clone(&diagnostics);

        let handle = thread::Builder::new()
            .name("focus-controller".into())
            .spawn(move || run(session, rx, shared_diagnostics))
            .map_err(|e| {
                FocusError::ConfigurationFailed(format!("failed to spawn controller thread: {}", e))
            })?;

        Ok(Self {
            tx,
            state,
            diagnostics,
            handle: Some(handle),
        })
    }

    pub fn state(&self) -> ControllerState {
        *self.state.lock()
    }

    pub fn diagnostics(&self) -> ControllerDiagnostics {
        self.diagnostics.lock().clone()
    }

    pub fn lock_focus(&self) -> Result<(), FocusError> {
        self.send(ControllerMessage::LockFocus)
    }

    pub fn unlock_focus(&self) -> Result<(), FocusError> {
        self.send(ControllerMessage::UnlockFocus)
    }

    pub fn set_auto_focus(&self, enabled: bool) -> Result<(), FocusError> {
        self.send(ControllerMessage::SetAutoFocus(enabled))
    }

    pub fn set_flash(&self, enabled: bool) -> Result<(), FocusError> {
        self.send(ControllerMessage::SetFlash(enabled))
    }

    pub fn on_session_established(&self, handle: SessionHandle) -> Result<(), FocusError> {
        self.send(ControllerMessage::SessionEstablished(handle))
    }

    pub fn on_session_failed(&self) -> Result<(), FocusError> {
        self.send(ControllerMessage::SessionFailed)
    }

    pub fn on_external_signal(&self, signal: HostSignal) -> Result<(), FocusError> {
        self.send(ControllerMessage::Signal(signal))
    }

    /// Block until every message queued before this call has been handled.
    pub fn sync(&self) -> Result<(), FocusError> {
        let (done_tx, done_rx) = mpsc::sync_channel(1);
        self.send(ControllerMessage::Sync(done_tx))?;
        done_rx.recv().map_err(|_| FocusError::ChannelClosed)
    }

    fn send(&self, message: ControllerMessage) -> Result<(), FocusError> {
        self.tx.send(message).map_err(|_| FocusError::ChannelClosed)
    }
}

impl Drop for FocusController {
    fn drop(&mut self) {
        let _ = self.tx.send(ControllerMessage::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Controller thread body: the only place the session is mutated.
fn run<D: CaptureDevice>(
    mut session: FocusSession<D>,
    rx: Receiver<ControllerMessage>,
    diagnostics: Arc<Mutex<ControllerDiagnostics>>,
) {
    log::debug!("focus controller started");

    // The session's listener keeps a sender alive, so the queue only ends
    // on an explicit shutdown.
    while let Ok(message) = rx.recv() {
        match message {
            ControllerMessage::LockFocus => {
                if let Err(e) = session.lock_focus() {
                    log::warn!("lock_focus rejected: {}", e);
                }
            }
            ControllerMessage::UnlockFocus => session.unlock_focus(),
            ControllerMessage::SetAutoFocus(enabled) => session.set_auto_focus(enabled),
            ControllerMessage::SetFlash(enabled) => session.set_flash(enabled),
            ControllerMessage::SessionEstablished(handle) => session.on_session_established(handle),
            ControllerMessage::SessionFailed => session.on_session_failed(),
            ControllerMessage::Signal(signal) => session.on_external_signal(signal),
            ControllerMessage::Frame(frame) => {
                session.process_frame(&frame);
            }
            ControllerMessage::CaptureFailed { tag, reason } => session.on_capture_failed(tag, &reason),
            ControllerMessage::Sync(done) => {
                *diagnostics.lock() = session.diagnostics().clone();
                let _ = done.send(());
                continue;
            }
            ControllerMessage::Shutdown => break,
        }
        *diagnostics.lock() = session.diagnostics().clone();
    }

    // Close the queue before releasing the device so a result thread blocked
    // on a full queue can finish.
    drop(rx);
    drop(session);
    log::debug!("focus controller stopped");
}
