//! HDCP supervision controller
//!
//! `HdcpController` is the public face of the crate: start the link
//! synchronously (block for the first authentication outcome) or
//! monitored (receive status updates on a channel), and stop. All
//! shared state lives in one lock-guarded record; the per-run stop
//! signal and the synchronous caller's completion wake each get their
//! own channel so neither can be confused for the other.

use crate::engine;
use crate::worker;
use linkshield_core::{Config, LinkBackend, LinkStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, info, warn};

/// Shared supervision state for one link
///
/// Every field is read and written only under the controller's lock.
/// The channel senders double as state flags: a present `completion`
/// sender IS "a synchronous caller is waiting", a present `updates`
/// sender IS "this is a monitored run".
#[derive(Default)]
pub(crate) struct AuthState {
    /// No run is active, or a stop has been requested; true initially
    pub(crate) stopped: bool,
    /// Last known authentication outcome
    pub(crate) authenticated: bool,
    /// The worker's next sleep interval
    pub(crate) action_delay: Duration,
    /// Wakes the synchronous caller on the first definitive outcome
    pub(crate) completion: Option<oneshot::Sender<()>>,
    /// Status updates for a monitored run
    pub(crate) updates: Option<mpsc::Sender<LinkStatus>>,
    /// This run's stop signal; each start installs a fresh channel
    pub(crate) cancel: Option<watch::Sender<bool>>,
    /// The active worker task
    pub(crate) worker: Option<JoinHandle<()>>,
}

impl AuthState {
    fn new() -> Self {
        Self {
            stopped: true,
            ..Self::default()
        }
    }

    /// Begin a fresh run: reset transient fields and install this run's
    /// cancellation channel. Caller must hold the lock.
    fn begin_run(&mut self) -> watch::Receiver<bool> {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        self.stopped = false;
        self.authenticated = false;
        self.completion = None;
        self.updates = None;
        self.cancel = Some(cancel_tx);
        cancel_rx
    }
}

/// Authentication supervisor for one protected display link
///
/// Start and stop may be called repeatedly and from any task; calls are
/// serialized on the internal lock and are idempotent. Status updates
/// on monitored runs are produced by the worker task, never by the
/// caller's own task.
pub struct HdcpController {
    backend: Arc<dyn LinkBackend>,
    config: Config,
    state: Arc<Mutex<AuthState>>,
}

impl HdcpController {
    /// Create a controller for the given link; touches no hardware
    pub fn new(backend: Arc<dyn LinkBackend>, config: Config) -> Self {
        Self {
            backend,
            config,
            state: Arc::new(Mutex::new(AuthState::new())),
        }
    }

    /// Start supervision and block until the first authentication
    /// outcome, the configured timeout, or a concurrent stop.
    ///
    /// Runs one authentication attempt inline before the worker takes
    /// over, so the caller gets a result without waiting for the
    /// worker's first cycle. Returns the link's authenticated flag;
    /// timing out is not an error, merely "not authenticated yet".
    /// Starting an already-running controller is a no-op returning
    /// `true`.
    pub async fn start(&self) -> bool {
        if !self.backend.is_supported() {
            warn!("Link does not support HDCP authentication");
            return false;
        }

        let mut cancel = {
            let mut state = self.state.lock().await;
            if !state.stopped {
                info!("HDCP supervision already running");
                return true;
            }
            state.begin_run()
        };

        // Inline first attempt, outside the lock so stop stays callable
        let authenticated =
            engine::run_authentication(self.backend.as_ref(), &mut cancel, &self.config).await;

        let completion = {
            let mut state = self.state.lock().await;
            if state.stopped {
                // A concurrent stop tore this run down mid-attempt; it
                // must not be followed by new worker activity.
                info!("HDCP start aborted by concurrent stop");
                return false;
            }

            state.authenticated = authenticated;
            state.action_delay = self.config.action_delay(authenticated);

            let completion = if authenticated {
                None
            } else {
                let (tx, rx) = oneshot::channel();
                state.completion = Some(tx);
                Some(rx)
            };

            state.worker = Some(worker::spawn(
                self.backend.clone(),
                self.config.clone(),
                self.state.clone(),
                cancel,
            ));
            completion
        };

        let Some(completion) = completion else {
            info!("HDCP authenticated");
            return true;
        };

        // Wait for the worker's first definitive outcome; the sender is
        // also dropped by stop, which unblocks us the same way.
        if time::timeout(self.config.authentication_timeout, completion)
            .await
            .is_err()
        {
            warn!("Timed out waiting for HDCP authentication");
        }

        let mut state = self.state.lock().await;
        state.completion = None;
        state.authenticated
    }

    /// Start supervision in monitored mode.
    ///
    /// Returns immediately; the worker performs the first attempt on
    /// its own first cycle and sends a [`LinkStatus`] on `updates`
    /// every cycle thereafter, until `stop` is called. Updates are
    /// produced on the worker task. Fails when monitored starts are
    /// disabled in the configuration or the link is unsupported.
    /// Starting an already-running controller returns `true` and drops
    /// the new sender.
    pub async fn start_monitored(&self, updates: mpsc::Sender<LinkStatus>) -> bool {
        if !self.config.monitoring_enabled {
            warn!("Monitored HDCP supervision is disabled");
            return false;
        }

        if !self.backend.is_supported() {
            warn!("Link does not support HDCP authentication");
            return false;
        }

        let mut state = self.state.lock().await;
        if !state.stopped {
            info!("HDCP supervision already running");
            return true;
        }

        let cancel = state.begin_run();
        state.updates = Some(updates);
        state.action_delay = self.config.monitor_start_delay;
        state.worker = Some(worker::spawn(
            self.backend.clone(),
            self.config.clone(),
            self.state.clone(),
            cancel,
        ));

        info!("Monitored HDCP supervision started");
        true
    }

    /// Stop supervision and join the worker.
    ///
    /// When this returns, the worker of the stopped run has terminated:
    /// no further backend call or status update from that run can
    /// occur. A waiting synchronous caller is unblocked. Stopping an
    /// already-stopped controller returns `true` without touching the
    /// backend.
    pub async fn stop(&self) -> bool {
        let worker = {
            let mut state = self.state.lock().await;
            if state.stopped {
                debug!("HDCP supervision already stopped");
                return true;
            }

            state.stopped = true;
            if let Some(cancel) = state.cancel.take() {
                // Wakes a sleeping worker and aborts an in-flight run
                let _ = cancel.send(true);
            }
            state.authenticated = false;
            // Dropping the sender unblocks a waiting synchronous caller;
            // dropping the update sender closes the monitored channel.
            state.completion = None;
            state.updates = None;

            if let Err(e) = self.backend.disable_authentication() {
                warn!("Failed to disable link authentication: {}", e);
            }

            state.worker.take()
        };

        // Join outside the lock; the worker may need it to finish its cycle
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                warn!("HDCP worker task failed: {}", e);
            }
        }

        info!("HDCP supervision stopped");
        true
    }

    /// Last known authentication state of the link
    pub async fn is_authenticated(&self) -> bool {
        self.state.lock().await.authenticated
    }
}

impl Drop for HdcpController {
    fn drop(&mut self) {
        // Orderly shutdown is stop(); this only keeps a forgotten run
        // from outliving the controller.
        if let Ok(mut state) = self.state.try_lock() {
            if let Some(cancel) = state.cancel.take() {
                let _ = cancel.send(true);
            }
            if let Some(worker) = state.worker.take() {
                worker.abort();
            }
        }
    }
}
