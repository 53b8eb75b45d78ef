//! Background supervision worker
//!
//! One worker task exists per run, spawned by the controller on start
//! and joined on stop. It cycles through an explicit phase machine:
//! sleep for the current action delay (interruptible by stop), then act
//! on the link, then commit the outcome and go back to sleep. Only a
//! stop request ends the loop; a failed authentication attempt just
//! leaves the link unauthenticated for the next cycle.

use crate::controller::AuthState;
use crate::engine;
use linkshield_core::{Config, LinkBackend, LinkStatus};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, warn};

/// Worker phase, driven once per loop iteration
enum Phase {
    /// Waiting out the current action delay
    Sleeping,
    /// Re-authenticating or re-verifying the link
    Acting,
    /// Stop observed; the task exits and is never restarted
    Terminated,
}

/// Spawn the supervision worker for one run.
///
/// The cancellation receiver belongs to this run alone; the worker
/// trusts it, not the shared `stopped` flag, so a worker from a stopped
/// run can never touch state that a later start has handed to a
/// successor.
pub(crate) fn spawn(
    backend: Arc<dyn LinkBackend>,
    config: Config,
    state: Arc<Mutex<AuthState>>,
    cancel: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(run(backend, config, state, cancel))
}

async fn run(
    backend: Arc<dyn LinkBackend>,
    config: Config,
    state: Arc<Mutex<AuthState>>,
    mut cancel: watch::Receiver<bool>,
) {
    let mut cycle: u64 = 0;
    let mut phase = Phase::Sleeping;

    loop {
        match phase {
            Phase::Sleeping => {
                let delay = state.lock().await.action_delay;
                if *cancel.borrow() {
                    phase = Phase::Terminated;
                    continue;
                }
                tokio::select! {
                    _ = time::sleep(delay) => phase = Phase::Acting,
                    _ = cancel.changed() => phase = Phase::Terminated,
                }
            }

            Phase::Acting => {
                cycle += 1;
                let was_authenticated = state.lock().await.authenticated;

                // Full retry run while unauthenticated; a lightweight
                // status check is enough once the link is up.
                let authenticated = if was_authenticated {
                    let still = backend.check_link_status();
                    if !still {
                        warn!("Authenticated link failed re-verification");
                    }
                    still
                } else {
                    engine::run_authentication(backend.as_ref(), &mut cancel, &config).await
                };

                let mut state = state.lock().await;
                if *cancel.borrow() {
                    // Stopped while acting; the state may already belong
                    // to a successor run, so leave it alone.
                    phase = Phase::Terminated;
                    continue;
                }

                state.authenticated = authenticated;
                state.action_delay = config.action_delay(authenticated);

                // First definitive outcome unblocks a synchronous caller;
                // taking the sender keeps the wake to at most once per run.
                if let Some(completion) = state.completion.take() {
                    let _ = completion.send(());
                }

                if let Some(updates) = &state.updates {
                    let status = LinkStatus::new(authenticated, cycle);
                    if let Err(e) = updates.try_send(status) {
                        debug!("Dropping link status update: {}", e);
                    }
                }
                drop(state);

                phase = Phase::Sleeping;
            }

            Phase::Terminated => {
                debug!("Supervision worker terminated after {} cycles", cycle);
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockLink;
    use std::sync::atomic::Ordering;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::Instant;

    fn quick_config() -> Config {
        Config::new()
            .with_retry_budget(1)
            .with_settling_delay(Duration::from_millis(5))
            .with_verification_interval(Duration::from_millis(20))
            .with_retry_interval(Duration::from_millis(20))
    }

    fn running_state(action_delay: Duration) -> (Arc<Mutex<AuthState>>, watch::Sender<bool>, watch::Receiver<bool>) {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let mut state = AuthState::default();
        state.stopped = false;
        state.action_delay = action_delay;
        (Arc::new(Mutex::new(state)), cancel_tx, cancel_rx)
    }

    #[tokio::test]
    async fn test_worker_emits_stamped_updates_each_cycle() {
        let backend = Arc::new(MockLink::new(true));
        let (state, _cancel_tx, cancel_rx) = running_state(Duration::from_millis(10));
        let (updates_tx, mut updates_rx) = mpsc::channel(8);
        state.lock().await.updates = Some(updates_tx);

        let worker = spawn(backend, quick_config(), state, cancel_rx);

        let first = updates_rx.recv().await.unwrap();
        let second = updates_rx.recv().await.unwrap();
        assert_eq!(first, LinkStatus::new(true, 1));
        assert_eq!(second, LinkStatus::new(true, 2));

        worker.abort();
    }

    #[tokio::test]
    async fn test_stop_during_sleep_is_observed_promptly() {
        let backend = Arc::new(MockLink::new(true));
        // Long action delay: the cancel must cut the sleep short
        let (state, cancel_tx, cancel_rx) = running_state(Duration::from_secs(30));

        let worker = spawn(backend.clone(), quick_config(), state, cancel_rx);

        time::sleep(Duration::from_millis(20)).await;
        let stopped_at = Instant::now();
        cancel_tx.send(true).unwrap();
        worker.await.unwrap();

        assert!(stopped_at.elapsed() < Duration::from_secs(1));
        // Never woke up to act
        assert_eq!(backend.status_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_authenticated_link_gets_lightweight_reverification() {
        let backend = Arc::new(MockLink::new(true));
        let (state, cancel_tx, cancel_rx) = running_state(Duration::from_millis(10));
        state.lock().await.authenticated = true;

        let worker = spawn(backend.clone(), quick_config(), state, cancel_rx);
        time::sleep(Duration::from_millis(100)).await;
        cancel_tx.send(true).unwrap();
        worker.await.unwrap();

        // Steady state re-verifies without re-enabling
        assert!(backend.status_calls.load(Ordering::SeqCst) >= 1);
        assert_eq!(backend.enable_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_cycle_schedules_retry_cadence() {
        let backend = Arc::new(MockLink::new(false));
        let config = quick_config()
            .with_verification_interval(Duration::from_millis(10))
            .with_retry_interval(Duration::from_millis(250));
        let (state, cancel_tx, cancel_rx) = running_state(Duration::from_millis(5));

        let worker = spawn(backend, config.clone(), state.clone(), cancel_rx);
        time::sleep(Duration::from_millis(100)).await;

        assert_eq!(state.lock().await.action_delay, config.retry_interval);
        assert!(!state.lock().await.authenticated);

        cancel_tx.send(true).unwrap();
        worker.await.unwrap();
    }
}
