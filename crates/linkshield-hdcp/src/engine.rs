//! Bounded enable/verify retry engine
//!
//! One engine run is a single authentication attempt sequence: up to
//! `retry_budget` enable/verify rounds with a settling delay between
//! them. The engine never loops forever; keeping the link supervised
//! across failing runs is the worker's job, not the engine's.

use linkshield_core::{Config, LinkBackend};
use tokio::sync::watch;
use tokio::time;
use tracing::{debug, warn};

/// Drive the backend through one bounded authentication run.
///
/// Returns whether the link ended up authenticated. Backend command
/// failure, a stop observed through `cancel`, and budget exhaustion all
/// read as `false`; they differ only in what gets logged. The backend's
/// pre/post hooks bracket the run regardless of outcome.
///
/// Cancellation is honored within one settling delay: it is checked
/// before and after the enable/verify pair, and the settling sleep
/// itself is interrupted by it.
pub(crate) async fn run_authentication(
    backend: &dyn LinkBackend,
    cancel: &mut watch::Receiver<bool>,
    config: &Config,
) -> bool {
    backend.pre_authentication();

    let mut authenticated = false;
    let mut cancelled = false;
    for attempt in 1..=config.retry_budget {
        if *cancel.borrow() {
            cancelled = true;
            break;
        }

        if let Err(e) = backend.enable_authentication() {
            warn!("Failed to enable link authentication: {}", e);
            break;
        }

        if backend.check_link_status() {
            debug!("Link authenticated on attempt {}", attempt);
            authenticated = true;
            break;
        }

        if *cancel.borrow() {
            cancelled = true;
            break;
        }

        // Let the receiver settle on the video signal before the next
        // attempt (HDCP spec 1.3, section 2.3).
        tokio::select! {
            _ = time::sleep(config.settling_delay) => {}
            _ = cancel.changed() => {
                cancelled = true;
                break;
            }
        }
    }

    if cancelled {
        debug!("Authentication run abandoned by stop request");
    } else if !authenticated {
        debug!(
            "Authentication retry budget of {} exhausted",
            config.retry_budget
        );
    }

    backend.post_authentication();

    authenticated
}
