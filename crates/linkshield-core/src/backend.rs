//! Hardware backend contract for protected links
//!
//! The supervision core drives authentication through this trait so the
//! same logic runs against real DRM hardware and against scripted test
//! backends. Implementations are expected to be fast relative to the
//! retry cadence; every method maps to a single driver command.

use crate::error::Result;

/// Transmitter-side operations on one protected display link
pub trait LinkBackend: Send + Sync {
    /// Whether the transmitter supports link authentication at all
    ///
    /// A failed capability query reads as unsupported.
    fn is_supported(&self) -> bool;

    /// Ask the transmitter to begin (or refresh) link authentication
    fn enable_authentication(&self) -> Result<()>;

    /// Tear down link protection
    fn disable_authentication(&self) -> Result<()>;

    /// Verify link integrity right now
    ///
    /// A failed status query reads as not authenticated.
    fn check_link_status(&self) -> bool;

    /// Hook run before each authentication run
    ///
    /// Platforms that need to quiesce parts of the display pipeline while
    /// the link authenticates do it here. The default does nothing;
    /// implementations handle and log their own failures.
    fn pre_authentication(&self) {}

    /// Hook run after each authentication run, whatever its outcome
    fn post_authentication(&self) {}
}
