//! LinkShield HDCP - Authentication supervision for protected display links
//!
//! The [`HdcpController`] facade drives a hardware link through its
//! authenticate/verify cycle: a bounded retry engine performs the actual
//! enable/verify protocol, and a background worker re-verifies an
//! authenticated link (and re-authenticates a broken one) on a
//! configurable cadence until stopped. All hardware access goes through
//! the `LinkBackend` trait from `linkshield-core`, so the supervision
//! logic runs unchanged against real DRM devices and scripted test
//! backends.
//!
//! One controller supervises exactly one link. Construct a second
//! controller for a second link, never two for the same device.

pub mod controller;
mod engine;
mod worker;

#[cfg(test)]
mod mock;

pub use controller::HdcpController;
