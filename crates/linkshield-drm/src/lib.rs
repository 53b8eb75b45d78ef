//! LinkShield DRM - HDCP control over Intel PSB/Medfield DRM devices
//!
//! This crate talks the driver-private ioctl set of the PSB display
//! driver to query, engage, and verify HDCP on a display link. It
//! implements the `LinkBackend` contract consumed by the supervision
//! core.

mod ioctl;
pub mod link;

pub use link::{DrmLink, DrmLinkOptions, DEFAULT_DEVICE};
