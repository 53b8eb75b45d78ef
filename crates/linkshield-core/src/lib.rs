//! LinkShield Core - Shared types and the hardware backend contract
//!
//! This crate provides the foundational types used across all LinkShield components.

pub mod backend;
pub mod config;
pub mod error;
pub mod status;

pub use backend::LinkBackend;
pub use config::Config;
pub use error::{Error, Result};
pub use status::LinkStatus;
