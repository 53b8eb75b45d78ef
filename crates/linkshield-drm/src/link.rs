//! DRM device adapter for HDCP link control
//!
//! Owns the device node for its whole lifetime; every `LinkBackend`
//! method maps to a single driver command against that fd.

use crate::ioctl;
use linkshield_core::{Error, LinkBackend, Result};
use std::fs::{File, OpenOptions};
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::Path;
use tracing::{debug, info, warn};

/// Default DRM node for the primary display device
pub const DEFAULT_DEVICE: &str = "/dev/dri/card0";

/// Platform options for a DRM-driven link
#[derive(Debug, Clone, Copy, Default)]
pub struct DrmLinkOptions {
    /// Quiesce the display's inline encryption (IED) around authentication
    ///
    /// Some platforms cannot complete HDCP authentication while IED is
    /// active; with this set, the pre/post authentication hooks turn IED
    /// off for the duration of each run and back on afterwards.
    pub ied_quiesce: bool,
}

/// HDCP control surface of one DRM display device
pub struct DrmLink {
    device: File,
    options: DrmLinkOptions,
}

impl DrmLink {
    /// Open a DRM device node with default options
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_options(path, DrmLinkOptions::default())
    }

    /// Open a DRM device node with explicit platform options
    pub fn open_with_options(path: impl AsRef<Path>, options: DrmLinkOptions) -> Result<Self> {
        let path = path.as_ref();
        let device = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| Error::DeviceOpen(format!("{}: {}", path.display(), e)))?;

        info!("Opened DRM device {}", path.display());
        Ok(Self { device, options })
    }

    fn fd(&self) -> RawFd {
        self.device.as_raw_fd()
    }

    /// Turn the display's inline encryption engine back on
    pub fn display_ied_on(&self) -> Result<()> {
        ioctl::command_none(self.fd(), ioctl::DRM_PSB_HDCP_DISPLAY_IED_ON)
            .map_err(|e| Error::command("hdcp-display-ied-on", e))
    }

    /// Turn the display's inline encryption engine off
    pub fn display_ied_off(&self) -> Result<()> {
        ioctl::command_none(self.fd(), ioctl::DRM_PSB_HDCP_DISPLAY_IED_OFF)
            .map_err(|e| Error::command("hdcp-display-ied-off", e))
    }
}

impl LinkBackend for DrmLink {
    fn is_supported(&self) -> bool {
        match ioctl::command_read_u32(self.fd(), ioctl::DRM_PSB_QUERY_HDCP) {
            Ok(caps) => {
                debug!("HDCP capability word: {:#x}", caps);
                caps != 0
            }
            Err(e) => {
                warn!("HDCP capability query failed: {}", e);
                false
            }
        }
    }

    fn enable_authentication(&self) -> Result<()> {
        ioctl::command_none(self.fd(), ioctl::DRM_PSB_ENABLE_HDCP)
            .map_err(|e| Error::command("enable-hdcp", e))
    }

    fn disable_authentication(&self) -> Result<()> {
        ioctl::command_none(self.fd(), ioctl::DRM_PSB_DISABLE_HDCP)
            .map_err(|e| Error::command("disable-hdcp", e))
    }

    fn check_link_status(&self) -> bool {
        match ioctl::command_read_u32(self.fd(), ioctl::DRM_PSB_GET_HDCP_LINK_STATUS) {
            Ok(status) => status != 0,
            Err(e) => {
                warn!("HDCP link status query failed: {}", e);
                false
            }
        }
    }

    fn pre_authentication(&self) {
        if self.options.ied_quiesce {
            if let Err(e) = self.display_ied_off() {
                warn!("Failed to quiesce display IED: {}", e);
            }
        }
    }

    fn post_authentication(&self) {
        if self.options.ied_quiesce {
            if let Err(e) = self.display_ied_on() {
                warn!("Failed to restore display IED: {}", e);
            }
        }
    }
}
