//! Driver-private ioctl plumbing for the PSB HDCP command block
//!
//! Request codes are built with the kernel `_IO`/`_IOR` encoding for DRM
//! driver-private commands (type `'d'`, command numbers offset by the DRM
//! command base). Calls retry on EINTR/EAGAIN the way libdrm's `drmIoctl`
//! does.

use libc::{c_ulong, c_void};
use std::io;
use std::os::unix::io::RawFd;
use std::ptr;

// asm-generic/ioctl.h field layout
const IOC_NONE: c_ulong = 0;
const IOC_READ: c_ulong = 2;
const IOC_NRSHIFT: c_ulong = 0;
const IOC_TYPESHIFT: c_ulong = 8;
const IOC_SIZESHIFT: c_ulong = 16;
const IOC_DIRSHIFT: c_ulong = 30;

const DRM_IOCTL_BASE: c_ulong = b'd' as c_ulong;
const DRM_COMMAND_BASE: c_ulong = 0x40;

/// PSB private command numbers for the HDCP block (psb_drm.h)
pub(crate) const DRM_PSB_QUERY_HDCP: u8 = 0x13;
pub(crate) const DRM_PSB_ENABLE_HDCP: u8 = 0x16;
pub(crate) const DRM_PSB_DISABLE_HDCP: u8 = 0x17;
pub(crate) const DRM_PSB_GET_HDCP_LINK_STATUS: u8 = 0x18;
pub(crate) const DRM_PSB_HDCP_DISPLAY_IED_OFF: u8 = 0x19;
pub(crate) const DRM_PSB_HDCP_DISPLAY_IED_ON: u8 = 0x1a;

const fn ioc(dir: c_ulong, nr: c_ulong, size: c_ulong) -> c_ulong {
    (dir << IOC_DIRSHIFT)
        | (size << IOC_SIZESHIFT)
        | (DRM_IOCTL_BASE << IOC_TYPESHIFT)
        | (nr << IOC_NRSHIFT)
}

/// Request code for a payload-less driver-private command
const fn drm_io(command: u8) -> c_ulong {
    ioc(IOC_NONE, DRM_COMMAND_BASE + command as c_ulong, 0)
}

/// Request code for a driver-private command reading back one u32
const fn drm_ior_u32(command: u8) -> c_ulong {
    ioc(
        IOC_READ,
        DRM_COMMAND_BASE + command as c_ulong,
        std::mem::size_of::<u32>() as c_ulong,
    )
}

fn drm_ioctl(fd: RawFd, request: c_ulong, arg: *mut c_void) -> io::Result<()> {
    loop {
        let rc = unsafe { libc::ioctl(fd, request, arg) };
        if rc == 0 {
            return Ok(());
        }
        let err = io::Error::last_os_error();
        match err.raw_os_error() {
            Some(libc::EINTR) | Some(libc::EAGAIN) => continue,
            _ => return Err(err),
        }
    }
}

/// Issue a payload-less driver command
pub(crate) fn command_none(fd: RawFd, command: u8) -> io::Result<()> {
    drm_ioctl(fd, drm_io(command), ptr::null_mut())
}

/// Issue a driver command that reads back a single u32
pub(crate) fn command_read_u32(fd: RawFd, command: u8) -> io::Result<u32> {
    let mut value: u32 = 0;
    drm_ioctl(
        fd,
        drm_ior_u32(command),
        &mut value as *mut u32 as *mut c_void,
    )?;
    Ok(value)
}
