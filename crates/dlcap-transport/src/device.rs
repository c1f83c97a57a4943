use std::fs::OpenOptions;
use std::io;
use std::os::fd::{AsRawFd, OwnedFd, RawFd};
use std::path::Path;

use tracing::debug;

use crate::channel::ControlChannel;
use crate::error::{Result, TransportError};

// STREAMS message I/O. Declared here rather than taken from libc because we
// need exactly the message-boundary-preserving calls and nothing else.
#[repr(C)]
struct StrBuf {
    maxlen: libc::c_int,
    len: libc::c_int,
    buf: *mut libc::c_char,
}

#[repr(C)]
struct StrIoctl {
    ic_cmd: libc::c_int,
    ic_timout: libc::c_int,
    ic_len: libc::c_int,
    ic_dp: *mut libc::c_char,
}

extern "C" {
    fn getmsg(
        fd: libc::c_int,
        ctlptr: *mut StrBuf,
        dataptr: *mut StrBuf,
        flagsp: *mut libc::c_int,
    ) -> libc::c_int;
    fn putmsg(
        fd: libc::c_int,
        ctlptr: *const StrBuf,
        dataptr: *const StrBuf,
        flags: libc::c_int,
    ) -> libc::c_int;
}

const STR: libc::c_int = (b'S' as libc::c_int) << 8;
const I_FLUSH: libc::c_int = STR | 0o5;
const I_STR: libc::c_int = STR | 0o10;
const FLUSHR: libc::c_int = 0x01;
/// `I_STR` timeout meaning "wait forever".
const INFTIM: libc::c_int = -1;

/// A provider descriptor opened `O_RDWR`, with STREAMS message I/O.
///
/// The descriptor is exposed through [`AsRawFd`] so callers needing
/// bounded waits can `poll`/`select` on it; the channel itself never
/// implements timeouts.
pub struct DeviceStream {
    fd: OwnedFd,
}

impl DeviceStream {
    /// Opens a device node for reading and writing.
    ///
    /// The raw open error is preserved inside [`TransportError::Open`];
    /// classifying ENOENT/EPERM/EACCES into user-facing statuses is the
    /// resolver's job, which also knows the interface name being asked for.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| TransportError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(?path, "opened DLPI device");
        Ok(Self { fd: file.into() })
    }

    fn raw(&self) -> libc::c_int {
        self.fd.as_raw_fd()
    }
}

impl AsRawFd for DeviceStream {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

impl ControlChannel for DeviceStream {
    fn send_request(&mut self, what: &'static str, msg: &[u8]) -> Result<()> {
        let ctl = StrBuf {
            maxlen: 0,
            len: msg.len() as libc::c_int,
            buf: msg.as_ptr() as *mut libc::c_char,
        };
        // SAFETY: `ctl` points at `msg`, valid for `len` bytes for the
        // duration of the call; the data pointer is null.
        let rc = unsafe { putmsg(self.raw(), &ctl, std::ptr::null(), 0) };
        if rc < 0 {
            return Err(TransportError::Io {
                op: what,
                source: io::Error::last_os_error(),
            });
        }
        Ok(())
    }

    fn send_request_with_data(
        &mut self,
        what: &'static str,
        msg: &[u8],
        data: &[u8],
    ) -> Result<()> {
        let ctl = StrBuf {
            maxlen: 0,
            len: msg.len() as libc::c_int,
            buf: msg.as_ptr() as *mut libc::c_char,
        };
        let dat = StrBuf {
            maxlen: 0,
            len: data.len() as libc::c_int,
            buf: data.as_ptr() as *mut libc::c_char,
        };
        // SAFETY: both strbufs point at caller-owned slices valid for the
        // duration of the call.
        let rc = unsafe { putmsg(self.raw(), &ctl, &dat, 0) };
        if rc < 0 {
            return Err(TransportError::Io {
                op: what,
                source: io::Error::last_os_error(),
            });
        }
        Ok(())
    }

    fn recv_message(&mut self, what: &'static str, buf: &mut [u8]) -> Result<usize> {
        let mut ctl = StrBuf {
            maxlen: buf.len() as libc::c_int,
            len: 0,
            buf: buf.as_mut_ptr() as *mut libc::c_char,
        };
        let mut flags = 0;
        // SAFETY: `ctl` points at `buf`, writable for `maxlen` bytes; the
        // data pointer is null.
        let rc = unsafe { getmsg(self.raw(), &mut ctl, std::ptr::null_mut(), &mut flags) };
        if rc < 0 {
            return Err(TransportError::Io {
                op: what,
                source: io::Error::last_os_error(),
            });
        }
        Ok(ctl.len.max(0) as usize)
    }

    fn recv_frame(&mut self, ctl: &mut [u8], data: &mut [u8]) -> Result<usize> {
        let mut ctlbuf = StrBuf {
            maxlen: ctl.len() as libc::c_int,
            len: 0,
            buf: ctl.as_mut_ptr() as *mut libc::c_char,
        };
        let mut databuf = StrBuf {
            maxlen: data.len() as libc::c_int,
            len: 0,
            buf: data.as_mut_ptr() as *mut libc::c_char,
        };
        let mut flags = 0;
        // SAFETY: both strbufs point at caller-owned writable slices.
        let rc = unsafe { getmsg(self.raw(), &mut ctlbuf, &mut databuf, &mut flags) };
        if rc < 0 {
            return Err(TransportError::Io {
                op: "getmsg",
                source: io::Error::last_os_error(),
            });
        }
        Ok(databuf.len.max(0) as usize)
    }

    fn write_raw(&mut self, buf: &[u8]) -> Result<usize> {
        // SAFETY: writes from a caller-owned slice of the stated length.
        let rc = unsafe { libc::write(self.raw(), buf.as_ptr().cast(), buf.len()) };
        if rc < 0 {
            return Err(TransportError::Io {
                op: "send",
                source: io::Error::last_os_error(),
            });
        }
        Ok(rc as usize)
    }

    fn strioctl(&mut self, cmd: i32, buf: &mut [u8], len: usize) -> Result<usize> {
        let mut req = StrIoctl {
            ic_cmd: cmd,
            ic_timout: INFTIM,
            ic_len: len as libc::c_int,
            ic_dp: buf.as_mut_ptr() as *mut libc::c_char,
        };
        // SAFETY: `req.ic_dp` points at a caller-owned buffer of at least
        // `ic_len` bytes, readable and writable across the ioctl.
        let rc = unsafe { libc::ioctl(self.raw(), I_STR, &mut req) };
        if rc < 0 {
            return Err(TransportError::Io {
                op: "strioctl",
                source: io::Error::last_os_error(),
            });
        }
        Ok(req.ic_len.max(0) as usize)
    }

    fn flush_read(&mut self) -> Result<()> {
        // SAFETY: plain ioctl with an integer argument.
        let rc = unsafe { libc::ioctl(self.raw(), I_FLUSH, FLUSHR) };
        if rc != 0 {
            return Err(TransportError::Io {
                op: "FLUSHR",
                source: io::Error::last_os_error(),
            });
        }
        Ok(())
    }
}
