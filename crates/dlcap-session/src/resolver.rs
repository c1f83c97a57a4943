//! Interface-name resolution.
//!
//! Turns a user-supplied name like `bge0` or `/dev/dlpi/en:1` into the
//! device node to open and the PPA to attach to. The two strategies are
//! selected by [`crate::profile::DeviceStrategy`]: per-interface nodes
//! carry the PPA in the name's trailing unit number, while a shared node
//! is queried for its attachment table and scanned for a matching record.

use std::io;
use std::path::{Path, PathBuf};

use dlcap_proto::codec::PpaInfo;
use dlcap_proto::primitive::HDW_DEAD;
use tracing::debug;

use crate::error::{CaptureError, NameError, Result};
use crate::profile::Profile;

/// Strips a trailing `:digits` logical-unit suffix, which names a
/// sub-interface the provider does not distinguish.
pub fn strip_logical_unit(name: &str) -> &str {
    match name.rsplit_once(':') {
        Some((base, unit)) if !unit.is_empty() && unit.bytes().all(|b| b.is_ascii_digit()) => base,
        _ => name,
    }
}

/// Splits an interface name into its device-type prefix and trailing
/// unit number, ignoring any leading path components.
///
/// `bge0` gives `("bge", 0)`. A name with no trailing digit run is
/// missing its unit; a name that is nothing but digits after the last
/// path separator is only a unit.
pub fn split_device_name(name: &str) -> std::result::Result<(&str, u32), NameError> {
    let tail = match name.rfind('/') {
        Some(pos) => &name[pos + 1..],
        None => name,
    };

    let digits_at = tail
        .rfind(|c: char| !c.is_ascii_digit())
        .map(|pos| pos + c_len(tail, pos))
        .unwrap_or(0);

    if digits_at == tail.len() {
        return Err(NameError::MissingUnitNumber {
            name: name.to_string(),
        });
    }
    if digits_at == 0 {
        return Err(NameError::OnlyUnitNumber {
            name: name.to_string(),
        });
    }

    let unit = tail[digits_at..]
        .parse::<u32>()
        .map_err(|_| NameError::BadUnitNumber {
            name: name.to_string(),
        })?;
    Ok((&tail[..digits_at], unit))
}

fn c_len(s: &str, pos: usize) -> usize {
    s[pos..].chars().next().map_or(1, char::len_utf8)
}

/// One path to try opening, with the PPA to use if it opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    pub ppa: u32,
}

/// Open plan for the per-interface-node strategy.
///
/// The node named by the type alone is preferred, with the unit as the
/// PPA; if that node does not exist, the node named by type+unit is
/// tried with PPA zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerNodePlan {
    pub primary: Candidate,
    pub fallback: Candidate,
}

/// Computes the per-node open plan for a name, which may be absolute or
/// relative to the profile's device directory.
pub fn per_node_plan(dev_dir: &str, name: &str) -> std::result::Result<PerNodePlan, NameError> {
    let name = strip_logical_unit(name);
    let full: PathBuf = if name.starts_with('/') {
        PathBuf::from(name)
    } else {
        Path::new(dev_dir).join(name)
    };
    let (device_type, unit) = split_device_name(name)?;

    let stripped = full
        .parent()
        .map(|dir| dir.join(device_type))
        .unwrap_or_else(|| PathBuf::from(device_type));

    Ok(PerNodePlan {
        primary: Candidate {
            path: stripped,
            ppa: unit,
        },
        fallback: Candidate {
            path: full,
            ppa: 0,
        },
    })
}

/// Selects the PPA for `device`+`unit` from a shared node's attachment
/// table.
///
/// The scan matches on either module name and the instance number. When
/// no name matches, `major_of_node` is consulted (a stat of the
/// conventional `/dev/<device><unit>` path, performed lazily because it
/// is only needed on the fallback) and the scan retries on major number.
/// A matching record in hardware state `HDW_DEAD` is reported rather
/// than attached to.
pub fn select_ppa(
    records: &[PpaInfo],
    device: &str,
    unit: u32,
    major_of_node: impl FnOnce() -> Option<u32>,
) -> Result<u32> {
    let found = records
        .iter()
        .find(|rec| {
            (rec.module_id_1 == device || rec.module_id_2 == device) && rec.instance == unit
        })
        .or_else(|| {
            let major = major_of_node()?;
            records
                .iter()
                .find(|rec| rec.major == major && rec.instance == unit)
        });

    match found {
        Some(rec) if rec.hdw_state == HDW_DEAD => Err(CaptureError::Failed(format!(
            "{device}{unit}: hardware state: DOWN"
        ))),
        Some(rec) => {
            debug!(device, unit, ppa = rec.ppa, "resolved attachment point");
            Ok(rec.ppa)
        }
        None => Err(CaptureError::NoSuchDevice(format!(
            "can't find PPA for {device}{unit}"
        ))),
    }
}

/// Classifies a device-node open failure into a user-facing status.
///
/// A missing node is only "no such device" when the interface itself is
/// unknown to the system; when the interface exists but has no capture
/// node, the accurate diagnostic is that capture is not supported on it.
pub fn classify_open_error(name: &str, path: &Path, err: &io::Error) -> CaptureError {
    match err.kind() {
        io::ErrorKind::NotFound => {
            if interface_exists(name) {
                CaptureError::NotSupported(format!("{name}: no DLPI device found"))
            } else {
                CaptureError::NoSuchDevice(format!("{name}: no such device"))
            }
        }
        io::ErrorKind::PermissionDenied => {
            let which = match err.raw_os_error() {
                Some(code) if code == libc::EPERM => "EPERM",
                _ => "EACCES",
            };
            CaptureError::PermissionDenied(format!(
                "{}: {err} ({which}) - root privilege may be required",
                path.display()
            ))
        }
        _ => CaptureError::Failed(format!("{}: {err}", path.display())),
    }
}

/// Asks the live network stack whether an interface by this name exists
/// at all, via the interface-flags ioctl on a throwaway datagram socket.
#[cfg(unix)]
fn interface_exists(name: &str) -> bool {
    let mut req: libc::ifreq = unsafe { std::mem::zeroed() };
    let bytes = name.as_bytes();
    if bytes.len() >= req.ifr_name.len() {
        return false;
    }
    for (dst, src) in req.ifr_name.iter_mut().zip(bytes) {
        *dst = *src as libc::c_char;
    }

    // SAFETY: the socket and ioctl use only the stack-local ifreq; the
    // descriptor is closed before returning.
    unsafe {
        let fd = libc::socket(libc::AF_INET, libc::SOCK_DGRAM, 0);
        if fd < 0 {
            return false;
        }
        let rc = libc::ioctl(fd, libc::SIOCGIFFLAGS, &mut req);
        libc::close(fd);
        rc == 0
    }
}

#[cfg(not(unix))]
fn interface_exists(_name: &str) -> bool {
    false
}

/// Whether a name refers to a SunATM device, which needs the
/// pseudo-promiscuous ioctl instead of the generic DLPI promiscuity
/// requests.
pub fn is_atm_name(name: &str) -> bool {
    matches!(split_device_name(strip_logical_unit(name)), Ok((base, _)) if base == "ba")
}

/// Opens the separate send descriptor for profiles that require one.
///
/// Best effort: a session without it still captures, and injection
/// reports the output side unavailable.
pub fn open_send_channel<C>(
    profile: &Profile,
    open: impl FnOnce() -> dlcap_transport::Result<C>,
) -> Option<C> {
    if !profile.split_send_fd {
        return None;
    }
    match open() {
        Ok(chan) => Some(chan),
        Err(err) => {
            debug!(error = %err, "send descriptor unavailable, session will be receive-only");
            None
        }
    }
}

/// Resolves a name to an open device stream, an optional send stream,
/// and the PPA on the host platform.
#[cfg(any(target_os = "solaris", target_os = "illumos"))]
pub fn open_device(
    profile: &Profile,
    name: &str,
) -> Result<(
    dlcap_transport::DeviceStream,
    Option<dlcap_transport::DeviceStream>,
    u32,
)> {
    use crate::profile::DeviceStrategy;
    use dlcap_transport::{DeviceStream, TransportError};

    fn classify(name: &str, err: TransportError) -> CaptureError {
        match err {
            TransportError::Open { path, source } => classify_open_error(name, &path, &source),
            other => CaptureError::Transport(other),
        }
    }

    match &profile.device {
        DeviceStrategy::PerNode { dev_dir } => {
            let plan = per_node_plan(dev_dir, name)?;
            let (stream, candidate) = match DeviceStream::open(&plan.primary.path) {
                Ok(stream) => (stream, plan.primary),
                Err(TransportError::Open { source, .. })
                    if source.kind() == io::ErrorKind::NotFound =>
                {
                    let stream =
                        DeviceStream::open(&plan.fallback.path).map_err(|err| classify(name, err))?;
                    (stream, plan.fallback)
                }
                Err(err) => return Err(classify(name, err)),
            };
            let send = open_send_channel(profile, || DeviceStream::open(&candidate.path));
            Ok((stream, send, candidate.ppa))
        }
        DeviceStrategy::SharedNode { node } => {
            let mut stream = DeviceStream::open(node).map_err(|err| classify(name, err))?;
            let bare = strip_logical_unit(name);
            let (device_type, unit) = split_device_name(bare)?;
            let records = crate::handshake::query_ppa_table(&mut stream)?;
            let ppa = select_ppa(&records, device_type, unit, || {
                use std::os::unix::fs::MetadataExt;
                let conventional = format!("/dev/{device_type}{unit}");
                let meta = std::fs::metadata(conventional).ok()?;
                // SAFETY: pure arithmetic on the device number.
                Some(unsafe { libc::major(meta.rdev()) })
            })?;
            let send = open_send_channel(profile, || DeviceStream::open(node));
            Ok((stream, send, ppa))
        }
    }
}
