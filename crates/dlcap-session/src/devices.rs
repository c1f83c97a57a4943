//! Hooks for the system interface walker.
//!
//! The generic enumeration of interfaces lives outside this crate; these
//! are the predicates it calls back into, plus the SunATM unit query for
//! `ba` devices the walker cannot see.

use dlcap_transport::ControlChannel;

use crate::error::{CaptureError, Result};

/// SunATM `A_GET_UNITS`: how many ATM units the driver manages.
const A_GET_UNITS: i32 = (b'A' as i32) << 8 | 118;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceFlags {
    pub loopback: bool,
    /// Whether "connected/disconnected" means anything for this device.
    pub connection_status_applicable: bool,
}

/// Every interface the walker reports is capturable here.
pub fn include_device(_name: &str) -> bool {
    true
}

pub fn device_flags(loopback: bool) -> DeviceFlags {
    DeviceFlags {
        loopback,
        connection_status_applicable: !loopback,
    }
}

/// Names the SunATM devices behind an opened `ba` control descriptor,
/// `ba0` through `ba{n-1}`.
pub fn atm_device_names<C: ControlChannel>(chan: &mut C) -> Result<Vec<String>> {
    let mut buf = [0u8; 4];
    let len = buf.len();
    let got = chan.strioctl(A_GET_UNITS, &mut buf, len)?;
    if got < buf.len() {
        return Err(CaptureError::Failed(format!(
            "A_GET_UNITS: short reply ({got} bytes)"
        )));
    }
    let units = u32::from_ne_bytes(buf);
    Ok((0..units).map(|unit| format!("ba{unit}")).collect())
}
