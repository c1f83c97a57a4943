use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use dlcap_session::devices::{device_flags, include_device};

use crate::cmd::DevicesArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(_args: DevicesArgs) -> CliResult<i32> {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["NAME", "LOOPBACK", "STATUS"]);

    for iface in imp::interfaces()? {
        if !include_device(&iface.name) {
            continue;
        }
        let flags = device_flags(iface.loopback);
        let status = if !flags.connection_status_applicable {
            "n/a"
        } else if iface.up {
            "up"
        } else {
            "down"
        };
        table.add_row(vec![
            iface.name,
            flags.loopback.to_string(),
            status.to_string(),
        ]);
    }

    println!("{table}");
    Ok(SUCCESS)
}

pub struct Interface {
    pub name: String,
    pub loopback: bool,
    pub up: bool,
}

#[cfg(unix)]
mod imp {
    use std::ffi::CStr;
    use std::io;

    use super::Interface;
    use crate::exit::{CliError, CliResult, INTERNAL};

    /// Walks the system interface list. Addresses are irrelevant here,
    /// so entries are deduplicated by name.
    pub fn interfaces() -> CliResult<Vec<Interface>> {
        let mut out: Vec<Interface> = Vec::new();
        let mut ifap: *mut libc::ifaddrs = std::ptr::null_mut();

        // SAFETY: getifaddrs allocates the list; every node is read
        // within the walk and the list is freed exactly once.
        unsafe {
            if libc::getifaddrs(&mut ifap) != 0 {
                let err = io::Error::last_os_error();
                return Err(CliError::new(INTERNAL, format!("getifaddrs: {err}")));
            }
            let mut cursor = ifap;
            while !cursor.is_null() {
                let entry = &*cursor;
                cursor = entry.ifa_next;
                if entry.ifa_name.is_null() {
                    continue;
                }
                let name = CStr::from_ptr(entry.ifa_name).to_string_lossy().into_owned();
                if out.iter().any(|iface| iface.name == name) {
                    continue;
                }
                out.push(Interface {
                    name,
                    loopback: entry.ifa_flags & libc::IFF_LOOPBACK as libc::c_uint != 0,
                    up: entry.ifa_flags & libc::IFF_UP as libc::c_uint != 0,
                });
            }
            libc::freeifaddrs(ifap);
        }

        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }
}

#[cfg(not(unix))]
mod imp {
    use super::Interface;
    use crate::exit::{CliError, CliResult, NOT_SUPPORTED};

    pub fn interfaces() -> CliResult<Vec<Interface>> {
        Err(CliError::new(
            NOT_SUPPORTED,
            "interface enumeration is not supported on this platform",
        ))
    }
}
