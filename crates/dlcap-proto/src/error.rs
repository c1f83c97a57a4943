//! Codec errors and the provider error-code vocabulary.

use std::borrow::Cow;

/// Errors from encoding or decoding control messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtoError {
    /// The message is shorter than its primitive requires.
    #[error("{what}: truncated message ({got} bytes, need {want})")]
    Truncated {
        what: &'static str,
        got: usize,
        want: usize,
    },

    /// A PPA record chain points outside the received table.
    #[error("PPA table walk left the received region (offset {offset}, table {len} bytes)")]
    BadPpaChain { offset: usize, len: usize },
}

pub type Result<T> = std::result::Result<T, ProtoError>;

// DLPI error codes carried in DL_ERROR_ACK.
pub const DL_BADSAP: u32 = 0x00;
pub const DL_BADADDR: u32 = 0x01;
pub const DL_ACCESS: u32 = 0x02;
pub const DL_OUTSTATE: u32 = 0x03;
pub const DL_SYSERR: u32 = 0x04;
pub const DL_BADCORR: u32 = 0x05;
pub const DL_BADDATA: u32 = 0x06;
pub const DL_UNSUPPORTED: u32 = 0x07;
pub const DL_BADPPA: u32 = 0x08;
pub const DL_BADPRIM: u32 = 0x09;
pub const DL_BADQOSPARAM: u32 = 0x0a;
pub const DL_BADQOSTYPE: u32 = 0x0b;
pub const DL_BADTOKEN: u32 = 0x0c;
pub const DL_BOUND: u32 = 0x0d;
pub const DL_INITFAILED: u32 = 0x0e;
pub const DL_NOADDR: u32 = 0x0f;
pub const DL_NOTINIT: u32 = 0x10;
pub const DL_UNDELIVERABLE: u32 = 0x11;
pub const DL_NOTSUPPORTED: u32 = 0x12;
pub const DL_TOOMANY: u32 = 0x13;
pub const DL_NOTENAB: u32 = 0x14;
pub const DL_BUSY: u32 = 0x15;
pub const DL_NOAUTO: u32 = 0x16;
pub const DL_NOXIDAUTO: u32 = 0x17;
pub const DL_NOTESTAUTO: u32 = 0x18;
pub const DL_XIDAUTO: u32 = 0x19;
pub const DL_TESTAUTO: u32 = 0x1a;
pub const DL_PENDING: u32 = 0x1b;

/// How the device was resolved. `DL_BADPPA` reads differently depending on
/// whether PPAs are looked up in a shared control node's table or are just
/// per-interface unit numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PpaFlavor {
    SharedNode,
    PerNode,
}

/// Returns a human-readable description for a DLPI error code.
///
/// Unknown codes format as `Error %02x`, matching long-standing practice so
/// log scrapers keep working.
pub fn dl_errno_description(dl_errno: u32, flavor: PpaFlavor) -> Cow<'static, str> {
    let text = match dl_errno {
        DL_ACCESS => "Improper permissions for request",
        DL_BADADDR => "DLSAP addr in improper format or invalid",
        DL_BADCORR => "Seq number not from outstand DL_CONN_IND",
        DL_BADDATA => "User data exceeded provider limit",
        DL_BADPPA => match flavor {
            PpaFlavor::SharedNode => "Specified PPA was invalid",
            PpaFlavor::PerNode => "Specified PPA (device unit) was invalid",
        },
        DL_BADPRIM => "Primitive received not known by provider",
        DL_BADQOSPARAM => "QOS parameters contained invalid values",
        DL_BADQOSTYPE => "QOS structure type is unknown/unsupported",
        DL_BADSAP => "Bad LSAP selector",
        DL_BADTOKEN => "Token used not an active stream",
        DL_BOUND => "Attempted second bind with dl_max_conind",
        DL_INITFAILED => "Physical link initialization failed",
        DL_NOADDR => "Provider couldn't allocate alternate address",
        DL_NOTINIT => "Physical link not initialized",
        DL_OUTSTATE => "Primitive issued in improper state",
        DL_SYSERR => "UNIX system error occurred",
        DL_UNSUPPORTED => "Requested service not supplied by provider",
        DL_UNDELIVERABLE => "Previous data unit could not be delivered",
        DL_NOTSUPPORTED => "Primitive is known but not supported",
        DL_TOOMANY => "Limit exceeded",
        DL_NOTENAB => "Promiscuous mode not enabled",
        DL_BUSY => "Other streams for PPA in post-attached",
        DL_NOAUTO => "Automatic handling XID&TEST not supported",
        DL_NOXIDAUTO => "Automatic handling of XID not supported",
        DL_NOTESTAUTO => "Automatic handling of TEST not supported",
        DL_XIDAUTO => "Automatic handling of XID response",
        DL_TESTAUTO => "Automatic handling of TEST response",
        DL_PENDING => "Pending outstanding connect indications",
        _ => return Cow::Owned(format!("Error {dl_errno:02x}")),
    };
    Cow::Borrowed(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn badppa_description_depends_on_flavor() {
        assert_eq!(
            dl_errno_description(DL_BADPPA, PpaFlavor::SharedNode),
            "Specified PPA was invalid"
        );
        assert_eq!(
            dl_errno_description(DL_BADPPA, PpaFlavor::PerNode),
            "Specified PPA (device unit) was invalid"
        );
    }

    #[test]
    fn unknown_code_formats_hex() {
        assert_eq!(
            dl_errno_description(0xff, PpaFlavor::PerNode),
            "Error ff"
        );
    }

    #[test]
    fn known_codes_have_fixed_text() {
        assert_eq!(
            dl_errno_description(DL_BUSY, PpaFlavor::PerNode),
            "Other streams for PPA in post-attached"
        );
        assert_eq!(
            dl_errno_description(DL_SYSERR, PpaFlavor::SharedNode),
            "UNIX system error occurred"
        );
    }
}
