//! DLPI primitive discriminants and related protocol constants.
//!
//! Values match `<sys/dlpi.h>` and, for the HP extensions, `<sys/dlpi_ext.h>`.
//! Every control message starts with one of these discriminants as a
//! native-endian `u32`.

use std::borrow::Cow;

// Local management and connectionless primitives.
pub const DL_INFO_REQ: u32 = 0x00;
pub const DL_BIND_REQ: u32 = 0x01;
pub const DL_UNBIND_REQ: u32 = 0x02;
pub const DL_INFO_ACK: u32 = 0x03;
pub const DL_BIND_ACK: u32 = 0x04;
pub const DL_ERROR_ACK: u32 = 0x05;
pub const DL_OK_ACK: u32 = 0x06;
pub const DL_UNITDATA_REQ: u32 = 0x07;
pub const DL_UNITDATA_IND: u32 = 0x08;
pub const DL_UDERROR_IND: u32 = 0x09;
pub const DL_UDQOS_REQ: u32 = 0x0a;
pub const DL_ATTACH_REQ: u32 = 0x0b;
pub const DL_DETACH_REQ: u32 = 0x0c;

// Connection-oriented primitives. The driver never issues these; they are
// kept so an unexpected acknowledgment can be named in diagnostics.
pub const DL_CONNECT_REQ: u32 = 0x0d;
pub const DL_CONNECT_IND: u32 = 0x0e;
pub const DL_CONNECT_RES: u32 = 0x0f;
pub const DL_CONNECT_CON: u32 = 0x10;
pub const DL_TOKEN_REQ: u32 = 0x11;
pub const DL_TOKEN_ACK: u32 = 0x12;
pub const DL_DISCONNECT_REQ: u32 = 0x13;
pub const DL_DISCONNECT_IND: u32 = 0x14;
pub const DL_RESET_REQ: u32 = 0x17;
pub const DL_RESET_IND: u32 = 0x18;
pub const DL_RESET_RES: u32 = 0x19;
pub const DL_RESET_CON: u32 = 0x1a;

pub const DL_SUBS_BIND_REQ: u32 = 0x1b;
pub const DL_SUBS_BIND_ACK: u32 = 0x1c;
pub const DL_PROMISCON_REQ: u32 = 0x1f;
pub const DL_PROMISCOFF_REQ: u32 = 0x20;

/// Solaris extension: opt into passive (aggregation-friendly) mode.
pub const DL_PASSIVE_REQ: u32 = 0x114;

// HP-UX extension primitives from <sys/dlpi_ext.h>.
pub const DL_HP_PPA_REQ: u32 = 0x400;
pub const DL_HP_PPA_ACK: u32 = 0x401;
pub const DL_HP_RAWDATA_REQ: u32 = 0x404;
pub const DL_HP_RAWDATA_IND: u32 = 0x405;

// Provider styles, reported in DL_INFO_ACK. Style-2 providers require an
// explicit DL_ATTACH_REQ naming the PPA before binding.
pub const DL_STYLE1: u32 = 0x0500;
pub const DL_STYLE2: u32 = 0x0501;

// Service modes for DL_BIND_REQ.
pub const DL_CODLS: u32 = 0x01;
pub const DL_CLDLS: u32 = 0x02;
/// HP-UX raw connectionless service; frames carry full link-layer headers.
pub const DL_HP_RAWDLS: u32 = 0x10;

// Promiscuity levels for DL_PROMISCON_REQ.
pub const DL_PROMISC_PHYS: u32 = 0x01;
pub const DL_PROMISC_SAP: u32 = 0x02;
pub const DL_PROMISC_MULTI: u32 = 0x03;

// MAC types reported in DL_INFO_ACK.
pub const DL_CSMACD: u32 = 0x00;
pub const DL_TPB: u32 = 0x01;
pub const DL_TPR: u32 = 0x02;
pub const DL_METRO: u32 = 0x03;
pub const DL_ETHER: u32 = 0x04;
pub const DL_HDLC: u32 = 0x05;
pub const DL_CHAR: u32 = 0x06;
pub const DL_CTCA: u32 = 0x07;
pub const DL_FDDI: u32 = 0x08;
pub const DL_OTHER: u32 = 0x09;
/// ATM Classical IP interface (SunATM).
pub const DL_IPATM: u32 = 0x12;

/// HP PPA hardware state indicating the attachment is down.
pub const HDW_DEAD: u32 = 0x02;

/// Returns the mnemonic for a primitive discriminant.
///
/// Unknown values format as `unknown primitive 0x…` so a misbehaving
/// provider can still be diagnosed.
pub fn primitive_name(prim: u32) -> Cow<'static, str> {
    let name = match prim {
        DL_INFO_REQ => "DL_INFO_REQ",
        DL_INFO_ACK => "DL_INFO_ACK",
        DL_ATTACH_REQ => "DL_ATTACH_REQ",
        DL_DETACH_REQ => "DL_DETACH_REQ",
        DL_BIND_REQ => "DL_BIND_REQ",
        DL_BIND_ACK => "DL_BIND_ACK",
        DL_UNBIND_REQ => "DL_UNBIND_REQ",
        DL_OK_ACK => "DL_OK_ACK",
        DL_ERROR_ACK => "DL_ERROR_ACK",
        DL_SUBS_BIND_REQ => "DL_SUBS_BIND_REQ",
        DL_SUBS_BIND_ACK => "DL_SUBS_BIND_ACK",
        DL_UNITDATA_REQ => "DL_UNITDATA_REQ",
        DL_UNITDATA_IND => "DL_UNITDATA_IND",
        DL_UDERROR_IND => "DL_UDERROR_IND",
        DL_UDQOS_REQ => "DL_UDQOS_REQ",
        DL_CONNECT_REQ => "DL_CONNECT_REQ",
        DL_CONNECT_IND => "DL_CONNECT_IND",
        DL_CONNECT_RES => "DL_CONNECT_RES",
        DL_CONNECT_CON => "DL_CONNECT_CON",
        DL_TOKEN_REQ => "DL_TOKEN_REQ",
        DL_TOKEN_ACK => "DL_TOKEN_ACK",
        DL_DISCONNECT_REQ => "DL_DISCONNECT_REQ",
        DL_DISCONNECT_IND => "DL_DISCONNECT_IND",
        DL_RESET_REQ => "DL_RESET_REQ",
        DL_RESET_IND => "DL_RESET_IND",
        DL_RESET_RES => "DL_RESET_RES",
        DL_RESET_CON => "DL_RESET_CON",
        DL_PROMISCON_REQ => "DL_PROMISCON_REQ",
        DL_PROMISCOFF_REQ => "DL_PROMISCOFF_REQ",
        DL_PASSIVE_REQ => "DL_PASSIVE_REQ",
        DL_HP_PPA_REQ => "DL_HP_PPA_REQ",
        DL_HP_PPA_ACK => "DL_HP_PPA_ACK",
        DL_HP_RAWDATA_REQ => "DL_HP_RAWDATA_REQ",
        DL_HP_RAWDATA_IND => "DL_HP_RAWDATA_IND",
        _ => return Cow::Owned(format!("unknown primitive 0x{prim:x}")),
    };
    Cow::Borrowed(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_primitive_names() {
        assert_eq!(primitive_name(DL_BIND_ACK), "DL_BIND_ACK");
        assert_eq!(primitive_name(DL_HP_PPA_ACK), "DL_HP_PPA_ACK");
        assert_eq!(primitive_name(DL_PASSIVE_REQ), "DL_PASSIVE_REQ");
    }

    #[test]
    fn unknown_primitive_formats_hex() {
        assert_eq!(primitive_name(0xdead), "unknown primitive 0xdead");
    }
}
