//! Encode/decode of the control messages the driver exchanges.
//!
//! Field offsets and sizes mirror the provider's C structures exactly;
//! nothing on this wire is self-describing, so a one-word layout mistake
//! shows up as a provider `DL_BADPRIM` at best. All multi-byte fields are
//! native-endian `u32`s at 4-byte offsets. Decodes are bounds-checked and
//! never panic on short input.

use bytes::{BufMut, BytesMut};

use crate::error::{ProtoError, Result};
use crate::primitive::{
    DL_ATTACH_REQ, DL_BIND_ACK, DL_BIND_REQ, DL_ERROR_ACK, DL_HP_PPA_ACK, DL_HP_PPA_REQ,
    DL_HP_RAWDATA_REQ, DL_INFO_ACK, DL_INFO_REQ, DL_OK_ACK, DL_PASSIVE_REQ, DL_PROMISCON_REQ,
};

/// Capacity of every per-call control buffer. Large enough for the biggest
/// acknowledgment any known provider sends through the normal path; the PPA
/// table is the one exception and is sized from its own header.
pub const MAX_CONTROL_LEN: usize = 8192;

/// Reads the primitive discriminant, if the message is long enough to
/// carry one.
pub fn primitive_of(msg: &[u8]) -> Option<u32> {
    Some(u32::from_ne_bytes(msg.get(..4)?.try_into().ok()?))
}

fn u32_at(msg: &[u8], off: usize, what: &'static str, want: usize) -> Result<u32> {
    let bytes = msg
        .get(off..off + 4)
        .ok_or(ProtoError::Truncated {
            what,
            got: msg.len(),
            want,
        })?;
    Ok(u32::from_ne_bytes(bytes.try_into().expect("4-byte slice")))
}

fn cstr_at(msg: &[u8], off: usize, cap: usize) -> String {
    let field = &msg[off..off + cap];
    let end = field.iter().position(|&b| b == 0).unwrap_or(cap);
    String::from_utf8_lossy(&field[..end]).into_owned()
}

/// `dl_info_req_t`: primitive only.
pub struct InfoReq;

impl InfoReq {
    pub const SIZE: usize = 4;

    pub fn encode(dst: &mut BytesMut) {
        dst.put_u32_ne(DL_INFO_REQ);
    }
}

/// `dl_attach_req_t`: primitive + PPA.
pub struct AttachReq {
    pub ppa: u32,
}

impl AttachReq {
    pub const SIZE: usize = 8;

    pub fn encode(&self, dst: &mut BytesMut) {
        dst.put_u32_ne(DL_ATTACH_REQ);
        dst.put_u32_ne(self.ppa);
    }
}

/// `dl_bind_req_t`: primitive, SAP, max_conind, service mode, conn_mgmt,
/// xidtest_flg.
pub struct BindReq {
    pub sap: u32,
    pub max_conind: u32,
    pub service_mode: u32,
}

impl BindReq {
    pub const SIZE: usize = 24;

    pub fn encode(&self, dst: &mut BytesMut) {
        dst.put_u32_ne(DL_BIND_REQ);
        dst.put_u32_ne(self.sap);
        dst.put_u32_ne(self.max_conind);
        dst.put_u32_ne(self.service_mode);
        dst.put_u32_ne(0); // dl_conn_mgmt
        dst.put_u32_ne(0); // dl_xidtest_flg
    }
}

/// `dl_promiscon_req_t`: primitive + level.
pub struct PromisconReq {
    pub level: u32,
}

impl PromisconReq {
    pub const SIZE: usize = 8;

    pub fn encode(&self, dst: &mut BytesMut) {
        dst.put_u32_ne(DL_PROMISCON_REQ);
        dst.put_u32_ne(self.level);
    }
}

/// `dl_passive_req_t`: primitive only.
pub struct PassiveReq;

impl PassiveReq {
    pub const SIZE: usize = 4;

    pub fn encode(dst: &mut BytesMut) {
        dst.put_u32_ne(DL_PASSIVE_REQ);
    }
}

/// `dl_hp_ppa_req_t`: primitive only.
pub struct HpPpaReq;

impl HpPpaReq {
    pub const SIZE: usize = 4;

    pub fn encode(dst: &mut BytesMut) {
        dst.put_u32_ne(DL_HP_PPA_REQ);
    }
}

/// `dl_hp_rawdata_req_t` header. The frame itself travels in the data part
/// of the same message; raw mode carries no address, the destination is
/// implied by the frame's own link-layer header.
pub struct HpRawDataReq;

impl HpRawDataReq {
    pub const SIZE: usize = 4;

    pub fn encode(dst: &mut BytesMut) {
        dst.put_u32_ne(DL_HP_RAWDATA_REQ);
    }
}

/// `dl_info_ack_t`. Only the fields the driver consults are surfaced;
/// `encode` fills the full 76-byte image so scripted providers produce
/// layout-exact acknowledgments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InfoAck {
    pub mac_type: u32,
    pub provider_style: u32,
}

impl InfoAck {
    pub const SIZE: usize = 76;
    const MAC_TYPE_OFFSET: usize = 16;
    const PROVIDER_STYLE_OFFSET: usize = 52;

    pub fn decode(msg: &[u8]) -> Result<Self> {
        Ok(Self {
            mac_type: u32_at(msg, Self::MAC_TYPE_OFFSET, "info ack", Self::SIZE)?,
            provider_style: u32_at(msg, Self::PROVIDER_STYLE_OFFSET, "info ack", Self::SIZE)?,
        })
    }

    pub fn encode(&self, dst: &mut BytesMut) {
        let mut image = [0u8; Self::SIZE];
        image[..4].copy_from_slice(&DL_INFO_ACK.to_ne_bytes());
        image[Self::MAC_TYPE_OFFSET..Self::MAC_TYPE_OFFSET + 4]
            .copy_from_slice(&self.mac_type.to_ne_bytes());
        image[Self::PROVIDER_STYLE_OFFSET..Self::PROVIDER_STYLE_OFFSET + 4]
            .copy_from_slice(&self.provider_style.to_ne_bytes());
        dst.put_slice(&image);
    }
}

/// `dl_bind_ack_t`. The handshake only checks identity and length, but the
/// bound SAP is decoded for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindAck {
    pub sap: u32,
}

impl BindAck {
    pub const SIZE: usize = 24;

    pub fn decode(msg: &[u8]) -> Result<Self> {
        Ok(Self {
            sap: u32_at(msg, 4, "bind ack", Self::SIZE)?,
        })
    }

    pub fn encode(&self, dst: &mut BytesMut) {
        dst.put_u32_ne(DL_BIND_ACK);
        dst.put_u32_ne(self.sap);
        dst.put_u32_ne(0); // dl_addr_length
        dst.put_u32_ne(0); // dl_addr_offset
        dst.put_u32_ne(0); // dl_max_conind
        dst.put_u32_ne(0); // dl_xidtest_flg
    }
}

/// `dl_ok_ack_t`: primitive + the primitive being confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OkAck {
    pub correct_primitive: u32,
}

impl OkAck {
    pub const SIZE: usize = 8;

    pub fn encode(&self, dst: &mut BytesMut) {
        dst.put_u32_ne(DL_OK_ACK);
        dst.put_u32_ne(self.correct_primitive);
    }
}

/// `dl_error_ack_t`: which primitive failed, the DLPI error code, and the
/// embedded OS errno when the code is `DL_SYSERR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorAck {
    pub error_primitive: u32,
    pub errno: u32,
    pub unix_errno: u32,
}

impl ErrorAck {
    pub const SIZE: usize = 16;

    pub fn decode(msg: &[u8]) -> Result<Self> {
        Ok(Self {
            error_primitive: u32_at(msg, 4, "error ack", Self::SIZE)?,
            errno: u32_at(msg, 8, "error ack", Self::SIZE)?,
            unix_errno: u32_at(msg, 12, "error ack", Self::SIZE)?,
        })
    }

    pub fn encode(&self, dst: &mut BytesMut) {
        dst.put_u32_ne(DL_ERROR_ACK);
        dst.put_u32_ne(self.error_primitive);
        dst.put_u32_ne(self.errno);
        dst.put_u32_ne(self.unix_errno);
    }
}

/// `dl_hp_ppa_ack_t` header. The PPA record table follows as a separate
/// message read, sized by `length` — the table can exceed any fixed control
/// buffer on aggregated-link systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HpPpaAck {
    pub count: u32,
    pub offset: u32,
    pub length: u32,
}

impl HpPpaAck {
    pub const SIZE: usize = 20;

    pub fn decode(msg: &[u8]) -> Result<Self> {
        Ok(Self {
            count: u32_at(msg, 8, "ppa ack", Self::SIZE)?,
            offset: u32_at(msg, 12, "ppa ack", Self::SIZE)?,
            length: u32_at(msg, 16, "ppa ack", Self::SIZE)?,
        })
    }

    pub fn encode(&self, dst: &mut BytesMut) {
        dst.put_u32_ne(DL_HP_PPA_ACK);
        dst.put_u32_ne(0); // dl_flags
        dst.put_u32_ne(self.count);
        dst.put_u32_ne(self.offset);
        dst.put_u32_ne(self.length);
    }
}

/// One `dl_hp_ppa_info_t` record.
///
/// Layout, relative to the record start:
/// `next_offset` (0), `ppa` (4), `hdw_state` (8), `major` (12),
/// `instance` (16), `module_id_1` (20, 40-byte NUL-terminated name),
/// `module_id_2` (60, 40-byte alternate name). Records chain through
/// `next_offset`, measured from the start of the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PpaInfo {
    pub ppa: u32,
    pub hdw_state: u32,
    pub major: u32,
    pub instance: u32,
    pub module_id_1: String,
    pub module_id_2: String,
    pub next_offset: u32,
}

impl PpaInfo {
    pub const SIZE: usize = 100;
    const MODULE_ID_CAP: usize = 40;

    fn decode_at(table: &[u8], off: usize) -> Result<Self> {
        if off + Self::SIZE > table.len() {
            return Err(ProtoError::BadPpaChain {
                offset: off,
                len: table.len(),
            });
        }
        let rec = &table[off..off + Self::SIZE];
        Ok(Self {
            next_offset: u32_at(rec, 0, "ppa info", Self::SIZE)?,
            ppa: u32_at(rec, 4, "ppa info", Self::SIZE)?,
            hdw_state: u32_at(rec, 8, "ppa info", Self::SIZE)?,
            major: u32_at(rec, 12, "ppa info", Self::SIZE)?,
            instance: u32_at(rec, 16, "ppa info", Self::SIZE)?,
            module_id_1: cstr_at(rec, 20, Self::MODULE_ID_CAP),
            module_id_2: cstr_at(rec, 60, Self::MODULE_ID_CAP),
        })
    }

    pub fn encode(&self, dst: &mut BytesMut) {
        let mut image = [0u8; Self::SIZE];
        image[..4].copy_from_slice(&self.next_offset.to_ne_bytes());
        image[4..8].copy_from_slice(&self.ppa.to_ne_bytes());
        image[8..12].copy_from_slice(&self.hdw_state.to_ne_bytes());
        image[12..16].copy_from_slice(&self.major.to_ne_bytes());
        image[16..20].copy_from_slice(&self.instance.to_ne_bytes());
        let id1 = self.module_id_1.as_bytes();
        let id2 = self.module_id_2.as_bytes();
        image[20..20 + id1.len().min(Self::MODULE_ID_CAP - 1)]
            .copy_from_slice(&id1[..id1.len().min(Self::MODULE_ID_CAP - 1)]);
        image[60..60 + id2.len().min(Self::MODULE_ID_CAP - 1)]
            .copy_from_slice(&id2[..id2.len().min(Self::MODULE_ID_CAP - 1)]);
        dst.put_slice(&image);
    }
}

/// Walks the record table, following `next_offset` chains, yielding at most
/// `count` records.
pub fn walk_ppa_records(table: &[u8], count: u32) -> Result<Vec<PpaInfo>> {
    let mut records = Vec::with_capacity(count as usize);
    let mut off = 0usize;
    for _ in 0..count {
        let rec = PpaInfo::decode_at(table, off)?;
        off = rec.next_offset as usize;
        records.push(rec);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::{DL_ETHER, DL_STYLE2, HDW_DEAD};

    #[test]
    fn bind_req_layout() {
        let mut buf = BytesMut::new();
        BindReq {
            sap: 22,
            max_conind: 1,
            service_mode: 0x10,
        }
        .encode(&mut buf);
        assert_eq!(buf.len(), BindReq::SIZE);
        assert_eq!(primitive_of(&buf), Some(DL_BIND_REQ));
        assert_eq!(u32::from_ne_bytes(buf[4..8].try_into().unwrap()), 22);
        assert_eq!(u32::from_ne_bytes(buf[12..16].try_into().unwrap()), 0x10);
        // conn_mgmt and xidtest_flg stay zero
        assert_eq!(&buf[16..24], &[0u8; 8]);
    }

    #[test]
    fn info_ack_roundtrip_fixed_offsets() {
        let mut buf = BytesMut::new();
        InfoAck {
            mac_type: DL_ETHER,
            provider_style: DL_STYLE2,
        }
        .encode(&mut buf);
        assert_eq!(buf.len(), InfoAck::SIZE);
        assert_eq!(
            u32::from_ne_bytes(buf[16..20].try_into().unwrap()),
            DL_ETHER
        );
        assert_eq!(
            u32::from_ne_bytes(buf[52..56].try_into().unwrap()),
            DL_STYLE2
        );
        let ack = InfoAck::decode(&buf).unwrap();
        assert_eq!(ack.mac_type, DL_ETHER);
        assert_eq!(ack.provider_style, DL_STYLE2);
    }

    #[test]
    fn info_ack_decode_rejects_short_message() {
        let err = InfoAck::decode(&[0u8; 40]).unwrap_err();
        assert!(matches!(err, ProtoError::Truncated { want: 76, .. }));
    }

    #[test]
    fn error_ack_roundtrip() {
        let mut buf = BytesMut::new();
        ErrorAck {
            error_primitive: DL_BIND_REQ,
            errno: 0x04,
            unix_errno: 16,
        }
        .encode(&mut buf);
        let ack = ErrorAck::decode(&buf).unwrap();
        assert_eq!(ack.error_primitive, DL_BIND_REQ);
        assert_eq!(ack.errno, 0x04);
        assert_eq!(ack.unix_errno, 16);
    }

    #[test]
    fn primitive_of_short_message() {
        assert_eq!(primitive_of(&[1, 2]), None);
    }

    #[test]
    fn ppa_table_walk_follows_chain() {
        let mut table = BytesMut::new();
        PpaInfo {
            ppa: 3,
            hdw_state: 0,
            major: 57,
            instance: 0,
            module_id_1: "lan".into(),
            module_id_2: "snap".into(),
            next_offset: PpaInfo::SIZE as u32,
        }
        .encode(&mut table);
        PpaInfo {
            ppa: 7,
            hdw_state: HDW_DEAD,
            major: 57,
            instance: 1,
            module_id_1: "lan".into(),
            module_id_2: String::new(),
            next_offset: 0,
        }
        .encode(&mut table);

        let records = walk_ppa_records(&table, 2).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].ppa, 3);
        assert_eq!(records[0].module_id_2, "snap");
        assert_eq!(records[1].instance, 1);
        assert_eq!(records[1].hdw_state, HDW_DEAD);
    }

    #[test]
    fn ppa_table_walk_rejects_escaping_chain() {
        let mut table = BytesMut::new();
        PpaInfo {
            ppa: 0,
            hdw_state: 0,
            major: 0,
            instance: 0,
            module_id_1: "en".into(),
            module_id_2: String::new(),
            next_offset: 4096, // far past the table
        }
        .encode(&mut table);

        let err = walk_ppa_records(&table, 2).unwrap_err();
        assert!(matches!(err, ProtoError::BadPpaChain { .. }));
    }
}
