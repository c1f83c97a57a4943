//! Link-type classification, snapshot-length policy, and the frame
//! dispatch seam between the read loop and the packet handler.

use dlcap_proto::primitive::{
    DL_CSMACD, DL_ETHER, DL_FDDI, DL_IPATM, DL_TPR,
};

/// The only snapshot length the buffering layer will ever see as an
/// upper bound.
pub const MAXIMUM_SNAPLEN: i32 = 262_144;

/// Link-layer type identifiers handed to packet decoders.
pub const LINKTYPE_EN10MB: u32 = 1;
pub const LINKTYPE_IEEE802: u32 = 6;
pub const LINKTYPE_FDDI: u32 = 10;
pub const LINKTYPE_SUNATM: u32 = 123;

/// Maps a provider MAC type to a link-layer type, or `None` when no
/// decoder exists for it.
pub fn link_type_for(mac_type: u32) -> Option<u32> {
    match mac_type {
        DL_CSMACD | DL_ETHER => Some(LINKTYPE_EN10MB),
        DL_TPR => Some(LINKTYPE_IEEE802),
        DL_FDDI => Some(LINKTYPE_FDDI),
        DL_IPATM => Some(LINKTYPE_SUNATM),
        _ => None,
    }
}

/// Clamps a requested snapshot length into `(0, MAXIMUM_SNAPLEN]`.
/// Zero, negative, and over-large requests all mean "everything".
pub fn clamp_snaplen(requested: i32) -> usize {
    if requested <= 0 || requested > MAXIMUM_SNAPLEN {
        MAXIMUM_SNAPLEN as usize
    } else {
        requested as usize
    }
}

/// Read-buffer sizing derived from the clamped snapshot length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferConfig {
    pub snaplen: usize,
    pub read_capacity: usize,
}

impl BufferConfig {
    /// Room for a batch of snapshot-length frames per receive, so a
    /// provider that queues several messages does not force one syscall
    /// per frame.
    const BATCH_FACTOR: usize = 4;

    pub fn new(snaplen: usize) -> Self {
        Self {
            snaplen,
            read_capacity: snaplen * Self::BATCH_FACTOR,
        }
    }
}

/// A captured frame as handed to the packet handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    /// The frame bytes, truncated to the snapshot length.
    pub bytes: &'a [u8],
    /// The frame's full on-the-wire length before truncation.
    pub wire_len: usize,
}

/// Hands the frames in one received byte range to `handler`, up to
/// `max` of them, returning how many were delivered.
///
/// In raw mode each message's data part carries exactly one frame, so
/// the region is one frame; the seam still exists so a batching push
/// module can slot in without touching the read loop.
pub fn dispatch_frames(
    region: &[u8],
    snaplen: usize,
    max: usize,
    handler: &mut dyn FnMut(Frame<'_>),
) -> usize {
    if region.is_empty() || max == 0 {
        return 0;
    }
    let caplen = region.len().min(snaplen);
    handler(Frame {
        bytes: &region[..caplen],
        wire_len: region.len(),
    });
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use dlcap_proto::primitive::DL_OTHER;

    #[test]
    fn mac_type_classification() {
        assert_eq!(link_type_for(DL_CSMACD), Some(LINKTYPE_EN10MB));
        assert_eq!(link_type_for(DL_ETHER), Some(LINKTYPE_EN10MB));
        assert_eq!(link_type_for(DL_TPR), Some(LINKTYPE_IEEE802));
        assert_eq!(link_type_for(DL_FDDI), Some(LINKTYPE_FDDI));
        assert_eq!(link_type_for(DL_IPATM), Some(LINKTYPE_SUNATM));
        assert_eq!(link_type_for(DL_OTHER), None);
    }

    #[test]
    fn snaplen_clamping() {
        assert_eq!(clamp_snaplen(0), MAXIMUM_SNAPLEN as usize);
        assert_eq!(clamp_snaplen(-1), MAXIMUM_SNAPLEN as usize);
        assert_eq!(clamp_snaplen(MAXIMUM_SNAPLEN + 1), MAXIMUM_SNAPLEN as usize);
        assert_eq!(clamp_snaplen(1), 1);
        assert_eq!(clamp_snaplen(1500), 1500);
        assert_eq!(clamp_snaplen(MAXIMUM_SNAPLEN), MAXIMUM_SNAPLEN as usize);
    }

    #[test]
    fn dispatch_truncates_to_snaplen() {
        let region = [0xaau8; 100];
        let mut seen = Vec::new();
        let n = dispatch_frames(&region, 64, 16, &mut |frame| {
            seen.push((frame.bytes.len(), frame.wire_len));
        });
        assert_eq!(n, 1);
        assert_eq!(seen, vec![(64, 100)]);
    }

    #[test]
    fn dispatch_empty_region_is_nothing() {
        let mut called = false;
        let n = dispatch_frames(&[], 64, 16, &mut |_| called = true);
        assert_eq!(n, 0);
        assert!(!called);
    }
}
