//! Steady-state capture: the blocking read loop and the inject path.

use std::fmt;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::BytesMut;
use dlcap_proto::codec::{HpRawDataReq, MAX_CONTROL_LEN};
use dlcap_transport::ControlChannel;
use tracing::debug;

use crate::dispatch::{dispatch_frames, BufferConfig, Frame};
use crate::error::{CaptureError, Result};
use crate::profile::InjectPolicy;

/// Outcome of one [`Capture::read_packets`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// This many frames were handed to the handler (possibly zero, when
    /// the provider delivered a control-only message).
    Packets(usize),
    /// A break was requested; the flag has been cleared and no data was
    /// consumed.
    Interrupted,
    /// The descriptor is non-blocking and nothing is queued.
    NoData,
}

/// Session counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub received: u64,
    /// The raw-mode stream has no drop counter; always zero here.
    pub dropped: u64,
}

/// Cooperative cancellation for a blocked read. Settable from a signal
/// handler or another thread; the read loop polls it between complete
/// message receptions, never mid-message.
#[derive(Clone)]
pub struct BreakHandle(Arc<AtomicBool>);

impl BreakHandle {
    pub fn set_break(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// An activated capture session.
///
/// Owns the receive descriptor, the optional send descriptor, and the
/// read buffer exclusively; all I/O is synchronous and single-threaded
/// by contract.
pub struct Capture<C> {
    pub(crate) recv: C,
    pub(crate) send: Option<C>,
    link_type: u32,
    buffer: BufferConfig,
    inject_policy: InjectPolicy,
    break_flag: Arc<AtomicBool>,
    ctl: Vec<u8>,
    data: Vec<u8>,
    /// Bytes buffered from a previous receive, not yet dispatched.
    pending: usize,
    received: u64,
}

// Not derived: the channel type carries no useful debug output and
// would force a bound on every caller.
impl<C> fmt::Debug for Capture<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capture")
            .field("link_type", &self.link_type)
            .field("snaplen", &self.buffer.snaplen)
            .field("pending", &self.pending)
            .field("received", &self.received)
            .finish_non_exhaustive()
    }
}

impl<C: ControlChannel> Capture<C> {
    pub(crate) fn new(
        recv: C,
        send: Option<C>,
        link_type: u32,
        buffer: BufferConfig,
        inject_policy: InjectPolicy,
    ) -> Self {
        Self {
            recv,
            send,
            link_type,
            buffer,
            inject_policy,
            break_flag: Arc::new(AtomicBool::new(false)),
            ctl: vec![0; MAX_CONTROL_LEN],
            data: vec![0; buffer.read_capacity],
            pending: 0,
            received: 0,
        }
    }

    pub fn link_type(&self) -> u32 {
        self.link_type
    }

    pub fn snaplen(&self) -> usize {
        self.buffer.snaplen
    }

    pub fn break_handle(&self) -> BreakHandle {
        BreakHandle(Arc::clone(&self.break_flag))
    }

    pub fn stats(&self) -> Stats {
        Stats {
            received: self.received,
            dropped: 0,
        }
    }

    /// Receives one batch of frames and hands up to `max` of them to
    /// `handler`.
    ///
    /// Blocks until data arrives unless bytes remain buffered from a
    /// previous call. EINTR retries transparently; the break flag is
    /// checked before every receive attempt and, when set, is cleared
    /// and reported as [`ReadOutcome::Interrupted`] so the next call
    /// proceeds normally.
    pub fn read_packets(
        &mut self,
        max: usize,
        mut handler: impl FnMut(Frame<'_>),
    ) -> Result<ReadOutcome> {
        if self.pending == 0 {
            loop {
                if self.break_flag.swap(false, Ordering::SeqCst) {
                    debug!("read interrupted by request");
                    return Ok(ReadOutcome::Interrupted);
                }
                match self.recv.recv_frame(&mut self.ctl, &mut self.data) {
                    Ok(n) => {
                        self.pending = n;
                        break;
                    }
                    Err(err) => match err.io_kind() {
                        Some(io::ErrorKind::Interrupted) => continue,
                        Some(io::ErrorKind::WouldBlock) => return Ok(ReadOutcome::NoData),
                        _ => return Err(err.into()),
                    },
                }
            }
        }

        let region = &self.data[..self.pending];
        let delivered = dispatch_frames(region, self.buffer.snaplen, max, &mut handler);
        self.pending = 0;
        self.received += delivered as u64;
        Ok(ReadOutcome::Packets(delivered))
    }

    /// Injects one frame, returning the count of bytes accepted.
    pub fn inject(&mut self, frame: &[u8]) -> Result<usize> {
        match self.inject_policy {
            InjectPolicy::RawWrite => Ok(self.recv.write_raw(frame)?),
            InjectPolicy::RawDataRequest => {
                let chan = self
                    .send
                    .as_mut()
                    .ok_or(CaptureError::OutputUnavailable)?;
                let mut req = BytesMut::with_capacity(HpRawDataReq::SIZE);
                HpRawDataReq::encode(&mut req);
                chan.send_request_with_data("raw data request", &req, frame)?;
                Ok(frame.len())
            }
            InjectPolicy::Unsupported => Err(CaptureError::InjectNotSupported),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::clamp_snaplen;
    use crate::fake::FakeChannel;

    fn capture(recv: FakeChannel, inject: InjectPolicy) -> Capture<FakeChannel> {
        Capture::new(
            recv,
            None,
            1,
            BufferConfig::new(clamp_snaplen(1500)),
            inject,
        )
    }

    #[test]
    fn frame_delivered_to_handler() {
        let mut chan = FakeChannel::new();
        chan.push_frame(vec![], vec![0xab; 60]);
        let mut cap = capture(chan, InjectPolicy::RawWrite);

        let mut frames = Vec::new();
        let outcome = cap
            .read_packets(16, |frame| frames.push(frame.bytes.to_vec()))
            .unwrap();
        assert_eq!(outcome, ReadOutcome::Packets(1));
        assert_eq!(frames, vec![vec![0xab; 60]]);
        assert_eq!(cap.stats().received, 1);
    }

    #[test]
    fn break_before_read_interrupts_once() {
        let mut chan = FakeChannel::new();
        chan.push_frame(vec![], vec![1, 2, 3]);
        let mut cap = capture(chan, InjectPolicy::RawWrite);

        cap.break_handle().set_break();
        let outcome = cap.read_packets(16, |_| panic!("no data expected")).unwrap();
        assert_eq!(outcome, ReadOutcome::Interrupted);

        // The flag was cleared; the next read proceeds normally.
        let outcome = cap.read_packets(16, |_| {}).unwrap();
        assert_eq!(outcome, ReadOutcome::Packets(1));
    }

    #[test]
    fn eintr_retries_until_data() {
        let mut chan = FakeChannel::new();
        chan.push_io(io::ErrorKind::Interrupted);
        chan.push_io(io::ErrorKind::Interrupted);
        chan.push_frame(vec![], vec![9; 10]);
        let mut cap = capture(chan, InjectPolicy::RawWrite);

        let outcome = cap.read_packets(16, |_| {}).unwrap();
        assert_eq!(outcome, ReadOutcome::Packets(1));
    }

    #[test]
    fn would_block_reports_no_data() {
        let mut chan = FakeChannel::new();
        chan.push_io(io::ErrorKind::WouldBlock);
        let mut cap = capture(chan, InjectPolicy::RawWrite);

        let outcome = cap.read_packets(16, |_| panic!()).unwrap();
        assert_eq!(outcome, ReadOutcome::NoData);
    }

    #[test]
    fn other_io_errors_propagate() {
        let mut chan = FakeChannel::new();
        chan.push_io(io::ErrorKind::BrokenPipe);
        let mut cap = capture(chan, InjectPolicy::RawWrite);

        let err = cap.read_packets(16, |_| {}).unwrap_err();
        assert!(matches!(err, CaptureError::Transport(_)));
    }

    #[test]
    fn frames_truncated_to_snaplen() {
        let mut chan = FakeChannel::new();
        chan.push_frame(vec![], vec![0u8; 4000]);
        let mut cap = capture(chan, InjectPolicy::RawWrite);

        let mut lens = Vec::new();
        cap.read_packets(16, |frame| lens.push((frame.bytes.len(), frame.wire_len)))
            .unwrap();
        assert_eq!(lens, vec![(1500, 4000)]);
    }

    #[test]
    fn control_only_message_delivers_nothing() {
        let mut chan = FakeChannel::new();
        chan.push_control(vec![0u8; 8]);
        let mut cap = capture(chan, InjectPolicy::RawWrite);

        let outcome = cap.read_packets(16, |_| panic!()).unwrap();
        assert_eq!(outcome, ReadOutcome::Packets(0));
    }

    #[test]
    fn debug_output_works_without_a_debug_channel() {
        let cap = capture(FakeChannel::new(), InjectPolicy::RawWrite);
        let rendered = format!("{cap:?}");
        assert!(rendered.contains("link_type: 1"));
        assert!(rendered.contains("snaplen: 1500"));
    }

    #[test]
    fn raw_write_inject_returns_byte_count() {
        let mut cap = capture(FakeChannel::new(), InjectPolicy::RawWrite);
        let n = cap.inject(&[1, 2, 3, 4]).unwrap();
        assert_eq!(n, 4);
        assert_eq!(cap.recv.raw_writes, vec![vec![1, 2, 3, 4]]);
    }

    #[test]
    fn raw_data_inject_uses_send_channel() {
        let mut cap = Capture::new(
            FakeChannel::new(),
            Some(FakeChannel::new()),
            1,
            BufferConfig::new(1500),
            InjectPolicy::RawDataRequest,
        );
        let n = cap.inject(&[5, 6, 7]).unwrap();
        assert_eq!(n, 3);
        let send = cap.send.as_ref().unwrap();
        assert_eq!(send.sent.len(), 1);
        assert_eq!(send.sent_data, vec![vec![5, 6, 7]]);
        assert!(cap.recv.raw_writes.is_empty());
    }

    #[test]
    fn raw_data_inject_without_send_channel_fails() {
        let mut cap = capture(FakeChannel::new(), InjectPolicy::RawDataRequest);
        let err = cap.inject(&[1]).unwrap_err();
        assert!(matches!(err, CaptureError::OutputUnavailable));
    }

    #[test]
    fn unsupported_inject_performs_no_io() {
        let mut cap = capture(FakeChannel::new(), InjectPolicy::Unsupported);
        let err = cap.inject(&[1, 2]).unwrap_err();
        assert!(matches!(err, CaptureError::InjectNotSupported));
        assert!(cap.recv.raw_writes.is_empty());
        assert!(cap.recv.sent.is_empty());
        assert!(cap.recv.sent_data.is_empty());
    }
}
