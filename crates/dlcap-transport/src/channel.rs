use crate::error::{Result, TransportError};

/// A blocking, message-boundary-preserving channel to a DLPI provider.
///
/// Required methods cover the request/acknowledgment round trip and the
/// data-message read the capture loop depends on. The capability methods
/// (`send_request_with_data`, `write_raw`, `strioctl`) default to
/// `Unsupported`; platform implementations opt in to what the provider
/// actually offers, and the session's platform profile decides which ones
/// are ever called.
pub trait ControlChannel {
    /// Sends exactly one control message. `what` names the request for
    /// error wrapping.
    fn send_request(&mut self, what: &'static str, msg: &[u8]) -> Result<()>;

    /// Sends one control message with an attached data part (raw-data
    /// injection).
    fn send_request_with_data(
        &mut self,
        what: &'static str,
        msg: &[u8],
        data: &[u8],
    ) -> Result<()> {
        let _ = (msg, data);
        Err(TransportError::Unsupported { op: what })
    }

    /// Blocks until one complete control message is available and copies
    /// it into `buf`, returning its length.
    fn recv_message(&mut self, what: &'static str, buf: &mut [u8]) -> Result<usize>;

    /// Blocks until one complete message is available, splitting it into
    /// control and data parts, and returns the data length (zero when the
    /// message had no data part).
    ///
    /// Errors surface the raw I/O error: callers match
    /// [`std::io::ErrorKind::Interrupted`] to retry and
    /// [`std::io::ErrorKind::WouldBlock`] to report "no data yet".
    fn recv_frame(&mut self, ctl: &mut [u8], data: &mut [u8]) -> Result<usize>;

    /// Writes a raw frame directly to the descriptor, returning the byte
    /// count accepted.
    fn write_raw(&mut self, buf: &[u8]) -> Result<usize> {
        let _ = buf;
        Err(TransportError::Unsupported { op: "write" })
    }

    /// Issues a STREAMS `I_STR` ioctl against the descriptor, returning
    /// the result data length.
    fn strioctl(&mut self, cmd: i32, buf: &mut [u8], len: usize) -> Result<usize> {
        let _ = (cmd, buf, len);
        Err(TransportError::Unsupported { op: "strioctl" })
    }

    /// Discards any queued input on the descriptor.
    fn flush_read(&mut self) -> Result<()>;
}
