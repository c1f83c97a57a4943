use std::path::PathBuf;

/// Errors from the device control channel.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the device node. The raw error is kept so the
    /// resolver can distinguish missing, forbidden and broken devices.
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A send/receive/ioctl on the descriptor failed. Carries the name of
    /// the attempted operation for diagnostics.
    #[error("{op}: {source}")]
    Io {
        op: &'static str,
        source: std::io::Error,
    },

    /// The channel does not implement this operation on this platform.
    #[error("{op}: not supported on this channel")]
    Unsupported { op: &'static str },
}

impl TransportError {
    /// The underlying I/O error kind, when there is one. The read loop
    /// matches on this to treat EINTR as "retry" and EAGAIN as "no data".
    pub fn io_kind(&self) -> Option<std::io::ErrorKind> {
        match self {
            TransportError::Open { source, .. } | TransportError::Io { source, .. } => {
                Some(source.kind())
            }
            TransportError::Unsupported { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
