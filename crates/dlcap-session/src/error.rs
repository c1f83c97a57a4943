use dlcap_proto::{AckClass, AckError};

/// Errors surfaced by device resolution and session activation.
///
/// Permission problems and missing devices get their own variants because
/// they drive different user guidance: one says "run privileged", the
/// other says "check the interface name". Promiscuous-mode denial is kept
/// distinct from generic permission denial for the same reason.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// Descriptor-level I/O failure.
    #[error(transparent)]
    Transport(#[from] dlcap_transport::TransportError),

    /// Malformed control message.
    #[error(transparent)]
    Proto(#[from] dlcap_proto::ProtoError),

    /// A handshake step was rejected or answered with the wrong primitive.
    #[error(transparent)]
    Ack(AckError),

    /// The interface name cannot be split into device type and unit.
    #[error(transparent)]
    DeviceName(#[from] NameError),

    /// No attachment point exists for the requested interface.
    #[error("{0}")]
    NoSuchDevice(String),

    /// The device exists but this system has no capture provider for it.
    #[error("{0}")]
    NotSupported(String),

    /// EPERM/EACCES from the provider or the device node.
    #[error("{0}")]
    PermissionDenied(String),

    /// Physical-level promiscuity was denied. Distinct from
    /// [`CaptureError::PermissionDenied`] so callers can say "you lack
    /// permission for promiscuous capture" rather than a blanket message.
    #[error("promiscuous mode denied: {0}")]
    PromiscDenied(String),

    /// Monitor/radio mode was requested; DLPI has no such mode.
    #[error("monitor mode is not supported")]
    MonitorModeUnsupported,

    /// The provider reported a MAC type with no known link-layer mapping.
    #[error("unknown mac type 0x{0:x}")]
    UnknownMacType(u32),

    /// Injection needs the separate send descriptor, which failed to open.
    #[error("send side of this DLPI device is not available")]
    OutputUnavailable,

    /// This platform has no injection path at all.
    #[error("packet injection is not supported on this device")]
    InjectNotSupported,

    /// Anything else, with a formatted message.
    #[error("{0}")]
    Failed(String),
}

impl CaptureError {
    /// Classifies an acknowledgment failure into the matching session
    /// error. Used for every handshake step except physical promiscuity,
    /// which maps permission denial to [`CaptureError::PromiscDenied`]
    /// instead.
    pub(crate) fn from_ack(err: AckError) -> Self {
        match err.class() {
            AckClass::PermissionDenied => CaptureError::PermissionDenied(err.to_string()),
            AckClass::NoSuchDevice => CaptureError::NoSuchDevice(err.to_string()),
            AckClass::Generic => CaptureError::Ack(err),
        }
    }
}

/// Interface-name decomposition failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    #[error("{name} missing unit number")]
    MissingUnitNumber { name: String },

    #[error("{name} is only a unit number")]
    OnlyUnitNumber { name: String },

    #[error("{name} bad unit number")]
    BadUnitNumber { name: String },
}

/// A best-effort handshake step that failed without aborting activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// Multicast promiscuity failed after physical promiscuity succeeded.
    MulticastPromisc(String),
    /// SAP promiscuity failed while physical promiscuity is already on.
    SapPromisc(String),
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::MulticastPromisc(msg) => {
                write!(f, "DL_PROMISC_MULTI failed ({msg})")
            }
            Warning::SapPromisc(msg) => {
                write!(f, "DL_PROMISC_SAP failed ({msg})")
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, CaptureError>;
