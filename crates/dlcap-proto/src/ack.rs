//! Acknowledgment interpretation.
//!
//! Every handshake step's reply passes through [`interpret_ack`], which
//! checks both the primitive identity and the message length. Centralizing
//! this keeps the error classification identical no matter which request
//! produced the reply.

use std::io;

use crate::codec::{primitive_of, ErrorAck};
use crate::error::{dl_errno_description, PpaFlavor, DL_ACCESS, DL_BADPPA, DL_SYSERR};
use crate::primitive::{
    primitive_name, DL_BIND_ACK, DL_ERROR_ACK, DL_HP_PPA_ACK, DL_INFO_ACK, DL_OK_ACK,
};

/// Broad classification of a failed acknowledgment, used by callers to pick
/// the right user-facing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckClass {
    PermissionDenied,
    NoSuchDevice,
    Generic,
}

/// A received acknowledgment that did not confirm the request.
#[derive(Debug, thiserror::Error)]
pub enum AckError {
    /// The message is too short to carry a primitive at all.
    #[error("{what}: acknowledgment truncated ({got} bytes)")]
    Truncated { what: &'static str, got: usize },

    /// A valid acknowledgment primitive, but shorter than the caller's
    /// declared minimum for this request.
    #[error("{what}: ack too small ({got} < {want})")]
    TooSmall {
        what: &'static str,
        got: usize,
        want: usize,
    },

    /// A primitive that is neither an accepted acknowledgment nor an
    /// explicit error.
    #[error("{what}: unexpected primitive ack {primitive}")]
    Unexpected { what: &'static str, primitive: String },

    /// `DL_ERROR_ACK` carrying `DL_SYSERR` and an embedded OS errno.
    #[error("{what}: UNIX error: {message}")]
    System {
        what: &'static str,
        unix_errno: i32,
        message: String,
    },

    /// `DL_ERROR_ACK` carrying a DLPI error code other than `DL_SYSERR`.
    #[error("{what}: {description}")]
    Provider {
        what: &'static str,
        errno: u32,
        description: String,
    },
}

impl AckError {
    /// Classifies the failure for status mapping. EPERM/EACCES embedded in
    /// a system error, and `DL_ACCESS`, are permission problems regardless
    /// of which step hit them; `DL_BADPPA` always means the attachment
    /// point does not exist.
    pub fn class(&self) -> AckClass {
        match self {
            AckError::System { unix_errno, .. }
                if *unix_errno == libc::EPERM || *unix_errno == libc::EACCES =>
            {
                AckClass::PermissionDenied
            }
            AckError::Provider { errno, .. } if *errno == DL_BADPPA => AckClass::NoSuchDevice,
            AckError::Provider { errno, .. } if *errno == DL_ACCESS => AckClass::PermissionDenied,
            _ => AckClass::Generic,
        }
    }

    /// The embedded OS errno, when the provider reported `DL_SYSERR`.
    /// The deferred-bind retry loop uses this to recognize EBUSY.
    pub fn unix_errno(&self) -> Option<i32> {
        match self {
            AckError::System { unix_errno, .. } => Some(*unix_errno),
            _ => None,
        }
    }
}

/// Interprets a received control message as the acknowledgment for the
/// request named by `what`.
///
/// Succeeds only when the primitive is one of the accepted acknowledgments
/// (`DL_INFO_ACK`, `DL_BIND_ACK`, `DL_OK_ACK`, `DL_HP_PPA_ACK`) *and* the
/// message is at least `min_len` bytes; returns the actual length then.
pub fn interpret_ack(
    raw: &[u8],
    min_len: usize,
    what: &'static str,
    flavor: PpaFlavor,
) -> Result<usize, AckError> {
    let primitive = primitive_of(raw).ok_or(AckError::Truncated {
        what,
        got: raw.len(),
    })?;

    match primitive {
        DL_INFO_ACK | DL_BIND_ACK | DL_OK_ACK | DL_HP_PPA_ACK => {}
        DL_ERROR_ACK => {
            let ack = ErrorAck::decode(raw).map_err(|_| AckError::Truncated {
                what,
                got: raw.len(),
            })?;
            return Err(match ack.errno {
                DL_SYSERR => {
                    let unix_errno = ack.unix_errno as i32;
                    AckError::System {
                        what,
                        unix_errno,
                        message: io::Error::from_raw_os_error(unix_errno).to_string(),
                    }
                }
                errno => AckError::Provider {
                    what,
                    errno,
                    description: dl_errno_description(errno, flavor).into_owned(),
                },
            });
        }
        other => {
            return Err(AckError::Unexpected {
                what,
                primitive: primitive_name(other).into_owned(),
            })
        }
    }

    if raw.len() < min_len {
        return Err(AckError::TooSmall {
            what,
            got: raw.len(),
            want: min_len,
        });
    }
    Ok(raw.len())
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;

    use super::*;
    use crate::codec::{BindAck, OkAck};
    use crate::error::{DL_BOUND, DL_BUSY};
    use crate::primitive::{DL_BIND_REQ, DL_PROMISCON_REQ, DL_UNITDATA_IND};

    fn error_ack(errno: u32, unix_errno: u32) -> BytesMut {
        let mut buf = BytesMut::new();
        ErrorAck {
            error_primitive: DL_BIND_REQ,
            errno,
            unix_errno,
        }
        .encode(&mut buf);
        buf
    }

    #[test]
    fn accepts_whitelisted_primitives_with_sufficient_length() {
        let mut buf = BytesMut::new();
        BindAck { sap: 0 }.encode(&mut buf);
        let len = interpret_ack(&buf, BindAck::SIZE, "bind", PpaFlavor::PerNode).unwrap();
        assert_eq!(len, BindAck::SIZE);
    }

    #[test]
    fn valid_primitive_below_minimum_is_too_small() {
        let mut buf = BytesMut::new();
        OkAck {
            correct_primitive: DL_PROMISCON_REQ,
        }
        .encode(&mut buf);
        // Valid OK ack, but caller declared a larger minimum.
        let err = interpret_ack(&buf, OkAck::SIZE + 4, "promiscon", PpaFlavor::PerNode).unwrap_err();
        assert!(matches!(
            err,
            AckError::TooSmall { got: 8, want: 12, .. }
        ));
    }

    #[test]
    fn syserr_eperm_and_eacces_classify_as_permission_denied() {
        for errno in [libc::EPERM, libc::EACCES] {
            let buf = error_ack(DL_SYSERR, errno as u32);
            let err = interpret_ack(&buf, 4, "attach", PpaFlavor::PerNode).unwrap_err();
            assert_eq!(err.class(), AckClass::PermissionDenied);
            assert_eq!(err.unix_errno(), Some(errno));
        }
    }

    #[test]
    fn syserr_other_errno_is_generic_but_carries_errno() {
        let buf = error_ack(DL_SYSERR, libc::EBUSY as u32);
        let err = interpret_ack(&buf, 4, "bind", PpaFlavor::PerNode).unwrap_err();
        assert_eq!(err.class(), AckClass::Generic);
        assert_eq!(err.unix_errno(), Some(libc::EBUSY));
    }

    #[test]
    fn badppa_is_no_such_device() {
        let buf = error_ack(DL_BADPPA, 0);
        let err = interpret_ack(&buf, 4, "attach", PpaFlavor::SharedNode).unwrap_err();
        assert_eq!(err.class(), AckClass::NoSuchDevice);
        assert!(err.to_string().contains("Specified PPA was invalid"));
    }

    #[test]
    fn access_is_permission_denied() {
        let buf = error_ack(DL_ACCESS, 0);
        let err = interpret_ack(&buf, 4, "promiscon", PpaFlavor::PerNode).unwrap_err();
        assert_eq!(err.class(), AckClass::PermissionDenied);
    }

    #[test]
    fn other_provider_errors_keep_description() {
        for (errno, needle) in [
            (DL_BOUND, "second bind"),
            (DL_BUSY, "post-attached"),
            (0xabu32, "Error ab"),
        ] {
            let buf = error_ack(errno, 0);
            let err = interpret_ack(&buf, 4, "bind", PpaFlavor::PerNode).unwrap_err();
            assert_eq!(err.class(), AckClass::Generic);
            assert!(err.to_string().contains(needle), "{err}");
        }
    }

    #[test]
    fn unexpected_primitive_is_named() {
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&DL_UNITDATA_IND.to_ne_bytes());
        buf.extend_from_slice(&[0u8; 20]);
        let err = interpret_ack(&buf, 4, "bind", PpaFlavor::PerNode).unwrap_err();
        assert!(err.to_string().contains("DL_UNITDATA_IND"), "{err}");
    }

    #[test]
    fn truncated_message_is_rejected() {
        let err = interpret_ack(&[0x05, 0x00], 4, "info", PpaFlavor::PerNode).unwrap_err();
        assert!(matches!(err, AckError::Truncated { got: 2, .. }));
    }
}
