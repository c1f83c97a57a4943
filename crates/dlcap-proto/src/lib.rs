//! DLPI control-message encodings and acknowledgment interpretation.
//!
//! A DLPI provider is driven by exchanging small fixed-layout control
//! messages over a message-boundary-preserving device stream. This crate
//! owns everything about those messages:
//! - `primitive`: the primitive discriminants and related constants, plus
//!   the mnemonic-name table used in diagnostics
//! - `codec`: bounds-checked encode/decode of every message the driver
//!   sends or receives
//! - `ack`: the single choke point that classifies a received
//!   acknowledgment as success, a recognized provider error, or an
//!   unexpected primitive
//! - `error`: the provider error-code vocabulary and codec errors
//!
//! The layouts are native-endian because DLPI messages are host C structs,
//! not a self-describing wire format.

pub mod ack;
pub mod codec;
pub mod error;
pub mod primitive;

pub use ack::{interpret_ack, AckClass, AckError};
pub use codec::{
    AttachReq, BindAck, BindReq, ErrorAck, HpPpaAck, HpRawDataReq, InfoAck, InfoReq, OkAck,
    PassiveReq, PpaInfo, PromisconReq, MAX_CONTROL_LEN,
};
pub use error::{dl_errno_description, PpaFlavor, ProtoError, Result};
pub use primitive::primitive_name;
