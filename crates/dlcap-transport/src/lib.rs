//! The message transport under the capture driver.
//!
//! A DLPI provider is reached through a bidirectional device stream that
//! preserves message boundaries: one `putmsg` sends exactly one control
//! message, one `getmsg` receives exactly one. This crate provides:
//! - [`ControlChannel`], the trait the handshake engine and read loop are
//!   written against, so every protocol decision can be tested with a
//!   scripted channel
//! - [`DeviceStream`], the real implementation over an open descriptor,
//!   available on platforms with STREAMS message I/O
//!
//! The transport is strictly synchronous: one request, then one blocking
//! wait for the matching reply, per descriptor.

pub mod channel;
pub mod error;

#[cfg(any(target_os = "solaris", target_os = "illumos"))]
pub mod device;

pub use channel::ControlChannel;
pub use error::{Result, TransportError};

#[cfg(any(target_os = "solaris", target_os = "illumos"))]
pub use device::DeviceStream;
