//! DLPI capture sessions.
//!
//! Ties the protocol crate and the transport crate into a working
//! capture driver: resolve an interface name to a device node and PPA,
//! run the activation handshake, then read and inject frames.
//!
//! Platform variance is data, not branches: a [`profile::Profile`]
//! selects the device-resolution strategy, bind timing, promiscuity
//! policy, and injection path once, and the handshake consults it at
//! each decision point. Everything above the device descriptor is
//! generic over [`dlcap_transport::ControlChannel`], so the whole
//! sequence is exercised against a scripted provider on any host.

mod capture;
pub mod devices;
pub mod dispatch;
pub mod error;
pub mod handshake;
pub mod profile;
pub mod resolver;

#[cfg(test)]
pub(crate) mod fake;

pub use capture::{BreakHandle, Capture, ReadOutcome, Stats};
pub use dispatch::{clamp_snaplen, link_type_for, BufferConfig, Frame, MAXIMUM_SNAPLEN};
pub use error::{CaptureError, NameError, Result, Warning};
pub use handshake::{activate, Activation, Options};
pub use profile::{BindPolicy, DeviceStrategy, InjectPolicy, Profile};
