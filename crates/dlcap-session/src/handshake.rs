//! The activation handshake.
//!
//! [`activate`] drives the ordered attach/bind/promiscuity sequence over
//! an already-opened control channel. Each step is one request and one
//! acknowledgment, checked through the interpreter; the first fatal
//! failure aborts activation and drops the channels, so a failed
//! activation never leaves a partially bound descriptor behind.

use bytes::BytesMut;
use dlcap_proto::codec::{
    walk_ppa_records, AttachReq, BindAck, BindReq, HpPpaAck, HpPpaReq, InfoAck, InfoReq, OkAck,
    PassiveReq, PpaInfo, PromisconReq, MAX_CONTROL_LEN,
};
use dlcap_proto::error::PpaFlavor;
use dlcap_proto::primitive::{DL_PROMISC_MULTI, DL_PROMISC_PHYS, DL_PROMISC_SAP, DL_STYLE2};
use dlcap_proto::{interpret_ack, AckClass, AckError};
use dlcap_transport::{ControlChannel, TransportError};
use tracing::{debug, info};

use crate::capture::Capture;
use crate::dispatch::{clamp_snaplen, link_type_for, BufferConfig, MAXIMUM_SNAPLEN};
use crate::error::{CaptureError, Result, Warning};
use crate::profile::{BindPolicy, Profile};

/// Solaris `DLIOCRAW`: deliver and accept frames with full link-layer
/// headers, no reframing.
const DLIOCRAW: i32 = (b'D' as i32) << 8 | 1;
/// SunATM `A_PROMISCON_REQ`: pseudo-promiscuity on `ba` devices.
const A_PROMISCON_REQ: i32 = (b'A' as i32) << 8 | 121;

/// What the caller asked of this activation.
#[derive(Debug, Clone)]
pub struct Options {
    /// Requested snapshot length; clamped into `(0, MAXIMUM_SNAPLEN]`.
    pub snaplen: i32,
    pub promisc: bool,
    /// Monitor/radio mode. DLPI cannot do this; requesting it fails.
    pub monitor: bool,
    /// Whether the resolved device is a SunATM interface.
    pub atm_device: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            snaplen: MAXIMUM_SNAPLEN,
            promisc: false,
            monitor: false,
            atm_device: false,
        }
    }
}

/// A successfully activated session, plus any non-fatal warnings
/// accumulated along the way. Warnings never mask success but are the
/// worst outcome the caller should report.
pub struct Activation<C> {
    pub capture: Capture<C>,
    pub warnings: Vec<Warning>,
}

impl<C> std::fmt::Debug for Activation<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Activation")
            .field("capture", &self.capture)
            .field("warnings", &self.warnings)
            .finish()
    }
}

/// A handshake step that did not succeed, before classification.
enum StepFailure {
    Transport(TransportError),
    Ack(AckError),
}

impl StepFailure {
    /// Busy SAPs are expected while probing for a free one.
    fn is_busy(&self) -> bool {
        matches!(self, StepFailure::Ack(ack) if ack.unix_errno() == Some(libc::EBUSY))
    }

    fn message(&self) -> String {
        match self {
            StepFailure::Transport(err) => err.to_string(),
            StepFailure::Ack(err) => err.to_string(),
        }
    }

    fn into_error(self) -> CaptureError {
        match self {
            StepFailure::Transport(err) => CaptureError::Transport(err),
            StepFailure::Ack(err) => CaptureError::from_ack(err),
        }
    }
}

fn request_ack<C: ControlChannel>(
    chan: &mut C,
    what: &'static str,
    req: &[u8],
    min_len: usize,
    flavor: PpaFlavor,
) -> std::result::Result<([u8; MAX_CONTROL_LEN], usize), StepFailure> {
    chan.send_request(what, req).map_err(StepFailure::Transport)?;
    let mut reply = [0u8; MAX_CONTROL_LEN];
    let got = chan
        .recv_message(what, &mut reply)
        .map_err(StepFailure::Transport)?;
    let len = interpret_ack(&reply[..got], min_len, what, flavor).map_err(StepFailure::Ack)?;
    Ok((reply, len))
}

fn query_info<C: ControlChannel>(chan: &mut C, flavor: PpaFlavor) -> Result<InfoAck> {
    let mut req = BytesMut::with_capacity(InfoReq::SIZE);
    InfoReq::encode(&mut req);
    let (reply, len) = request_ack(chan, "info", &req, InfoAck::SIZE, flavor)
        .map_err(StepFailure::into_error)?;
    Ok(InfoAck::decode(&reply[..len])?)
}

fn attach<C: ControlChannel>(
    chan: &mut C,
    ppa: u32,
    flavor: PpaFlavor,
) -> std::result::Result<(), StepFailure> {
    let mut req = BytesMut::with_capacity(AttachReq::SIZE);
    AttachReq { ppa }.encode(&mut req);
    request_ack(chan, "attach", &req, OkAck::SIZE, flavor)?;
    Ok(())
}

fn bind<C: ControlChannel>(
    chan: &mut C,
    sap: u32,
    profile: &Profile,
) -> std::result::Result<(), StepFailure> {
    let mut req = BytesMut::with_capacity(BindReq::SIZE);
    BindReq {
        sap,
        max_conind: profile.max_conind,
        service_mode: profile.service_mode,
    }
    .encode(&mut req);
    request_ack(chan, "bind", &req, BindAck::SIZE, profile.ppa_flavor)?;
    Ok(())
}

fn promiscon<C: ControlChannel>(
    chan: &mut C,
    level: u32,
    flavor: PpaFlavor,
) -> std::result::Result<(), StepFailure> {
    let mut req = BytesMut::with_capacity(PromisconReq::SIZE);
    PromisconReq { level }.encode(&mut req);
    request_ack(chan, "promiscon", &req, OkAck::SIZE, flavor)?;
    Ok(())
}

/// Probes successive SAPs from `base` through `ceiling`, advancing past
/// busy ones. A busy rejection is expected here and its message is
/// deliberately dropped; any other rejection aborts immediately.
fn deferred_bind<C: ControlChannel>(
    chan: &mut C,
    base: u32,
    ceiling: u32,
    profile: &Profile,
) -> Result<()> {
    for sap in base..=ceiling {
        match bind(chan, sap, profile) {
            Ok(()) => {
                debug!(sap, "bound");
                return Ok(());
            }
            Err(failure) if failure.is_busy() => continue,
            Err(failure) => return Err(failure.into_error()),
        }
    }
    Err(CaptureError::Failed(format!(
        "All SAPs from {base} through {ceiling} are in use"
    )))
}

/// Runs the full activation sequence over `recv` (and `send`, when the
/// platform splits the send side onto its own descriptor).
///
/// Ownership of the channels moves in; on any failure they are dropped,
/// which closes the underlying descriptors.
pub fn activate<C: ControlChannel>(
    mut recv: C,
    mut send: Option<C>,
    ppa: u32,
    profile: &Profile,
    opts: &Options,
) -> Result<Activation<C>> {
    let flavor = profile.ppa_flavor;
    let mut warnings = Vec::new();

    let first_info = query_info(&mut recv, flavor)?;
    if first_info.provider_style == DL_STYLE2 {
        attach(&mut recv, ppa, flavor).map_err(StepFailure::into_error)?;
        if let Some(chan) = send.as_mut() {
            attach(chan, ppa, flavor).map_err(StepFailure::into_error)?;
        }
    }

    if opts.monitor {
        return Err(CaptureError::MonitorModeUnsupported);
    }

    if profile.supports_passive {
        // Best effort; some providers reject it and that is fine.
        let mut req = BytesMut::with_capacity(PassiveReq::SIZE);
        PassiveReq::encode(&mut req);
        if let Err(failure) = request_ack(&mut recv, "passive", &req, OkAck::SIZE, flavor) {
            debug!(error = %failure.message(), "passive mode not granted");
        }
    }

    match profile.bind {
        BindPolicy::Immediate { sap } => {
            bind(&mut recv, sap, profile).map_err(StepFailure::into_error)?
        }
        BindPolicy::PrimaryWithFallback { primary, fallback } => {
            if let Err(first) = bind(&mut recv, primary, profile) {
                debug!(
                    sap = primary,
                    error = %first.message(),
                    "primary SAP rejected, trying fallback"
                );
                bind(&mut recv, fallback, profile).map_err(StepFailure::into_error)?;
            }
        }
        BindPolicy::Deferred { .. } => {}
    }

    let snaplen = clamp_snaplen(opts.snaplen);

    let atm = opts.atm_device && profile.atm_pseudo_promisc;
    if atm {
        recv.strioctl(A_PROMISCON_REQ, &mut [], 0)?;
    } else {
        if opts.promisc {
            if let Err(failure) = promiscon(&mut recv, DL_PROMISC_PHYS, flavor) {
                return Err(match failure {
                    StepFailure::Ack(ack) if ack.class() == AckClass::PermissionDenied => {
                        CaptureError::PromiscDenied(ack.to_string())
                    }
                    other => other.into_error(),
                });
            }
            if profile.multicast_promisc {
                // Physical promiscuity is already on, so losing multicast
                // promiscuity only narrows what extra traffic we see.
                if let Err(failure) = promiscon(&mut recv, DL_PROMISC_MULTI, flavor) {
                    warnings.push(Warning::MulticastPromisc(failure.message()));
                }
            }
        }
        if !(opts.promisc && profile.sap_skipped_when_promisc) {
            if let Err(failure) = promiscon(&mut recv, DL_PROMISC_SAP, flavor) {
                if opts.promisc {
                    warnings.push(Warning::SapPromisc(failure.message()));
                } else {
                    // Without it nothing would be captured at all.
                    return Err(failure.into_error());
                }
            }
        }
    }

    if let BindPolicy::Deferred { base, ceiling } = profile.bind {
        deferred_bind(&mut recv, base, ceiling, profile)?;
        if let Some(chan) = send.as_mut() {
            deferred_bind(chan, base, ceiling, profile)?;
        }
    }

    let bound_info = query_info(&mut recv, flavor)?;
    let link_type = link_type_for(bound_info.mac_type)
        .ok_or(CaptureError::UnknownMacType(bound_info.mac_type))?;

    if profile.raw_mode_ioctl {
        recv.strioctl(DLIOCRAW, &mut [], 0)?;
    }

    let buffer = BufferConfig::new(snaplen);

    recv.flush_read()?;

    info!(ppa, link_type, snaplen, "activated capture session");
    Ok(Activation {
        capture: Capture::new(recv, send, link_type, buffer, profile.inject),
        warnings,
    })
}

/// Asks a shared device node for its attachment table.
///
/// The acknowledgment header reports where the record table starts and
/// how long it is; on systems with many aggregated links the table can
/// be larger than a control buffer, in which case it arrives as a
/// follow-up message.
pub fn query_ppa_table<C: ControlChannel>(chan: &mut C) -> Result<Vec<PpaInfo>> {
    let mut req = BytesMut::with_capacity(HpPpaReq::SIZE);
    HpPpaReq::encode(&mut req);
    let (reply, len) = request_ack(
        chan,
        "get PPA info",
        &req,
        HpPpaAck::SIZE,
        PpaFlavor::SharedNode,
    )
    .map_err(StepFailure::into_error)?;
    let ack = HpPpaAck::decode(&reply[..len])?;

    let offset = ack.offset as usize;
    let length = ack.length as usize;
    if len >= offset + length {
        return Ok(walk_ppa_records(&reply[offset..offset + length], ack.count)?);
    }

    let mut table = vec![0u8; length];
    let got = chan.recv_message("get PPA info table", &mut table)?;
    Ok(walk_ppa_records(&table[..got], ack.count)?)
}
