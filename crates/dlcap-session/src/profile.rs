//! Platform capability and policy tables.
//!
//! Every way the activation sequence differs between providers is
//! expressed here as data, resolved once when a session is constructed.
//! The handshake itself stays a single linear sequence that consults the
//! profile at each decision point.

use dlcap_proto::error::PpaFlavor;
use dlcap_proto::primitive::{DL_CLDLS, DL_HP_RAWDLS};

/// How an interface name maps to an open device descriptor and a PPA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceStrategy {
    /// One multiplexed device node serves every attachment; the PPA is
    /// found by querying the node for its attachment table.
    SharedNode { node: &'static str },
    /// One device node per interface under a device directory; the unit
    /// parsed from the name becomes the PPA.
    PerNode { dev_dir: &'static str },
}

/// When and with which SAP the receive descriptor is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindPolicy {
    /// Bind before promiscuity setup, with one fixed SAP.
    Immediate { sap: u32 },
    /// Bind before promiscuity setup; if the primary SAP is rejected,
    /// try the fallback once, failing hard if both fail.
    PrimaryWithFallback { primary: u32, fallback: u32 },
    /// Bind after promiscuity setup, probing successive SAPs from `base`
    /// and advancing past ones the provider reports busy, up to
    /// `ceiling` inclusive.
    Deferred { base: u32, ceiling: u32 },
}

/// How frames are injected, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectPolicy {
    /// A plain write on the receive descriptor, in raw mode.
    RawWrite,
    /// A raw-data request on the separately opened send descriptor.
    RawDataRequest,
    Unsupported,
}

/// Everything platform-dependent about driving one provider.
#[derive(Debug, Clone)]
pub struct Profile {
    pub device: DeviceStrategy,
    pub bind: BindPolicy,
    /// Service mode requested in the bind.
    pub service_mode: u32,
    /// `dl_max_conind` requested in the bind.
    pub max_conind: u32,
    /// Whether the provider supports `DL_PASSIVE_REQ` (aggregation-friendly
    /// opt-in, requested best-effort).
    pub supports_passive: bool,
    /// Whether multicast promiscuity is attempted after physical.
    pub multicast_promisc: bool,
    /// Whether SAP promiscuity is skipped when physical promiscuity was
    /// requested. Providers where physical promiscuity already delivers
    /// every SAP make the extra level redundant there; without physical
    /// promiscuity the SAP level is still required, or nothing at all
    /// would be captured.
    pub sap_skipped_when_promisc: bool,
    /// Whether a raw-header ioctl exists to force full link-layer headers.
    pub raw_mode_ioctl: bool,
    /// Whether ATM devices use the pseudo-promiscuous ioctl instead of
    /// the generic promiscuity steps.
    pub atm_pseudo_promisc: bool,
    /// Whether injection requires a second descriptor opened for sending.
    pub split_send_fd: bool,
    pub inject: InjectPolicy,
    /// Which wording the bad-PPA diagnostic uses.
    pub ppa_flavor: PpaFlavor,
}

impl Profile {
    /// Solaris and illumos: per-interface nodes under `/dev`, immediate
    /// bind to the open SAP, raw mode via `DLIOCRAW`, injection by plain
    /// write, SunATM pseudo-promiscuity on `ba` devices.
    pub fn solaris() -> Self {
        Self {
            device: DeviceStrategy::PerNode { dev_dir: "/dev" },
            bind: BindPolicy::Immediate { sap: 0 },
            service_mode: DL_CLDLS,
            max_conind: 0,
            supports_passive: true,
            multicast_promisc: true,
            sap_skipped_when_promisc: false,
            raw_mode_ioctl: true,
            atm_pseudo_promisc: true,
            split_send_fd: false,
            inject: InjectPolicy::RawWrite,
            ppa_flavor: PpaFlavor::PerNode,
        }
    }

    /// HP-UX: everything goes through the shared `/dev/dlpi` node, the
    /// bind is deferred until promiscuity is configured and probes SAPs
    /// 22 through 100, and injection uses a raw-data request on a second
    /// descriptor. Multicast promiscuity is never attempted, and SAP
    /// promiscuity only when physical promiscuity was not requested;
    /// physical promiscuity already delivers every SAP there.
    pub fn hpux() -> Self {
        Self {
            device: DeviceStrategy::SharedNode { node: "/dev/dlpi" },
            bind: BindPolicy::Deferred {
                base: 22,
                ceiling: 100,
            },
            service_mode: DL_HP_RAWDLS,
            max_conind: 1,
            supports_passive: true,
            multicast_promisc: false,
            sap_skipped_when_promisc: true,
            raw_mode_ioctl: false,
            atm_pseudo_promisc: false,
            split_send_fd: true,
            inject: InjectPolicy::RawDataRequest,
            ppa_flavor: PpaFlavor::SharedNode,
        }
    }

    /// AIX: per-interface nodes under `/dev/dlpi`, an Ethernet-SAP bind
    /// with an 802.2 fallback, no injection path.
    pub fn aix() -> Self {
        Self {
            device: DeviceStrategy::PerNode {
                dev_dir: "/dev/dlpi",
            },
            bind: BindPolicy::PrimaryWithFallback {
                primary: 1537,
                fallback: 2,
            },
            service_mode: DL_CLDLS,
            max_conind: 0,
            supports_passive: false,
            multicast_promisc: true,
            sap_skipped_when_promisc: false,
            raw_mode_ioctl: false,
            atm_pseudo_promisc: false,
            split_send_fd: false,
            inject: InjectPolicy::Unsupported,
            ppa_flavor: PpaFlavor::PerNode,
        }
    }

    /// The profile for the build target.
    #[cfg(any(target_os = "solaris", target_os = "illumos"))]
    pub fn host() -> Self {
        Self::solaris()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deferred_bind_bounds_preserved() {
        // The probe range is historical platform behavior; changing it
        // breaks coexistence with other DLPI users on the shared node.
        match Profile::hpux().bind {
            BindPolicy::Deferred { base, ceiling } => {
                assert_eq!(base, 22);
                assert_eq!(ceiling, 100);
            }
            other => panic!("unexpected bind policy {other:?}"),
        }
    }

    #[test]
    fn hpux_promiscuity_policy() {
        let hp = Profile::hpux();
        assert!(!hp.multicast_promisc);
        assert!(hp.sap_skipped_when_promisc);

        let sol = Profile::solaris();
        assert!(sol.multicast_promisc);
        assert!(!sol.sap_skipped_when_promisc);
    }

    #[test]
    fn split_send_fd_implies_raw_data_inject() {
        let hp = Profile::hpux();
        assert!(hp.split_send_fd);
        assert_eq!(hp.inject, InjectPolicy::RawDataRequest);

        let sol = Profile::solaris();
        assert!(!sol.split_send_fd);
        assert_eq!(sol.inject, InjectPolicy::RawWrite);
    }
}
