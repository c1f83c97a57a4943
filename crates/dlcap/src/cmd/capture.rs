use crate::cmd::CaptureArgs;
use crate::exit::CliResult;

pub fn run(args: CaptureArgs) -> CliResult<i32> {
    imp::run(args)
}

#[cfg(any(target_os = "solaris", target_os = "illumos"))]
mod imp {
    use dlcap_session::{activate, resolver, Frame, Options, Profile, ReadOutcome};
    use tracing::warn;

    use crate::cmd::CaptureArgs;
    use crate::exit::{capture_error, CliError, CliResult, INTERNAL, SUCCESS};

    const READ_BATCH: usize = 64;

    pub fn run(args: CaptureArgs) -> CliResult<i32> {
        let profile = Profile::host();
        let (stream, send, ppa) =
            resolver::open_device(&profile, &args.device).map_err(|err| capture_error("open", err))?;

        let opts = Options {
            snaplen: args.snaplen,
            promisc: args.promisc,
            monitor: args.monitor,
            atm_device: resolver::is_atm_name(&args.device),
        };
        let activation = activate(stream, send, ppa, &profile, &opts)
            .map_err(|err| capture_error(&args.device, err))?;
        for warning in &activation.warnings {
            warn!("{warning}");
        }

        let mut cap = activation.capture;
        let brk = cap.break_handle();
        ctrlc::set_handler(move || brk.set_break())
            .map_err(|err| CliError::new(INTERNAL, format!("signal handler: {err}")))?;

        println!(
            "listening on {}, link-type {}, snaplen {}",
            args.device,
            cap.link_type(),
            cap.snaplen()
        );

        let mut seen: u64 = 0;
        loop {
            let outcome = cap
                .read_packets(READ_BATCH, |frame| {
                    seen += 1;
                    print_frame(seen, frame);
                })
                .map_err(|err| capture_error(&args.device, err))?;
            match outcome {
                ReadOutcome::Packets(_) | ReadOutcome::NoData => {}
                ReadOutcome::Interrupted => break,
            }
            if args.count.is_some_and(|count| seen >= count) {
                break;
            }
        }

        let stats = cap.stats();
        eprintln!("{} frames received, {} dropped", stats.received, stats.dropped);
        Ok(SUCCESS)
    }

    fn print_frame(index: u64, frame: Frame<'_>) {
        let preview: String = frame
            .bytes
            .iter()
            .take(32)
            .map(|byte| format!("{byte:02x}"))
            .collect();
        println!(
            "{index:6}  caplen={} wirelen={}  {preview}",
            frame.bytes.len(),
            frame.wire_len
        );
    }
}

#[cfg(not(any(target_os = "solaris", target_os = "illumos")))]
mod imp {
    use crate::cmd::CaptureArgs;
    use crate::exit::{CliError, CliResult, NOT_SUPPORTED};

    pub fn run(args: CaptureArgs) -> CliResult<i32> {
        Err(CliError::new(
            NOT_SUPPORTED,
            format!(
                "{}: capture requires a DLPI provider; this platform has none",
                args.device
            ),
        ))
    }
}
