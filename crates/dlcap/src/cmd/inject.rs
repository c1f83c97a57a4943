use crate::cmd::InjectArgs;
use crate::exit::{CliError, CliResult, USAGE};

pub fn run(args: InjectArgs) -> CliResult<i32> {
    let frame = parse_hex(&args.hex)?;
    if frame.is_empty() {
        return Err(CliError::new(USAGE, "empty frame"));
    }
    imp::run(args, frame)
}

fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let cleaned: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.len() % 2 != 0 {
        return Err(CliError::new(USAGE, "hex frame has an odd digit count"));
    }
    (0..cleaned.len())
        .step_by(2)
        .map(|at| {
            u8::from_str_radix(&cleaned[at..at + 2], 16)
                .map_err(|_| CliError::new(USAGE, format!("bad hex at offset {at}")))
        })
        .collect()
}

#[cfg(any(target_os = "solaris", target_os = "illumos"))]
mod imp {
    use dlcap_session::{activate, resolver, Options, Profile};

    use crate::cmd::InjectArgs;
    use crate::exit::{capture_error, CliResult, SUCCESS};

    pub fn run(args: InjectArgs, frame: Vec<u8>) -> CliResult<i32> {
        let profile = Profile::host();
        let (stream, send, ppa) =
            resolver::open_device(&profile, &args.device).map_err(|err| capture_error("open", err))?;
        let opts = Options {
            atm_device: resolver::is_atm_name(&args.device),
            ..Options::default()
        };
        let activation = activate(stream, send, ppa, &profile, &opts)
            .map_err(|err| capture_error(&args.device, err))?;

        let mut cap = activation.capture;
        for _ in 0..args.repeat {
            let sent = cap
                .inject(&frame)
                .map_err(|err| capture_error(&args.device, err))?;
            println!("sent {sent} bytes");
        }
        Ok(SUCCESS)
    }
}

#[cfg(not(any(target_os = "solaris", target_os = "illumos")))]
mod imp {
    use crate::cmd::InjectArgs;
    use crate::exit::{CliError, CliResult, NOT_SUPPORTED};

    pub fn run(args: InjectArgs, _frame: Vec<u8>) -> CliResult<i32> {
        Err(CliError::new(
            NOT_SUPPORTED,
            format!(
                "{}: injection requires a DLPI provider; this platform has none",
                args.device
            ),
        ))
    }
}
