use clap::{Args, Subcommand};

use crate::exit::CliResult;

pub mod capture;
pub mod devices;
pub mod inject;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Capture frames from an interface and print them.
    Capture(CaptureArgs),
    /// List capturable network interfaces.
    Devices(DevicesArgs),
    /// Inject one raw frame on an interface.
    Inject(InjectArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command) -> CliResult<i32> {
    match command {
        Command::Capture(args) => capture::run(args),
        Command::Devices(args) => devices::run(args),
        Command::Inject(args) => inject::run(args),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct CaptureArgs {
    /// Interface to capture on (e.g. bge0, lan0:1).
    pub device: String,

    /// Snapshot length in bytes; 0 means everything.
    #[arg(long, short = 's', default_value_t = 0)]
    pub snaplen: i32,

    /// Capture promiscuously.
    #[arg(long, short = 'p')]
    pub promisc: bool,

    /// Request monitor mode. DLPI providers cannot do this; the option
    /// exists so scripts get a clean error instead of silent non-monitor
    /// capture.
    #[arg(long)]
    pub monitor: bool,

    /// Stop after this many frames.
    #[arg(long, short = 'c')]
    pub count: Option<u64>,
}

#[derive(Args, Debug, Default)]
pub struct DevicesArgs {}

#[derive(Args, Debug)]
pub struct InjectArgs {
    /// Interface to send on.
    pub device: String,

    /// Frame bytes as hex, link-layer header included.
    #[arg(long)]
    pub hex: String,

    /// Send the frame this many times.
    #[arg(long, default_value_t = 1)]
    pub repeat: u32,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build information.
    #[arg(long)]
    pub extended: bool,
}
