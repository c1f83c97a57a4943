use std::fmt;

use dlcap_session::CaptureError;
use dlcap_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const NO_SUCH_DEVICE: i32 = 40;
pub const NOT_SUPPORTED: i32 = 41;
pub const PERMISSION_DENIED: i32 = 50;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    let code = match err.io_kind() {
        Some(std::io::ErrorKind::PermissionDenied) => PERMISSION_DENIED,
        Some(std::io::ErrorKind::NotFound) => NO_SUCH_DEVICE,
        Some(_) => TRANSPORT_ERROR,
        None => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn capture_error(context: &str, err: CaptureError) -> CliError {
    match err {
        CaptureError::Transport(err) => transport_error(context, err),
        CaptureError::NoSuchDevice(_) => CliError::new(NO_SUCH_DEVICE, format!("{context}: {err}")),
        CaptureError::DeviceName(_) => CliError::new(USAGE, format!("{context}: {err}")),
        CaptureError::NotSupported(_)
        | CaptureError::MonitorModeUnsupported
        | CaptureError::InjectNotSupported
        | CaptureError::OutputUnavailable => {
            CliError::new(NOT_SUPPORTED, format!("{context}: {err}"))
        }
        CaptureError::PermissionDenied(_) | CaptureError::PromiscDenied(_) => {
            CliError::new(PERMISSION_DENIED, format!("{context}: {err}"))
        }
        other => CliError::new(FAILURE, format!("{context}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_errors_map_to_permission_code() {
        let err = capture_error("activate", CaptureError::PermissionDenied("nope".into()));
        assert_eq!(err.code, PERMISSION_DENIED);
        let err = capture_error("activate", CaptureError::PromiscDenied("nope".into()));
        assert_eq!(err.code, PERMISSION_DENIED);
    }

    #[test]
    fn missing_device_maps_to_device_code() {
        let err = capture_error("open", CaptureError::NoSuchDevice("bge9".into()));
        assert_eq!(err.code, NO_SUCH_DEVICE);
    }

    #[test]
    fn bad_name_is_a_usage_error() {
        let err = capture_error(
            "open",
            dlcap_session::NameError::MissingUnitNumber {
                name: "bge".into(),
            }
            .into(),
        );
        assert_eq!(err.code, USAGE);
    }
}
