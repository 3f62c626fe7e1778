use std::fmt;

use crate::driver::DriverError;

#[derive(Debug)]
pub enum Error {
    /// A device driver call failed. Tagged with the host and the command
    /// that was being dispatched when it happened.
    Command {
        host: String,
        command: &'static str,
        source: DriverError,
    },
    /// The device reported a code with no normalized equivalent. Indicates a
    /// protocol or firmware mismatch, not a recoverable condition.
    UnknownCode { domain: &'static str, code: u8 },
    /// Caller-supplied argument outside its allowed domain. Rejected before
    /// any driver call is attempted.
    InvalidArgument {
        field: &'static str,
        reason: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Command { host, command, source } => {
                write!(f, "[{host}] {command} failed: {source}")
            }
            Error::UnknownCode { domain, code } => {
                write!(f, "unmapped {domain} code 0x{code:02x}")
            }
            Error::InvalidArgument { field, reason } => {
                write!(f, "invalid {field}: {reason}")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Command { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
