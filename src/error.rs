use std::{error::Error, fmt, io};

pub type GenericError = Box<dyn Error + Send + Sync + 'static>;

/// An inbound buffer too short to hold the headers required by its family.
#[derive(Debug, PartialEq, Eq)]
pub enum DecodeError {
    Truncated { expected: usize, actual: usize },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            DecodeError::Truncated { expected, actual } => {
                write!(f, "truncated packet: need {expected} bytes, got {actual}")
            }
        }
    }
}

impl Error for DecodeError {}

/// Raw-socket creation failure. `PermissionDenied` is fatal to the whole
/// monitoring job: raw sockets need elevated privilege and retrying cannot
/// acquire it.
#[derive(Debug)]
pub enum OpenError {
    PermissionDenied(io::Error),
    Io(io::Error),
}

impl fmt::Display for OpenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            OpenError::PermissionDenied(e) => {
                write!(f, "raw socket refused, requires root or CAP_NET_RAW: {e}")
            }
            OpenError::Io(e) => write!(f, "could not open raw socket: {e}"),
        }
    }
}

impl Error for OpenError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            OpenError::PermissionDenied(e) | OpenError::Io(e) => Some(e),
        }
    }
}

impl From<io::Error> for OpenError {
    fn from(error: io::Error) -> OpenError {
        if error.kind() == io::ErrorKind::PermissionDenied {
            OpenError::PermissionDenied(error)
        } else {
            OpenError::Io(error)
        }
    }
}

/// Transmission failure. The probe is treated as not-sent and does not count
/// toward the sent total.
#[derive(Debug)]
pub enum SendError {
    Unreachable(io::Error),
    Io(io::Error),
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            SendError::Unreachable(e) => write!(f, "destination unreachable: {e}"),
            SendError::Io(e) => write!(f, "could not send echo request: {e}"),
        }
    }
}

impl Error for SendError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SendError::Unreachable(e) | SendError::Io(e) => Some(e),
        }
    }
}

impl From<io::Error> for SendError {
    fn from(error: io::Error) -> SendError {
        match error.kind() {
            io::ErrorKind::HostUnreachable | io::ErrorKind::NetworkUnreachable => {
                SendError::Unreachable(error)
            }
            _ => SendError::Io(error),
        }
    }
}

/// The hostname could not be resolved to an address of the requested family.
/// Non-fatal to the scheduler: the burst is skipped.
#[derive(Debug)]
pub struct ResolveError {
    pub message: String,
    pub source: Option<GenericError>,
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "ResolveError")?;
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        Ok(())
    }
}

impl Error for ResolveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source.as_deref().map(|e| e as &(dyn Error + 'static))
    }
}

/// Reported by a `SummarySink`. The scheduler logs it and keeps monitoring;
/// the affected summary is lost, never retried.
#[derive(Debug)]
pub struct PersistError {
    pub message: String,
    pub source: Option<GenericError>,
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "PersistError")?;
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        Ok(())
    }
}

impl Error for PersistError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source.as_deref().map(|e| e as &(dyn Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_fmt() {
        let e = DecodeError::Truncated { expected: 28, actual: 12 };
        assert_eq!("truncated packet: need 28 bytes, got 12", format!("{e}"));
    }

    #[test]
    fn open_error_from_permission_denied() {
        let io_error = io::Error::from(io::ErrorKind::PermissionDenied);
        assert!(matches!(OpenError::from(io_error), OpenError::PermissionDenied(_)));
    }

    #[test]
    fn open_error_from_other_io_error() {
        let io_error = io::Error::from(io::ErrorKind::AddrNotAvailable);
        assert!(matches!(OpenError::from(io_error), OpenError::Io(_)));
    }

    #[test]
    fn send_error_from_unreachable() {
        let io_error = io::Error::from(io::ErrorKind::HostUnreachable);
        assert!(matches!(SendError::from(io_error), SendError::Unreachable(_)));
    }

    #[test]
    fn resolve_error_fmt_with_message() {
        let e = ResolveError { message: "no address".to_string(), source: None };
        assert_eq!("ResolveError: no address", format!("{e}"));
    }

    #[test]
    fn resolve_error_fmt_without_message() {
        let e = ResolveError { message: String::new(), source: None };
        assert_eq!("ResolveError", format!("{e}"));
    }

    #[test]
    fn persist_error_source_chain() {
        let inner = io::Error::from(io::ErrorKind::Other);
        let e = PersistError { message: "db write failed".to_string(), source: Some(inner.into()) };
        assert!(e.source().is_some());
    }
}
