// src/error.rs
//
// Typed error taxonomy for the serial terminal.
// Every failure mode surfaces to the caller as one of these kinds; nothing
// is swallowed except inside the best-effort ping probe.

use thiserror::Error;

// ============================================================================
// Types
// ============================================================================

/// Kind tag carried across the events boundary (`on_error(kind, message)`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    PortUnavailable,
    InvalidState,
    Read,
    Write,
}

/// Serial terminal errors
#[derive(Debug, Error)]
pub enum SerialError {
    /// Malformed line descriptor, or one the host platform rejected
    #[error("configuration rejected: {0}")]
    Configuration(String),

    /// The device could not be opened (busy, missing, permission denied)
    #[error("port unavailable: {0}")]
    PortUnavailable(String),

    /// Operation invoked in the wrong session state
    #[error("invalid session state: {0}")]
    InvalidState(String),

    /// OS-level read failure mid-operation
    #[error("read failed: {0}")]
    Read(String),

    /// OS-level write failure mid-operation
    #[error("write failed: {0}")]
    Write(String),
}

impl SerialError {
    pub fn configuration(message: impl Into<String>) -> Self {
        SerialError::Configuration(message.into())
    }

    pub fn unavailable(port: &str, cause: impl std::fmt::Display) -> Self {
        SerialError::PortUnavailable(format!("{}: {}", port, cause))
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        SerialError::InvalidState(message.into())
    }

    pub fn read(cause: impl std::fmt::Display) -> Self {
        SerialError::Read(cause.to_string())
    }

    pub fn write(cause: impl std::fmt::Display) -> Self {
        SerialError::Write(cause.to_string())
    }

    /// Kind tag for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SerialError::Configuration(_) => ErrorKind::Configuration,
            SerialError::PortUnavailable(_) => ErrorKind::PortUnavailable,
            SerialError::InvalidState(_) => ErrorKind::InvalidState,
            SerialError::Read(_) => ErrorKind::Read,
            SerialError::Write(_) => ErrorKind::Write,
        }
    }
}

pub type Result<T> = std::result::Result<T, SerialError>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags() {
        assert_eq!(
            SerialError::configuration("bad baud").kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            SerialError::unavailable("/dev/ttyUSB0", "busy").kind(),
            ErrorKind::PortUnavailable
        );
        assert_eq!(
            SerialError::invalid_state("already open").kind(),
            ErrorKind::InvalidState
        );
        assert_eq!(SerialError::read("io").kind(), ErrorKind::Read);
        assert_eq!(SerialError::write("io").kind(), ErrorKind::Write);
    }

    #[test]
    fn test_messages_carry_context() {
        let err = SerialError::unavailable("/dev/ttyUSB0", "permission denied");
        assert_eq!(
            err.to_string(),
            "port unavailable: /dev/ttyUSB0: permission denied"
        );
    }
}
