use thiserror::Error;

use crate::remote::ProtocolFamily;

/// The library's specialized `Result` type.
pub type Result<T> = std::result::Result<T, Error>;

/// Possible errors while parsing remote definitions, decoding signals,
/// encoding commands, or transmitting pulses.
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    ProtocolError(String),

    #[error("Pulse sending error: {0}")]
    Transmitting(String),

    #[error("parse error at line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("timing expectation failed at {stage}")]
    BadTiming { stage: &'static str },

    #[error("buffer full")]
    BufferFull,

    #[error("encoding not implemented for {family:?}")]
    Unsupported { family: ProtocolFamily },

    #[error("serial framing error at bit {bit}")]
    Framing { bit: usize },

    #[error("unknown remote: {0}")]
    UnknownRemote(String),

    #[error("unknown button {button:?} on remote {remote:?}")]
    UnknownButton { remote: String, button: String },

    #[error("driver error: {0}")]
    Driver(String),
}

impl Error {
    /// Every parse failure is logged at the call site, mirroring
    /// `config_file.c`'s `parse_error`, which always logs before
    /// returning `0` to unwind the parse.
    pub fn parse(line: usize, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        log::error!("parse error at line {line}: {reason}");
        Error::Parse { line, reason }
    }

    /// A decoder expectation failed partway through a frame. Diagnostic
    /// only: the decode chain treats this the same as any other mismatch
    /// and moves on to the next remote, it never propagates as an `Err`.
    pub fn bad_timing(stage: &'static str) -> Self {
        let err = Error::BadTiming { stage };
        log::trace!("{err}");
        err
    }

    /// A serial frame's start bit, parity, or stop window failed to
    /// verify. Diagnostic only, same control-flow treatment as
    /// [`Error::bad_timing`].
    pub fn framing(bit: usize) -> Self {
        let err = Error::Framing { bit };
        log::debug!("{err}");
        err
    }

    /// The transmit buffer grew past its capacity while encoding a frame.
    pub fn buffer_full() -> Self {
        log::error!("transmit buffer overflowed its capacity");
        Error::BufferFull
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_display_io() {
        let io_err = Error::Io(io::Error::new(io::ErrorKind::Other, "test error"));
        assert!(io_err.to_string().contains("IO error"));
    }

    #[test]
    fn test_error_display_protocol() {
        let proto_err = Error::ProtocolError("encoding failed".to_string());
        assert!(proto_err.to_string().contains("Protocol error"));
    }

    #[test]
    fn test_error_display_transmitting() {
        let tx_err = Error::Transmitting("transmission failed".to_string());
        assert!(tx_err.to_string().contains("Pulse sending error"));
    }

    #[test]
    fn test_error_display_parse() {
        let err = Error::parse(12, "unknown flag");
        assert!(err.to_string().contains("line 12"));
        assert!(err.to_string().contains("unknown flag"));
    }

    #[test]
    fn test_error_display_unsupported() {
        let err = Error::Unsupported {
            family: ProtocolFamily::Grundig,
        };
        assert!(err.to_string().contains("Grundig"));
    }

    #[test]
    fn test_error_display_unknown_button() {
        let err = Error::UnknownButton {
            remote: "sony".into(),
            button: "KEY_POWER".into(),
        };
        assert!(err.to_string().contains("sony"));
        assert!(err.to_string().contains("KEY_POWER"));
    }
}
