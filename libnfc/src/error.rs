// libnfc/src/error.rs

use thiserror::Error;

/// Common error type shared by codecs, transports and state machines.
#[derive(Error, Debug)]
pub enum Error {
    /// The transport did not answer within the requested timeout.
    #[error("operation timed out")]
    Timeout,

    #[error("crc mismatch: expected {expected:02x?}, got {actual:02x?}")]
    CrcMismatch { expected: [u8; 2], actual: [u8; 2] },

    #[error("parity error")]
    ParityError,

    #[error("erroneous bit count during anti-collision/select")]
    BitCountError,

    #[error("framing error: {0}")]
    FramingError(String),

    #[error("bit collision detected during anti-collision")]
    BitCollision,

    #[error("buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall { needed: usize, available: usize },

    #[error("buffer overflow: frame of {actual} bytes exceeds limit of {limit}")]
    BufferOverflow { limit: usize, actual: usize },

    /// No RF answer from the counterpart (the tag or peer stayed silent).
    #[error("rf timeout: no answer from the counterpart")]
    RfTimeout,

    #[error("rf protocol error: {0}")]
    RfProtocolError(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("command not supported: {0}")]
    CommandNotSupported(String),

    #[error("device not supported: {0}")]
    DeviceNotSupported(String),

    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// The pending operation was cancelled through an [`AbortHandle`](crate::AbortHandle).
    #[error("operation aborted")]
    Aborted,

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("unexpected response code: expected {expected:#04x}, got {actual:#04x}")]
    UnexpectedResponse { expected: u8, actual: u8 },

    #[error("felica error: status=({status1:#04x}, {status2:#04x})")]
    FelicaStatus { status1: u8, status2: u8 },

    /// A DEP target was released or deselected by its initiator.
    #[error("target released by initiator")]
    TargetReleased,

    #[error("device not found")]
    DeviceNotFound,
}

impl Error {
    /// True for both host-side and RF-side timeouts, i.e. "nobody answered".
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout | Error::RfTimeout)
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, Error::Aborted)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
