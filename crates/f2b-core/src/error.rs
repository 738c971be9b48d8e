use crate::value::Value;
use thiserror::Error;

/// Result type alias for fail2ban socket operations
pub type Result<T> = std::result::Result<T, Fail2BanError>;

/// Errors raised while talking to the fail2ban daemon
#[derive(Error, Debug)]
pub enum Fail2BanError {
    /// Dialing, writing to or reading from the socket failed
    #[error("({command}) failed to send command through socket: {source}")]
    Connection {
        /// Command being sent (`connect` for the dial itself)
        command: String,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The daemon's reply could not be decoded
    #[error("({command}) malformed response: {source}")]
    Decode {
        /// Command whose reply failed to decode
        command: String,
        /// Decoder failure
        #[source]
        source: DecodeError,
    },

    /// The reply decoded, but not into the shape the command documents
    #[error("({command}) unexpected response format - {reason}: {response}")]
    BadFormat {
        /// Command whose reply was rejected
        command: String,
        /// What went wrong
        reason: String,
        /// The decoded reply, kept for diagnostics
        response: Box<Value>,
    },
}

/// Coarse classification of a [`Fail2BanError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transport-level failure
    Connection,
    /// Malformed wire bytes
    Decode,
    /// Well-formed reply of the wrong shape
    BadFormat,
}

impl Fail2BanError {
    /// Build a `BadFormat` error.
    pub fn bad_format(
        command: impl Into<String>,
        reason: impl ToString,
        response: &Value,
    ) -> Self {
        Self::BadFormat {
            command: command.into(),
            reason: reason.to_string(),
            response: Box::new(response.clone()),
        }
    }

    /// Returns the error classification
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Connection { .. } => ErrorKind::Connection,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::BadFormat { .. } => ErrorKind::BadFormat,
        }
    }

    /// Returns true if the socket itself failed
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }

    /// The command that failed
    #[must_use]
    pub fn command(&self) -> &str {
        match self {
            Self::Connection { command, .. }
            | Self::Decode { command, .. }
            | Self::BadFormat { command, .. } => command,
        }
    }
}

/// A value whose tag or arity did not match what the caller navigated to
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{path}: expected {expected}, found {found}")]
pub struct ShapeError {
    /// Path from the root, e.g. `$[1][0]`
    pub path: String,
    /// What the caller asked for
    pub expected: String,
    /// What was actually there
    pub found: String,
}

/// Failure to decode a pickle stream
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason} at byte {offset}")]
pub struct DecodeError {
    /// What went wrong
    pub reason: DecodeReason,
    /// Offset of the failing opcode
    pub offset: usize,
    /// Raw bytes consumed before the failure
    pub consumed: Vec<u8>,
}

/// Why decoding failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeReason {
    /// Input ended before the object was complete
    #[error("truncated input: need {need} more bytes, {have} available")]
    Truncated {
        /// Bytes required by the current opcode
        need: usize,
        /// Bytes left in the input
        have: usize,
    },

    /// Opcode outside the supported set
    #[error("unknown opcode 0x{0:02x}")]
    UnknownOpcode(u8),

    /// Pickle protocol newer than 5
    #[error("unsupported pickle protocol {0}")]
    UnsupportedProtocol(u8),

    /// An opcode needed more stack entries than were present
    #[error("stack underflow")]
    StackUnderflow,

    /// An opcode needed a mark that was never pushed
    #[error("missing mark")]
    MissingMark,

    /// Reference to a memo slot that was never stored
    #[error("memo slot {0} is empty")]
    MemoMiss(u32),

    /// String payload is not valid UTF-8
    #[error("invalid UTF-8 in string")]
    InvalidUtf8,

    /// Integer wider than 64 bits
    #[error("integer does not fit in 64 bits")]
    IntegerOverflow,

    /// Text-protocol literal could not be parsed
    #[error("invalid literal {0:?}")]
    InvalidLiteral(String),

    /// Operand of the wrong type for the opcode
    #[error("{opcode} expects {expected}, found {found}")]
    UnexpectedOperand {
        /// Opcode name
        opcode: &'static str,
        /// Expected operand
        expected: &'static str,
        /// Operand present on the stack
        found: &'static str,
    },

    /// `STOP` reached with nothing on the stack
    #[error("empty stack at STOP")]
    EmptyResult,
}
