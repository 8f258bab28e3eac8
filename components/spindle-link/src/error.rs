//! Framing error types

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("Frame does not start with ':'")]
    MissingStart,

    #[error("Frame payload has an odd number of hex digits")]
    OddLength,

    #[error("Invalid hex digit {byte:#04x} at offset {position}")]
    InvalidHex { byte: u8, position: usize },

    #[error("Frame needs {needed} bytes, buffer holds {available}")]
    BufferTooSmall { needed: usize, available: usize },

    #[error("Checksum mismatch (expected {expected:#04x}, received {received:#04x})")]
    ChecksumMismatch { expected: u8, received: u8 },

    #[error("Frame is not terminated by CR LF")]
    MissingTerminator,
}

pub type Result<T> = core::result::Result<T, FrameError>;
