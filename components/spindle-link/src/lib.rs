//! Spindle Link - Checksummed command frames over a serial port
//!
//! # Purpose
//! Frames ASCII commands for the external spindle/motor controller and sends
//! them through the blocking transmit path of `uart-driver`.
//!
//! # Integration Points
//! - Depends on: `uart-driver` ([`SerialWrite`])
//! - Provides to: machine control code that drives the spindle
//!
//! # Frame Layout
//! A command body (`":"` followed by hex pairs) is followed by its two-digit
//! LRC and CR LF. See [`frame`] for the checksum rule.

#![no_std]

mod error;
pub mod frame;

pub use error::{FrameError, Result};
pub use frame::{checksum_digits, encode_frame, lrc, verify_frame, FRAME_OVERHEAD, FRAME_START, TERMINATOR};

use uart_driver::SerialWrite;

/// Frame `body` and transmit it
///
/// The body is validated before anything is written, so a rejected command
/// never reaches the wire. Bytes go out in order: body, checksum, CR LF.
pub fn send_frame<W: SerialWrite + ?Sized>(port: &mut W, body: &[u8]) -> Result<u8> {
    let checksum = lrc(body)?;
    let digits = checksum_digits(checksum);

    port.write_bytes(body);
    port.write_bytes(&digits);
    port.write_bytes(&TERMINATOR);

    log::trace!(
        "sent frame ({} bytes, lrc {:#04x})",
        body.len() + FRAME_OVERHEAD,
        checksum
    );
    Ok(checksum)
}
