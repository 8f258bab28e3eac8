//! ASCII command frames
//!
//! ```text
//! ':' <hex pairs ...> <LRC hi> <LRC lo> '\r' '\n'
//! ```
//! The LRC is the two's complement of the 8-bit sum of the bytes encoded by
//! the hex pairs after the start character, so summing every pair of a valid
//! frame, checksum included, gives zero.

use crate::error::{FrameError, Result};

/// First byte of every frame
pub const FRAME_START: u8 = b':';

/// Line terminator appended after the checksum
pub const TERMINATOR: [u8; 2] = *b"\r\n";

/// Bytes added to a body by framing (two checksum digits and the terminator)
pub const FRAME_OVERHEAD: usize = 4;

/// Checksum of a command body such as `":01030101"`
pub fn lrc(body: &[u8]) -> Result<u8> {
    let pairs = payload(body)?;

    let mut sum: u8 = 0;
    for (index, pair) in pairs.chunks_exact(2).enumerate() {
        // +1 for the start byte
        let at = 1 + index * 2;
        let hi = hex_value(pair[0], at)?;
        let lo = hex_value(pair[1], at + 1)?;
        sum = sum.wrapping_add(hi << 4 | lo);
    }

    Ok(sum.wrapping_neg())
}

/// Write `body`, its checksum and the terminator into `out`
///
/// Returns the frame length.
pub fn encode_frame(body: &[u8], out: &mut [u8]) -> Result<usize> {
    let checksum = lrc(body)?;
    let len = body.len() + FRAME_OVERHEAD;

    if out.len() < len {
        return Err(FrameError::BufferTooSmall {
            needed: len,
            available: out.len(),
        });
    }

    out[..body.len()].copy_from_slice(body);
    out[body.len()..body.len() + 2].copy_from_slice(&checksum_digits(checksum));
    out[body.len() + 2..len].copy_from_slice(&TERMINATOR);
    Ok(len)
}

/// Check a received frame and return its body (start byte included)
pub fn verify_frame(frame: &[u8]) -> Result<&[u8]> {
    let without_terminator = frame
        .strip_suffix(&TERMINATOR)
        .ok_or(FrameError::MissingTerminator)?;

    if without_terminator.len() < 3 {
        return Err(if without_terminator.first() == Some(&FRAME_START) {
            FrameError::OddLength
        } else {
            FrameError::MissingStart
        });
    }

    let split = without_terminator.len() - 2;
    let (body, digits) = without_terminator.split_at(split);

    let expected = lrc(body)?;
    let received = hex_value(digits[0], split)? << 4 | hex_value(digits[1], split + 1)?;

    if expected != received {
        return Err(FrameError::ChecksumMismatch { expected, received });
    }

    Ok(body)
}

/// Uppercase hex digits of a checksum
pub fn checksum_digits(checksum: u8) -> [u8; 2] {
    [hex_digit(checksum >> 4), hex_digit(checksum & 0x0F)]
}

fn payload(body: &[u8]) -> Result<&[u8]> {
    let pairs = match body.split_first() {
        Some((&FRAME_START, rest)) => rest,
        _ => return Err(FrameError::MissingStart),
    };

    if pairs.len() % 2 != 0 {
        return Err(FrameError::OddLength);
    }
    Ok(pairs)
}

fn hex_value(c: u8, position: usize) -> Result<u8> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'A'..=b'F' => Ok(c - b'A' + 10),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        _ => Err(FrameError::InvalidHex { byte: c, position }),
    }
}

fn hex_digit(nibble: u8) -> u8 {
    match nibble {
        0..=9 => b'0' + nibble,
        _ => b'A' + nibble - 10,
    }
}
