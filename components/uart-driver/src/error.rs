//! Driver error types
//!
//! Only configuration and the bounded-wait transmit extension can fail. The
//! receive path and the foreground reads never return errors.

use thiserror::Error;

/// Error types for USART operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UartError {
    #[error("Baud rate must be non-zero")]
    ZeroBaud,

    #[error("Baud rate {baud} not reachable from a {cpu_hz} Hz clock")]
    BaudOutOfRange { baud: u32, cpu_hz: u32 },

    #[error("Transmitter not ready after {spins} polls")]
    TransmitTimeout { spins: u32 },
}

pub type Result<T> = core::result::Result<T, UartError>;
