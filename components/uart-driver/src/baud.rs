//! Baud rate configuration
//!
//! Divisor for the 12-bit UBRR register:
//! - double speed (U2X): `(cpu_hz / 4 / baud - 1) / 2`, bit time = 8 clocks per unit
//! - normal speed:       `(cpu_hz / 8 / baud - 1) / 2`, bit time = 16 clocks per unit
//!
//! Double speed is used for every rate except 57600 baud on a 16 MHz part,
//! which stays at normal speed to match the bootloaders shipped on those boards.

use crate::error::{Result, UartError};

/// Clock of the reference boards
pub const DEFAULT_CPU_HZ: u32 = 16_000_000;

/// Largest value the UBRR register holds
pub const MAX_DIVISOR: u16 = 0x0FFF;

const LEGACY_CPU_HZ: u32 = 16_000_000;
const LEGACY_BAUD: u32 = 57_600;

/// Board-level driver configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UartConfig {
    /// CPU / peripheral clock in Hz
    pub cpu_hz: u32,
}

impl UartConfig {
    pub const fn new(cpu_hz: u32) -> Self {
        Self { cpu_hz }
    }
}

impl Default for UartConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CPU_HZ)
    }
}

/// Computed register setting for one baud rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaudSetting {
    /// Requested rate
    pub baud: u32,
    /// UBRR value
    pub divisor: u16,
    /// U2X mode
    pub double_speed: bool,
}

impl BaudSetting {
    /// Compute the divisor for `baud` on a `cpu_hz` clock
    ///
    /// # Errors
    /// - `ZeroBaud` for `baud == 0`
    /// - `BaudOutOfRange` if the divisor would underflow or exceed 12 bits
    pub fn compute(cpu_hz: u32, baud: u32) -> Result<Self> {
        if baud == 0 {
            return Err(UartError::ZeroBaud);
        }

        let double_speed = uses_double_speed(cpu_hz, baud);
        let prescale = if double_speed { 4 } else { 8 };
        let units = cpu_hz / prescale / baud;

        if units == 0 {
            return Err(UartError::BaudOutOfRange { baud, cpu_hz });
        }

        let divisor = (units - 1) / 2;
        if divisor > MAX_DIVISOR as u32 {
            return Err(UartError::BaudOutOfRange { baud, cpu_hz });
        }

        Ok(Self {
            baud,
            divisor: divisor as u16,
            double_speed,
        })
    }

    /// Rate the hardware will actually run at
    pub fn actual_baud(&self, cpu_hz: u32) -> u32 {
        let clocks_per_bit = if self.double_speed { 8 } else { 16 };
        cpu_hz / (clocks_per_bit * (self.divisor as u32 + 1))
    }

    /// Deviation from the requested rate in parts per thousand
    pub fn error_permille(&self, cpu_hz: u32) -> i32 {
        let actual = self.actual_baud(cpu_hz) as i64;
        let requested = self.baud as i64;
        ((actual - requested) * 1000 / requested) as i32
    }
}

/// Whether `baud` on `cpu_hz` runs in U2X mode
pub fn uses_double_speed(cpu_hz: u32, baud: u32) -> bool {
    !(cpu_hz == LEGACY_CPU_HZ && baud == LEGACY_BAUD)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_rates_at_16mhz() {
        let cases = [
            (9_600, 207, true),
            (19_200, 103, true),
            (57_600, 16, false),
            (115_200, 16, true),
            (250_000, 7, true),
        ];

        for (baud, divisor, double_speed) in cases {
            let setting = BaudSetting::compute(DEFAULT_CPU_HZ, baud).unwrap();
            assert_eq!(setting.divisor, divisor, "divisor for {}", baud);
            assert_eq!(setting.double_speed, double_speed, "u2x for {}", baud);
        }
    }

    #[test]
    fn test_legacy_exception_only_at_16mhz() {
        assert!(!uses_double_speed(16_000_000, 57_600));
        assert!(uses_double_speed(20_000_000, 57_600));
        assert!(uses_double_speed(16_000_000, 38_400));

        let setting = BaudSetting::compute(20_000_000, 57_600).unwrap();
        assert!(setting.double_speed);
        assert_eq!(setting.divisor, 42);
    }

    #[test]
    fn test_actual_baud_and_error() {
        let setting = BaudSetting::compute(DEFAULT_CPU_HZ, 115_200).unwrap();
        assert_eq!(setting.actual_baud(DEFAULT_CPU_HZ), 117_647);
        assert_eq!(setting.error_permille(DEFAULT_CPU_HZ), 21);

        let exact = BaudSetting::compute(DEFAULT_CPU_HZ, 250_000).unwrap();
        assert_eq!(exact.error_permille(DEFAULT_CPU_HZ), 0);
    }

    #[test]
    fn test_zero_baud_rejected() {
        assert_eq!(
            BaudSetting::compute(DEFAULT_CPU_HZ, 0),
            Err(UartError::ZeroBaud)
        );
    }

    #[test]
    fn test_out_of_range_rates() {
        // Too fast: divisor underflows
        assert!(matches!(
            BaudSetting::compute(DEFAULT_CPU_HZ, 5_000_000),
            Err(UartError::BaudOutOfRange { baud: 5_000_000, .. })
        ));

        // Too slow: divisor needs more than 12 bits
        assert!(matches!(
            BaudSetting::compute(DEFAULT_CPU_HZ, 300),
            Err(UartError::BaudOutOfRange { baud: 300, cpu_hz: DEFAULT_CPU_HZ })
        ));
    }

    #[test]
    fn test_config_default() {
        assert_eq!(UartConfig::default().cpu_hz, DEFAULT_CPU_HZ);
    }
}
