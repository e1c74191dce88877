// src/descriptor.rs
//
// DCB-equivalent line descriptor: the boundary contract with the host's
// serial subsystem. Carries the canonical control-string parameters
// ("<baud>,<parity-letter>,<byteSize>,<stopBits>"), the expanded
// flow-control flag bundle, the fixed XON/XOFF bytes, and the read-timeout
// policy installed on every opened port.

use std::time::Duration;

use crate::config::{FlowControl, FlowFlags, LineConfig, Parity, StopBits};
use crate::error::{Result, SerialError};

/// Software flow-control resume byte (ASCII DC1), fixed for the lifetime
/// of a configuration.
pub const XON_CHAR: u8 = 0x11;
/// Software flow-control suspend byte (ASCII DC3).
pub const XOFF_CHAR: u8 = 0x13;

// ============================================================================
// Read Timeout Policy
// ============================================================================

/// Read-timeout policy. A read that sees no further byte within `interval`
/// after the first, or nothing at all within the total bound, returns what
/// it has; the shortfall is not fatal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadTimeouts {
    /// Longest allowed gap between consecutive bytes
    pub interval: Duration,
    /// Per-requested-byte contribution to the total bound
    pub multiplier: Duration,
    /// Constant part of the total bound
    pub constant: Duration,
}

impl Default for ReadTimeouts {
    fn default() -> Self {
        ReadTimeouts {
            interval: Duration::from_millis(500),
            multiplier: Duration::from_millis(1),
            constant: Duration::from_millis(5000),
        }
    }
}

impl ReadTimeouts {
    /// Total bound for a read of `len` bytes.
    pub fn total_for(&self, len: usize) -> Duration {
        self.constant + self.multiplier * len as u32
    }
}

// ============================================================================
// Line Descriptor
// ============================================================================

/// Low-level line descriptor applied to the port handle at open time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineDescriptor {
    pub baud_rate: u32,
    pub byte_size: u8,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub flags: FlowFlags,
    pub xon_char: u8,
    pub xoff_char: u8,
    pub timeouts: ReadTimeouts,
}

impl LineDescriptor {
    /// Translate a structured configuration. Rejections here are
    /// configuration errors, not session errors.
    pub(crate) fn build(config: &LineConfig) -> Result<Self> {
        if config.baud_rate == 0 {
            return Err(SerialError::configuration("baud rate must be positive"));
        }
        if !(5..=8).contains(&config.byte_size) {
            return Err(SerialError::configuration(format!(
                "byte size must be 5-8, got {}",
                config.byte_size
            )));
        }

        Ok(LineDescriptor {
            baud_rate: config.baud_rate,
            byte_size: config.byte_size,
            parity: config.parity,
            stop_bits: config.stop_bits,
            flags: config.flag_bundle(),
            xon_char: XON_CHAR,
            xoff_char: XOFF_CHAR,
            timeouts: ReadTimeouts::default(),
        })
    }

    /// Canonical control-string form, e.g. "9600,E,7,1".
    pub fn control_string(&self) -> String {
        format!(
            "{},{},{},{}",
            self.baud_rate,
            self.parity.letter(),
            self.byte_size,
            match self.stop_bits {
                StopBits::One => 1,
                StopBits::Two => 2,
            }
        )
    }

    /// Parse a canonical control string back into a descriptor. The string
    /// only carries the four line parameters; the flag bundle and timeouts
    /// take their defaults.
    pub fn parse(s: &str) -> Result<Self> {
        let fields: Vec<&str> = s.split(',').map(str::trim).collect();
        if fields.len() != 4 {
            return Err(SerialError::configuration(format!(
                "malformed control string {:?}: expected <baud>,<parity>,<bits>,<stop>",
                s
            )));
        }

        let baud_rate: u32 = fields[0]
            .parse()
            .map_err(|_| SerialError::configuration(format!("invalid baud rate {:?}", fields[0])))?;
        if baud_rate == 0 {
            return Err(SerialError::configuration("baud rate must be positive"));
        }

        let parity = match fields[1] {
            "N" | "n" => Parity::None,
            "E" | "e" => Parity::Even,
            "O" | "o" => Parity::Odd,
            other => {
                return Err(SerialError::configuration(format!(
                    "invalid parity letter {:?}",
                    other
                )))
            }
        };

        let byte_size: u8 = fields[2]
            .parse()
            .map_err(|_| SerialError::configuration(format!("invalid byte size {:?}", fields[2])))?;
        if !(5..=8).contains(&byte_size) {
            return Err(SerialError::configuration(format!(
                "byte size must be 5-8, got {}",
                byte_size
            )));
        }

        let stop_bits = match fields[3] {
            "1" => StopBits::One,
            "2" => StopBits::Two,
            other => {
                return Err(SerialError::configuration(format!(
                    "invalid stop bits {:?}",
                    other
                )))
            }
        };

        Ok(LineDescriptor {
            baud_rate,
            byte_size,
            parity,
            stop_bits,
            flags: FlowControl::None.flags(),
            xon_char: XON_CHAR,
            xoff_char: XOFF_CHAR,
            timeouts: ReadTimeouts::default(),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_control_string() {
        let descriptor = LineConfig::default().build_descriptor().unwrap();
        assert_eq!(descriptor.control_string(), "9600,E,7,1");
    }

    #[test]
    fn test_control_string_roundtrip() {
        let configs = [
            LineConfig::default(),
            LineConfig {
                baud_rate: 115200,
                byte_size: 8,
                parity: Parity::None,
                stop_bits: StopBits::Two,
                flow_control: FlowControl::RtsCts,
            },
            LineConfig {
                baud_rate: 300,
                byte_size: 5,
                parity: Parity::Odd,
                stop_bits: StopBits::One,
                flow_control: FlowControl::DtrDsr,
            },
        ];

        for config in configs {
            let built = config.build_descriptor().unwrap();
            let reparsed = LineDescriptor::parse(&built.control_string()).unwrap();
            assert_eq!(reparsed.baud_rate, built.baud_rate);
            assert_eq!(reparsed.parity, built.parity);
            assert_eq!(reparsed.byte_size, built.byte_size);
            assert_eq!(reparsed.stop_bits, built.stop_bits);
        }
    }

    #[test]
    fn test_parse_accepts_lowercase_parity() {
        let descriptor = LineDescriptor::parse("9600,e,7,1").unwrap();
        assert_eq!(descriptor.parity, Parity::Even);
    }

    #[test]
    fn test_parse_rejects_malformed_strings() {
        assert!(LineDescriptor::parse("").is_err());
        assert!(LineDescriptor::parse("9600,E,7").is_err());
        assert!(LineDescriptor::parse("9600,E,7,1,extra").is_err());
        assert!(LineDescriptor::parse("fast,E,7,1").is_err());
        assert!(LineDescriptor::parse("9600,X,7,1").is_err());
        assert!(LineDescriptor::parse("9600,E,9,1").is_err());
        assert!(LineDescriptor::parse("9600,E,7,3").is_err());
        assert!(LineDescriptor::parse("0,E,7,1").is_err());
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let mut config = LineConfig::default();
        config.set_baud_rate(0);
        assert!(config.build_descriptor().is_err());

        let mut config = LineConfig::default();
        config.set_byte_size(9);
        assert!(config.build_descriptor().is_err());
    }

    #[test]
    fn test_descriptor_carries_flag_bundle() {
        let mut config = LineConfig::default();
        config.set_flow_control(FlowControl::RtsCts);
        let descriptor = config.build_descriptor().unwrap();
        assert!(descriptor.flags.cts_flow);
        assert!(descriptor.flags.rts_handshake);
        assert_eq!(descriptor.xon_char, 0x11);
        assert_eq!(descriptor.xoff_char, 0x13);
    }

    #[test]
    fn test_timeout_totals() {
        let timeouts = ReadTimeouts::default();
        assert_eq!(timeouts.interval, Duration::from_millis(500));
        assert_eq!(timeouts.total_for(1), Duration::from_millis(5001));
        assert_eq!(timeouts.total_for(8), Duration::from_millis(5008));
    }
}
