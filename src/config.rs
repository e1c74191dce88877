// src/config.rs
//
// Serial line configuration: the structured value object edited by the
// front end and snapshotted by the session engine at open time.
// Provides conversions to the serialport crate's parameter types.

use serde::{Deserialize, Serialize};
use serialport::{DataBits, Parity as SpParity, StopBits as SpStopBits};

use crate::descriptor::LineDescriptor;
use crate::error::Result;

// ============================================================================
// Types
// ============================================================================

/// Parity setting for the serial line
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    None,
    Even,
    Odd,
}

impl Parity {
    /// Single-letter form used in the canonical control string
    /// (the "E" in "9600,E,7,1").
    pub fn letter(&self) -> char {
        match self {
            Parity::None => 'N',
            Parity::Even => 'E',
            Parity::Odd => 'O',
        }
    }
}

/// Stop bit count
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopBits {
    One,
    Two,
}

/// Flow control mode. Each variant expands to a complete four-flag bundle
/// (see [`FlowControl::flags`]); a mixed bundle is unrepresentable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowControl {
    None,
    DtrDsr,
    RtsCts,
}

/// The four handshake flags of the DCB-equivalent descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlowFlags {
    /// Transmission gated on the CTS line
    pub cts_flow: bool,
    /// RTS driven by handshake rather than held inactive
    pub rts_handshake: bool,
    /// DTR driven by handshake rather than held inactive
    pub dtr_handshake: bool,
    /// Transmission gated on the DSR line
    pub dsr_sensitivity: bool,
}

impl FlowControl {
    /// Expand to the flag bundle. Derived per variant, so the bundle can
    /// never carry leftovers from a previously selected mode.
    pub fn flags(&self) -> FlowFlags {
        match self {
            FlowControl::None => FlowFlags {
                cts_flow: false,
                rts_handshake: false,
                dtr_handshake: false,
                dsr_sensitivity: false,
            },
            FlowControl::DtrDsr => FlowFlags {
                cts_flow: false,
                rts_handshake: false,
                dtr_handshake: true,
                dsr_sensitivity: true,
            },
            FlowControl::RtsCts => FlowFlags {
                cts_flow: true,
                rts_handshake: true,
                dtr_handshake: false,
                dsr_sensitivity: false,
            },
        }
    }
}

// ============================================================================
// Line Configuration
// ============================================================================

/// Serial line configuration. All setters are total; validation happens
/// when the low-level descriptor is built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineConfig {
    pub baud_rate: u32,
    pub byte_size: u8,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub flow_control: FlowControl,
}

impl Default for LineConfig {
    /// Baseline profile: 9600 baud, even parity, 7 data bits, 1 stop bit.
    fn default() -> Self {
        LineConfig {
            baud_rate: 9600,
            byte_size: 7,
            parity: Parity::Even,
            stop_bits: StopBits::One,
            flow_control: FlowControl::None,
        }
    }
}

impl LineConfig {
    pub fn set_baud_rate(&mut self, baud: u32) {
        self.baud_rate = baud;
    }

    pub fn set_byte_size(&mut self, bits: u8) {
        self.byte_size = bits;
    }

    pub fn set_parity(&mut self, parity: Parity) {
        self.parity = parity;
    }

    pub fn set_stop_bits(&mut self, stop_bits: StopBits) {
        self.stop_bits = stop_bits;
    }

    /// Replaces the whole flag bundle at once; see [`FlowControl::flags`].
    pub fn set_flow_control(&mut self, flow: FlowControl) {
        self.flow_control = flow;
    }

    /// Flag bundle currently implied by the flow-control mode.
    pub fn flag_bundle(&self) -> FlowFlags {
        self.flow_control.flags()
    }

    /// Translate into the low-level descriptor handed to the port-open
    /// call. Fails with a configuration error if the host side would
    /// reject the parameters.
    pub fn build_descriptor(&self) -> Result<LineDescriptor> {
        LineDescriptor::build(self)
    }
}

// ============================================================================
// Conversion Functions
// ============================================================================

/// Convert our Parity enum to the serialport crate's parity type
pub(crate) fn to_serialport_parity(p: Parity) -> SpParity {
    match p {
        Parity::None => SpParity::None,
        Parity::Even => SpParity::Even,
        Parity::Odd => SpParity::Odd,
    }
}

/// Convert data bits count to the serialport crate's DataBits type
pub(crate) fn to_serialport_data_bits(bits: u8) -> DataBits {
    match bits {
        5 => DataBits::Five,
        6 => DataBits::Six,
        7 => DataBits::Seven,
        _ => DataBits::Eight,
    }
}

/// Convert our stop bits to the serialport crate's StopBits type
pub(crate) fn to_serialport_stop_bits(s: StopBits) -> SpStopBits {
    match s {
        StopBits::One => SpStopBits::One,
        StopBits::Two => SpStopBits::Two,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile() {
        let config = LineConfig::default();
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.parity, Parity::Even);
        assert_eq!(config.byte_size, 7);
        assert_eq!(config.stop_bits, StopBits::One);
        assert_eq!(config.flow_control, FlowControl::None);
    }

    #[test]
    fn test_rts_cts_bundle_is_complete() {
        let mut config = LineConfig::default();
        // Pass through another mode first; no flag may survive the switch
        config.set_flow_control(FlowControl::DtrDsr);
        config.set_flow_control(FlowControl::RtsCts);

        let flags = config.flag_bundle();
        assert!(flags.cts_flow);
        assert!(flags.rts_handshake);
        assert!(!flags.dtr_handshake);
        assert!(!flags.dsr_sensitivity);
    }

    #[test]
    fn test_dtr_dsr_bundle_is_complete() {
        let flags = FlowControl::DtrDsr.flags();
        assert!(!flags.cts_flow);
        assert!(!flags.rts_handshake);
        assert!(flags.dtr_handshake);
        assert!(flags.dsr_sensitivity);
    }

    #[test]
    fn test_no_flow_bundle_is_all_inactive() {
        let flags = FlowControl::None.flags();
        assert!(!flags.cts_flow);
        assert!(!flags.rts_handshake);
        assert!(!flags.dtr_handshake);
        assert!(!flags.dsr_sensitivity);
    }

    #[test]
    fn test_parity_letters() {
        assert_eq!(Parity::None.letter(), 'N');
        assert_eq!(Parity::Even.letter(), 'E');
        assert_eq!(Parity::Odd.letter(), 'O');
    }

    #[test]
    fn test_to_serialport_parity() {
        assert!(matches!(to_serialport_parity(Parity::None), SpParity::None));
        assert!(matches!(to_serialport_parity(Parity::Even), SpParity::Even));
        assert!(matches!(to_serialport_parity(Parity::Odd), SpParity::Odd));
    }

    #[test]
    fn test_to_serialport_data_bits() {
        assert!(matches!(to_serialport_data_bits(5), DataBits::Five));
        assert!(matches!(to_serialport_data_bits(6), DataBits::Six));
        assert!(matches!(to_serialport_data_bits(7), DataBits::Seven));
        assert!(matches!(to_serialport_data_bits(8), DataBits::Eight));
    }

    #[test]
    fn test_to_serialport_stop_bits() {
        assert!(matches!(
            to_serialport_stop_bits(StopBits::One),
            SpStopBits::One
        ));
        assert!(matches!(
            to_serialport_stop_bits(StopBits::Two),
            SpStopBits::Two
        ));
    }
}
