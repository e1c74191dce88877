// src/terminal.rs
//
// The terminal controller: the front-end-facing surface of the crate.
// Holds the line configuration, terminator policy, transmit text, exchange
// mode and the single session, and reports results through the
// TerminalEvents capability trait.

use crate::config::{FlowControl, LineConfig, Parity, StopBits};
use crate::error::ErrorKind;
use crate::framing::Terminator;
use crate::ports::{self, PortInfo};
use crate::session::Session;
use crate::transmit::{self, TransmitMessage};

// ============================================================================
// Events Boundary
// ============================================================================

/// Callbacks surfaced to whatever front end drives the terminal (CLI,
/// TUI, or a programmatic driver). A capability set, not a widget
/// hierarchy.
pub trait TerminalEvents {
    fn on_ports_listed(&mut self, ports: &[PortInfo]);
    fn on_read_complete(&mut self, text: &str);
    fn on_ping_complete(&mut self, rtt_ms: f64);
    fn on_error(&mut self, kind: ErrorKind, message: &str);
}

/// How an opened session is used.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExchangeMode {
    /// Free-form interactive transmission; the session stays open
    Transmit,
    /// Single-shot response read; the engine closes the session afterwards
    Receive,
}

// ============================================================================
// Terminal
// ============================================================================

pub struct Terminal {
    config: LineConfig,
    terminator: Terminator,
    transmit_text: String,
    message: TransmitMessage,
    mode: ExchangeMode,
    session: Session,
}

impl Terminal {
    pub fn new(mode: ExchangeMode) -> Self {
        let terminator = Terminator::None;
        Terminal {
            config: LineConfig::default(),
            message: transmit::compose("", &terminator),
            terminator,
            transmit_text: String::new(),
            mode,
            session: Session::new(),
        }
    }

    pub fn config(&self) -> &LineConfig {
        &self.config
    }

    pub fn terminator(&self) -> &Terminator {
        &self.terminator
    }

    /// The composed message that `send` will transmit.
    pub fn message(&self) -> &TransmitMessage {
        &self.message
    }

    pub fn mode(&self) -> ExchangeMode {
        self.mode
    }

    pub fn is_open(&self) -> bool {
        self.session.is_open()
    }

    // Per-field configuration triggers, one per editable control. The
    // configuration is snapshotted by the session at open time, so edits
    // while open only affect the next session.

    pub fn set_baud_rate(&mut self, baud: u32) {
        self.config.set_baud_rate(baud);
    }

    pub fn set_byte_size(&mut self, bits: u8) {
        self.config.set_byte_size(bits);
    }

    pub fn set_parity(&mut self, parity: Parity) {
        self.config.set_parity(parity);
    }

    pub fn set_stop_bits(&mut self, stop_bits: StopBits) {
        self.config.set_stop_bits(stop_bits);
    }

    pub fn set_flow_control(&mut self, flow: FlowControl) {
        self.config.set_flow_control(flow);
    }

    /// Replace the terminator policy wholesale and recompose the pending
    /// transmit message.
    pub fn set_terminator(&mut self, terminator: Terminator) {
        self.terminator = terminator;
        self.recompose();
    }

    pub fn set_transmit_text(&mut self, text: &str) {
        self.transmit_text = text.to_string();
        self.recompose();
    }

    fn recompose(&mut self) {
        self.message = transmit::compose(&self.transmit_text, &self.terminator);
    }

    /// Re-enumerate host serial devices.
    pub fn refresh_ports(&mut self, events: &mut dyn TerminalEvents) {
        match ports::list_ports() {
            Ok(ports) => events.on_ports_listed(&ports),
            Err(e) => events.on_error(e.kind(), &e.to_string()),
        }
    }

    /// Open `port_name` with the current configuration. In receive mode
    /// this performs the single framed read and the engine closes the
    /// session when the read completes.
    pub fn open(&mut self, port_name: &str, events: &mut dyn TerminalEvents) {
        if let Err(e) = self.session.open(port_name, &self.config) {
            events.on_error(e.kind(), &e.to_string());
            return;
        }
        if self.mode == ExchangeMode::Receive {
            match self.session.read_framed(&self.terminator) {
                Ok(text) => events.on_read_complete(&text),
                // Read failure leaves the session open but tainted; the
                // user decides whether to close and retry
                Err(e) => events.on_error(e.kind(), &e.to_string()),
            }
        }
    }

    /// Send the composed message over the open session.
    pub fn send(&mut self, events: &mut dyn TerminalEvents) {
        if let Err(e) = self.session.write(self.message.as_bytes()) {
            events.on_error(e.kind(), &e.to_string());
        }
    }

    /// Round-trip probe on the open session.
    pub fn ping(&mut self, events: &mut dyn TerminalEvents) {
        match self.session.ping() {
            Ok(rtt_ms) => events.on_ping_complete(rtt_ms),
            Err(e) => events.on_error(e.kind(), &e.to_string()),
        }
    }

    pub fn close(&mut self, events: &mut dyn TerminalEvents) {
        if let Err(e) = self.session.close() {
            events.on_error(e.kind(), &e.to_string());
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
