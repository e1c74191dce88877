// src/session.rs
//
// The serial session engine. Owns the open port handle and implements the
// Closed -> Open -> Closed state machine: open with a built descriptor,
// terminator-aware framed reads under the timeout policy, whole-message
// writes, a best-effort round-trip probe, and purge-on-teardown.

use std::io::{Read, Write};
use std::time::Instant;

use serialport::{ClearBuffer, SerialPort};

use crate::config::{self, FlowFlags, LineConfig};
use crate::descriptor::{LineDescriptor, ReadTimeouts};
use crate::error::{Result, SerialError};
use crate::framing::{self, ByteSource, Terminator};

/// Size of the zero-filled round-trip probe.
const PING_PROBE_LEN: usize = 8;

// ============================================================================
// Session
// ============================================================================

struct OpenPort {
    port: Box<dyn SerialPort>,
    port_name: String,
    /// Configuration snapshot, immutable for the session's lifetime
    config: LineConfig,
    timeouts: ReadTimeouts,
}

/// One serial session. The handle is owned exclusively and never
/// duplicated; at most one session may hold a given port open.
pub struct Session {
    open: Option<OpenPort>,
}

impl Session {
    pub fn new() -> Self {
        Session { open: None }
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Name of the port this session holds open, if any.
    pub fn port_name(&self) -> Option<&str> {
        self.open.as_ref().map(|o| o.port_name.as_str())
    }

    /// Configuration snapshot taken at open time.
    pub fn config(&self) -> Option<&LineConfig> {
        self.open.as_ref().map(|o| &o.config)
    }

    /// Open the named port with the given configuration.
    ///
    /// Builds the low-level descriptor, acquires the handle, purges stale
    /// bytes in both directions, applies the descriptor, installs the
    /// read-timeout policy, then purges again for a clean baseline. A
    /// partially acquired handle is released before any error propagates.
    pub fn open(&mut self, port_name: &str, config: &LineConfig) -> Result<()> {
        if self.open.is_some() {
            return Err(SerialError::invalid_state("session is already open"));
        }

        let descriptor = config.build_descriptor()?;

        let port = serialport::new(port_name, descriptor.baud_rate)
            .timeout(descriptor.timeouts.constant)
            .open()
            .map_err(|e| SerialError::unavailable(port_name, e))?;

        let port = apply_descriptor(port, &descriptor)?;

        tlog!(
            "[session:{}] opened ({}, flow {:?})",
            port_name,
            descriptor.control_string(),
            config.flow_control
        );

        self.open = Some(OpenPort {
            port,
            port_name: port_name.to_string(),
            config: config.clone(),
            timeouts: descriptor.timeouts,
        });
        Ok(())
    }

    /// Purge pending I/O in both directions, release the handle, and
    /// return to Closed.
    pub fn close(&mut self) -> Result<()> {
        let open = self
            .open
            .take()
            .ok_or_else(|| SerialError::invalid_state("session is not open"))?;
        let _ = open.port.clear(ClearBuffer::All);
        tlog!("[session:{}] closed", open.port_name);
        Ok(())
    }

    /// Read one framed message under the given terminator policy, then
    /// close the session (single-shot receive semantics).
    ///
    /// The first byte is bounded by the total timeout constant and each
    /// further byte by the inter-byte interval; running out of data ends
    /// the read without error. An OS-level read failure leaves the
    /// session open but tainted; the caller is expected to close it.
    pub fn read_framed(&mut self, terminator: &Terminator) -> Result<String> {
        let text = {
            let open = self
                .open
                .as_mut()
                .ok_or_else(|| SerialError::invalid_state("session is not open"))?;
            let mut source = PortBytes {
                port: &mut *open.port,
                timeouts: open.timeouts,
                got_first: false,
            };
            framing::read_frame(&mut source, terminator)?
        };

        tlog!(
            "[session:{}] framed read complete ({} bytes)",
            self.port_name().unwrap_or("?"),
            text.len()
        );
        self.close()?;
        Ok(text)
    }

    /// Write the full message to the open session. No terminator is
    /// appended here; that belongs to the transmit buffer.
    pub fn write(&mut self, message: &[u8]) -> Result<usize> {
        let open = self
            .open
            .as_mut()
            .ok_or_else(|| SerialError::invalid_state("session is not open"))?;
        open.port
            .write_all(message)
            .map_err(|e| SerialError::write(e))?;
        open.port.flush().map_err(|e| SerialError::write(e))?;
        Ok(message.len())
    }

    /// Round-trip probe: write an 8-byte zero-filled probe, read back up
    /// to 8 bytes, report elapsed wall-clock time in milliseconds.
    ///
    /// Best-effort diagnostics: I/O failures are logged and tolerated, and
    /// the echoed bytes are not checked. The only error is calling this on
    /// a closed session.
    pub fn ping(&mut self) -> Result<f64> {
        let open = self
            .open
            .as_mut()
            .ok_or_else(|| SerialError::invalid_state("session is not open"))?;

        let mut probe = [0u8; PING_PROBE_LEN];
        let _ = open.port.set_timeout(open.timeouts.total_for(PING_PROBE_LEN));

        let started = Instant::now();
        if let Err(e) = open.port.write_all(&probe) {
            tlog!("[session:{}] ping write failed: {}", open.port_name, e);
        }
        if let Err(e) = open.port.read(&mut probe) {
            tlog!("[session:{}] ping read failed: {}", open.port_name, e);
        }
        Ok(started.elapsed().as_secs_f64() * 1000.0)
    }

    #[cfg(test)]
    fn open_with(&mut self, port: Box<dyn SerialPort>, config: LineConfig) {
        self.open = Some(OpenPort {
            port,
            port_name: "mock".to_string(),
            config,
            timeouts: ReadTimeouts::default(),
        });
    }
}

impl Default for Session {
    fn default() -> Self {
        Session::new()
    }
}

// ============================================================================
// Open Helpers
// ============================================================================

/// Purge, apply the descriptor, install timeouts, purge again. Consumes
/// the handle so the failure path releases it before the error propagates.
fn apply_descriptor(
    mut port: Box<dyn SerialPort>,
    descriptor: &LineDescriptor,
) -> Result<Box<dyn SerialPort>> {
    match try_apply(&mut *port, descriptor) {
        Ok(()) => Ok(port),
        Err(e) => {
            drop(port);
            Err(e)
        }
    }
}

fn try_apply(port: &mut dyn SerialPort, descriptor: &LineDescriptor) -> Result<()> {
    // Discard whatever a previous session left buffered, in both directions
    port.clear(ClearBuffer::All)
        .map_err(|e| SerialError::PortUnavailable(format!("purge failed: {}", e)))?;

    port.set_baud_rate(descriptor.baud_rate).map_err(reject)?;
    port.set_data_bits(config::to_serialport_data_bits(descriptor.byte_size))
        .map_err(reject)?;
    port.set_parity(config::to_serialport_parity(descriptor.parity))
        .map_err(reject)?;
    port.set_stop_bits(config::to_serialport_stop_bits(descriptor.stop_bits))
        .map_err(reject)?;
    port.set_flow_control(flow_for(&descriptor.flags))
        .map_err(reject)?;
    if descriptor.flags.dtr_handshake {
        // serialport exposes no DTR/DSR handshake mode; raise DTR so a
        // DSR-gated peer is allowed to transmit
        port.write_data_terminal_ready(true).map_err(reject)?;
    }
    port.set_timeout(descriptor.timeouts.constant)
        .map_err(reject)?;

    // Clean baseline for the first read
    port.clear(ClearBuffer::All)
        .map_err(|e| SerialError::PortUnavailable(format!("purge failed: {}", e)))?;
    Ok(())
}

fn reject(e: serialport::Error) -> SerialError {
    SerialError::Configuration(format!("descriptor rejected by driver: {}", e))
}

fn flow_for(flags: &FlowFlags) -> serialport::FlowControl {
    if flags.cts_flow {
        serialport::FlowControl::Hardware
    } else {
        serialport::FlowControl::None
    }
}

// ============================================================================
// Port Byte Source
// ============================================================================

/// Byte-at-a-time adapter over the open port. The first byte is bounded
/// by the total timeout constant; once data starts flowing, each further
/// byte is bounded by the inter-byte interval.
struct PortBytes<'a> {
    port: &'a mut dyn SerialPort,
    timeouts: ReadTimeouts,
    got_first: bool,
}

impl ByteSource for PortBytes<'_> {
    fn next_byte(&mut self) -> Result<Option<u8>> {
        let mut byte = [0u8; 1];
        match self.port.read(&mut byte) {
            Ok(0) => Ok(None),
            Ok(_) => {
                if !self.got_first {
                    self.got_first = true;
                    let _ = self.port.set_timeout(self.timeouts.interval);
                }
                Ok(Some(byte[0]))
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(None),
            Err(e) => Err(SerialError::read(e)),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
