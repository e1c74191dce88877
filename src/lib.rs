// src/lib.rs
//
// serterm: a manual serial-port terminal. Enumerate ports, open one with
// explicit line parameters, exchange terminated text, measure round-trip
// delay. The session engine is the core; front ends drive it through the
// Terminal controller and its events boundary.

#[macro_use]
pub mod logging;

pub mod config;
pub mod descriptor;
pub mod error;
pub mod framing;
pub mod ports;
pub mod session;
pub mod terminal;
pub mod transmit;

pub use config::{FlowControl, FlowFlags, LineConfig, Parity, StopBits};
pub use descriptor::{LineDescriptor, ReadTimeouts, XOFF_CHAR, XON_CHAR};
pub use error::{ErrorKind, Result, SerialError};
pub use framing::{read_frame, ByteSource, Terminator};
pub use ports::{list_ports, PortInfo};
pub use session::Session;
pub use terminal::{ExchangeMode, Terminal, TerminalEvents};
pub use transmit::{compose, TransmitMessage};
