// src/main.rs
//
// Command-line front end for serterm. Maps subcommands onto the Terminal
// controller triggers and renders results from the events boundary.

use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};

use serterm::{
    ErrorKind, ExchangeMode, FlowControl, Parity, PortInfo, StopBits, Terminal, TerminalEvents,
    Terminator,
};

// ============================================================================
// Arguments
// ============================================================================

#[derive(Parser)]
#[command(
    name = "serterm",
    version,
    about = "Manual serial port terminal: framed reads, line transmission, round-trip diagnostics"
)]
struct Cli {
    /// Also write log output to a timestamped file in this directory
    #[arg(long, global = true, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List serial devices visible on this host
    List {
        /// Emit the port list as JSON
        #[arg(long)]
        json: bool,
    },
    /// Open a port, read one terminated response, close
    Read {
        /// Device name, e.g. /dev/ttyUSB0 or COM3
        port: String,
        #[command(flatten)]
        line: LineArgs,
        #[command(flatten)]
        term: TerminatorArgs,
    },
    /// Send one line of text with the terminator appended
    Send {
        /// Device name, e.g. /dev/ttyUSB0 or COM3
        port: String,
        /// Text to transmit
        text: String,
        #[command(flatten)]
        line: LineArgs,
        #[command(flatten)]
        term: TerminatorArgs,
    },
    /// Measure round-trip delay with an 8-byte zero probe
    Ping {
        /// Device name, e.g. /dev/ttyUSB0 or COM3
        port: String,
        #[command(flatten)]
        line: LineArgs,
    },
    /// Interactive transmit mode: every stdin line is sent to the port
    Term {
        /// Device name, e.g. /dev/ttyUSB0 or COM3
        port: String,
        #[command(flatten)]
        line: LineArgs,
        #[command(flatten)]
        term: TerminatorArgs,
    },
}

/// Line parameters. Defaults reproduce the 9600,E,7,1 baseline profile.
#[derive(Args)]
struct LineArgs {
    /// Baud rate
    #[arg(long, default_value_t = 9600)]
    baud: u32,

    /// Data bits per character (5-8)
    #[arg(long = "bits", default_value_t = 7)]
    byte_size: u8,

    #[arg(long, value_enum, default_value_t = ParityArg::Even)]
    parity: ParityArg,

    #[arg(long = "stop-bits", value_enum, default_value_t = StopBitsArg::One)]
    stop_bits: StopBitsArg,

    /// Flow control handshake
    #[arg(long, value_enum, default_value_t = FlowArg::None)]
    flow: FlowArg,
}

#[derive(Args)]
struct TerminatorArgs {
    /// Message terminator
    #[arg(long, value_enum, default_value_t = TerminatorArg::CrLf)]
    terminator: TerminatorArg,

    /// Literal terminator text, used with --terminator custom
    #[arg(long, value_name = "TEXT")]
    custom: Option<String>,
}

impl TerminatorArgs {
    fn resolve(&self) -> Terminator {
        match self.terminator {
            TerminatorArg::None => Terminator::None,
            TerminatorArg::Cr => Terminator::Cr,
            TerminatorArg::Lf => Terminator::Lf,
            TerminatorArg::CrLf => Terminator::CrLf,
            TerminatorArg::Custom => {
                Terminator::Custom(self.custom.clone().unwrap_or_default())
            }
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ParityArg {
    None,
    Even,
    Odd,
}

impl From<ParityArg> for Parity {
    fn from(arg: ParityArg) -> Self {
        match arg {
            ParityArg::None => Parity::None,
            ParityArg::Even => Parity::Even,
            ParityArg::Odd => Parity::Odd,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum StopBitsArg {
    One,
    Two,
}

impl From<StopBitsArg> for StopBits {
    fn from(arg: StopBitsArg) -> Self {
        match arg {
            StopBitsArg::One => StopBits::One,
            StopBitsArg::Two => StopBits::Two,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FlowArg {
    None,
    DtrDsr,
    RtsCts,
}

impl From<FlowArg> for FlowControl {
    fn from(arg: FlowArg) -> Self {
        match arg {
            FlowArg::None => FlowControl::None,
            FlowArg::DtrDsr => FlowControl::DtrDsr,
            FlowArg::RtsCts => FlowControl::RtsCts,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum TerminatorArg {
    None,
    Cr,
    Lf,
    CrLf,
    Custom,
}

// ============================================================================
// Console Events Sink
// ============================================================================

/// Renders terminal events on stdout/stderr and remembers the first
/// failure for the process exit code.
struct ConsoleEvents {
    json_ports: bool,
    failed: Option<ErrorKind>,
}

impl ConsoleEvents {
    fn new() -> Self {
        ConsoleEvents {
            json_ports: false,
            failed: None,
        }
    }

    fn exit_code(&self) -> ExitCode {
        match self.failed {
            None => ExitCode::SUCCESS,
            Some(ErrorKind::Configuration) => ExitCode::from(2),
            Some(ErrorKind::PortUnavailable) => ExitCode::from(3),
            Some(ErrorKind::InvalidState) => ExitCode::from(4),
            Some(ErrorKind::Read) => ExitCode::from(5),
            Some(ErrorKind::Write) => ExitCode::from(6),
        }
    }
}

impl TerminalEvents for ConsoleEvents {
    fn on_ports_listed(&mut self, ports: &[PortInfo]) {
        if self.json_ports {
            match serde_json::to_string_pretty(ports) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("error: failed to encode port list: {}", e);
                    self.failed = Some(ErrorKind::Read);
                }
            }
            return;
        }

        if ports.is_empty() {
            println!("no serial ports found");
            return;
        }
        for port in ports {
            let product = port
                .product
                .as_deref()
                .map(|p| format!("  {}", p))
                .unwrap_or_default();
            println!("{}  [{}]{}", port.port_name, port.port_type, product);
        }
    }

    fn on_read_complete(&mut self, text: &str) {
        println!("{}", text);
    }

    fn on_ping_complete(&mut self, rtt_ms: f64) {
        println!("round trip delay: {:.3} ms", rtt_ms);
    }

    fn on_error(&mut self, kind: ErrorKind, message: &str) {
        if self.failed.is_none() {
            self.failed = Some(kind);
        }
        eprintln!("error: {}", message);
    }
}

// ============================================================================
// Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(dir) = cli.log_dir.as_deref() {
        if let Err(e) = serterm::logging::init_file_logging(dir) {
            eprintln!("warning: {}", e);
        }
    }

    let mut events = ConsoleEvents::new();

    match cli.command {
        Command::List { json } => {
            events.json_ports = json;
            let mut terminal = Terminal::new(ExchangeMode::Transmit);
            terminal.refresh_ports(&mut events);
        }
        Command::Read { port, line, term } => {
            let mut terminal = configured(ExchangeMode::Receive, &line, Some(&term));
            terminal.open(&port, &mut events);
            // A failed framed read leaves the session open and tainted;
            // tear it down before exiting
            if terminal.is_open() {
                terminal.close(&mut events);
            }
        }
        Command::Send {
            port,
            text,
            line,
            term,
        } => {
            let mut terminal = configured(ExchangeMode::Transmit, &line, Some(&term));
            terminal.set_transmit_text(&text);
            terminal.open(&port, &mut events);
            if terminal.is_open() {
                terminal.send(&mut events);
                terminal.close(&mut events);
            }
        }
        Command::Ping { port, line } => {
            let mut terminal = configured(ExchangeMode::Transmit, &line, None);
            terminal.open(&port, &mut events);
            if terminal.is_open() {
                terminal.ping(&mut events);
                terminal.close(&mut events);
            }
        }
        Command::Term { port, line, term } => {
            let mut terminal = configured(ExchangeMode::Transmit, &line, Some(&term));
            terminal.open(&port, &mut events);
            if terminal.is_open() {
                run_interactive(&mut terminal, &mut events);
                terminal.close(&mut events);
            }
        }
    }

    events.exit_code()
}

/// Build a terminal with the line parameters and terminator from the
/// command line applied, mirroring the per-field configuration triggers.
fn configured(mode: ExchangeMode, line: &LineArgs, term: Option<&TerminatorArgs>) -> Terminal {
    let mut terminal = Terminal::new(mode);
    terminal.set_baud_rate(line.baud);
    terminal.set_byte_size(line.byte_size);
    terminal.set_parity(line.parity.into());
    terminal.set_stop_bits(line.stop_bits.into());
    terminal.set_flow_control(line.flow.into());
    if let Some(term) = term {
        terminal.set_terminator(term.resolve());
    }
    terminal
}

/// Free-form transmit loop: each stdin line is composed with the active
/// terminator and sent.
fn run_interactive(terminal: &mut Terminal, events: &mut ConsoleEvents) {
    eprintln!("connected; every line is sent with the terminator appended (Ctrl-D to exit)");
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        match line {
            Ok(text) => {
                terminal.set_transmit_text(&text);
                terminal.send(events);
            }
            Err(_) => break,
        }
    }
}
