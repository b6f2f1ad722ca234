//! # SwiftLink Modem Cartridge Core
//!
//! Emulates the 6551 ACIA of a SwiftLink RS-232 cartridge on the Commodore 64
//! expansion port and bridges it to TCP/IP: AT commands, raw telnet-style
//! connections and a small HTML-to-PETSCII page browser, all reached by the
//! C64 through four registers in the IO1 window.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use swiftlink::{
//!     Device, DirectorySink, HostNetwork, InterruptDevice, ManualClock, MemorySettings, Modem,
//!     ModemConfig, Services, TcpTransport,
//! };
//!
//! let clock = Rc::new(ManualClock::new());
//! let services = Services {
//!     transport: Box::new(TcpTransport::default()),
//!     network: Box::new(HostNetwork::new()),
//!     settings: Box::new(MemorySettings::default()),
//!     storage: Box::new(DirectorySink::new(std::env::temp_dir())),
//!     clock: clock.clone(),
//! };
//! let mut modem = Modem::new(ModemConfig::default(), services);
//!
//! // The C64 types "AT" and return; the modem echoes it and answers "ok"
//! for &c in &[0x41, 0x54, 0x0D] {
//!     modem.write(0, c);
//!     modem.poll();
//! }
//!
//! // First echoed character is waiting behind the NMI
//! modem.poll();
//! assert!(modem.has_interrupt());
//! assert_eq!(modem.read(0), 0x41);
//! ```
//!
//! ## Architecture
//!
//! The firmware this models runs three contexts over one set of state:
//!
//! - **Bus access**: register reads and writes, via [`Device`]. Never blocks.
//! - **Cycle**: [`Modem::cycle`] once per host clock, gating receive NMIs.
//! - **Polling**: [`Modem::poll`] once per main-loop pass. All network I/O,
//!   protocol state and queue servicing happens here.
//!
//! Collaborators outside the core (TCP client, settings storage, network
//! bring-up, download storage, time) are traits in [`services`] and
//! [`timing`], with std-backed implementations in [`net`].
//!
//! ## Modules
//!
//! - `devices` - `Device`/`InterruptDevice` traits and the ACIA register file
//! - `registers` - status/command flag sets and register addresses
//! - `rx_queue` / `tx_line` - receive ring and command line assembly
//! - `at_command` - AT command table and argument parsing
//! - `browser` - link table, history ring, HTML tags, browser commands
//! - `url` - URL decomposition
//! - `modem` - the polling-context engine

pub mod at_command;
pub mod browser;
pub mod config;
pub mod devices;
pub mod error;
pub mod escape;
pub mod modem;
pub mod net;
pub mod petscii;
pub mod registers;
pub mod rx_queue;
pub mod services;
pub mod timing;
pub mod tx_line;
pub mod url;

// Re-export public API
pub use at_command::{AtCommand, AtLine, AT_COMMANDS};
pub use browser::{BrowserCommand, HistoryRing, LinkTable};
pub use config::ModemConfig;
pub use devices::{Acia, Device, InterruptDevice};
pub use error::{ModemError, StorageError};
pub use escape::EscapeDetector;
pub use modem::{Mode, Modem, Session};
pub use net::{DirectorySink, HostNetwork, TcpTransport};
pub use registers::{Command, RegisterAddress, Status};
pub use rx_queue::RxQueue;
pub use services::{
    AddressField, FileSink, LinkState, MemorySettings, NetSettings, NetworkInterface, Services,
    SettingsStore, StaticAddresses, Transport,
};
pub use timing::{Clock, ManualClock, Retry, RetryBudget, SystemClock, WaitOutcome};
pub use tx_line::TxLine;
pub use url::Url;
