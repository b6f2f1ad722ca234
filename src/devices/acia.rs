//! 6551 ACIA register file as seen by the C64 bus.
//!
//! Everything in here runs in the bus-access or cycle context: no I/O, no
//! waiting, a handful of instructions per call. Queueing, translation and
//! network traffic all live in [`crate::Modem`], which talks to the ACIA only
//! through the methods below.

use super::{Device, InterruptDevice};
use crate::registers::{Command, RegisterAddress, Status};
use std::cell::Cell;
use tracing::warn;

/// Emulated 6551 ACIA.
///
/// ## Receive handshake
///
/// 1. The polling context checks [`Acia::ready_to_send`]: receive interrupts
///    enabled, nothing pending, and the inter-character countdown expired.
/// 2. [`Acia::deliver`] latches the byte and asserts `RX_FULL | IRQ` (NMI).
/// 3. The host reads the data register: the pending pair is cleared and the
///    countdown is re-armed so the next NMI cannot arrive before the host
///    has left its handler.
///
/// ## Transmit handshake
///
/// A host write to the data register latches the byte and clears
/// `TX_EMPTY`. The polling context picks it up with [`Acia::pending_tx`] and
/// sets `TX_EMPTY` again with [`Acia::tx_done`].
///
/// # Example
///
/// ```rust
/// use swiftlink::{Acia, Device, InterruptDevice};
///
/// let acia = Acia::new(2, 300);
/// assert!(acia.ready_to_send());
///
/// acia.deliver(b'A', 0);
/// assert!(acia.has_interrupt());
/// assert_eq!(acia.read(0), b'A');
/// assert!(!acia.has_interrupt());
///
/// // Countdown must run out before the next byte
/// assert!(!acia.ready_to_send());
/// acia.cycle();
/// acia.cycle();
/// assert!(acia.ready_to_send());
/// ```
#[derive(Debug)]
pub struct Acia {
    tx_byte: Cell<u8>,
    rx_byte: Cell<u8>,
    status: Cell<Status>,
    command: Cell<Command>,
    control: Cell<u8>,

    // Cycle context
    countdown: Cell<u32>,
    cycles_between_rx: u32,

    // NMI assertion watchdog
    nmi_asserted_us: Cell<u64>,
    nmi_timeout_us: u64,
}

impl Acia {
    /// Create an ACIA in its init state.
    ///
    /// * `cycles_between_rx` - minimum host cycles between receive interrupts
    /// * `nmi_timeout_us` - longest an unserviced NMI stays asserted
    pub fn new(cycles_between_rx: u32, nmi_timeout_us: u64) -> Self {
        Self {
            tx_byte: Cell::new(0),
            rx_byte: Cell::new(0),
            status: Cell::new(Status::RESET),
            command: Cell::new(Command::DEFAULT),
            control: Cell::new(0),
            countdown: Cell::new(0),
            cycles_between_rx,
            nmi_asserted_us: Cell::new(0),
            nmi_timeout_us,
        }
    }

    /// Return all registers and timers to the init state.
    pub fn reset(&self) {
        self.tx_byte.set(0);
        self.rx_byte.set(0);
        self.status.set(Status::RESET);
        self.command.set(Command::DEFAULT);
        self.control.set(0);
        self.countdown.set(0);
        self.nmi_asserted_us.set(0);
    }

    /// Bus read of one register.
    pub fn read_register(&self, reg: RegisterAddress) -> u8 {
        match reg {
            RegisterAddress::Data => {
                self.countdown.set(self.cycles_between_rx);
                self.release_rx();
                self.rx_byte.get()
            }
            RegisterAddress::Status => self.status.get().bits(),
            RegisterAddress::Command => self.command.get().bits(),
            RegisterAddress::Control => self.control.get(),
        }
    }

    /// Bus write of one register.
    pub fn write_register(&self, reg: RegisterAddress, value: u8) {
        match reg {
            RegisterAddress::Data => {
                self.tx_byte.set(value);
                self.update_status(|s| s.remove(Status::TX_EMPTY));
            }
            // Programmed reset: only the command register changes
            RegisterAddress::Status => self.command.set(Command::DEFAULT),
            RegisterAddress::Command => self.command.set(Command::from_bits_retain(value)),
            // Line format / baud rate, stored but not enforced
            RegisterAddress::Control => self.control.set(value),
        }
    }

    /// Cycle context: one host clock tick.
    #[inline]
    pub fn cycle(&self) {
        let n = self.countdown.get();
        if n != 0 {
            self.countdown.set(n - 1);
        }
    }

    /// Cycles left before the next receive interrupt may be raised.
    pub fn countdown(&self) -> u32 {
        self.countdown.get()
    }

    /// True when the host can take another received byte.
    pub fn ready_to_send(&self) -> bool {
        self.command.get().rx_irq_enabled()
            && !self.status.get().intersects(Status::RX_PENDING)
            && self.countdown.get() == 0
    }

    /// Latch a received byte and assert the interrupt.
    ///
    /// A zero byte is a no-op placeholder: it is swallowed without using up
    /// a character slot on the host. Callers check [`Acia::ready_to_send`]
    /// first.
    pub fn deliver(&self, byte: u8, now_us: u64) {
        if byte == 0 {
            return;
        }
        self.rx_byte.set(byte);
        self.update_status(|s| s.insert(Status::RX_PENDING));
        self.nmi_asserted_us.set(now_us);
    }

    /// Force-clear an interrupt the host has left unserviced for too long.
    ///
    /// Returns `false` when the timeout fired.
    pub fn check_nmi_timeout(&self, now_us: u64) -> bool {
        if self.status.get().contains(Status::IRQ)
            && now_us.saturating_sub(self.nmi_asserted_us.get()) > self.nmi_timeout_us
        {
            warn!("Rx NMI timeout");
            self.release_rx();
            return false;
        }
        true
    }

    /// Byte written by the host and not yet processed, if any.
    pub fn pending_tx(&self) -> Option<u8> {
        if self.status.get().contains(Status::TX_EMPTY) {
            None
        } else {
            Some(self.tx_byte.get())
        }
    }

    /// Mark the transmit register free for the next host write.
    pub fn tx_done(&self) {
        self.update_status(|s| s.insert(Status::TX_EMPTY));
    }

    pub fn status(&self) -> Status {
        self.status.get()
    }

    pub fn command(&self) -> Command {
        self.command.get()
    }

    pub fn control(&self) -> u8 {
        self.control.get()
    }

    fn release_rx(&self) {
        self.update_status(|s| s.remove(Status::RX_PENDING));
    }

    fn update_status(&self, f: impl FnOnce(&mut Status)) {
        let mut status = self.status.get();
        f(&mut status);
        self.status.set(status);
    }
}

impl Device for Acia {
    fn read(&self, offset: u16) -> u8 {
        match RegisterAddress::from_offset(offset) {
            Some(reg) => self.read_register(reg),
            None => 0x00,
        }
    }

    fn write(&mut self, offset: u16, value: u8) {
        if let Some(reg) = RegisterAddress::from_offset(offset) {
            self.write_register(reg, value);
        }
    }

    fn size(&self) -> u16 {
        4 // Four registers: data, status, command, control
    }
}

impl InterruptDevice for Acia {
    fn has_interrupt(&self) -> bool {
        self.status.get().contains(Status::IRQ)
    }
}
