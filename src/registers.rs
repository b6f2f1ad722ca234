//! # 6551 ACIA Register Definitions
//!
//! The SwiftLink cartridge decodes four registers in the IO1 window ($DE00):
//!
//! | Offset | Register | Read                     | Write                 |
//! |--------|----------|--------------------------|-----------------------|
//! | 0      | Data     | Received byte            | Transmit byte         |
//! | 1      | Status   | Status flags             | Programmed reset      |
//! | 2      | Command  | Command register         | Command register      |
//! | 3      | Control  | Control register         | Control register      |
//!
//! ## Status Register
//!
//! | Bit | Name     | Description                          |
//! |-----|----------|--------------------------------------|
//! | 7   | IRQ      | ACIA asserted its interrupt (NMI)    |
//! | 6   | DSR      | Data set ready line                  |
//! | 5   | DCD      | Carrier detect line                  |
//! | 4   | TX_EMPTY | Transmit data register empty         |
//! | 3   | RX_FULL  | Receive data register full           |
//! | 2   | OVERRUN  | Overrun error                        |
//! | 1   | FRAMING  | Framing error                        |
//! | 0   | PARITY   | Parity error                         |

use bitflags::bitflags;

bitflags! {
    /// Status register flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Status: u8 {
        const IRQ = 0x80;
        const DSR = 0x40;
        const DCD = 0x20;
        const TX_EMPTY = 0x10;
        const RX_FULL = 0x08;
        const OVERRUN = 0x04;
        const FRAMING = 0x02;
        const PARITY = 0x01;

        /// A received byte waiting for the host. `RX_FULL` and `IRQ` are
        /// only ever set and cleared as this pair.
        const RX_PENDING = Self::IRQ.bits() | Self::RX_FULL.bits();
    }
}

impl Status {
    /// Power-on / init state: transmitter empty, nothing received.
    pub const RESET: Status = Status::TX_EMPTY;
}

impl Default for Status {
    fn default() -> Self {
        Status::RESET
    }
}

bitflags! {
    /// Command register bits the emulation interprets. All other bits are
    /// stored and read back untouched.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Command: u8 {
        /// Receive interrupt *disabled* when set (active low enable).
        const RX_IRQ_DISABLE = 0x02;

        const _ = !0;
    }
}

impl Command {
    /// Value loaded at init and by a programmed reset.
    pub const DEFAULT: Command = Command::from_bits_retain(0xE0);

    /// True when the host has enabled receive interrupts.
    #[inline]
    pub fn rx_irq_enabled(self) -> bool {
        !self.contains(Command::RX_IRQ_DISABLE)
    }
}

/// Addressable ACIA registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterAddress {
    Data = 0,
    Status = 1,
    Command = 2,
    Control = 3,
}

impl RegisterAddress {
    /// Decode a device offset. Only offsets 0-3 address a register.
    pub fn from_offset(offset: u16) -> Option<Self> {
        match offset {
            0 => Some(RegisterAddress::Data),
            1 => Some(RegisterAddress::Status),
            2 => Some(RegisterAddress::Command),
            3 => Some(RegisterAddress::Control),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rx_pending_is_irq_and_full() {
        assert_eq!(Status::RX_PENDING.bits(), 0x88);
        assert!(Status::RX_PENDING.contains(Status::IRQ));
        assert!(Status::RX_PENDING.contains(Status::RX_FULL));
    }

    #[test]
    fn test_command_default_enables_rx_irq() {
        assert_eq!(Command::DEFAULT.bits(), 0xE0);
        assert!(Command::DEFAULT.rx_irq_enabled());
        assert!(!Command::from_bits_retain(0xE2).rx_irq_enabled());
    }

    #[test]
    fn test_register_decode() {
        assert_eq!(RegisterAddress::from_offset(0), Some(RegisterAddress::Data));
        assert_eq!(
            RegisterAddress::from_offset(3),
            Some(RegisterAddress::Control)
        );
        assert_eq!(RegisterAddress::from_offset(4), None);
    }
}
