//! Bus-facing device support.
//!
//! The cartridge port hands every IO1 access to the device as an offset
//! relative to the start of the window. Devices implement [`Device`] to
//! answer those accesses and [`InterruptDevice`] to drive the interrupt line.
//!
//! # Design
//!
//! - **Offset-based**: Device receives offset (0 to size-1), not absolute address
//! - **No panics**: All operations must succeed or fail gracefully
//! - **Never blocks**: Called once per bus cycle, must finish in a few instructions
//! - **Immutable read**: Read side effects go through interior mutability
//!
//! # Example
//!
//! ```rust
//! use swiftlink::{Acia, Device, InterruptDevice};
//!
//! let mut acia = Acia::new(2300, 300);
//!
//! // Host writes a byte to the data register
//! acia.write(0, b'A');
//! assert_eq!(acia.read(1) & 0x10, 0x00); // TX_EMPTY cleared until processed
//! assert!(!acia.has_interrupt());
//! ```

mod acia;
mod interrupts;

pub use acia::Acia;
pub use interrupts::InterruptDevice;

/// Abstract interface for memory-mapped hardware devices.
///
/// # Examples
///
/// ```rust
/// use swiftlink::Device;
///
/// struct Latch {
///     value: u8,
/// }
///
/// impl Device for Latch {
///     fn read(&self, _offset: u16) -> u8 {
///         self.value
///     }
///
///     fn write(&mut self, _offset: u16, value: u8) {
///         self.value = value;
///     }
///
///     fn size(&self) -> u16 {
///         1
///     }
/// }
/// ```
pub trait Device {
    /// Read byte from device at offset relative to device base address.
    fn read(&self, offset: u16) -> u8;

    /// Write byte to device at offset relative to device base address.
    fn write(&mut self, offset: u16, value: u8);

    /// Return size of device's address space in bytes.
    fn size(&self) -> u16;
}
