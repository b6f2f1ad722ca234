//! Interrupt line support for bus devices.
//!
//! The SwiftLink wires the ACIA's IRQ output to the C64 NMI line. NMI is
//! edge-triggered on the 6510, so the emulation asserts the line once per
//! received byte and keeps it asserted until the host reads the data
//! register (or the assertion times out, see [`crate::Acia::check_nmi_timeout`]).
//!
//! # Contract
//!
//! - **Level view**: returns the current line state, not an edge
//! - **Read-only**: querying never changes device state
//! - **O(1)**: polled by the bus emulation after every cycle

/// Trait for devices that can signal interrupt requests to the host CPU.
///
/// # Example
///
/// ```rust
/// use swiftlink::InterruptDevice;
///
/// struct TimerDevice {
///     interrupt_pending: bool,
/// }
///
/// impl InterruptDevice for TimerDevice {
///     fn has_interrupt(&self) -> bool {
///         self.interrupt_pending
///     }
/// }
/// ```
pub trait InterruptDevice {
    /// Check if device has a pending interrupt request.
    fn has_interrupt(&self) -> bool;
}
