//! Time sources and bounded waiting.
//!
//! The polling context is the only place allowed to spend time. Anything
//! that used to spin forever (waiting for the host to read a byte, waiting
//! for an HTTP header line) is expressed as a [`Retry`] loop with a spin
//! budget and an elapsed-time budget.

use std::cell::Cell;
use web_time::Instant;

/// Monotonic time source.
pub trait Clock {
    /// Microseconds since an arbitrary fixed origin.
    fn micros(&self) -> u64;

    /// Milliseconds since the same origin as [`Clock::micros`].
    fn millis(&self) -> u64 {
        self.micros() / 1000
    }
}

/// Wall clock backed by a monotonic `Instant`.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn micros(&self) -> u64 {
        self.origin.elapsed().as_micros() as u64
    }
}

/// Clock that only moves when told to.
///
/// Used by tests and by drivers that derive time from emulated cycles.
///
/// # Example
///
/// ```rust
/// use swiftlink::{Clock, ManualClock};
///
/// let clock = ManualClock::new();
/// clock.advance_ms(1500);
/// assert_eq!(clock.millis(), 1500);
/// ```
#[derive(Debug, Default)]
pub struct ManualClock {
    now_us: Cell<u64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance_us(&self, us: u64) {
        self.now_us.set(self.now_us.get().saturating_add(us));
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance_us(ms.saturating_mul(1000));
    }
}

impl Clock for ManualClock {
    fn micros(&self) -> u64 {
        self.now_us.get()
    }
}

/// Spin and time limits for one bounded wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    pub max_spins: u32,
    pub max_micros: u64,
}

/// Result of waiting for the host to accept a byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Host is ready for the next byte.
    Ready,
    /// The pending interrupt was never serviced and has been force-cleared.
    NmiTimeout,
    /// Budget exhausted without the host becoming ready.
    Expired,
}

/// A bounded retry loop.
///
/// ```rust
/// use swiftlink::{ManualClock, Retry, RetryBudget};
///
/// let clock = ManualClock::new();
/// let mut retry = Retry::new(&clock, RetryBudget { max_spins: 3, max_micros: 1_000 });
/// assert!(retry.spin());
/// assert!(retry.spin());
/// assert!(retry.spin());
/// assert!(!retry.spin());
/// ```
pub struct Retry<'a> {
    clock: &'a dyn Clock,
    budget: RetryBudget,
    started_us: u64,
    spins: u32,
}

impl<'a> Retry<'a> {
    pub fn new(clock: &'a dyn Clock, budget: RetryBudget) -> Self {
        Self {
            clock,
            budget,
            started_us: clock.micros(),
            spins: 0,
        }
    }

    /// Count one spin. Returns false once either budget is exhausted.
    pub fn spin(&mut self) -> bool {
        self.spins = self.spins.saturating_add(1);
        self.spins <= self.budget.max_spins
            && self.clock.micros().saturating_sub(self.started_us) <= self.budget.max_micros
    }

    /// Start both budgets over (progress was made).
    pub fn restart(&mut self) {
        self.spins = 0;
        self.started_us = self.clock.micros();
    }

    pub fn spins(&self) -> u32 {
        self.spins
    }
}
