//! `+++` escape detection for the online data relay.
//!
//! Classic Hayes guard-time rule: the first `+` must follow at least one
//! guard period of silence, the next two may follow immediately, and the
//! sequence only counts once another guard period passes with no traffic.

/// Tracks the escape sequence across forwarded bytes.
///
/// # Example
///
/// ```rust
/// use swiftlink::EscapeDetector;
///
/// let mut esc = EscapeDetector::new(1000, 0);
/// esc.on_tx(b'+', 1_500);
/// esc.on_tx(b'+', 1_510);
/// esc.on_tx(b'+', 1_520);
/// assert!(!esc.triggered(2_000));
/// assert!(esc.triggered(2_521));
/// ```
#[derive(Debug, Clone)]
pub struct EscapeDetector {
    guard_ms: u64,
    plus_count: u8,
    last_tx_ms: u64,
}

impl EscapeDetector {
    pub fn new(guard_ms: u64, now_ms: u64) -> Self {
        Self {
            guard_ms,
            plus_count: 0,
            last_tx_ms: now_ms,
        }
    }

    /// Record a transmitted byte. Offline bytes count as traffic too, so
    /// every byte the host writes must pass through here.
    pub fn on_tx(&mut self, byte: u8, now_ms: u64) {
        if byte == b'+' {
            if now_ms.saturating_sub(self.last_tx_ms) > self.guard_ms || self.plus_count != 0 {
                self.plus_count += 1;
                if self.plus_count > 3 {
                    self.plus_count = 0;
                }
            }
        } else {
            self.plus_count = 0;
        }
        self.last_tx_ms = now_ms;
    }

    /// Record traffic that is not a candidate escape byte.
    pub fn on_traffic(&mut self, now_ms: u64) {
        self.last_tx_ms = now_ms;
    }

    /// Check for a completed sequence followed by a guard period. Fires at
    /// most once per sequence.
    pub fn triggered(&mut self, now_ms: u64) -> bool {
        if self.plus_count == 3 && now_ms.saturating_sub(self.last_tx_ms) > self.guard_ms {
            self.plus_count = 0;
            return true;
        }
        false
    }

    pub fn plus_count(&self) -> u8 {
        self.plus_count
    }
}
