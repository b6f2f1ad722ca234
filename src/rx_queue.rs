//! Receive ring buffer between the network and the host.
//!
//! Network data arrives in bursts far faster than the host can take it one
//! NMI at a time, so everything headed for the C64 is parked here first.
//! One slot is always left unused so `head == tail` unambiguously means
//! empty.

use tracing::warn;

/// Default capacity: 320 KiB.
pub const DEFAULT_RX_CAPACITY: usize = 1024 * 320;

/// Fixed-capacity byte ring.
///
/// # Example
///
/// ```rust
/// use swiftlink::RxQueue;
///
/// let mut q = RxQueue::new(4);
/// assert!(q.push(1));
/// assert!(q.push(2));
/// assert!(q.push(3));
/// assert!(!q.push(4)); // capacity - 1 usable slots
/// assert_eq!(q.used(), 3);
/// assert_eq!(q.pop(), Some(1));
/// ```
#[derive(Debug, Clone)]
pub struct RxQueue {
    buf: Box<[u8]>,
    head: usize,
    tail: usize,
    overflowing: bool,
}

impl RxQueue {
    /// Create an empty queue. Capacities below 2 are raised to 2 so at least
    /// one byte fits.
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: vec![0; capacity.max(2)].into_boxed_slice(),
            head: 0,
            tail: 0,
            overflowing: false,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Bytes currently queued. Always below [`RxQueue::capacity`].
    pub fn used(&self) -> usize {
        if self.head >= self.tail {
            self.head - self.tail
        } else {
            self.head + self.capacity() - self.tail
        }
    }

    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    /// Append a byte. On overflow the byte is dropped and `false` returned;
    /// the overflow is logged once per run of dropped bytes.
    pub fn push(&mut self, byte: u8) -> bool {
        if self.used() >= self.capacity() - 1 {
            if !self.overflowing {
                warn!(capacity = self.capacity(), "Rx queue overflow, dropping input");
                self.overflowing = true;
            }
            return false;
        }
        self.overflowing = false;
        self.buf[self.head] = byte;
        self.head += 1;
        if self.head == self.capacity() {
            self.head = 0;
        }
        true
    }

    /// Append every byte of `bytes`, dropping what does not fit.
    pub fn push_slice(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.push(b);
        }
    }

    /// Remove the oldest byte.
    pub fn pop(&mut self) -> Option<u8> {
        if self.is_empty() {
            return None;
        }
        let byte = self.buf[self.tail];
        self.tail += 1;
        if self.tail == self.capacity() {
            self.tail = 0;
        }
        Some(byte)
    }

    /// Dump everything queued.
    pub fn clear(&mut self) {
        self.head = 0;
        self.tail = 0;
        self.overflowing = false;
    }
}

impl Default for RxQueue {
    fn default() -> Self {
        Self::new(DEFAULT_RX_CAPACITY)
    }
}
