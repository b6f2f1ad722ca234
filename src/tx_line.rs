//! Line assembly for characters typed while offline or browsing.

use crate::petscii::{fold_typed, ASCII_BACKSPACE, DELETE, RETURN};

/// Longest command line, terminator included.
pub const TX_LINE_MAX: usize = 128;

/// Accumulates folded host keystrokes into a command line.
///
/// A return, or filling the buffer, closes the line. The closing byte is
/// replaced by the terminator, so a line that fills the buffer loses its
/// last character.
///
/// # Example
///
/// ```rust
/// use swiftlink::TxLine;
///
/// let mut line = TxLine::new();
/// for &c in b"atc" {
///     assert_eq!(line.push(c), None);
/// }
/// assert_eq!(line.push(0x14), None); // delete
/// assert_eq!(line.push(b'?'), None);
/// assert_eq!(line.push(0x0D).as_deref(), Some("at?"));
/// ```
#[derive(Debug, Clone)]
pub struct TxLine {
    buf: [u8; TX_LINE_MAX],
    offset: usize,
}

impl TxLine {
    pub fn new() -> Self {
        Self {
            buf: [0; TX_LINE_MAX],
            offset: 0,
        }
    }

    /// Feed one typed byte (raw PETSCII). Returns the completed line, in
    /// folded lowercase ASCII, when this byte closes it.
    pub fn push(&mut self, typed: u8) -> Option<String> {
        let c = fold_typed(typed);

        if c == ASCII_BACKSPACE || c == DELETE {
            // Nothing to erase at the start of a line
            self.offset = self.offset.saturating_sub(1);
            return None;
        }

        self.buf[self.offset] = c;
        self.offset += 1;

        if c == RETURN || self.offset == TX_LINE_MAX {
            let line = self.buf[..self.offset - 1]
                .iter()
                .map(|&b| b as char)
                .collect();
            self.offset = 0;
            return Some(line);
        }
        None
    }

    /// Characters held so far.
    pub fn len(&self) -> usize {
        self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.offset == 0
    }

    pub fn clear(&mut self) {
        self.offset = 0;
    }
}

impl Default for TxLine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(line: &mut TxLine, bytes: &[u8]) -> Option<String> {
        let mut out = None;
        for &b in bytes {
            out = line.push(b);
        }
        out
    }

    #[test]
    fn test_return_closes_line() {
        let mut line = TxLine::new();
        assert_eq!(feed(&mut line, b"at+s\r").as_deref(), Some("at+s"));
        assert!(line.is_empty());
    }

    #[test]
    fn test_bare_return_is_empty_line() {
        let mut line = TxLine::new();
        assert_eq!(line.push(RETURN).as_deref(), Some(""));
    }

    #[test]
    fn test_backspace_and_delete() {
        let mut line = TxLine::new();
        feed(&mut line, b"abx");
        line.push(ASCII_BACKSPACE);
        line.push(b'c');
        line.push(b'y');
        line.push(DELETE);
        assert_eq!(line.push(RETURN).as_deref(), Some("abc"));
    }

    #[test]
    fn test_backspace_on_empty_line_is_ignored() {
        let mut line = TxLine::new();
        line.push(DELETE);
        assert_eq!(line.len(), 0);
        assert_eq!(feed(&mut line, b"x\r").as_deref(), Some("x"));
    }

    #[test]
    fn test_shifted_letters_fold_to_lowercase() {
        let mut line = TxLine::new();
        // PETSCII "AT" typed shifted and unshifted
        assert_eq!(feed(&mut line, &[0xC1, 0x54, RETURN]).as_deref(), Some("at"));
    }

    #[test]
    fn test_full_buffer_closes_line() {
        let mut line = TxLine::new();
        let mut closed = None;
        for i in 0..TX_LINE_MAX {
            closed = line.push(b'a');
            if i < TX_LINE_MAX - 1 {
                assert_eq!(closed, None);
            }
        }
        let closed = closed.unwrap_or_default();
        assert_eq!(closed.len(), TX_LINE_MAX - 1);
        assert!(line.is_empty());
    }
}
