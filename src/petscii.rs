//! PETSCII control codes and ASCII translation.
//!
//! The host runs its screen in the lowercase/uppercase character set, where
//! PETSCII $41-$5A are lowercase letters and $61-$7A / $C1-$DA uppercase.
//! Network text is plain ASCII, so letters swap case on the way in.

// Colors
pub const PURPLE: u8 = 0x9C;
pub const WHITE: u8 = 0x05;
pub const LIGHT_BLUE: u8 = 0x9A;
pub const YELLOW: u8 = 0x9E;
pub const PINK: u8 = 0x96;
pub const LIGHT_GREEN: u8 = 0x99;
pub const DARK_GREY: u8 = 0x97;
pub const GREY: u8 = 0x98;

// Control
pub const RETURN: u8 = 0x0D;
pub const RVS_ON: u8 = 0x12;
pub const RVS_OFF: u8 = 0x92;
pub const CLEAR_SCREEN: u8 = 0x93;
pub const CURSOR_UP: u8 = 0x91;
pub const DELETE: u8 = 0x14;
pub const HORIZ_BAR: u8 = 0x60;
pub const SPACE: u8 = 0x20;

/// ASCII backspace, accepted as a line edit alongside PETSCII delete.
pub const ASCII_BACKSPACE: u8 = 0x08;

/// Translate one ASCII byte to PETSCII.
///
/// Returns 0 for bytes with no printable equivalent; 0 is the no-op
/// placeholder the receive path swallows.
///
/// ```rust
/// use swiftlink::petscii::to_petscii;
///
/// assert_eq!(to_petscii(b'a'), 0x41);
/// assert_eq!(to_petscii(b'A'), 0x61);
/// assert_eq!(to_petscii(b'\r'), 0x0D);
/// assert_eq!(to_petscii(b'\n'), 0x00);
/// ```
pub fn to_petscii(ascii: u8) -> u8 {
    match ascii {
        b'a'..=b'z' => ascii - 0x20,
        b'A'..=b'Z' => ascii + 0x20,
        b'\r' => RETURN,
        b'\t' => SPACE,
        b'_' => 0xA4,
        b'`' => 0x27,
        b'{' => b'(',
        b'}' => b')',
        b'|' => 0xDD,
        b'~' => b'-',
        0x20..=0x5E => ascii,
        _ => 0,
    }
}

/// Translate one PETSCII byte to ASCII for display on a modern terminal.
///
/// Color and cursor codes have no ASCII form and map to 0.
pub fn from_petscii(petscii: u8) -> u8 {
    match petscii {
        0x41..=0x5A => petscii + 0x20,
        0x61..=0x7A => petscii - 0x20,
        0xC1..=0xDA => petscii - 0x80,
        RETURN => b'\r',
        0x20..=0x40 | 0x5B..=0x5F => petscii,
        0xA4 => b'_',
        _ => 0,
    }
}

/// Translate an ASCII string, keeping the no-op zeros.
pub fn ascii_to_petscii(text: &str) -> Vec<u8> {
    text.bytes().map(to_petscii).collect()
}

/// Fold a typed character into the lowercase ASCII used for command
/// matching. Bit 7 (shifted letter in graphics mode) is dropped first.
///
/// ```rust
/// use swiftlink::petscii::fold_typed;
///
/// assert_eq!(fold_typed(0x41), b'a'); // PETSCII lowercase 'a'
/// assert_eq!(fold_typed(0xC1), b'a'); // PETSCII uppercase 'A'
/// assert_eq!(fold_typed(b'7'), b'7');
/// ```
pub fn fold_typed(petscii: u8) -> u8 {
    let c = petscii & 0x7F;
    if c & 0x40 != 0 {
        c | 0x20
    } else {
        c
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letters_round_trip_through_display() {
        for c in b'a'..=b'z' {
            assert_eq!(from_petscii(to_petscii(c)), c);
        }
        for c in b'A'..=b'Z' {
            assert_eq!(from_petscii(to_petscii(c)), c);
        }
    }

    #[test]
    fn test_control_bytes_become_noop() {
        assert_eq!(to_petscii(b'\n'), 0);
        assert_eq!(to_petscii(0x07), 0);
        assert_eq!(to_petscii(0x7F), 0);
        assert_eq!(to_petscii(0xE9), 0);
    }

    #[test]
    fn test_colors_have_no_ascii_form() {
        assert_eq!(from_petscii(PURPLE), 0);
        assert_eq!(from_petscii(RVS_ON), 0);
        assert_eq!(from_petscii(CLEAR_SCREEN), 0);
    }

    #[test]
    fn test_fold_typed_digits_and_punctuation() {
        for &c in b"0123456789.:=+?/ " {
            assert_eq!(fold_typed(c), c);
        }
        assert_eq!(fold_typed(RETURN), RETURN);
    }
}
