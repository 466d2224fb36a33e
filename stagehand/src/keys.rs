//! Raw-byte key decoding.
//!
//! The reader thread hands this module buffers of 1 or 3 bytes straight from
//! the terminal. Decoding is a pure function of the bytes: no state, no side
//! effects. Unrecognized sequences yield `None` and are silently dropped by
//! the caller, never surfaced as errors.

/// A decoded key press, compared by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A printable character.
    Char(char),
    /// A control chord; carries the base letter (Ctrl-C is `Ctrl('c')`).
    Ctrl(char),
    Up,
    Down,
    Left,
    Right,
    Enter,
    Escape,
    Tab,
    Space,
    Backspace,
    Delete,
}

impl Key {
    /// Decodes a single input byte.
    ///
    /// Dedicated control codes (enter, escape, tab, space, backspace) are
    /// checked before the generic 0x01–0x1A control range so that 0x09/0x0D
    /// do not decode as Ctrl-I/Ctrl-M. Anything else is treated as a
    /// printable character via its code point.
    pub fn from_byte(byte: u8) -> Option<Key> {
        match byte {
            0x0D => Some(Key::Enter),
            0x1B => Some(Key::Escape),
            0x09 => Some(Key::Tab),
            0x20 => Some(Key::Space),
            0x7F => Some(Key::Backspace),
            0x01..=0x1A => Some(Key::Ctrl((byte + 0x60) as char)),
            _ => Some(Key::Char(byte as char)),
        }
    }

    /// Decodes a 3-byte CSI arrow sequence (`ESC [ A|B|C|D`).
    ///
    /// Any other escape sequence is unrecognized and yields `None`.
    pub fn from_escape_sequence(bytes: &[u8]) -> Option<Key> {
        if bytes.len() >= 3 && bytes[0] == 0x1B && bytes[1] == b'[' {
            match bytes[2] {
                b'A' => Some(Key::Up),
                b'B' => Some(Key::Down),
                b'C' => Some(Key::Right),
                b'D' => Some(Key::Left),
                _ => None,
            }
        } else {
            None
        }
    }

    /// Decodes a raw read buffer of length 1 or 3.
    ///
    /// Any other length is an unrecognized multi-byte sequence and is dropped.
    pub fn decode(buf: &[u8]) -> Option<Key> {
        match buf.len() {
            1 => Key::from_byte(buf[0]),
            3 => Key::from_escape_sequence(buf),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_range_maps_to_base_letters() {
        // Full 0x01–0x1A range, minus the bytes with dedicated meanings.
        for byte in 0x01u8..=0x1A {
            let expected = match byte {
                0x09 => Key::Tab,
                0x0D => Key::Enter,
                _ => Key::Ctrl((byte + 0x60) as char),
            };
            assert_eq!(Key::from_byte(byte), Some(expected), "byte {byte:#04x}");
        }
        assert_eq!(Key::from_byte(0x03), Some(Key::Ctrl('c')));
        assert_eq!(Key::from_byte(0x1A), Some(Key::Ctrl('z')));
    }

    #[test]
    fn printable_ascii_decodes_to_chars() {
        for byte in (65u8..=90).chain(97..=122) {
            assert_eq!(Key::from_byte(byte), Some(Key::Char(byte as char)));
        }
        assert_eq!(Key::from_byte(b'?'), Some(Key::Char('?')));
    }

    #[test]
    fn dedicated_bytes_win_over_generic_decoding() {
        assert_eq!(Key::from_byte(0x0D), Some(Key::Enter));
        assert_eq!(Key::from_byte(0x1B), Some(Key::Escape));
        assert_eq!(Key::from_byte(0x09), Some(Key::Tab));
        assert_eq!(Key::from_byte(0x20), Some(Key::Space));
        assert_eq!(Key::from_byte(0x7F), Some(Key::Backspace));
    }

    #[test]
    fn csi_arrows_decode() {
        assert_eq!(Key::from_escape_sequence(&[0x1B, b'[', b'A']), Some(Key::Up));
        assert_eq!(Key::from_escape_sequence(&[0x1B, b'[', b'B']), Some(Key::Down));
        assert_eq!(Key::from_escape_sequence(&[0x1B, b'[', b'C']), Some(Key::Right));
        assert_eq!(Key::from_escape_sequence(&[0x1B, b'[', b'D']), Some(Key::Left));
    }

    #[test]
    fn unknown_escape_sequences_are_dropped() {
        assert_eq!(Key::from_escape_sequence(&[0x1B, b'[', b'Z']), None);
        assert_eq!(Key::from_escape_sequence(&[0x1B, b'O', b'A']), None);
    }

    #[test]
    fn decode_dispatches_on_length() {
        assert_eq!(Key::decode(&[b'j']), Some(Key::Char('j')));
        assert_eq!(Key::decode(&[0x1B, b'[', b'B']), Some(Key::Down));
        assert_eq!(Key::decode(&[0x1B, b'[']), None);
        assert_eq!(Key::decode(&[]), None);
    }
}
