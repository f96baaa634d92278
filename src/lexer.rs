//! Byte-level classification shared by the `nom` grammar in `parser.rs`.
//!
//! PDF syntax (ISO 32000-1 §7.2) recognizes three character classes:
//! regular, delimiter, and whitespace. Everything here operates on raw
//! bytes; there is no intermediate token stream, the parser combinators in
//! `parser.rs` consume directly off these predicates.

/// `%` is whitespace-adjacent: it starts a comment that runs to EOL.
#[inline]
pub fn is_whitespace(ch: u8) -> bool {
    matches!(ch, 0x00 | 0x09 | 0x0A | 0x0C | 0x0D | 0x20)
}

#[inline]
pub fn is_delimiter(ch: u8) -> bool {
    matches!(ch, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%')
}

#[inline]
pub fn is_regular(ch: u8) -> bool {
    !is_whitespace(ch) && !is_delimiter(ch)
}

#[inline]
pub fn is_eol(ch: u8) -> bool {
    matches!(ch, 0x0A | 0x0D)
}

#[inline]
pub fn is_digit(ch: u8) -> bool {
    ch.is_ascii_digit()
}

#[inline]
pub fn is_hex_digit(ch: u8) -> bool {
    ch.is_ascii_hexdigit()
}
