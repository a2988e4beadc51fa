//! Mapping between Unicode text and the display's single-byte character set.
//!
//! Printable ASCII maps to itself, except for the characters the display
//! cannot show: `" % @ [ ] ^ _ ` { | } ~`. Some of those are used by the page
//! text syntax instead. A handful of non-ASCII characters are also available.

use crate::{
    decode::{DecodeError, DecodeErrorKind},
    encode::EncodeError,
};

/// Control byte that moves the following text to the next display line.
pub const LINE_BREAK: u8 = 0x0A;

/// Control sequence that right-aligns the remaining text on the current line.
pub const RIGHT_ALIGN: [u8; 2] = [b'\\', b'R'];

/// Non-ASCII characters the display can show, with their device bytes.
pub const EXTENDED_CHARACTERS: [(char, u8); 6] = [
    ('\u{00B7}', 0x8F), // MIDDLE DOT
    ('\u{2022}', 0xD3), // BULLET
    ('\u{2500}', 0x97), // BOX DRAWINGS LIGHT HORIZONTAL
    ('\u{2501}', 0xD2), // BOX DRAWINGS HEAVY HORIZONTAL
    ('\u{2588}', 0x5F), // FULL BLOCK
    ('\u{2594}', 0xA3), // UPPER ONE EIGHTH BLOCK
];

/// Device bytes that read back as an existing character but are never produced
/// when encoding.
const DECODE_ALIASES: [(u8, char); 4] = [
    (b'"', '\''),
    (0x98, '\u{2500}'),
    (0xA4, '\u{2594}'),
    (0xA5, '\u{2594}'),
];

const fn is_supported_ascii(c: char) -> bool {
    matches!(c,
        'A'..='Z' | 'a'..='z' | '0'..='9'
        | ' ' | '!' | '#' | '$' | '&' | '\'' | '(' | ')' | '*' | '+' | ','
        | '-' | '.' | '/' | ':' | ';' | '<' | '=' | '>' | '?' | '\\'
    )
}

/// Returns the device byte for `c`.
///
/// # Errors
///
/// Returns [`EncodeError::UnsupportedCharacter`] if the display has no
/// representation of `c`.
pub fn encode_char(c: char) -> Result<u8, EncodeError> {
    if is_supported_ascii(c) {
        return Ok(c as u8);
    }

    EXTENDED_CHARACTERS
        .iter()
        .find(|&&(ch, _)| ch == c)
        .map(|&(_, byte)| byte)
        .ok_or(EncodeError::UnsupportedCharacter(c))
}

/// Returns the character shown for device byte `byte`.
///
/// # Errors
///
/// Returns [`DecodeErrorKind::UnsupportedByte`] for control bytes and for
/// bytes with no known glyph.
pub fn decode_byte(byte: u8) -> Result<char, DecodeError> {
    if is_supported_ascii(byte as char) {
        return Ok(byte as char);
    }

    EXTENDED_CHARACTERS
        .iter()
        .find(|&&(_, b)| b == byte)
        .map(|&(ch, _)| ch)
        .or_else(|| {
            DECODE_ALIASES
                .iter()
                .find(|&&(b, _)| b == byte)
                .map(|&(_, ch)| ch)
        })
        .ok_or_else(|| DecodeError::new::<char>(DecodeErrorKind::UnsupportedByte(byte)))
}

/// Checks that every character of `text` can be shown, without encoding it.
pub(crate) fn validate(text: &str) -> Result<(), EncodeError> {
    text.chars().try_for_each(|c| encode_char(c).map(drop))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_is_identity() {
        for c in "AZaz09 !#$&'()*+,-./:;<=>?\\".chars() {
            assert_eq!(encode_char(c), Ok(c as u8));
            assert_eq!(decode_byte(c as u8), Ok(c));
        }
    }

    #[test]
    fn unsupported_ascii() {
        for c in "\"%@[]^_`{|}~\n".chars() {
            assert_eq!(encode_char(c), Err(EncodeError::UnsupportedCharacter(c)));
        }
        assert_eq!(
            encode_char('é'),
            Err(EncodeError::UnsupportedCharacter('é'))
        );
    }

    #[test]
    fn extended_characters_are_bijective() {
        for (c, byte) in EXTENDED_CHARACTERS {
            assert_eq!(encode_char(c), Ok(byte));
            assert_eq!(decode_byte(byte), Ok(c));
        }
    }

    #[test]
    fn full_block_is_not_underscore() {
        assert_eq!(encode_char('█'), Ok(b'_'));
        assert_eq!(decode_byte(b'_'), Ok('█'));
    }

    #[test]
    fn aliases() {
        assert_eq!(decode_byte(b'"'), Ok('\''));
        assert_eq!(decode_byte(0x98), Ok('─'));
        assert_eq!(decode_byte(0xA4), Ok('▔'));
        assert_eq!(decode_byte(0xA5), Ok('▔'));
    }

    #[test]
    fn control_bytes_have_no_text() {
        for byte in [LINE_BREAK, 0x0D, 0x00, 0x01, 0x10, 0xFF, b'%', b'~'] {
            assert_eq!(
                decode_byte(byte).map_err(|e| e.kind()),
                Err(DecodeErrorKind::UnsupportedByte(byte))
            );
        }
    }

    #[test]
    fn validate_reports_first_bad_character() {
        assert_eq!(validate("12:34 FUNKYTOWN"), Ok(()));
        assert_eq!(
            validate("@@@ BAD TEXT @@@"),
            Err(EncodeError::UnsupportedCharacter('@'))
        );
    }
}
