use thiserror::Error;

/// Failure to interpret bytes received from (or captured on the way to) a display.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub struct DecodeError {
    kind: DecodeErrorKind,
    type_name: &'static str,
}

impl DecodeError {
    pub fn new<T>(kind: DecodeErrorKind) -> Self {
        Self {
            kind,
            type_name: core::any::type_name::<T>(),
        }
    }

    pub const fn kind(&self) -> DecodeErrorKind {
        self.kind
    }
}

impl core::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Failed to decode {}: {}", self.type_name, self.kind)
    }
}

#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeErrorKind {
    #[error("Packet was too short.")]
    UnexpectedEnd,

    #[error(
        "Could not decode {name} with unexpected byte. Found {value:x}, expected one of: {expected:x?}."
    )]
    UnexpectedByte {
        name: &'static str,
        value: u8,
        expected: &'static [u8],
    },

    #[error("Packet did not have a valid header sequence.")]
    InvalidHeader,

    #[error("Packet contained a DLE byte that was not part of an escape or marker.")]
    InvalidEscape,

    #[error("Packet contained unexpected bytes after its end.")]
    TrailingData,

    #[error("Byte {0:#04x} has no text meaning.")]
    UnsupportedByte(u8),

    #[error("Unknown animation byte {0:#04x}.")]
    UnknownAnimation(u8),

    #[error("Page contained {0} lines, but a display shows at most 2.")]
    TooManyLines(usize),

    #[error("CRC16 checksum mismatch. Found {found:x?}, expected {expected:x?}.")]
    ChecksumMismatch { found: [u8; 2], expected: [u8; 2] },
}

impl DecodeErrorKind {
    /// Returns `true` for errors caused by an inconsistent envelope, header
    /// or truncated payload rather than by its content.
    pub const fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::UnexpectedEnd
                | Self::UnexpectedByte { .. }
                | Self::InvalidHeader
                | Self::InvalidEscape
                | Self::TrailingData
        )
    }
}

/// A type that can be reconstructed (decoded) from a raw sequence of bytes.
///
/// Implementors of this trait define how to parse their binary representation
/// from an input buffer. The input slice will be advanced by the number of bytes
/// successfully consumed during decoding.
pub trait Decode {
    /// Attempts to decode `Self` from the beginning of the provided byte slice.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the input is malformed or insufficient
    /// to decode a complete value of this type.
    fn decode(data: &mut &[u8]) -> Result<Self, DecodeError>
    where
        Self: Sized;

    /// Decodes `Self` from the whole of `data`.
    ///
    /// # Errors
    ///
    /// In addition to the errors of [`Decode::decode`], returns
    /// [`DecodeErrorKind::TrailingData`] if any bytes are left over.
    fn decode_exact(mut data: &[u8]) -> Result<Self, DecodeError>
    where
        Self: Sized,
    {
        let value = Self::decode(&mut data)?;
        if !data.is_empty() {
            return Err(DecodeError::new::<Self>(DecodeErrorKind::TrailingData));
        }
        Ok(value)
    }
}

impl Decode for u8 {
    fn decode(data: &mut &[u8]) -> Result<Self, DecodeError> {
        let (&first, rest) = data
            .split_first()
            .ok_or_else(|| DecodeError::new::<Self>(DecodeErrorKind::UnexpectedEnd))?;
        *data = rest;
        Ok(first)
    }
}

impl<const N: usize> Decode for [u8; N] {
    fn decode(data: &mut &[u8]) -> Result<Self, DecodeError> {
        let mut arr = [0; N];
        let bytes = data
            .get(..N)
            .ok_or_else(|| DecodeError::new::<Self>(DecodeErrorKind::UnexpectedEnd))?;
        arr.copy_from_slice(bytes);
        *data = &data[N..];
        Ok(arr)
    }
}

/// Consumes one byte and checks it against the only value allowed there.
pub(crate) fn expect_byte<T>(
    data: &mut &[u8],
    name: &'static str,
    expected: &'static [u8],
) -> Result<u8, DecodeError> {
    let value = u8::decode(data)?;
    if !expected.contains(&value) {
        return Err(DecodeError::new::<T>(DecodeErrorKind::UnexpectedByte {
            name,
            value,
            expected,
        }));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_advance_input() {
        let mut data: &[u8] = &[0x01, 0x02, 0x03];
        assert_eq!(u8::decode(&mut data), Ok(0x01));
        assert_eq!(<[u8; 2]>::decode(&mut data), Ok([0x02, 0x03]));
        assert!(data.is_empty());
        assert_eq!(
            u8::decode(&mut data).map_err(|e| e.kind()),
            Err(DecodeErrorKind::UnexpectedEnd)
        );
    }

    #[test]
    fn exact_rejects_leftovers() {
        assert_eq!(u8::decode_exact(&[0x6F]), Ok(0x6F));
        assert_eq!(
            u8::decode_exact(&[0x6F, 0x00]).map_err(|e| e.kind()),
            Err(DecodeErrorKind::TrailingData)
        );
    }

    #[test]
    fn expected_byte() {
        let mut data: &[u8] = &[0x00, 0xFF];
        assert_eq!(expect_byte::<()>(&mut data, "reserved", &[0x00]), Ok(0x00));
        assert_eq!(
            expect_byte::<()>(&mut data, "reserved", &[0x00]).map_err(|e| e.kind()),
            Err(DecodeErrorKind::UnexpectedByte {
                name: "reserved",
                value: 0xFF,
                expected: &[0x00],
            })
        );
    }

    #[test]
    fn malformed_family() {
        assert!(DecodeErrorKind::InvalidEscape.is_malformed());
        assert!(DecodeErrorKind::UnexpectedEnd.is_malformed());
        assert!(!DecodeErrorKind::UnsupportedByte(0xFF).is_malformed());
        assert!(
            !DecodeErrorKind::ChecksumMismatch {
                found: [0, 0],
                expected: [1, 1]
            }
            .is_malformed()
        );
    }
}
