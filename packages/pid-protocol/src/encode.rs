use alloc::{string::String, vec, vec::Vec};
use thiserror::Error;

/// Failure to build a value that can be displayed, due to invalid input.
///
/// Every encodable type in this crate is validated when it is constructed,
/// so this error is only ever returned by constructors and parsers. Once a
/// value exists, encoding it cannot fail.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum EncodeError {
    #[error("Character {0:?} cannot be shown on the display.")]
    UnsupportedCharacter(char),

    #[error("Unknown animation {0:?}.")]
    UnknownAnimation(char),

    #[error("Delay {0:?} is outside the range 0..=255.")]
    DelayOutOfRange(String),

    #[error("Page contains {0} lines, but a display shows at most 2.")]
    TooManyLines(usize),

    #[error("A display message needs at least one page.")]
    EmptyMessage,

    #[error(r"Text contains the sequence `\R`, which the display reads as right alignment.")]
    ReservedSequence,
}

/// A type that can be encoded into a sequence of bytes.
pub trait Encode {
    /// Returns the number of bytes this value will take when encoded.
    fn size(&self) -> usize;

    /// Encodes this instance into the provided byte slice.
    fn encode(&self, data: &mut [u8]);

    /// Encodes this instance into a newly allocated buffer.
    fn to_bytes(&self) -> Vec<u8> {
        let mut data = vec![0; self.size()];
        self.encode(&mut data);
        data
    }
}

impl Encode for u8 {
    fn size(&self) -> usize {
        1
    }

    fn encode(&self, data: &mut [u8]) {
        data[0] = *self;
    }
}

impl Encode for &[u8] {
    fn size(&self) -> usize {
        self.len()
    }

    fn encode(&self, data: &mut [u8]) {
        data[..self.len()].copy_from_slice(self);
    }
}

impl<const N: usize> Encode for [u8; N] {
    fn size(&self) -> usize {
        N
    }

    fn encode(&self, data: &mut [u8]) {
        data[..N].copy_from_slice(self);
    }
}

impl Encode for Vec<u8> {
    fn size(&self) -> usize {
        self.len()
    }

    fn encode(&self, data: &mut [u8]) {
        self.as_slice().encode(data)
    }
}

/// Sequential writer over a pre-sized output buffer.
pub struct MessageEncoder<'a> {
    data: &'a mut [u8],
    position: usize,
}

impl<'a> MessageEncoder<'a> {
    pub fn new(data: &'a mut [u8]) -> Self {
        Self::new_with_position(data, 0)
    }

    pub fn new_with_position(data: &'a mut [u8], position: usize) -> Self {
        Self { data, position }
    }

    /// Encodes `value` at the current position and moves past it.
    pub fn write(&mut self, value: &impl Encode) {
        value.encode(&mut self.data[self.position..]);
        self.position += value.size();
    }

    pub fn position(&self) -> usize {
        self.position
    }
}
