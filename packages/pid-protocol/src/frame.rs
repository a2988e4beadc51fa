//! DLE/STX/ETX packet framing.
//!
//! A packet is a message followed by its checksum, with every `DLE` byte
//! doubled, wrapped between the start and end markers.

use alloc::vec::Vec;

use crate::{
    crc::{CHECKSUM_SIZE, checksum, verify},
    decode::{Decode, DecodeError, DecodeErrorKind},
    encode::Encode,
    message::{ADDRESS, Message},
};

/// Data Link Escape.
pub const DLE: u8 = 0x10;
/// Start of Text.
pub const STX: u8 = 0x02;
/// End of Text.
pub const ETX: u8 = 0x03;

pub const START_MARKER: [u8; 2] = [DLE, STX];
pub const END_MARKER: [u8; 2] = [DLE, ETX];

/// Payload size of an acknowledgement, the largest response accepted by
/// [`inspect`] without a checksum.
const ACKNOWLEDGEMENT_PAYLOAD_SIZE: usize = 2;

/// A checksummed, framed message as sent over the wire.
///
/// # Encoding
///
/// | Field      | Size | Description |
/// |------------|------|-------------|
/// | `start`    | 2    | [`START_MARKER`]. |
/// | `message`  | n    | Encoded message, with every [`DLE`] doubled. |
/// | `checksum` | 2–4  | [`checksum`] of the message, with every [`DLE`] doubled. |
/// | `end`      | 2    | [`END_MARKER`]. |
///
/// Decoding is strict: both markers must be present. Use [`inspect`] for
/// captured data that may be missing either one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet<M> {
    message: M,
}

impl<M> Packet<M> {
    pub fn new(message: M) -> Self {
        Self { message }
    }

    pub fn message(&self) -> &M {
        &self.message
    }

    pub fn into_inner(self) -> M {
        self.message
    }
}

impl<M: Encode> Encode for Packet<M> {
    fn size(&self) -> usize {
        frame(&self.message).len()
    }

    fn encode(&self, data: &mut [u8]) {
        frame(&self.message).encode(data)
    }
}

impl<M: Decode> Decode for Packet<M> {
    fn decode(data: &mut &[u8]) -> Result<Self, DecodeError> {
        if <[u8; 2]>::decode(data)? != START_MARKER {
            return Err(DecodeError::new::<Self>(DecodeErrorKind::InvalidHeader));
        }

        let (body, terminated) = unstuff(data)?;
        if !terminated {
            return Err(DecodeError::new::<Self>(DecodeErrorKind::UnexpectedEnd));
        }

        Ok(Self {
            message: M::decode_exact(strip_checksum::<Self>(&body)?)?,
        })
    }
}

/// Checksums and frames an encoded message.
pub fn frame(message: &impl Encode) -> Vec<u8> {
    let mut body = message.to_bytes();
    let sum = checksum(&body);
    body.extend_from_slice(&sum);

    let escapes = body.iter().filter(|&&b| b == DLE).count();
    let mut packet = Vec::with_capacity(START_MARKER.len() + body.len() + escapes + END_MARKER.len());

    packet.extend_from_slice(&START_MARKER);
    for byte in body {
        packet.push(byte);
        if byte == DLE {
            packet.push(DLE);
        }
    }
    packet.extend_from_slice(&END_MARKER);

    packet
}

impl Message {
    /// Returns the fully framed, checksummed packet for this message.
    pub fn to_packet(&self) -> Vec<u8> {
        frame(self)
    }
}

/// Returns `true` if `bytes` is exactly one well-formed frame. The checksum is
/// not verified.
pub fn is_framed(bytes: &[u8]) -> bool {
    let Some(mut data) = bytes.strip_prefix(&START_MARKER) else {
        return false;
    };

    matches!(unstuff(&mut data), Ok((_, true))) && data.is_empty()
}

/// Reads stuffed bytes up to and including the end marker.
///
/// Returns the unstuffed body and whether the end marker was found. Running
/// out of input before the end marker is not an error.
fn unstuff(data: &mut &[u8]) -> Result<(Vec<u8>, bool), DecodeError> {
    let mut body = Vec::with_capacity(data.len());

    while let Some((&byte, rest)) = data.split_first() {
        if byte != DLE {
            body.push(byte);
            *data = rest;
            continue;
        }

        match rest.first() {
            Some(&DLE) => body.push(DLE),
            Some(&ETX) => {
                *data = &rest[1..];
                return Ok((body, true));
            }
            Some(_) => {
                return Err(DecodeError::new::<Packet<()>>(
                    DecodeErrorKind::InvalidEscape,
                ));
            }
            None => {
                return Err(DecodeError::new::<Packet<()>>(
                    DecodeErrorKind::UnexpectedEnd,
                ));
            }
        }
        *data = &rest[1..];
    }

    Ok((body, false))
}

/// Verifies the trailing checksum of `body` and returns the message before it.
fn strip_checksum<T>(body: &[u8]) -> Result<&[u8], DecodeError> {
    let split = body
        .len()
        .checked_sub(CHECKSUM_SIZE)
        .ok_or_else(|| DecodeError::new::<T>(DecodeErrorKind::UnexpectedEnd))?;
    let (message, found) = body.split_at(split);
    let found = [found[0], found[1]];

    if !verify(message, found) {
        return Err(DecodeError::new::<T>(DecodeErrorKind::ChecksumMismatch {
            found,
            expected: checksum(message),
        }));
    }

    Ok(message)
}

/// Determines how a display would interpret an arbitrary sequence of bytes.
///
/// Unlike [`Packet::decode`], either framing marker may be missing, as happens
/// with captures that start or end part-way through a packet:
///
/// - If the start or the end marker is present, the bytes are unstuffed and
///   must end with a valid checksum.
/// - Otherwise the bytes are unstuffed, and if they end with a valid checksum
///   it is stripped. Bytes that cannot be unstuffed, or that fail the checksum
///   but read as a complete bare message (such as `01 50 6F`), are read as a
///   bare message.
///
/// A failed checksum is never ignored: input that starts like a message but
/// only reads as one by keeping the checksum bytes, or by taking them as an
/// oversized response payload, fails with the mismatch.
///
/// # Errors
///
/// Returns a [`DecodeError`] with [`DecodeErrorKind::ChecksumMismatch`] if a
/// packet fails its checksum, or another kind if the bytes cannot be
/// understood.
pub fn inspect(bytes: &[u8]) -> Result<Message, DecodeError> {
    let started = bytes.starts_with(&START_MARKER);

    if started || bytes.ends_with(&END_MARKER) {
        let mut data = if started {
            &bytes[START_MARKER.len()..]
        } else {
            bytes
        };

        let (body, _) = unstuff(&mut data)?;
        if !data.is_empty() {
            return Err(DecodeError::new::<Message>(DecodeErrorKind::TrailingData));
        }

        return Message::decode_exact(strip_checksum::<Message>(&body)?);
    }

    let mut data = bytes;
    let body = match unstuff(&mut data) {
        Ok((body, false)) => body,
        // Lone DLE bytes, so these were never stuffed.
        _ => return Message::decode_exact(bytes),
    };

    let mismatch = match strip_checksum::<Message>(&body) {
        Ok(message) => return Message::decode_exact(message),
        Err(error) => error,
    };

    // Without markers, the address byte is all that identifies a message.
    if body.first() != Some(&ADDRESS) {
        return Message::decode_exact(bytes);
    }

    match Message::decode_exact(bytes) {
        Ok(Message::Response(response))
            if response.payload.len() > ACKNOWLEDGEMENT_PAYLOAD_SIZE =>
        {
            Err(mismatch)
        }
        Ok(message) => Ok(message),
        Err(_) => Err(mismatch),
    }
}
