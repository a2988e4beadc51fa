//! Messages exchanged with a display, before checksumming and framing.

use alloc::vec::Vec;
use core::{fmt, str::FromStr};

use crate::{
    decode::{Decode, DecodeError, DecodeErrorKind, expect_byte},
    encode::{Encode, EncodeError, MessageEncoder},
    page::{Animation, Page},
};

/// Address byte that starts every message.
pub const ADDRESS: u8 = 0x01;

/// Separates pages in message text.
pub const PAGE_SEPARATOR: char = '|';

/// Message type bytes, following [`ADDRESS`].
///
/// Any type byte not listed here is decoded as a [`ResponseMessage`].
pub mod kinds {
    pub const DISPLAY: u8 = 0x44;
    pub const PING: u8 = 0x50;
    pub const ACKNOWLEDGE: u8 = 0x52;
}

/// Joins consecutive pages of a [`DisplayMessage`].
const PAGE_JOINER: u8 = 0x01;

/// Content to show on the display: a sequence of pages shown in order, then
/// repeated from the first page once the last page's delay has elapsed.
///
/// # Encoding
///
/// | Field      | Size | Description |
/// |------------|------|-------------|
/// | `address`  | 1    | [`ADDRESS`]. |
/// | `kind`     | 1    | [`kinds::DISPLAY`]. |
/// | `reserved` | 1    | Always `0x00`. |
/// | `pages`    | n    | Encoded [`Page`]s, each after the first preceded by `0x01`. |
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DisplayMessage {
    pages: Vec<Page>,
}

impl DisplayMessage {
    const HEADER: [u8; 3] = [ADDRESS, kinds::DISPLAY, 0x00];

    /// # Errors
    ///
    /// Returns [`EncodeError::EmptyMessage`] if `pages` is empty.
    pub fn new(pages: Vec<Page>) -> Result<Self, EncodeError> {
        if pages.is_empty() {
            return Err(EncodeError::EmptyMessage);
        }
        Ok(Self { pages })
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }
}

impl FromStr for DisplayMessage {
    type Err = EncodeError;

    /// Parses `|`-separated page text.
    ///
    /// Pages that do not specify an animation or delay scroll vertically
    /// with a delay of 40 if they come first, and scroll horizontally with no
    /// delay otherwise.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let pages = s
            .split(PAGE_SEPARATOR)
            .enumerate()
            .map(|(index, page)| {
                if index == 0 {
                    Page::parse_with_defaults(page, Animation::VerticalScroll, 40)
                } else {
                    Page::parse_with_defaults(page, Animation::HorizontalScroll, 0)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(pages)
    }
}

impl fmt::Display for DisplayMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, page) in self.pages.iter().enumerate() {
            if index > 0 {
                write!(f, "{PAGE_SEPARATOR}")?;
            }
            write!(f, "{page}")?;
        }
        Ok(())
    }
}

impl Encode for DisplayMessage {
    fn size(&self) -> usize {
        Self::HEADER.len()
            + self.pages.iter().map(Encode::size).sum::<usize>()
            + (self.pages.len() - 1)
    }

    fn encode(&self, data: &mut [u8]) {
        let mut enc = MessageEncoder::new(data);
        enc.write(&Self::HEADER);

        for (index, page) in self.pages.iter().enumerate() {
            if index > 0 {
                enc.write(&PAGE_JOINER);
            }
            enc.write(page);
        }
    }
}

impl Decode for DisplayMessage {
    fn decode(data: &mut &[u8]) -> Result<Self, DecodeError> {
        expect_byte::<Self>(data, "address", &[ADDRESS])?;
        expect_byte::<Self>(data, "kind", &[kinds::DISPLAY])?;
        expect_byte::<Self>(data, "reserved", &[0x00])?;

        let mut pages = Vec::new();
        loop {
            pages.push(Page::decode(data)?);
            if data.is_empty() {
                break;
            }
            expect_byte::<Self>(data, "page joiner", &[PAGE_JOINER])?;
        }

        Ok(Self { pages })
    }
}

/// Keep-alive message. It has no visible effect, but stops the display from
/// clearing itself after about a minute without traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PingMessage {
    /// Changing this byte has no observable effect. Deployed systems send `0x6F`.
    pub unspecified_byte: u8,
}

impl PingMessage {
    const HEADER: [u8; 2] = [ADDRESS, kinds::PING];
}

impl Default for PingMessage {
    fn default() -> Self {
        Self {
            unspecified_byte: 0x6F,
        }
    }
}

impl Encode for PingMessage {
    fn size(&self) -> usize {
        Self::HEADER.len() + 1
    }

    fn encode(&self, data: &mut [u8]) {
        let mut enc = MessageEncoder::new(data);
        enc.write(&Self::HEADER);
        enc.write(&self.unspecified_byte);
    }
}

impl Decode for PingMessage {
    fn decode(data: &mut &[u8]) -> Result<Self, DecodeError> {
        expect_byte::<Self>(data, "address", &[ADDRESS])?;
        expect_byte::<Self>(data, "kind", &[kinds::PING])?;

        Ok(Self {
            unspecified_byte: u8::decode(data)?,
        })
    }
}

/// Message sent by the display, typically to acknowledge a transmission.
///
/// The payload is opaque. An acknowledgement ([`kinds::ACKNOWLEDGE`]) usually
/// carries one byte loosely related to the last ping, followed by `0x00`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResponseMessage {
    pub kind: u8,
    pub payload: Vec<u8>,
}

impl ResponseMessage {
    pub fn is_acknowledgement(&self) -> bool {
        self.kind == kinds::ACKNOWLEDGE
    }
}

impl Encode for ResponseMessage {
    fn size(&self) -> usize {
        2 + self.payload.len()
    }

    fn encode(&self, data: &mut [u8]) {
        let mut enc = MessageEncoder::new(data);
        enc.write(&ADDRESS);
        enc.write(&self.kind);
        enc.write(&self.payload);
    }
}

impl Decode for ResponseMessage {
    /// Consumes all remaining input as the payload.
    fn decode(data: &mut &[u8]) -> Result<Self, DecodeError> {
        expect_byte::<Self>(data, "address", &[ADDRESS])?;
        let kind = u8::decode(data)?;
        let payload = data.to_vec();
        *data = &[];

        Ok(Self { kind, payload })
    }
}

/// Any message, selected by its type byte.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Message {
    Display(DisplayMessage),
    Ping(PingMessage),
    Response(ResponseMessage),
}

impl Encode for Message {
    fn size(&self) -> usize {
        match self {
            Self::Display(message) => message.size(),
            Self::Ping(message) => message.size(),
            Self::Response(message) => message.size(),
        }
    }

    fn encode(&self, data: &mut [u8]) {
        match self {
            Self::Display(message) => message.encode(data),
            Self::Ping(message) => message.encode(data),
            Self::Response(message) => message.encode(data),
        }
    }
}

impl Decode for Message {
    fn decode(data: &mut &[u8]) -> Result<Self, DecodeError> {
        match *data {
            [ADDRESS, kinds::DISPLAY, ..] => Ok(Self::Display(DisplayMessage::decode(data)?)),
            [ADDRESS, kinds::PING, ..] => Ok(Self::Ping(PingMessage::decode(data)?)),
            [ADDRESS, _, ..] => Ok(Self::Response(ResponseMessage::decode(data)?)),
            [] | [ADDRESS] => Err(DecodeError::new::<Self>(DecodeErrorKind::UnexpectedEnd)),
            _ => Err(DecodeError::new::<Self>(DecodeErrorKind::InvalidHeader)),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Display(message) => write!(f, "DisplayMessage({message})"),
            Self::Ping(message) => write!(f, "PingMessage({:#04x})", message.unspecified_byte),
            Self::Response(message) => write!(
                f,
                "ResponseMessage({:#04x}, {:02x?})",
                message.kind, message.payload
            ),
        }
    }
}

impl From<DisplayMessage> for Message {
    fn from(message: DisplayMessage) -> Self {
        Self::Display(message)
    }
}

impl From<PingMessage> for Message {
    fn from(message: PingMessage) -> Self {
        Self::Ping(message)
    }
}

impl From<ResponseMessage> for Message {
    fn from(message: ResponseMessage) -> Self {
        Self::Response(message)
    }
}
