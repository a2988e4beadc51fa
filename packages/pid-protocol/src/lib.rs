//! Implementation of the serial protocol spoken by LED passenger information
//! displays in Rust.
//!
//! Text is written in a small page language (`V40^FIRST LINE_SECOND~RIGHT|H0^NEXT PAGE`),
//! parsed into [`DisplayMessage`]s, and sent to the display as checksummed,
//! DLE/STX/ETX-framed [`Packet`]s.

#![no_std]

extern crate alloc;

mod crc;
mod decode;
mod encode;
mod frame;
mod message;
mod page;
pub mod text;

pub use crc::{CHECKSUM_SIZE, PID_CRC16, checksum, verify};
pub use decode::{Decode, DecodeError, DecodeErrorKind};
pub use encode::{Encode, EncodeError, MessageEncoder};
pub use frame::{DLE, END_MARKER, ETX, Packet, START_MARKER, STX, frame, inspect, is_framed};
pub use message::{
    ADDRESS, DisplayMessage, Message, PAGE_SEPARATOR, PingMessage, ResponseMessage, kinds,
};
pub use page::{
    ATTRIBUTES_SEPARATOR, Animation, LINE_SEPARATOR, Line, PAGE_TERMINATOR, Page,
    RIGHT_ALIGN_MARKER,
};
