use crc::Crc;

/// [CRC16 error-detecting algorithm](https://en.wikipedia.org/wiki/Cyclic_redundancy_check)
/// used to check every framed packet (CRC-16/X.25).
pub const PID_CRC16: Crc<u16> = Crc::<u16>::new(&crc::CRC_16_IBM_SDLC);

/// Number of checksum bytes trailing every framed message.
pub const CHECKSUM_SIZE: usize = 2;

/// Computes the checksum of `data` in the byte order the display expects.
pub fn checksum(data: &[u8]) -> [u8; CHECKSUM_SIZE] {
    PID_CRC16.checksum(data).to_le_bytes()
}

/// Returns `true` if `expected` is the checksum of `data`.
pub fn verify(data: &[u8], expected: [u8; CHECKSUM_SIZE]) -> bool {
    checksum(data) == expected
}
