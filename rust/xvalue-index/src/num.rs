//! Compressed number codec used by the list file, and the fixed-width offsets
//! stored in the reference file.
//!
//! A compressed number carries its width in the two high bits of the first byte:
//!
//! | tag  | width   | range                  |
//! |------|---------|------------------------|
//! | `00` | 1 byte  | `0..=0x3F`             |
//! | `01` | 2 bytes | `0x40..=0x3FFF`        |
//! | `10` | 4 bytes | `0x4000..=0x3FFF_FFFF` |
//! | `11` | 5 bytes | any `u32`              |
//!
//! Payload bytes are big-endian. Offsets are 40-bit big-endian unsigned integers.

use xvalue_common::{Result, error::Error};

/// Width of a reference file slot.
pub const OFFSET_LEN: usize = 5;

/// Largest encodable offset.
pub const MAX_OFFSET: u64 = (1 << 40) - 1;

/// Longest possible compressed number.
pub const MAX_NUM_LEN: usize = 5;

/// Returns the number of bytes `value` occupies when compressed.
#[inline]
pub fn encoded_len(value: u32) -> usize {
    if value > 0x3FFF_FFFF {
        5
    } else if value > 0x3FFF {
        4
    } else if value > 0x3F {
        2
    } else {
        1
    }
}

/// Appends the compressed form of `value` to `buf`.
pub fn encode(value: u32, buf: &mut Vec<u8>) {
    match encoded_len(value) {
        1 => buf.push(value as u8),
        2 => buf.extend_from_slice(&(value as u16 | 0x4000).to_be_bytes()),
        4 => buf.extend_from_slice(&(value | 0x8000_0000).to_be_bytes()),
        _ => {
            buf.push(0xC0);
            buf.extend_from_slice(&value.to_be_bytes());
        }
    }
}

/// Decodes a compressed number from the start of `bytes`.
///
/// Returns the value together with the number of bytes consumed.
pub fn decode(bytes: &[u8]) -> Result<(u32, usize)> {
    let Some(&first) = bytes.first() else {
        return Err(truncated(0, 1));
    };
    let len = match first & 0xC0 {
        0x00 => return Ok((first as u32, 1)),
        0x40 => 2,
        0x80 => 4,
        _ => 5,
    };
    if bytes.len() < len {
        return Err(truncated(bytes.len(), len));
    }
    let value = match len {
        2 => ((first & 0x3F) as u32) << 8 | bytes[1] as u32,
        4 => u32::from_be_bytes([first & 0x3F, bytes[1], bytes[2], bytes[3]]),
        _ => u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]),
    };
    Ok((value, len))
}

/// Appends a 5-byte offset to `buf`.
pub fn encode_offset(offset: u64, buf: &mut Vec<u8>) -> Result<()> {
    if offset > MAX_OFFSET {
        return Err(Error::invalid_arg(
            "offset",
            format!("{offset} exceeds 40-bit range"),
        ));
    }
    buf.extend_from_slice(&offset.to_be_bytes()[3..]);
    Ok(())
}

/// Decodes a 5-byte offset from the start of `bytes`.
pub fn decode_offset(bytes: &[u8]) -> Result<u64> {
    if bytes.len() < OFFSET_LEN {
        return Err(truncated(bytes.len(), OFFSET_LEN));
    }
    Ok(bytes[..OFFSET_LEN]
        .iter()
        .fold(0u64, |acc, &b| acc << 8 | b as u64))
}

#[cold]
fn truncated(available: usize, needed: usize) -> Error {
    Error::corrupted(
        "compressed number",
        format!("needs {needed} bytes, {available} available"),
    )
}
