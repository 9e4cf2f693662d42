//! Terminated bytes serialization for lexicographically ordered keys.
//!
//! Variable-length byte strings are escaped and terminated with `0x00`:
//!
//! - `0x00` → `0x01 0x01`
//! - `0x01` → `0x01 0x02`
//! - All other bytes unchanged
//! - Terminated with `0x00` delimiter
//!
//! The encoding preserves lexicographic ordering and is prefix-free: the
//! encoding of `a` is never a proper prefix of the encoding of `b`. Composite
//! keys built by concatenating several terminated fields therefore sort field
//! by field, and the encoding of the empty string (`[0x00]`) sorts before
//! every other encoding.

use bytes::{BufMut, Bytes, BytesMut};

use super::DeserializeError;

/// Terminator byte (lowest byte value).
const TERMINATOR_BYTE: u8 = 0x00;

/// Escape character.
const ESCAPE_BYTE: u8 = 0x01;

/// Serializes raw bytes into a freshly allocated buffer.
pub fn serialize_to_bytes(data: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(data.len() + 1);
    serialize(data, &mut buf);
    buf.freeze()
}

/// Serializes raw bytes with escape sequences and `0x00` terminator,
/// appending to `buf`.
pub fn serialize(data: &[u8], buf: &mut BytesMut) {
    for &byte in data {
        match byte {
            TERMINATOR_BYTE => {
                buf.put_u8(ESCAPE_BYTE);
                buf.put_u8(0x01);
            }
            ESCAPE_BYTE => {
                buf.put_u8(ESCAPE_BYTE);
                buf.put_u8(0x02);
            }
            _ => buf.put_u8(byte),
        }
    }
    buf.put_u8(TERMINATOR_BYTE);
}

/// Deserializes one terminated field, advancing `buf` past its terminator.
///
/// # Errors
///
/// Returns an error on a truncated or invalid escape sequence, or when the
/// terminator is missing.
pub fn deserialize(buf: &mut &[u8]) -> Result<Bytes, DeserializeError> {
    let mut result = BytesMut::new();
    let mut i = 0;

    while i < buf.len() {
        let byte = buf[i];

        if byte == TERMINATOR_BYTE {
            *buf = &buf[i + 1..];
            return Ok(result.freeze());
        }

        if byte == ESCAPE_BYTE {
            let Some(&next) = buf.get(i + 1) else {
                return Err(DeserializeError {
                    message: "truncated escape sequence in terminated bytes".to_string(),
                });
            };
            match next {
                0x01 => result.put_u8(TERMINATOR_BYTE),
                0x02 => result.put_u8(ESCAPE_BYTE),
                _ => {
                    return Err(DeserializeError {
                        message: format!("invalid escape sequence: 0x01 0x{:02x}", next),
                    });
                }
            }
            i += 2;
        } else {
            result.put_u8(byte);
            i += 1;
        }
    }

    Err(DeserializeError {
        message: "unterminated bytes sequence (missing 0x00 terminator)".to_string(),
    })
}
