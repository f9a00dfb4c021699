//! The MessageSet format carried inside produce requests and fetch
//! responses.
//!
//! A MessageSet on the wire is an i32 byte size followed by messages laid
//! back to back with no outer per-message framing:
//!
//! ```text
//! offset: i64 | message_size: i32 | crc: u32 | magic: i8 | attributes: i8
//!             | key: bytes | value: bytes
//! ```
//!
//! The CRC is IEEE CRC-32 over the bytes from `magic` through the end of
//! `value`. Brokers may cut the final message of a fetched set short when it
//! would exceed the client's `max_bytes`; the decoder silently discards such
//! a partial tail and returns the complete messages before it.

use bytes::{BufMut, Bytes};
use crc32fast::Hasher as Crc32;
use nom::{
    IResult,
    bytes::complete::take,
    number::complete::{be_i8, be_i32, be_i64, be_u32},
};
use nombytes::NomBytes;

use crate::constants::{MESSAGE_ATTRIBUTES, MESSAGE_HEADER_SIZE, MESSAGE_MAGIC};
use crate::encode::ToByte;
use crate::error::{Error, Result};
use crate::parser::parse_bytes;

/// A single message within a MessageSet.
///
/// `key` and `value` are nullable on the wire and null is distinct from
/// empty. `topic` and `partition` are never serialized: the fetch response
/// decoder fills them in from the enclosing blocks, and encoders ignore
/// them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    pub offset: i64,
    /// CRC stored on the wire. The decoder preserves what it read; the
    /// encoder always writes a freshly computed value.
    pub crc: u32,
    pub key: Option<Bytes>,
    pub value: Option<Bytes>,
    pub topic: String,
    pub partition: i32,
}

impl Message {
    /// The magic/attributes/key/value region the CRC covers, re-serialized.
    fn crc_region(&self) -> Vec<u8> {
        let key_len = self.key.as_ref().map_or(0, |k| k.len());
        let value_len = self.value.as_ref().map_or(0, |v| v.len());
        let mut region = Vec::with_capacity(10 + key_len + value_len);

        region.put_i8(MESSAGE_MAGIC);
        region.put_i8(MESSAGE_ATTRIBUTES);
        match &self.key {
            Some(k) => {
                region.put_i32(k.len() as i32);
                region.put_slice(k);
            }
            None => region.put_i32(-1),
        }
        match &self.value {
            Some(v) => {
                region.put_i32(v.len() as i32);
                region.put_slice(v);
            }
            None => region.put_i32(-1),
        }
        region
    }

    /// IEEE CRC-32 of the re-serialized CRC-covered region.
    pub fn compute_crc(&self) -> u32 {
        crc32(&self.crc_region())
    }
}

impl ToByte for Message {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        let region = self.crc_region();
        self.offset.encode(buffer)?;
        ((4 + region.len()) as i32).encode(buffer)?;
        crc32(&region).encode(buffer)?;
        buffer.put_slice(&region);
        Ok(())
    }
}

fn crc32(data: &[u8]) -> u32 {
    let mut hasher = Crc32::new();
    hasher.update(data);
    hasher.finalize()
}

/// How the decoder treats a stored CRC that does not match the message
/// contents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CrcMode {
    /// Keep the message and the stored CRC; log the mismatch.
    #[default]
    Lenient,
    /// Fail the decode with [`Error::InvalidCrc`].
    Strict,
}

/// Encode `messages` as a size-prefixed MessageSet. An empty slice encodes
/// as exactly four zero bytes.
pub fn encode_message_set<W: BufMut>(messages: &[Message], buffer: &mut W) -> Result<()> {
    let mut body = Vec::new();
    for message in messages {
        message.encode(&mut body)?;
    }
    (body.len() as i32).encode(buffer)?;
    buffer.put_slice(&body);
    Ok(())
}

/// Decode a size-prefixed MessageSet from `data`.
pub fn read_message_set(data: Bytes, mode: CrcMode) -> Result<Vec<Message>> {
    let (_, messages) = parse_message_set(NomBytes::new(data))?;
    if mode == CrcMode::Strict {
        validate_crcs(&messages)?;
    }
    Ok(messages)
}

/// Check every message's stored CRC against its contents.
pub fn validate_crcs(messages: &[Message]) -> Result<()> {
    for message in messages {
        let computed = message.compute_crc();
        if computed != message.crc {
            return Err(Error::InvalidCrc {
                stored: message.crc,
                computed,
            });
        }
    }
    Ok(())
}

/// Parse a size-prefixed MessageSet, tolerating a truncated final message.
///
/// The declared size may exceed the bytes actually present (brokers truncate
/// whole responses too); whatever is available up to the declared size is
/// parsed.
pub fn parse_message_set(s: NomBytes) -> IResult<NomBytes, Vec<Message>> {
    let (s, declared) = be_i32(s)?;
    if declared < 0 {
        return Err(nom::Err::Failure(nom::error::Error::new(
            s,
            nom::error::ErrorKind::Verify,
        )));
    }

    let available = s.clone().into_bytes().len();
    let (s, set) = take((declared as usize).min(available))(s)?;
    let messages = parse_messages(set.into_bytes())?;
    Ok((s, messages))
}

fn parse_messages(set: Bytes) -> std::result::Result<Vec<Message>, nom::Err<nom::error::Error<NomBytes>>> {
    let mut messages = Vec::new();
    let mut remaining = set;

    while remaining.len() >= MESSAGE_HEADER_SIZE {
        let s = NomBytes::new(remaining.clone());
        let (s, offset) = be_i64(s)?;
        let (s, size) = be_i32(s)?;
        if size < 0 {
            return Err(nom::Err::Failure(nom::error::Error::new(
                s,
                nom::error::ErrorKind::Verify,
            )));
        }
        if size as usize > remaining.len() - MESSAGE_HEADER_SIZE {
            // The broker cut the final message short; drop it.
            tracing::trace!(
                declared = size,
                available = remaining.len() - MESSAGE_HEADER_SIZE,
                "discarding truncated trailing message"
            );
            return Ok(messages);
        }

        let (s, content) = take(size as usize)(s)?;
        let c = NomBytes::new(content.into_bytes());
        let (c, crc) = be_u32(c)?;
        let (c, _magic) = be_i8(c)?;
        let (c, _attributes) = be_i8(c)?;
        let (c, key) = parse_bytes(c)?;
        let (_, value) = parse_bytes(c)?;

        let message = Message {
            offset,
            crc,
            key,
            value,
            ..Message::default()
        };
        let computed = message.compute_crc();
        if computed != crc {
            tracing::warn!(
                stored_crc = format!("{:#x}", crc),
                computed_crc = format!("{:#x}", computed),
                offset,
                "message crc mismatch"
            );
        }
        messages.push(message);
        remaining = s.into_bytes();
    }

    if !remaining.is_empty() {
        tracing::trace!(
            left = remaining.len(),
            "discarding truncated trailing message header"
        );
    }
    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(offset: i64, key: Option<&[u8]>, value: Option<&[u8]>) -> Message {
        Message {
            offset,
            crc: 0,
            key: key.map(Bytes::copy_from_slice),
            value: value.map(Bytes::copy_from_slice),
            ..Message::default()
        }
    }

    #[test]
    fn test_empty_message_set_is_four_zero_bytes() {
        let mut buf = Vec::new();
        encode_message_set(&[], &mut buf).unwrap();
        assert_eq!(buf, vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_known_crc_value() {
        let msg = message(0, Some(b"foo"), Some(b"bar"));
        assert_eq!(msg.compute_crc(), 0xB8BA5F57);
    }

    #[test]
    fn test_single_message_wire_layout() {
        let mut buf = Vec::new();
        encode_message_set(&[message(0, Some(b"foo"), Some(b"bar"))], &mut buf).unwrap();

        let expected = [
            0x00, 0x00, 0x00, 0x20, // set byte size = 32
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // offset = 0
            0x00, 0x00, 0x00, 0x14, // message size = 20
            0xB8, 0xBA, 0x5F, 0x57, // crc
            0x00, // magic
            0x00, // attributes
            0x00, 0x00, 0x00, 0x03, b'f', b'o', b'o', // key
            0x00, 0x00, 0x00, 0x03, b'b', b'a', b'r', // value
        ];
        assert_eq!(buf, expected);
    }

    #[test]
    fn test_encoder_writes_computed_crc() {
        // A bogus stored crc must not leak onto the wire.
        let mut msg = message(0, Some(b"foo"), Some(b"bar"));
        msg.crc = 0xDEADBEEF;

        let mut buf = Vec::new();
        encode_message_set(&[msg], &mut buf).unwrap();
        assert_eq!(&buf[16..20], &[0xB8, 0xBA, 0x5F, 0x57]);
    }

    #[test]
    fn test_message_set_roundtrip() {
        let mut original = vec![
            message(5, Some(b"k1"), Some(b"v1")),
            message(6, None, Some(b"v2")),
            message(7, Some(b""), None),
        ];

        let mut buf = Vec::new();
        encode_message_set(&original, &mut buf).unwrap();

        // The decoder reports what the encoder computed.
        for msg in &mut original {
            msg.crc = msg.compute_crc();
        }

        let decoded = read_message_set(Bytes::from(buf), CrcMode::Strict).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_null_and_empty_key_are_distinct() {
        let null_key = message(0, None, Some(b"v"));
        let empty_key = message(0, Some(b""), Some(b"v"));

        let mut null_buf = Vec::new();
        let mut empty_buf = Vec::new();
        encode_message_set(&[null_key], &mut null_buf).unwrap();
        encode_message_set(&[empty_key], &mut empty_buf).unwrap();
        assert_ne!(null_buf, empty_buf);

        let decoded_null = read_message_set(Bytes::from(null_buf), CrcMode::Lenient).unwrap();
        let decoded_empty = read_message_set(Bytes::from(empty_buf), CrcMode::Lenient).unwrap();
        assert_eq!(decoded_null[0].key, None);
        assert_eq!(decoded_empty[0].key, Some(Bytes::new()));
    }

    #[test]
    fn test_truncated_tail_is_discarded() {
        let messages = vec![
            message(0, None, Some(b"111111111111111")),
            message(1, None, Some(b"222222222222222")),
            message(2, None, Some(b"333333333333333")),
        ];

        let mut buf = Vec::new();
        encode_message_set(&messages, &mut buf).unwrap();

        // Cut off the last bytes the way a broker does.
        buf.truncate(buf.len() - 4);

        let decoded = read_message_set(Bytes::from(buf), CrcMode::Lenient).unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].value.as_deref(), Some(&b"111111111111111"[..]));
        assert_eq!(decoded[1].value.as_deref(), Some(&b"222222222222222"[..]));
    }

    #[test]
    fn test_every_truncation_point_of_last_message() {
        let messages = vec![
            message(0, Some(b"key-a"), Some(b"value-a")),
            message(1, Some(b"key-b"), Some(b"value-b")),
        ];

        let mut buf = Vec::new();
        encode_message_set(&messages, &mut buf).unwrap();
        // offset + size + crc + magic + attributes + key + value
        let last_len: usize = 8 + 4 + 4 + 1 + 1 + (4 + 5) + (4 + 7);

        for cut in 1..last_len {
            let truncated = Bytes::copy_from_slice(&buf[..buf.len() - cut]);
            let decoded = read_message_set(truncated, CrcMode::Lenient).unwrap();
            assert_eq!(decoded.len(), 1, "cut of {} bytes", cut);
            assert_eq!(decoded[0].offset, 0);
        }
    }

    #[test]
    fn test_strict_mode_rejects_tampered_crc() {
        let mut buf = Vec::new();
        encode_message_set(&[message(0, Some(b"foo"), Some(b"bar"))], &mut buf).unwrap();
        buf[17] ^= 0xFF;

        let err = read_message_set(Bytes::from(buf.clone()), CrcMode::Strict).unwrap_err();
        match err {
            Error::InvalidCrc { stored, computed } => {
                assert_ne!(stored, computed);
                assert_eq!(computed, 0xB8BA5F57);
            }
            other => panic!("expected InvalidCrc, got {:?}", other),
        }

        // Lenient mode keeps the message and the stored value.
        let decoded = read_message_set(Bytes::from(buf), CrcMode::Lenient).unwrap();
        assert_eq!(decoded.len(), 1);
        assert_ne!(decoded[0].crc, decoded[0].compute_crc());
    }

    #[test]
    fn test_negative_set_size_is_rejected() {
        let data = Bytes::from((-2i32).to_be_bytes().to_vec());
        assert_eq!(
            read_message_set(data, CrcMode::Lenient),
            Err(Error::NegativeLength)
        );
    }

    #[test]
    fn test_negative_message_size_is_rejected() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&16i32.to_be_bytes()); // set size
        buf.extend_from_slice(&0i64.to_be_bytes()); // offset
        buf.extend_from_slice(&(-3i32).to_be_bytes()); // bad message size
        buf.extend_from_slice(&[0u8; 4]);

        assert_eq!(
            read_message_set(Bytes::from(buf), CrcMode::Lenient),
            Err(Error::NegativeLength)
        );
    }

    #[test]
    fn test_declared_size_beyond_input_is_tolerated() {
        let mut buf = Vec::new();
        encode_message_set(&[message(3, None, Some(b"xyz"))], &mut buf).unwrap();
        // Inflate the declared size without adding bytes.
        buf[..4].copy_from_slice(&1000i32.to_be_bytes());

        let decoded = read_message_set(Bytes::from(buf), CrcMode::Lenient).unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].offset, 3);
    }
}
