//! The length-prefixed frame envelope.
//!
//! Every request and response travels as a 4-byte big-endian length followed
//! by exactly that many body bytes; the length does not include itself.
//! Writing serializes the body to a scratch buffer first and prefixes the
//! final length, so no seekable sink is required. Reading enforces a caller
//! supplied ceiling before any body byte is consumed.

use std::io::{self, Read};

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};

/// Prefix a fully serialized body with its i32 length.
pub fn frame_body(body: &[u8]) -> Bytes {
    let mut framed = BytesMut::with_capacity(4 + body.len());
    framed.put_i32(body.len() as i32);
    framed.put_slice(body);
    framed.freeze()
}

/// Read one frame from `source`: the i32 length, then exactly that many
/// body bytes. The returned `Bytes` is the body without the prefix.
pub fn read_frame<R: Read>(source: &mut R, limit: i32) -> Result<Bytes> {
    let mut prefix = [0u8; 4];
    read_exact(source, &mut prefix)?;

    let declared = i32::from_be_bytes(prefix);
    if declared < 0 {
        return Err(Error::NegativeLength);
    }
    if declared > limit {
        return Err(Error::OversizedFrame { declared, limit });
    }

    let mut body = vec![0u8; declared as usize];
    read_exact(source, &mut body)?;
    Ok(Bytes::from(body))
}

fn read_exact<R: Read>(source: &mut R, buf: &mut [u8]) -> Result<()> {
    source.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => Error::UnexpectedEnd,
        kind => Error::SourceReadFailed(kind),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MAX_FRAME_SIZE;

    #[test]
    fn test_frame_body_prefixes_length() {
        let framed = frame_body(b"hello");
        assert_eq!(&framed[..], &[0, 0, 0, 5, b'h', b'e', b'l', b'l', b'o']);
    }

    #[test]
    fn test_frame_empty_body() {
        let framed = frame_body(&[]);
        assert_eq!(&framed[..], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_read_frame_roundtrip() {
        let framed = frame_body(b"payload");
        let mut source = &framed[..];
        let body = read_frame(&mut source, MAX_FRAME_SIZE).unwrap();
        assert_eq!(&body[..], b"payload");
        assert!(source.is_empty());
    }

    #[test]
    fn test_read_frame_truncated_prefix() {
        let mut source: &[u8] = &[0, 0];
        assert_eq!(
            read_frame(&mut source, MAX_FRAME_SIZE),
            Err(Error::UnexpectedEnd)
        );
    }

    #[test]
    fn test_read_frame_truncated_body() {
        let mut source: &[u8] = &[0, 0, 0, 10, 1, 2, 3];
        assert_eq!(
            read_frame(&mut source, MAX_FRAME_SIZE),
            Err(Error::UnexpectedEnd)
        );
    }

    #[test]
    fn test_read_frame_negative_length() {
        let mut source: &[u8] = &(-1i32).to_be_bytes();
        assert_eq!(
            read_frame(&mut source, MAX_FRAME_SIZE),
            Err(Error::NegativeLength)
        );
    }

    #[test]
    fn test_read_frame_over_limit() {
        let mut data = Vec::new();
        data.extend_from_slice(&100i32.to_be_bytes());
        data.extend_from_slice(&[0u8; 100]);

        let mut source = &data[..];
        assert_eq!(
            read_frame(&mut source, 64),
            Err(Error::OversizedFrame {
                declared: 100,
                limit: 64
            })
        );
    }

    #[test]
    fn test_read_frame_at_exact_limit() {
        let framed = frame_body(&[0xAB; 64]);
        let mut source = &framed[..];
        let body = read_frame(&mut source, 64).unwrap();
        assert_eq!(body.len(), 64);
    }
}
