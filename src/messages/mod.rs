//! Request and response codecs, one module per API family.
//!
//! Every request kind implements [`Request`]: the shared framed header
//! (api key, api version, correlation id, client id) followed by a
//! kind-specific body. Every response kind implements [`Response`]: the
//! frame, the echoed correlation id, then the body. Both traits derive
//! `to_bytes` and `write_to` from a single `encode_body`, so the two entry
//! points are byte-identical by construction. The matching `read_*` free
//! functions live in the per-kind modules.

mod consumer_metadata;
mod fetch;
mod message_set;
mod metadata;
mod offsets;
mod produce;

use std::io::Write;

use bytes::{BufMut, Bytes, BytesMut};
use nom::{
    IResult,
    number::complete::{be_i16, be_i32},
};
use nombytes::NomBytes;

use crate::encode::ToByte;
use crate::error::{Error, Result};
use crate::frame;
use crate::parser::{bytes_to_string, parse_string};

pub use consumer_metadata::*;
pub use fetch::*;
pub use message_set::*;
pub use metadata::*;
pub use offsets::*;
pub use produce::*;

/// The only header version this codec speaks.
pub const API_VERSION: i16 = 0;

/// API keys for the request kinds this codec speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKey {
    Produce,
    Fetch,
    Offset,
    Metadata,
    OffsetCommit,
    OffsetFetch,
    ConsumerMetadata,
    Unknown(i16),
}

impl From<i16> for ApiKey {
    fn from(value: i16) -> Self {
        match value {
            0 => ApiKey::Produce,
            1 => ApiKey::Fetch,
            2 => ApiKey::Offset,
            3 => ApiKey::Metadata,
            8 => ApiKey::OffsetCommit,
            9 => ApiKey::OffsetFetch,
            10 => ApiKey::ConsumerMetadata,
            n => ApiKey::Unknown(n),
        }
    }
}

impl From<ApiKey> for i16 {
    fn from(key: ApiKey) -> Self {
        match key {
            ApiKey::Produce => 0,
            ApiKey::Fetch => 1,
            ApiKey::Offset => 2,
            ApiKey::Metadata => 3,
            ApiKey::OffsetCommit => 8,
            ApiKey::OffsetFetch => 9,
            ApiKey::ConsumerMetadata => 10,
            ApiKey::Unknown(n) => n,
        }
    }
}

/// Header common to every request, in wire order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHeader {
    pub api_key: ApiKey,
    pub api_version: i16,
    pub correlation_id: i32,
    pub client_id: String,
}

impl ToByte for RequestHeader {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        i16::from(self.api_key).encode(buffer)?;
        self.api_version.encode(buffer)?;
        self.correlation_id.encode(buffer)?;
        self.client_id.encode(buffer)?;
        Ok(())
    }
}

pub fn parse_request_header(s: NomBytes) -> IResult<NomBytes, RequestHeader> {
    let (s, api_key) = be_i16(s)?;
    let (s, api_version) = be_i16(s)?;
    let (s, correlation_id) = be_i32(s)?;
    let (s, client_id) = parse_string(s)?;

    Ok((
        s,
        RequestHeader {
            api_key: ApiKey::from(api_key),
            api_version,
            correlation_id,
            client_id: bytes_to_string(&client_id)?,
        },
    ))
}

/// A client-to-broker request that knows how to frame itself.
///
/// `to_bytes` and `write_to` are guaranteed to produce identical bytes for
/// the same value; `write_to` returns the number of bytes written, which
/// equals the `to_bytes` length.
pub trait Request {
    /// API key identifying this request kind on the wire.
    const API_KEY: ApiKey;

    fn correlation_id(&self) -> i32;

    fn client_id(&self) -> &str;

    /// Render the body that follows the shared request header.
    fn encode_body<W: BufMut>(&self, buffer: &mut W) -> Result<()>;

    /// Serialize the complete framed request.
    fn to_bytes(&self) -> Result<Bytes> {
        let mut body = BytesMut::with_capacity(64);
        let header = RequestHeader {
            api_key: Self::API_KEY,
            api_version: API_VERSION,
            correlation_id: self.correlation_id(),
            client_id: self.client_id().to_string(),
        };
        header.encode(&mut body)?;
        self.encode_body(&mut body)?;
        Ok(frame::frame_body(&body))
    }

    /// Serialize the complete framed request into `sink`, returning the
    /// number of bytes written.
    fn write_to<W: Write>(&self, sink: &mut W) -> Result<usize> {
        let bytes = self.to_bytes()?;
        sink.write_all(&bytes)
            .map_err(|e| Error::SinkWriteFailed(e.kind()))?;
        Ok(bytes.len())
    }
}

/// A broker-to-client response that knows how to frame itself.
///
/// Same contract as [`Request`]; the header is the echoed correlation id
/// alone.
pub trait Response {
    fn correlation_id(&self) -> i32;

    /// Render the body that follows the correlation id.
    fn encode_body<W: BufMut>(&self, buffer: &mut W) -> Result<()>;

    /// Serialize the complete framed response.
    fn to_bytes(&self) -> Result<Bytes> {
        let mut body = BytesMut::with_capacity(64);
        self.correlation_id().encode(&mut body)?;
        self.encode_body(&mut body)?;
        Ok(frame::frame_body(&body))
    }

    /// Serialize the complete framed response into `sink`, returning the
    /// number of bytes written.
    fn write_to<W: Write>(&self, sink: &mut W) -> Result<usize> {
        let bytes = self.to_bytes()?;
        sink.write_all(&bytes)
            .map_err(|e| Error::SinkWriteFailed(e.kind()))?;
        Ok(bytes.len())
    }
}

/// Parse the response header, which is the echoed correlation id.
pub(crate) fn parse_correlation_id(s: NomBytes) -> IResult<NomBytes, i32> {
    be_i32(s)
}

/// Parse an in-band broker error code; 0 decodes as `None`.
pub(crate) fn parse_kafka_code(s: NomBytes) -> IResult<NomBytes, Option<crate::error::KafkaCode>> {
    let (s, raw) = be_i16(s)?;
    Ok((s, crate::error::KafkaCode::from_wire(raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_from_i16() {
        assert_eq!(ApiKey::from(0), ApiKey::Produce);
        assert_eq!(ApiKey::from(1), ApiKey::Fetch);
        assert_eq!(ApiKey::from(2), ApiKey::Offset);
        assert_eq!(ApiKey::from(3), ApiKey::Metadata);
        assert_eq!(ApiKey::from(8), ApiKey::OffsetCommit);
        assert_eq!(ApiKey::from(9), ApiKey::OffsetFetch);
        assert_eq!(ApiKey::from(10), ApiKey::ConsumerMetadata);
        assert_eq!(ApiKey::from(999), ApiKey::Unknown(999));
    }

    #[test]
    fn test_api_key_roundtrip() {
        for raw in 0..=12 {
            let key = ApiKey::from(raw);
            assert_eq!(i16::from(key), raw);
        }
    }

    #[test]
    fn test_request_header_encode() {
        let header = RequestHeader {
            api_key: ApiKey::Metadata,
            api_version: 0,
            correlation_id: 123,
            client_id: "testcli".to_string(),
        };
        let mut buf = Vec::new();
        header.encode(&mut buf).unwrap();

        let expected = [
            0x00, 0x03, // api_key = Metadata
            0x00, 0x00, // api_version = 0
            0x00, 0x00, 0x00, 0x7B, // correlation_id = 123
            0x00, 0x07, b't', b'e', b's', b't', b'c', b'l', b'i',
        ];
        assert_eq!(buf, expected);
    }

    #[test]
    fn test_parse_request_header() {
        let header = RequestHeader {
            api_key: ApiKey::Fetch,
            api_version: 0,
            correlation_id: -7,
            client_id: "cli".to_string(),
        };
        let mut buf = Vec::new();
        header.encode(&mut buf).unwrap();

        let input = NomBytes::new(Bytes::from(buf));
        let (_, parsed) = parse_request_header(input).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn test_parse_request_header_null_client_id() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&3i16.to_be_bytes());
        buf.extend_from_slice(&0i16.to_be_bytes());
        buf.extend_from_slice(&99i32.to_be_bytes());
        buf.extend_from_slice(&(-1i16).to_be_bytes()); // null client_id

        let input = NomBytes::new(Bytes::from(buf));
        let (_, parsed) = parse_request_header(input).unwrap();
        assert_eq!(parsed.client_id, "");
    }
}
