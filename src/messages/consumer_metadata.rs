//! Consumer metadata (coordinator lookup) request and response codec.

use std::io::Read;

use bytes::BufMut;
use nom::number::complete::be_i32;
use nombytes::NomBytes;

use crate::constants::MAX_FRAME_SIZE;
use crate::encode::ToByte;
use crate::error::{KafkaCode, Result};
use crate::frame::read_frame;
use crate::parser::{bytes_to_string, parse_string};

use super::{
    ApiKey, Request, Response, parse_correlation_id, parse_kafka_code, parse_request_header,
};

/// Request for the broker coordinating the given consumer group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsumerMetadataReq {
    pub correlation_id: i32,
    pub client_id: String,
    pub consumer_group: String,
}

impl Request for ConsumerMetadataReq {
    const API_KEY: ApiKey = ApiKey::ConsumerMetadata;

    fn correlation_id(&self) -> i32 {
        self.correlation_id
    }

    fn client_id(&self) -> &str {
        &self.client_id
    }

    fn encode_body<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.consumer_group.encode(buffer)
    }
}

/// Reconstruct a [`ConsumerMetadataReq`] from its framed wire form.
pub fn read_consumer_metadata_req<R: Read>(source: &mut R) -> Result<ConsumerMetadataReq> {
    let body = read_frame(source, MAX_FRAME_SIZE)?;
    let (s, header) = parse_request_header(NomBytes::new(body))?;
    let (_, consumer_group) = parse_string(s)?;

    Ok(ConsumerMetadataReq {
        correlation_id: header.correlation_id,
        client_id: header.client_id,
        consumer_group: bytes_to_string(&consumer_group)?,
    })
}

/// The coordinator broker for a consumer group, or an in-band error with
/// an invalid coordinator id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsumerMetadataResp {
    pub correlation_id: i32,
    pub err: Option<KafkaCode>,
    pub coordinator_id: i32,
    pub coordinator_host: String,
    pub coordinator_port: i32,
}

impl Response for ConsumerMetadataResp {
    fn correlation_id(&self) -> i32 {
        self.correlation_id
    }

    fn encode_body<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        KafkaCode::to_wire(self.err).encode(buffer)?;
        self.coordinator_id.encode(buffer)?;
        self.coordinator_host.encode(buffer)?;
        self.coordinator_port.encode(buffer)?;
        Ok(())
    }
}

/// Reconstruct a [`ConsumerMetadataResp`] from its framed wire form.
pub fn read_consumer_metadata_resp<R: Read>(source: &mut R) -> Result<ConsumerMetadataResp> {
    let body = read_frame(source, MAX_FRAME_SIZE)?;
    let (s, correlation_id) = parse_correlation_id(NomBytes::new(body))?;
    let (s, err) = parse_kafka_code(s)?;
    let (s, coordinator_id) = be_i32(s)?;
    let (s, coordinator_host) = parse_string(s)?;
    let (_, coordinator_port) = be_i32(s)?;

    Ok(ConsumerMetadataResp {
        correlation_id,
        err,
        coordinator_id,
        coordinator_host: bytes_to_string(&coordinator_host)?,
        coordinator_port,
    })
}
