//! Produce request and response codec.

use std::io::Read;

use bytes::BufMut;
use nom::{
    IResult,
    number::complete::{be_i16, be_i32, be_i64},
};
use nombytes::NomBytes;

use crate::constants::MAX_FRAME_SIZE;
use crate::encode::{ToByte, encode_array};
use crate::error::{KafkaCode, Result};
use crate::frame::read_frame;
use crate::parser::{bytes_to_string, parse_array, parse_string};

use super::message_set::{Message, encode_message_set, parse_message_set};
use super::{
    ApiKey, Request, Response, parse_correlation_id, parse_kafka_code, parse_request_header,
};

/// Request to append messages to the partitions it names.
///
/// `required_acks` uses the sentinels from [`crate::constants`]:
/// [-1](crate::constants::REQUIRED_ACKS_ALL) waits for every in-sync
/// replica, 1 for the leader only, 0 for no acknowledgement at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProduceReq {
    pub correlation_id: i32,
    pub client_id: String,
    pub required_acks: i16,
    pub timeout_ms: i32,
    pub topics: Vec<ProduceReqTopic>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProduceReqTopic {
    pub name: String,
    pub partitions: Vec<ProduceReqPartition>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProduceReqPartition {
    pub id: i32,
    pub messages: Vec<Message>,
}

impl Request for ProduceReq {
    const API_KEY: ApiKey = ApiKey::Produce;

    fn correlation_id(&self) -> i32 {
        self.correlation_id
    }

    fn client_id(&self) -> &str {
        &self.client_id
    }

    fn encode_body<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.required_acks.encode(buffer)?;
        self.timeout_ms.encode(buffer)?;
        encode_array(buffer, &self.topics)?;
        Ok(())
    }
}

impl ToByte for ProduceReqTopic {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.name.encode(buffer)?;
        encode_array(buffer, &self.partitions)?;
        Ok(())
    }
}

impl ToByte for ProduceReqPartition {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.id.encode(buffer)?;
        encode_message_set(&self.messages, buffer)?;
        Ok(())
    }
}

/// Reconstruct a [`ProduceReq`] from its framed wire form.
pub fn read_produce_req<R: Read>(source: &mut R) -> Result<ProduceReq> {
    let body = read_frame(source, MAX_FRAME_SIZE)?;
    let (s, header) = parse_request_header(NomBytes::new(body))?;
    let (s, required_acks) = be_i16(s)?;
    let (s, timeout_ms) = be_i32(s)?;
    let (_, topics) = parse_array(parse_req_topic)(s)?;

    Ok(ProduceReq {
        correlation_id: header.correlation_id,
        client_id: header.client_id,
        required_acks,
        timeout_ms,
        topics,
    })
}

fn parse_req_topic(s: NomBytes) -> IResult<NomBytes, ProduceReqTopic> {
    let (s, name) = parse_string(s)?;
    let (s, partitions) = parse_array(parse_req_partition)(s)?;

    Ok((
        s,
        ProduceReqTopic {
            name: bytes_to_string(&name)?,
            partitions,
        },
    ))
}

fn parse_req_partition(s: NomBytes) -> IResult<NomBytes, ProduceReqPartition> {
    let (s, id) = be_i32(s)?;
    let (s, messages) = parse_message_set(s)?;

    Ok((s, ProduceReqPartition { id, messages }))
}

/// Per-partition append outcome: the assigned base offset, or an in-band
/// error with offset -1.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProduceResp {
    pub correlation_id: i32,
    pub topics: Vec<ProduceRespTopic>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProduceRespTopic {
    pub name: String,
    pub partitions: Vec<ProduceRespPartition>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProduceRespPartition {
    pub id: i32,
    pub err: Option<KafkaCode>,
    pub offset: i64,
}

impl Response for ProduceResp {
    fn correlation_id(&self) -> i32 {
        self.correlation_id
    }

    fn encode_body<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        encode_array(buffer, &self.topics)
    }
}

impl ToByte for ProduceRespTopic {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.name.encode(buffer)?;
        encode_array(buffer, &self.partitions)?;
        Ok(())
    }
}

impl ToByte for ProduceRespPartition {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.id.encode(buffer)?;
        KafkaCode::to_wire(self.err).encode(buffer)?;
        self.offset.encode(buffer)?;
        Ok(())
    }
}

/// Reconstruct a [`ProduceResp`] from its framed wire form.
pub fn read_produce_resp<R: Read>(source: &mut R) -> Result<ProduceResp> {
    let body = read_frame(source, MAX_FRAME_SIZE)?;
    let (s, correlation_id) = parse_correlation_id(NomBytes::new(body))?;
    let (_, topics) = parse_array(parse_resp_topic)(s)?;

    Ok(ProduceResp {
        correlation_id,
        topics,
    })
}

fn parse_resp_topic(s: NomBytes) -> IResult<NomBytes, ProduceRespTopic> {
    let (s, name) = parse_string(s)?;
    let (s, partitions) = parse_array(parse_resp_partition)(s)?;

    Ok((
        s,
        ProduceRespTopic {
            name: bytes_to_string(&name)?,
            partitions,
        },
    ))
}

fn parse_resp_partition(s: NomBytes) -> IResult<NomBytes, ProduceRespPartition> {
    let (s, id) = be_i32(s)?;
    let (s, err) = parse_kafka_code(s)?;
    let (s, offset) = be_i64(s)?;

    Ok((s, ProduceRespPartition { id, err, offset }))
}
