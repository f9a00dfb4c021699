//! Fetch request and response codec.

use std::io::Read;

use bytes::BufMut;
use nom::{
    IResult,
    number::complete::{be_i32, be_i64},
};
use nombytes::NomBytes;

use crate::constants::{MAX_FRAME_SIZE, NO_REPLICA_ID};
use crate::encode::{ToByte, encode_array};
use crate::error::{KafkaCode, Result};
use crate::frame::read_frame;
use crate::parser::{bytes_to_string, parse_array, parse_string};

use super::message_set::{CrcMode, Message, encode_message_set, parse_message_set, validate_crcs};
use super::{
    ApiKey, Request, Response, parse_correlation_id, parse_kafka_code, parse_request_header,
};

/// Request to read messages starting at the given offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchReq {
    pub correlation_id: i32,
    pub client_id: String,
    /// Clients always send [`NO_REPLICA_ID`]; real ids are for brokers.
    pub replica_id: i32,
    pub max_wait_ms: i32,
    pub min_bytes: i32,
    pub topics: Vec<FetchReqTopic>,
}

impl Default for FetchReq {
    fn default() -> Self {
        Self {
            correlation_id: 0,
            client_id: String::new(),
            replica_id: NO_REPLICA_ID,
            max_wait_ms: 0,
            min_bytes: 0,
            topics: vec![],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchReqTopic {
    pub name: String,
    pub partitions: Vec<FetchReqPartition>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchReqPartition {
    pub id: i32,
    pub fetch_offset: i64,
    pub max_bytes: i32,
}

impl Request for FetchReq {
    const API_KEY: ApiKey = ApiKey::Fetch;

    fn correlation_id(&self) -> i32 {
        self.correlation_id
    }

    fn client_id(&self) -> &str {
        &self.client_id
    }

    fn encode_body<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.replica_id.encode(buffer)?;
        self.max_wait_ms.encode(buffer)?;
        self.min_bytes.encode(buffer)?;
        encode_array(buffer, &self.topics)?;
        Ok(())
    }
}

impl ToByte for FetchReqTopic {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.name.encode(buffer)?;
        encode_array(buffer, &self.partitions)?;
        Ok(())
    }
}

impl ToByte for FetchReqPartition {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.id.encode(buffer)?;
        self.fetch_offset.encode(buffer)?;
        self.max_bytes.encode(buffer)?;
        Ok(())
    }
}

/// Reconstruct a [`FetchReq`] from its framed wire form.
pub fn read_fetch_req<R: Read>(source: &mut R) -> Result<FetchReq> {
    let body = read_frame(source, MAX_FRAME_SIZE)?;
    let (s, header) = parse_request_header(NomBytes::new(body))?;
    let (s, replica_id) = be_i32(s)?;
    let (s, max_wait_ms) = be_i32(s)?;
    let (s, min_bytes) = be_i32(s)?;
    let (_, topics) = parse_array(parse_req_topic)(s)?;

    Ok(FetchReq {
        correlation_id: header.correlation_id,
        client_id: header.client_id,
        replica_id,
        max_wait_ms,
        min_bytes,
        topics,
    })
}

fn parse_req_topic(s: NomBytes) -> IResult<NomBytes, FetchReqTopic> {
    let (s, name) = parse_string(s)?;
    let (s, partitions) = parse_array(parse_req_partition)(s)?;

    Ok((
        s,
        FetchReqTopic {
            name: bytes_to_string(&name)?,
            partitions,
        },
    ))
}

fn parse_req_partition(s: NomBytes) -> IResult<NomBytes, FetchReqPartition> {
    let (s, id) = be_i32(s)?;
    let (s, fetch_offset) = be_i64(s)?;
    let (s, max_bytes) = be_i32(s)?;

    Ok((
        s,
        FetchReqPartition {
            id,
            fetch_offset,
            max_bytes,
        },
    ))
}

/// Fetched messages per partition, plus the partition's tip offset
/// (-1 when the broker reports an error instead of data).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchResp {
    pub correlation_id: i32,
    pub topics: Vec<FetchRespTopic>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchRespTopic {
    pub name: String,
    pub partitions: Vec<FetchRespPartition>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchRespPartition {
    pub id: i32,
    pub err: Option<KafkaCode>,
    pub tip_offset: i64,
    pub messages: Vec<Message>,
}

impl Response for FetchResp {
    fn correlation_id(&self) -> i32 {
        self.correlation_id
    }

    fn encode_body<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        encode_array(buffer, &self.topics)
    }
}

impl ToByte for FetchRespTopic {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.name.encode(buffer)?;
        encode_array(buffer, &self.partitions)?;
        Ok(())
    }
}

impl ToByte for FetchRespPartition {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.id.encode(buffer)?;
        KafkaCode::to_wire(self.err).encode(buffer)?;
        self.tip_offset.encode(buffer)?;
        encode_message_set(&self.messages, buffer)?;
        Ok(())
    }
}

/// Reconstruct a [`FetchResp`] from its framed wire form, tolerating CRC
/// mismatches the way brokers' clients historically do.
pub fn read_fetch_resp<R: Read>(source: &mut R) -> Result<FetchResp> {
    read_fetch_resp_mode(source, CrcMode::Lenient)
}

/// [`read_fetch_resp`], but a stored CRC that does not match the message
/// contents fails the decode.
pub fn read_fetch_resp_strict<R: Read>(source: &mut R) -> Result<FetchResp> {
    read_fetch_resp_mode(source, CrcMode::Strict)
}

fn read_fetch_resp_mode<R: Read>(source: &mut R, mode: CrcMode) -> Result<FetchResp> {
    let body = read_frame(source, MAX_FRAME_SIZE)?;
    let (s, correlation_id) = parse_correlation_id(NomBytes::new(body))?;
    let (_, topics) = parse_array(parse_resp_topic)(s)?;

    if mode == CrcMode::Strict {
        for topic in &topics {
            for partition in &topic.partitions {
                validate_crcs(&partition.messages)?;
            }
        }
    }

    Ok(FetchResp {
        correlation_id,
        topics,
    })
}

fn parse_resp_topic(s: NomBytes) -> IResult<NomBytes, FetchRespTopic> {
    let (s, name) = parse_string(s)?;
    let name = bytes_to_string(&name)?;
    let (s, partitions) = parse_array(|s| parse_resp_partition(s, &name))(s)?;

    Ok((s, FetchRespTopic { name, partitions }))
}

fn parse_resp_partition(s: NomBytes, topic: &str) -> IResult<NomBytes, FetchRespPartition> {
    let (s, id) = be_i32(s)?;
    let (s, err) = parse_kafka_code(s)?;
    let (s, tip_offset) = be_i64(s)?;
    let (s, mut messages) = parse_message_set(s)?;

    // Messages only know their topic and partition through this context.
    for message in &mut messages {
        message.topic = topic.to_string();
        message.partition = id;
    }

    Ok((
        s,
        FetchRespPartition {
            id,
            err,
            tip_offset,
            messages,
        },
    ))
}
