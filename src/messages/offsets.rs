//! Offset-related request and response codecs (Offset, OffsetCommit,
//! OffsetFetch).

use std::io::Read;

use bytes::BufMut;
use nom::{
    IResult,
    number::complete::{be_i32, be_i64},
};
use nombytes::NomBytes;

use crate::constants::MAX_FRAME_SIZE;
use crate::encode::{ToByte, encode_array};
use crate::error::{KafkaCode, Result};
use crate::frame::read_frame;
use crate::parser::{
    bytes_to_string, bytes_to_string_opt, parse_array, parse_nullable_string, parse_string,
};

use super::{
    ApiKey, Request, Response, parse_correlation_id, parse_kafka_code, parse_request_header,
};

// ============================================================================
// Offset
// ============================================================================

/// Request for the offsets available at the broker for the partitions it
/// names. `time_ms` takes the sentinels from [`crate::constants`]:
/// [-1](crate::constants::OFFSET_LATEST) for the log tip,
/// [-2](crate::constants::OFFSET_EARLIEST) for the log start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetReq {
    pub correlation_id: i32,
    pub client_id: String,
    pub replica_id: i32,
    pub topics: Vec<OffsetReqTopic>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetReqTopic {
    pub name: String,
    pub partitions: Vec<OffsetReqPartition>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetReqPartition {
    pub id: i32,
    pub time_ms: i64,
    pub max_offsets: i32,
}

impl Request for OffsetReq {
    const API_KEY: ApiKey = ApiKey::Offset;

    fn correlation_id(&self) -> i32 {
        self.correlation_id
    }

    fn client_id(&self) -> &str {
        &self.client_id
    }

    fn encode_body<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.replica_id.encode(buffer)?;
        encode_array(buffer, &self.topics)?;
        Ok(())
    }
}

impl ToByte for OffsetReqTopic {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.name.encode(buffer)?;
        encode_array(buffer, &self.partitions)?;
        Ok(())
    }
}

impl ToByte for OffsetReqPartition {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.id.encode(buffer)?;
        self.time_ms.encode(buffer)?;
        self.max_offsets.encode(buffer)?;
        Ok(())
    }
}

/// Reconstruct an [`OffsetReq`] from its framed wire form.
pub fn read_offset_req<R: Read>(source: &mut R) -> Result<OffsetReq> {
    let body = read_frame(source, MAX_FRAME_SIZE)?;
    let (s, header) = parse_request_header(NomBytes::new(body))?;
    let (s, replica_id) = be_i32(s)?;
    let (_, topics) = parse_array(parse_offset_req_topic)(s)?;

    Ok(OffsetReq {
        correlation_id: header.correlation_id,
        client_id: header.client_id,
        replica_id,
        topics,
    })
}

fn parse_offset_req_topic(s: NomBytes) -> IResult<NomBytes, OffsetReqTopic> {
    let (s, name) = parse_string(s)?;
    let (s, partitions) = parse_array(parse_offset_req_partition)(s)?;

    Ok((
        s,
        OffsetReqTopic {
            name: bytes_to_string(&name)?,
            partitions,
        },
    ))
}

fn parse_offset_req_partition(s: NomBytes) -> IResult<NomBytes, OffsetReqPartition> {
    let (s, id) = be_i32(s)?;
    let (s, time_ms) = be_i64(s)?;
    let (s, max_offsets) = be_i32(s)?;

    Ok((
        s,
        OffsetReqPartition {
            id,
            time_ms,
            max_offsets,
        },
    ))
}

/// Offsets the broker holds for each requested partition, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetResp {
    pub correlation_id: i32,
    pub topics: Vec<OffsetRespTopic>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetRespTopic {
    pub name: String,
    pub partitions: Vec<OffsetRespPartition>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetRespPartition {
    pub id: i32,
    pub err: Option<KafkaCode>,
    pub offsets: Vec<i64>,
}

impl Response for OffsetResp {
    fn correlation_id(&self) -> i32 {
        self.correlation_id
    }

    fn encode_body<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        encode_array(buffer, &self.topics)
    }
}

impl ToByte for OffsetRespTopic {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.name.encode(buffer)?;
        encode_array(buffer, &self.partitions)?;
        Ok(())
    }
}

impl ToByte for OffsetRespPartition {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.id.encode(buffer)?;
        KafkaCode::to_wire(self.err).encode(buffer)?;
        encode_array(buffer, &self.offsets)?;
        Ok(())
    }
}

/// Reconstruct an [`OffsetResp`] from its framed wire form.
pub fn read_offset_resp<R: Read>(source: &mut R) -> Result<OffsetResp> {
    let body = read_frame(source, MAX_FRAME_SIZE)?;
    let (s, correlation_id) = parse_correlation_id(NomBytes::new(body))?;
    let (_, topics) = parse_array(parse_offset_resp_topic)(s)?;

    Ok(OffsetResp {
        correlation_id,
        topics,
    })
}

fn parse_offset_resp_topic(s: NomBytes) -> IResult<NomBytes, OffsetRespTopic> {
    let (s, name) = parse_string(s)?;
    let (s, partitions) = parse_array(parse_offset_resp_partition)(s)?;

    Ok((
        s,
        OffsetRespTopic {
            name: bytes_to_string(&name)?,
            partitions,
        },
    ))
}

fn parse_offset_resp_partition(s: NomBytes) -> IResult<NomBytes, OffsetRespPartition> {
    let (s, id) = be_i32(s)?;
    let (s, err) = parse_kafka_code(s)?;
    let (s, offsets) = parse_array(be_i64)(s)?;

    Ok((s, OffsetRespPartition { id, err, offsets }))
}

// ============================================================================
// OffsetCommit
// ============================================================================

/// Request to durably record consumed offsets under a consumer group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetCommitReq {
    pub correlation_id: i32,
    pub client_id: String,
    pub consumer_group: String,
    pub topics: Vec<OffsetCommitReqTopic>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetCommitReqTopic {
    pub name: String,
    pub partitions: Vec<OffsetCommitReqPartition>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetCommitReqPartition {
    pub id: i32,
    pub offset: i64,
    pub metadata: Option<String>,
}

impl Request for OffsetCommitReq {
    const API_KEY: ApiKey = ApiKey::OffsetCommit;

    fn correlation_id(&self) -> i32 {
        self.correlation_id
    }

    fn client_id(&self) -> &str {
        &self.client_id
    }

    fn encode_body<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.consumer_group.encode(buffer)?;
        encode_array(buffer, &self.topics)?;
        Ok(())
    }
}

impl ToByte for OffsetCommitReqTopic {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.name.encode(buffer)?;
        encode_array(buffer, &self.partitions)?;
        Ok(())
    }
}

impl ToByte for OffsetCommitReqPartition {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.id.encode(buffer)?;
        self.offset.encode(buffer)?;
        self.metadata.encode(buffer)?;
        Ok(())
    }
}

/// Reconstruct an [`OffsetCommitReq`] from its framed wire form.
pub fn read_offset_commit_req<R: Read>(source: &mut R) -> Result<OffsetCommitReq> {
    let body = read_frame(source, MAX_FRAME_SIZE)?;
    let (s, header) = parse_request_header(NomBytes::new(body))?;
    let (s, consumer_group) = parse_string(s)?;
    let (_, topics) = parse_array(parse_commit_req_topic)(s)?;

    Ok(OffsetCommitReq {
        correlation_id: header.correlation_id,
        client_id: header.client_id,
        consumer_group: bytes_to_string(&consumer_group)?,
        topics,
    })
}

fn parse_commit_req_topic(s: NomBytes) -> IResult<NomBytes, OffsetCommitReqTopic> {
    let (s, name) = parse_string(s)?;
    let (s, partitions) = parse_array(parse_commit_req_partition)(s)?;

    Ok((
        s,
        OffsetCommitReqTopic {
            name: bytes_to_string(&name)?,
            partitions,
        },
    ))
}

fn parse_commit_req_partition(s: NomBytes) -> IResult<NomBytes, OffsetCommitReqPartition> {
    let (s, id) = be_i32(s)?;
    let (s, offset) = be_i64(s)?;
    let (s, metadata) = parse_nullable_string(s)?;

    Ok((
        s,
        OffsetCommitReqPartition {
            id,
            offset,
            metadata: bytes_to_string_opt(metadata)?,
        },
    ))
}

/// Per-partition commit outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetCommitResp {
    pub correlation_id: i32,
    pub topics: Vec<OffsetCommitRespTopic>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetCommitRespTopic {
    pub name: String,
    pub partitions: Vec<OffsetCommitRespPartition>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetCommitRespPartition {
    pub id: i32,
    pub err: Option<KafkaCode>,
}

impl Response for OffsetCommitResp {
    fn correlation_id(&self) -> i32 {
        self.correlation_id
    }

    fn encode_body<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        encode_array(buffer, &self.topics)
    }
}

impl ToByte for OffsetCommitRespTopic {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.name.encode(buffer)?;
        encode_array(buffer, &self.partitions)?;
        Ok(())
    }
}

impl ToByte for OffsetCommitRespPartition {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.id.encode(buffer)?;
        KafkaCode::to_wire(self.err).encode(buffer)?;
        Ok(())
    }
}

/// Reconstruct an [`OffsetCommitResp`] from its framed wire form.
pub fn read_offset_commit_resp<R: Read>(source: &mut R) -> Result<OffsetCommitResp> {
    let body = read_frame(source, MAX_FRAME_SIZE)?;
    let (s, correlation_id) = parse_correlation_id(NomBytes::new(body))?;
    let (_, topics) = parse_array(parse_commit_resp_topic)(s)?;

    Ok(OffsetCommitResp {
        correlation_id,
        topics,
    })
}

fn parse_commit_resp_topic(s: NomBytes) -> IResult<NomBytes, OffsetCommitRespTopic> {
    let (s, name) = parse_string(s)?;
    let (s, partitions) = parse_array(parse_commit_resp_partition)(s)?;

    Ok((
        s,
        OffsetCommitRespTopic {
            name: bytes_to_string(&name)?,
            partitions,
        },
    ))
}

fn parse_commit_resp_partition(s: NomBytes) -> IResult<NomBytes, OffsetCommitRespPartition> {
    let (s, id) = be_i32(s)?;
    let (s, err) = parse_kafka_code(s)?;

    Ok((s, OffsetCommitRespPartition { id, err }))
}

// ============================================================================
// OffsetFetch
// ============================================================================

/// Request for the offsets last committed under a consumer group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetFetchReq {
    pub correlation_id: i32,
    pub client_id: String,
    pub consumer_group: String,
    pub topics: Vec<OffsetFetchReqTopic>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetFetchReqTopic {
    pub name: String,
    pub partitions: Vec<i32>,
}

impl Request for OffsetFetchReq {
    const API_KEY: ApiKey = ApiKey::OffsetFetch;

    fn correlation_id(&self) -> i32 {
        self.correlation_id
    }

    fn client_id(&self) -> &str {
        &self.client_id
    }

    fn encode_body<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.consumer_group.encode(buffer)?;
        encode_array(buffer, &self.topics)?;
        Ok(())
    }
}

impl ToByte for OffsetFetchReqTopic {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.name.encode(buffer)?;
        encode_array(buffer, &self.partitions)?;
        Ok(())
    }
}

/// Reconstruct an [`OffsetFetchReq`] from its framed wire form.
pub fn read_offset_fetch_req<R: Read>(source: &mut R) -> Result<OffsetFetchReq> {
    let body = read_frame(source, MAX_FRAME_SIZE)?;
    let (s, header) = parse_request_header(NomBytes::new(body))?;
    let (s, consumer_group) = parse_string(s)?;
    let (_, topics) = parse_array(parse_fetch_req_topic)(s)?;

    Ok(OffsetFetchReq {
        correlation_id: header.correlation_id,
        client_id: header.client_id,
        consumer_group: bytes_to_string(&consumer_group)?,
        topics,
    })
}

fn parse_fetch_req_topic(s: NomBytes) -> IResult<NomBytes, OffsetFetchReqTopic> {
    let (s, name) = parse_string(s)?;
    let (s, partitions) = parse_array(be_i32)(s)?;

    Ok((
        s,
        OffsetFetchReqTopic {
            name: bytes_to_string(&name)?,
            partitions,
        },
    ))
}

/// Committed offsets per partition; a partition with no committed offset
/// carries -1 and null metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetFetchResp {
    pub correlation_id: i32,
    pub topics: Vec<OffsetFetchRespTopic>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetFetchRespTopic {
    pub name: String,
    pub partitions: Vec<OffsetFetchRespPartition>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetFetchRespPartition {
    pub id: i32,
    pub offset: i64,
    pub metadata: Option<String>,
    pub err: Option<KafkaCode>,
}

impl Response for OffsetFetchResp {
    fn correlation_id(&self) -> i32 {
        self.correlation_id
    }

    fn encode_body<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        encode_array(buffer, &self.topics)
    }
}

impl ToByte for OffsetFetchRespTopic {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.name.encode(buffer)?;
        encode_array(buffer, &self.partitions)?;
        Ok(())
    }
}

impl ToByte for OffsetFetchRespPartition {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.id.encode(buffer)?;
        self.offset.encode(buffer)?;
        self.metadata.encode(buffer)?;
        KafkaCode::to_wire(self.err).encode(buffer)?;
        Ok(())
    }
}

/// Reconstruct an [`OffsetFetchResp`] from its framed wire form.
pub fn read_offset_fetch_resp<R: Read>(source: &mut R) -> Result<OffsetFetchResp> {
    let body = read_frame(source, MAX_FRAME_SIZE)?;
    let (s, correlation_id) = parse_correlation_id(NomBytes::new(body))?;
    let (_, topics) = parse_array(parse_fetch_resp_topic)(s)?;

    Ok(OffsetFetchResp {
        correlation_id,
        topics,
    })
}

fn parse_fetch_resp_topic(s: NomBytes) -> IResult<NomBytes, OffsetFetchRespTopic> {
    let (s, name) = parse_string(s)?;
    let (s, partitions) = parse_array(parse_fetch_resp_partition)(s)?;

    Ok((
        s,
        OffsetFetchRespTopic {
            name: bytes_to_string(&name)?,
            partitions,
        },
    ))
}

fn parse_fetch_resp_partition(s: NomBytes) -> IResult<NomBytes, OffsetFetchRespPartition> {
    let (s, id) = be_i32(s)?;
    let (s, offset) = be_i64(s)?;
    let (s, metadata) = parse_nullable_string(s)?;
    let (s, err) = parse_kafka_code(s)?;

    Ok((
        s,
        OffsetFetchRespPartition {
            id,
            offset,
            metadata: bytes_to_string_opt(metadata)?,
            err,
        },
    ))
}
