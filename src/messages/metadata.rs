//! Metadata request and response codec.

use std::io::Read;

use bytes::BufMut;
use nom::{IResult, number::complete::be_i32};
use nombytes::NomBytes;

use crate::constants::MAX_FRAME_SIZE;
use crate::encode::{ToByte, encode_array};
use crate::error::{KafkaCode, Result};
use crate::frame::read_frame;
use crate::parser::{bytes_to_string, parse_array, parse_string};

use super::{
    ApiKey, Request, Response, parse_correlation_id, parse_kafka_code, parse_request_header,
};

/// Request for cluster and topic metadata. An empty topic list asks the
/// broker to describe every topic it knows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataReq {
    pub correlation_id: i32,
    pub client_id: String,
    pub topics: Vec<String>,
}

impl MetadataReq {
    pub fn new(correlation_id: i32, client_id: impl Into<String>, topics: Vec<String>) -> Self {
        Self {
            correlation_id,
            client_id: client_id.into(),
            topics,
        }
    }
}

impl Request for MetadataReq {
    const API_KEY: ApiKey = ApiKey::Metadata;

    fn correlation_id(&self) -> i32 {
        self.correlation_id
    }

    fn client_id(&self) -> &str {
        &self.client_id
    }

    fn encode_body<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        encode_array(buffer, &self.topics)
    }
}

/// Reconstruct a [`MetadataReq`] from its framed wire form.
pub fn read_metadata_req<R: Read>(source: &mut R) -> Result<MetadataReq> {
    let body = read_frame(source, MAX_FRAME_SIZE)?;
    let (s, header) = parse_request_header(NomBytes::new(body))?;
    let (_, topics) = parse_array(parse_topic_name)(s)?;

    Ok(MetadataReq {
        correlation_id: header.correlation_id,
        client_id: header.client_id,
        topics,
    })
}

fn parse_topic_name(s: NomBytes) -> IResult<NomBytes, String> {
    let (s, name) = parse_string(s)?;
    Ok((s, bytes_to_string(&name)?))
}

/// Cluster metadata: live brokers plus per-topic partition layout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataResp {
    pub correlation_id: i32,
    pub brokers: Vec<MetadataRespBroker>,
    pub topics: Vec<MetadataRespTopic>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataRespBroker {
    pub node_id: i32,
    pub host: String,
    pub port: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataRespTopic {
    pub name: String,
    pub err: Option<KafkaCode>,
    pub partitions: Vec<MetadataRespPartition>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataRespPartition {
    pub err: Option<KafkaCode>,
    pub id: i32,
    pub leader: i32,
    pub replicas: Vec<i32>,
    pub isrs: Vec<i32>,
}

impl Response for MetadataResp {
    fn correlation_id(&self) -> i32 {
        self.correlation_id
    }

    fn encode_body<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        encode_array(buffer, &self.brokers)?;
        encode_array(buffer, &self.topics)?;
        Ok(())
    }
}

impl ToByte for MetadataRespBroker {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.node_id.encode(buffer)?;
        self.host.encode(buffer)?;
        self.port.encode(buffer)?;
        Ok(())
    }
}

impl ToByte for MetadataRespTopic {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        KafkaCode::to_wire(self.err).encode(buffer)?;
        self.name.encode(buffer)?;
        encode_array(buffer, &self.partitions)?;
        Ok(())
    }
}

impl ToByte for MetadataRespPartition {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        KafkaCode::to_wire(self.err).encode(buffer)?;
        self.id.encode(buffer)?;
        self.leader.encode(buffer)?;
        encode_array(buffer, &self.replicas)?;
        encode_array(buffer, &self.isrs)?;
        Ok(())
    }
}

/// Reconstruct a [`MetadataResp`] from its framed wire form.
pub fn read_metadata_resp<R: Read>(source: &mut R) -> Result<MetadataResp> {
    let body = read_frame(source, MAX_FRAME_SIZE)?;
    let (s, correlation_id) = parse_correlation_id(NomBytes::new(body))?;
    let (s, brokers) = parse_array(parse_broker)(s)?;
    let (_, topics) = parse_array(parse_topic)(s)?;

    Ok(MetadataResp {
        correlation_id,
        brokers,
        topics,
    })
}

fn parse_broker(s: NomBytes) -> IResult<NomBytes, MetadataRespBroker> {
    let (s, node_id) = be_i32(s)?;
    let (s, host) = parse_string(s)?;
    let (s, port) = be_i32(s)?;

    Ok((
        s,
        MetadataRespBroker {
            node_id,
            host: bytes_to_string(&host)?,
            port,
        },
    ))
}

fn parse_topic(s: NomBytes) -> IResult<NomBytes, MetadataRespTopic> {
    let (s, err) = parse_kafka_code(s)?;
    let (s, name) = parse_string(s)?;
    let (s, partitions) = parse_array(parse_partition)(s)?;

    Ok((
        s,
        MetadataRespTopic {
            name: bytes_to_string(&name)?,
            err,
            partitions,
        },
    ))
}

fn parse_partition(s: NomBytes) -> IResult<NomBytes, MetadataRespPartition> {
    let (s, err) = parse_kafka_code(s)?;
    let (s, id) = be_i32(s)?;
    let (s, leader) = be_i32(s)?;
    let (s, replicas) = parse_array(be_i32)(s)?;
    let (s, isrs) = parse_array(be_i32)(s)?;

    Ok((
        s,
        MetadataRespPartition {
            err,
            id,
            leader,
            replicas,
            isrs,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_topics_request_body_is_empty_array() {
        let req = MetadataReq::new(1, "cli", vec![]);
        let mut buf = Vec::new();
        req.encode_body(&mut buf).unwrap();
        assert_eq!(buf, vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_request_roundtrip() {
        let req = MetadataReq::new(77, "meta-cli", vec!["a".to_string(), "bb".to_string()]);
        let bytes = req.to_bytes().unwrap();
        let decoded = read_metadata_req(&mut &bytes[..]).unwrap();
        assert_eq!(decoded, req);
    }

    #[test]
    fn test_response_roundtrip() {
        let resp = MetadataResp {
            correlation_id: 9,
            brokers: vec![MetadataRespBroker {
                node_id: 1,
                host: "kafka.local".to_string(),
                port: 9092,
            }],
            topics: vec![MetadataRespTopic {
                name: "events".to_string(),
                err: None,
                partitions: vec![MetadataRespPartition {
                    err: Some(KafkaCode::LeaderNotAvailable),
                    id: 0,
                    leader: -1,
                    replicas: vec![1, 2],
                    isrs: vec![],
                }],
            }],
        };

        let bytes = resp.to_bytes().unwrap();
        let decoded = read_metadata_resp(&mut &bytes[..]).unwrap();
        assert_eq!(decoded, resp);

        let reencoded = decoded.to_bytes().unwrap();
        assert_eq!(reencoded, bytes);
    }
}
