//! # Kafkawire
//! Client-side codec for the Kafka 0.8 wire protocol.
//!
//! This crate turns request structs into the length-prefixed binary frames
//! Kafka brokers expect on TCP, and broker response frames back into
//! structs, byte-exactly in both directions. It does nothing else: no
//! sockets, no retries, no broker discovery — callers hand the codec a byte
//! sink or a byte source and own everything around it.
//!
//! # Goals
//! - Byte-exact round trips for every request and response kind
//! - Zero-copy decoding of payloads via [Bytes](bytes::Bytes) and
//!   [Nom](https://docs.rs/nom/latest/nom/)
//! - Faithful 0.8 semantics: null and empty are distinct on the wire,
//!   truncated MessageSet tails are tolerated, broker error codes are data
//!
//! ## Encoding a request
//! ```
//! use kafkawire::prelude::*;
//!
//! let req = MetadataReq::new(123, "my-client", vec!["events".to_string()]);
//!
//! // Both entry points produce identical bytes.
//! let bytes = req.to_bytes().unwrap();
//! let mut sink = Vec::new();
//! let written = req.write_to(&mut sink).unwrap();
//! assert_eq!(written, bytes.len());
//! assert_eq!(&sink[..], &bytes[..]);
//! ```
//!
//! ## Decoding a response
//! ```
//! use kafkawire::prelude::*;
//!
//! # let resp = MetadataResp { correlation_id: 123, brokers: vec![], topics: vec![] };
//! # let wire = resp.to_bytes().unwrap();
//! let resp = read_metadata_resp(&mut &wire[..]).unwrap();
//! assert_eq!(resp.correlation_id, 123);
//! ```
//!
//! Fetched messages carry a CRC-32 over their key and value; the fetch
//! decoder is lenient about mismatches by default (matching the behaviour
//! Kafka clients have always had) and strict on request via
//! [`read_fetch_resp_strict`](messages::read_fetch_resp_strict).
//!
//! ## Resources
//! - [Kafka Protocol Spec](https://kafka.apache.org/protocol.html)
//! - [Confluence Docs](https://cwiki.apache.org/confluence/display/KAFKA/A+Guide+To+The+Kafka+Protocol)

#![forbid(unsafe_code)]

pub mod constants;
mod encode;
pub mod error;
pub mod frame;
pub mod messages;
mod parser;

pub use encode::ToByte;

pub mod prelude {
    //! Everything needed to encode requests and decode responses.
    pub use crate::constants::{
        NO_REPLICA_ID, OFFSET_EARLIEST, OFFSET_LATEST, REQUIRED_ACKS_ALL, REQUIRED_ACKS_LOCAL,
        REQUIRED_ACKS_NONE,
    };
    pub use crate::error::{Error, KafkaCode, Result};
    pub use crate::messages::{
        ApiKey, ConsumerMetadataReq, ConsumerMetadataResp, CrcMode, FetchReq, FetchReqPartition,
        FetchReqTopic, FetchResp, FetchRespPartition, FetchRespTopic, Message, MetadataReq,
        MetadataResp, MetadataRespBroker, MetadataRespPartition, MetadataRespTopic, OffsetCommitReq,
        OffsetCommitReqPartition, OffsetCommitReqTopic, OffsetCommitResp, OffsetCommitRespPartition,
        OffsetCommitRespTopic, OffsetFetchReq, OffsetFetchReqTopic, OffsetFetchResp,
        OffsetFetchRespPartition, OffsetFetchRespTopic, OffsetReq, OffsetReqPartition,
        OffsetReqTopic, OffsetResp, OffsetRespPartition, OffsetRespTopic, ProduceReq,
        ProduceReqPartition, ProduceReqTopic, ProduceResp, ProduceRespPartition, ProduceRespTopic,
        Request, Response, read_consumer_metadata_req, read_consumer_metadata_resp, read_fetch_req,
        read_fetch_resp, read_fetch_resp_strict, read_message_set, read_metadata_req,
        read_metadata_resp, read_offset_commit_req, read_offset_commit_resp, read_offset_fetch_req,
        read_offset_fetch_resp, read_offset_req, read_offset_resp, read_produce_req,
        read_produce_resp,
    };

    pub use bytes;
}
