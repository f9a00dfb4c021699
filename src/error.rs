//! Codec-level errors and the broker error-code table.
//!
//! Two kinds of failure live here and they must not be confused:
//!
//! - [`Error`] is a *codec* error: the bytes could not be produced or
//!   consumed at all (truncated input, bad length prefix, sink failure).
//! - [`KafkaCode`] is an in-band *broker* error: the frame decoded fine and
//!   the broker reported a per-topic or per-partition condition inside it.
//!   Response structs carry these as `Option<KafkaCode>` fields; code 0 on
//!   the wire is the absence of an error and decodes as `None`.

use std::{io, result};

use nombytes::NomBytes;
use thiserror::Error as ThisError;

pub type Result<T> = result::Result<T, Error>;

/// Errors surfaced while encoding or decoding wire data.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum Error {
    /// The source ran out of bytes in the middle of a field.
    #[error("input ended in the middle of a field")]
    UnexpectedEnd,

    /// A length prefix was negative where null is not permitted, or below -1.
    #[error("negative length prefix where none is allowed")]
    NegativeLength,

    /// The declared frame length exceeds the configured ceiling.
    #[error("frame of {declared} bytes exceeds the {limit} byte limit")]
    OversizedFrame { declared: i32, limit: i32 },

    /// The underlying sink rejected a write.
    #[error("sink write failed: {0:?}")]
    SinkWriteFailed(io::ErrorKind),

    /// The underlying source failed for a reason other than end-of-stream.
    #[error("source read failed: {0:?}")]
    SourceReadFailed(io::ErrorKind),

    /// A message failed CRC validation under strict decoding.
    #[error("message crc mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    InvalidCrc { stored: u32, computed: u32 },
}

// Parsers signal invalid length prefixes with `Failure(Verify)`; every other
// nom error means the input ran dry before the field was complete.
impl From<nom::Err<nom::error::Error<NomBytes>>> for Error {
    fn from(e: nom::Err<nom::error::Error<NomBytes>>) -> Self {
        match e {
            nom::Err::Failure(inner) if inner.code == nom::error::ErrorKind::Verify => {
                Error::NegativeLength
            }
            _ => Error::UnexpectedEnd,
        }
    }
}

/// Errors reported by a broker inside an otherwise well-formed response.
/// See also [Kafka Errors](http://kafka.apache.org/protocol.html).
///
/// The table is the 0.8-era code space. Codes without a named kind decode as
/// [`KafkaCode::Unrecognized`] so the numeric value survives a round trip.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum KafkaCode {
    /// An unexpected server error.
    Unknown,
    /// The requested offset is outside the range of offsets maintained by
    /// the server for the given topic/partition.
    OffsetOutOfRange,
    /// This indicates that a message contents does not match its CRC.
    CorruptMessage,
    /// This request is for a topic or partition that does not exist on this
    /// broker.
    UnknownTopicOrPartition,
    /// The message has a negative size.
    InvalidMessageSize,
    /// This error is thrown if we are in the middle of a leadership election
    /// and there is currently no leader for this partition and hence it is
    /// unavailable for writes.
    LeaderNotAvailable,
    /// This error is thrown if the client attempts to send messages to a
    /// replica that is not the leader for some partition. It indicates that
    /// the clients metadata is out of date.
    NotLeaderForPartition,
    /// This error is thrown if the request exceeds the user-specified time
    /// limit in the request.
    RequestTimedOut,
    /// This is not a client facing error and is used mostly by tools when a
    /// broker is not alive.
    BrokerNotAvailable,
    /// If replica is expected on a broker, but is not (this can be safely
    /// ignored).
    ReplicaNotAvailable,
    /// The server has a configurable maximum message size to avoid unbounded
    /// memory allocation. This error is thrown if the client attempt to
    /// produce a message larger than this maximum.
    MessageSizeTooLarge,
    /// Internal error code for broker-to-broker communication.
    StaleControllerEpoch,
    /// If you specify a string larger than configured maximum for offset
    /// metadata.
    OffsetMetadataTooLarge,
    /// The server disconnected before a response was received.
    NetworkException,
    /// The broker returns this error code for an offset fetch request if it
    /// is still loading offsets (after a leader change for that offsets
    /// topic partition).
    GroupLoadInProgress,
    /// The broker returns this error code for consumer metadata requests or
    /// offset commit requests if the offsets topic has not yet been created.
    GroupCoordinatorNotAvailable,
    /// The broker returns this error code if it receives an offset fetch or
    /// commit request for a group that it is not a coordinator for.
    NotCoordinatorForGroup,
    /// For a request which attempts to access an invalid topic (e.g. one
    /// which has an illegal name), or if an attempt is made to write to an
    /// internal topic (such as the consumer offsets topic).
    InvalidTopic,
    /// If a message batch in a produce request exceeds the maximum
    /// configured segment size.
    RecordListTooLarge,
    /// Returned from a produce request when the number of in-sync replicas
    /// is lower than the configured minimum and requiredAcks is -1.
    NotEnoughReplicas,
    /// Returned from a produce request when the message was written to the
    /// log, but with fewer in-sync replicas than required.
    NotEnoughReplicasAfterAppend,
    /// Returned from a produce request if the requested requiredAcks is
    /// invalid (anything other than -1, 1, or 0).
    InvalidRequiredAcks,
    /// A code outside the known table, preserved verbatim.
    Unrecognized(i16),
}

impl KafkaCode {
    /// Decode a wire error code. `0` is "no error" and yields `None`; any
    /// other value yields a named kind or `Unrecognized`.
    pub fn from_wire(raw: i16) -> Option<KafkaCode> {
        match raw {
            0 => None,
            -1 => Some(KafkaCode::Unknown),
            1 => Some(KafkaCode::OffsetOutOfRange),
            2 => Some(KafkaCode::CorruptMessage),
            3 => Some(KafkaCode::UnknownTopicOrPartition),
            4 => Some(KafkaCode::InvalidMessageSize),
            5 => Some(KafkaCode::LeaderNotAvailable),
            6 => Some(KafkaCode::NotLeaderForPartition),
            7 => Some(KafkaCode::RequestTimedOut),
            8 => Some(KafkaCode::BrokerNotAvailable),
            9 => Some(KafkaCode::ReplicaNotAvailable),
            10 => Some(KafkaCode::MessageSizeTooLarge),
            11 => Some(KafkaCode::StaleControllerEpoch),
            12 => Some(KafkaCode::OffsetMetadataTooLarge),
            13 => Some(KafkaCode::NetworkException),
            14 => Some(KafkaCode::GroupLoadInProgress),
            15 => Some(KafkaCode::GroupCoordinatorNotAvailable),
            16 => Some(KafkaCode::NotCoordinatorForGroup),
            17 => Some(KafkaCode::InvalidTopic),
            18 => Some(KafkaCode::RecordListTooLarge),
            19 => Some(KafkaCode::NotEnoughReplicas),
            20 => Some(KafkaCode::NotEnoughReplicasAfterAppend),
            21 => Some(KafkaCode::InvalidRequiredAcks),
            n => Some(KafkaCode::Unrecognized(n)),
        }
    }

    /// The numeric wire value of this code.
    pub fn as_i16(self) -> i16 {
        match self {
            KafkaCode::Unknown => -1,
            KafkaCode::OffsetOutOfRange => 1,
            KafkaCode::CorruptMessage => 2,
            KafkaCode::UnknownTopicOrPartition => 3,
            KafkaCode::InvalidMessageSize => 4,
            KafkaCode::LeaderNotAvailable => 5,
            KafkaCode::NotLeaderForPartition => 6,
            KafkaCode::RequestTimedOut => 7,
            KafkaCode::BrokerNotAvailable => 8,
            KafkaCode::ReplicaNotAvailable => 9,
            KafkaCode::MessageSizeTooLarge => 10,
            KafkaCode::StaleControllerEpoch => 11,
            KafkaCode::OffsetMetadataTooLarge => 12,
            KafkaCode::NetworkException => 13,
            KafkaCode::GroupLoadInProgress => 14,
            KafkaCode::GroupCoordinatorNotAvailable => 15,
            KafkaCode::NotCoordinatorForGroup => 16,
            KafkaCode::InvalidTopic => 17,
            KafkaCode::RecordListTooLarge => 18,
            KafkaCode::NotEnoughReplicas => 19,
            KafkaCode::NotEnoughReplicasAfterAppend => 20,
            KafkaCode::InvalidRequiredAcks => 21,
            KafkaCode::Unrecognized(n) => n,
        }
    }

    /// Encode an in-band error slot: `None` is code `0`.
    pub fn to_wire(code: Option<KafkaCode>) -> i16 {
        code.map_or(0, KafkaCode::as_i16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_zero_is_no_error() {
        assert_eq!(KafkaCode::from_wire(0), None);
        assert_eq!(KafkaCode::to_wire(None), 0);
    }

    #[test]
    fn test_known_code_values() {
        assert_eq!(KafkaCode::Unknown.as_i16(), -1);
        assert_eq!(KafkaCode::OffsetOutOfRange.as_i16(), 1);
        assert_eq!(KafkaCode::UnknownTopicOrPartition.as_i16(), 3);
        assert_eq!(KafkaCode::BrokerNotAvailable.as_i16(), 8);
        assert_eq!(KafkaCode::NotCoordinatorForGroup.as_i16(), 16);
        assert_eq!(KafkaCode::InvalidRequiredAcks.as_i16(), 21);
    }

    #[test]
    fn test_code_roundtrip() {
        for raw in -1..=21 {
            let decoded = KafkaCode::from_wire(raw);
            assert_eq!(KafkaCode::to_wire(decoded), raw);
        }
    }

    #[test]
    fn test_unrecognized_code_preserved() {
        match KafkaCode::from_wire(999) {
            Some(KafkaCode::Unrecognized(n)) => assert_eq!(n, 999),
            other => panic!("expected Unrecognized, got {:?}", other),
        }
        assert_eq!(KafkaCode::to_wire(KafkaCode::from_wire(-57)), -57);
    }

    #[test]
    fn test_error_display() {
        let err = Error::OversizedFrame {
            declared: 1 << 30,
            limit: 1 << 20,
        };
        let display = format!("{}", err);
        assert!(display.contains("exceeds"));

        let err = Error::InvalidCrc {
            stored: 0xB8BA5F57,
            computed: 0xDEADBEEF,
        };
        assert!(format!("{}", err).contains("0xb8ba5f57"));
    }

    #[test]
    fn test_error_is_std_error() {
        let err: Box<dyn std::error::Error> = Box::new(Error::UnexpectedEnd);
        assert!(err.to_string().contains("ended"));
    }

    #[test]
    fn test_nom_error_mapping() {
        let input = NomBytes::new(bytes::Bytes::new());
        let failure: nom::Err<nom::error::Error<NomBytes>> = nom::Err::Failure(
            nom::error::Error::new(input.clone(), nom::error::ErrorKind::Verify),
        );
        assert_eq!(Error::from(failure), Error::NegativeLength);

        let plain: nom::Err<nom::error::Error<NomBytes>> =
            nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Eof));
        assert_eq!(Error::from(plain), Error::UnexpectedEnd);
    }
}
