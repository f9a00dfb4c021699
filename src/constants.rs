//! Protocol constants.
//!
//! Everything the 0.8 wire format fixes numerically lives here: sentinel
//! values callers put into request fields, the message framing magic, and
//! the bounds the decoder enforces against adversarial input.

// =============================================================================
// Produce semantics
// =============================================================================

/// Do not wait for any broker acknowledgement.
pub const REQUIRED_ACKS_NONE: i16 = 0;

/// Wait for the partition leader to persist the messages.
pub const REQUIRED_ACKS_LOCAL: i16 = 1;

/// Wait for all in-sync replicas to persist the messages.
pub const REQUIRED_ACKS_ALL: i16 = -1;

// =============================================================================
// Offset semantics
// =============================================================================

/// Offset request time sentinel for "the latest available offset".
pub const OFFSET_LATEST: i64 = -1;

/// Offset request time sentinel for "the earliest available offset".
pub const OFFSET_EARLIEST: i64 = -2;

/// Replica id clients send; only brokers use real replica ids.
pub const NO_REPLICA_ID: i32 = -1;

// =============================================================================
// Message framing
// =============================================================================

/// Message format version written by this codec.
pub(crate) const MESSAGE_MAGIC: i8 = 0;

/// Attribute byte for uncompressed messages; compression bits are unused.
pub(crate) const MESSAGE_ATTRIBUTES: i8 = 0;

/// Fixed overhead of a message on the wire before the CRC-covered region:
/// offset (8 bytes) + message size (4 bytes).
pub(crate) const MESSAGE_HEADER_SIZE: usize = 12;

// =============================================================================
// Decoder limits
// =============================================================================

/// Maximum frame length the convenience readers accept (64 MB).
///
/// This prevents memory exhaustion from a malicious or corrupted length
/// prefix. Callers with bigger frames can use `read_frame` with their own
/// ceiling.
pub const MAX_FRAME_SIZE: i32 = 64 * 1024 * 1024;

/// Maximum allowed array size in protocol parsing.
///
/// This prevents memory exhaustion from malformed messages that claim to
/// have billions of elements. 100,000 is generous but bounded.
pub const MAX_PROTOCOL_ARRAY_SIZE: i32 = 100_000;
