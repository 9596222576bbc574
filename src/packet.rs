//! Wire-format definitions for protocol datagrams.
//!
//! Every datagram exchanged between sender and receiver is a [`Packet`].
//! This module is responsible for:
//! - Defining the on-wire binary layout (sequence-number header + payload).
//! - Serialising a [`Packet`] into a byte buffer ready for transmission.
//! - Deserialising a raw byte slice back into a [`Packet`], returning an
//!   error for datagrams too short to carry a header.
//!
//! No I/O happens here — this is pure data transformation.
//!
//! # Wire format
//!
//! The header is a single field, big-endian on the wire:
//!
//! ```text
//!  0               1               2               3
//!  0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                 Sequence Number (signed, BE)                  |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                        Payload ...                            |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! There is no length field: UDP preserves datagram boundaries, so the
//! payload length is whatever remains after the header.
//!
//! The sequence number of a data packet is the **byte offset** of its
//! payload within the file, not a packet counter.  Acknowledgements reuse
//! the same layout with the sequence number carrying the cumulative number
//! of bytes the receiver has accepted; any payload on an ACK is ignored.

use thiserror::Error;

/// Total datagram size used for data packets, in bytes.
pub const PACKET_SIZE: usize = 1024;

/// Bytes reserved for the sequence-number header.
pub const SEQ_ID_SIZE: usize = 4;

/// Payload capacity of a data packet.
pub const DATA_SIZE: usize = PACKET_SIZE - SEQ_ID_SIZE;

/// Sentinel payload of the final session-end datagram.
///
/// Sent with sequence number 0 after the EOF exchange; recognisable by the
/// receiver as "the sender is gone", distinct from any data packet.
pub const FINACK_PAYLOAD: &[u8] = b"==FINACK==";

/// Errors that can arise when parsing a raw datagram.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PacketError {
    /// Datagram shorter than the fixed sequence-number header.
    #[error("datagram too short to contain a 4-byte sequence header")]
    TooShort,
}

/// A complete protocol datagram: sequence number + payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Signed byte offset (data) or cumulative acknowledged bytes (ACK).
    pub seq: i32,
    pub payload: Vec<u8>,
}

impl Packet {
    /// A data packet carrying `payload` at byte offset `seq`.
    pub fn data(seq: i32, payload: Vec<u8>) -> Self {
        Self { seq, payload }
    }

    /// The end-of-file marker: empty payload, sequence number = total bytes.
    pub fn eof(total_bytes: i32) -> Self {
        Self {
            seq: total_bytes,
            payload: Vec::new(),
        }
    }

    /// The final session-end sentinel.
    pub fn finack() -> Self {
        Self {
            seq: 0,
            payload: FINACK_PAYLOAD.to_vec(),
        }
    }

    /// `true` when this datagram is the session-end sentinel.
    pub fn is_finack(&self) -> bool {
        self.payload == FINACK_PAYLOAD
    }

    /// Serialise this packet into a newly allocated byte vector.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(SEQ_ID_SIZE + self.payload.len());
        buf.extend_from_slice(&self.seq.to_be_bytes());
        buf.extend_from_slice(&self.payload);
        buf
    }

    /// Parse a [`Packet`] from a raw byte slice.
    ///
    /// Returns [`PacketError::TooShort`] when `buf` cannot hold the header.
    /// In practice UDP preserves datagram boundaries so well-behaved peers
    /// never produce this; callers discard the datagram when it happens.
    pub fn decode(buf: &[u8]) -> Result<Self, PacketError> {
        if buf.len() < SEQ_ID_SIZE {
            return Err(PacketError::TooShort);
        }
        let seq = i32::from_be_bytes(buf[..SEQ_ID_SIZE].try_into().unwrap());
        Ok(Self {
            seq,
            payload: buf[SEQ_ID_SIZE..].to_vec(),
        })
    }
}
