//! Reno-style congestion-controlled send-side state machine.
//!
//! Builds on the fixed window's cumulative-ACK sliding with a dynamically
//! sized window:
//! - **Slow start**: below `ssthresh`, `cwnd` grows by 1 per new ACK.
//! - **Congestion avoidance**: at or above `ssthresh`, `cwnd` grows by
//!   `1 / ssthresh` per new ACK (linear per round).
//! - **Fast retransmit**: exactly 3 duplicate ACKs halve `ssthresh`, set
//!   `cwnd = ssthresh + 3`, and signal an immediate resend of the chunk at
//!   `base` — without waiting for a timeout.
//! - **Timeout**: a stronger loss signal — `ssthresh` halves, `cwnd` drops
//!   back to 1 (full slow-start restart) and `next_index` rewinds to
//!   `base` so the whole unacknowledged range is resent.
//!
//! `cwnd` is real-valued; the in-flight bound uses its floor.  `ssthresh`
//! is clamped to ≥ 1 everywhere it is computed, so the
//! congestion-avoidance increment never divides by zero.
//!
//! Duplicate detection compares only against the last acknowledgement
//! value: an ACK strictly below `last_ack` is stale and ignored rather
//! than counted.  This module only manages window state; socket I/O and
//! metric recording live in [`crate::session`].

use std::ops::Range;

use crate::chunk::Chunk;

/// Initial slow-start threshold, in packets.
pub const INITIAL_SSTHRESH: f64 = 64.0;

/// Duplicate-ACK count that triggers fast retransmit.
const DUP_ACK_THRESHOLD: u32 = 3;

/// Outcome of feeding one acknowledgement to [`RenoSender::on_ack`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenoAck {
    /// A new ACK: `base` slid past these chunk indices (possibly none, when
    /// the ACK is new but lands mid-chunk) and the window grew.
    Advanced { newly_acked: Range<usize> },
    /// A duplicate of `last_ack`; `count` duplicates seen so far.
    Duplicate { count: u32 },
    /// The third duplicate: the caller must resend the chunk at `base` now.
    FastRetransmit,
    /// Below `last_ack`; ignored.
    Stale,
}

/// Reno send-side state for one session.
#[derive(Debug)]
pub struct RenoSender {
    /// Index of the first unacknowledged chunk.
    pub base: usize,
    /// Index of the next chunk to send.
    pub next_index: usize,
    cwnd: f64,
    ssthresh: f64,
    last_ack: i64,
    dup_acks: u32,
}

impl RenoSender {
    pub fn new() -> Self {
        Self {
            base: 0,
            next_index: 0,
            cwnd: 1.0,
            ssthresh: INITIAL_SSTHRESH,
            last_ack: -1,
            dup_acks: 0,
        }
    }

    /// Current congestion window, in packets.
    pub fn cwnd(&self) -> f64 {
        self.cwnd
    }

    /// Current slow-start threshold, in packets.
    pub fn ssthresh(&self) -> f64 {
        self.ssthresh
    }

    /// Number of chunks currently awaiting acknowledgement.
    pub fn in_flight(&self) -> usize {
        self.next_index - self.base
    }

    /// `true` while an unsent chunk exists and the congestion window has
    /// room (in-flight count below `floor(cwnd)`).
    pub fn can_send(&self, total_chunks: usize) -> bool {
        self.next_index < total_chunks && self.in_flight() < self.cwnd.floor() as usize
    }

    /// Advance `next_index` past the chunk just transmitted.
    pub fn record_sent(&mut self) {
        self.next_index += 1;
    }

    /// Process a cumulative ACK and update the congestion window.
    pub fn on_ack(&mut self, ack: i64, chunks: &[Chunk]) -> RenoAck {
        if ack > self.last_ack {
            self.dup_acks = 0;
            self.last_ack = ack;

            let start = self.base;
            while self.base < self.next_index && chunks[self.base].end_offset() <= ack {
                self.base += 1;
            }

            if self.cwnd < self.ssthresh {
                self.cwnd += 1.0; // slow start
            } else {
                self.cwnd += 1.0 / self.ssthresh; // congestion avoidance
            }

            RenoAck::Advanced {
                newly_acked: start..self.base,
            }
        } else if ack == self.last_ack {
            self.dup_acks += 1;
            if self.dup_acks == DUP_ACK_THRESHOLD {
                self.ssthresh = (self.cwnd / 2.0).floor().max(1.0);
                self.cwnd = self.ssthresh + 3.0;
                self.dup_acks = 0;
                RenoAck::FastRetransmit
            } else {
                RenoAck::Duplicate {
                    count: self.dup_acks,
                }
            }
        } else {
            RenoAck::Stale
        }
    }

    /// Timeout: full reset to slow start.
    ///
    /// Rewinds `next_index` to `base` so the send loop retransmits the whole
    /// unacknowledged range on subsequent cycles; the caller additionally
    /// resends the chunk at `base` immediately.
    pub fn on_timeout(&mut self) {
        self.ssthresh = (self.cwnd / 2.0).floor().max(1.0);
        self.cwnd = 1.0;
        self.next_index = self.base;
    }

    /// `true` once every chunk has been acknowledged.
    pub fn is_complete(&self, total_chunks: usize) -> bool {
        self.base >= total_chunks
    }
}

impl Default for RenoSender {
    fn default() -> Self {
        Self::new()
    }
}
