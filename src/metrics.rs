//! Per-session transfer metrics.
//!
//! [`SessionMetrics`] is owned by the driving session for the duration of
//! one transfer.  It records:
//! - the timestamp of each chunk's **first** send attempt (idempotent
//!   across retransmissions),
//! - the delay between that first send and the acknowledgement that slid
//!   the window past the chunk,
//! - the running count of acknowledged payload bytes.
//!
//! Send times live in a pre-sized `Vec<Option<Instant>>` indexed by chunk
//! index: chunk order is fixed, so offsets map 1:1 to indices and
//! "first write wins" needs no hashing.
//!
//! [`SessionMetrics::finalize`] consumes the collector exactly once, at
//! session end, producing a [`SessionReport`].  All timestamps are passed
//! in by the caller (taken from an injected [`crate::clock::Clock`]), so
//! the whole module is deterministic under test.

use std::fmt;
use std::time::{Duration, Instant};

/// Mutable metrics record for one in-progress session.
#[derive(Debug)]
pub struct SessionMetrics {
    started_at: Instant,
    total_acked_bytes: u64,
    /// First-send timestamp per chunk index; `None` until the chunk's first
    /// transmission.
    first_send: Vec<Option<Instant>>,
    delays: Vec<Duration>,
}

impl SessionMetrics {
    /// `total_chunks` sizes the send-time table; `started_at` anchors the
    /// elapsed-time measurement for throughput.
    pub fn new(total_chunks: usize, started_at: Instant) -> Self {
        Self {
            started_at,
            total_acked_bytes: 0,
            first_send: vec![None; total_chunks],
            delays: Vec::with_capacity(total_chunks),
        }
    }

    /// Record a send attempt for chunk `index` at `now`.
    ///
    /// Only the first call per index takes effect; retransmissions keep the
    /// original timestamp so measured delay spans every retry.
    pub fn record_send_attempt(&mut self, index: usize, now: Instant) {
        let slot = &mut self.first_send[index];
        if slot.is_none() {
            *slot = Some(now);
        }
    }

    /// Record that the window slid past chunk `index` at `now`.
    ///
    /// Called exactly once per chunk, at the moment `base` passes it; the
    /// chunk's payload length enters the acknowledged-byte count exactly
    /// once regardless of how many times it was retransmitted.
    pub fn record_acknowledged(&mut self, index: usize, payload_len: usize, now: Instant) {
        // A missing first-send timestamp would mean an ACK for a chunk that
        // was never transmitted; fall back to a zero delay rather than
        // corrupting the elapsed measurement.
        let sent_at = self.first_send[index].unwrap_or(now);
        self.delays.push(now.saturating_duration_since(sent_at));
        self.total_acked_bytes += payload_len as u64;
    }

    /// Bytes confirmed received so far.
    pub fn total_acked_bytes(&self) -> u64 {
        self.total_acked_bytes
    }

    /// Consume the collector and compute the final report as of `now`.
    pub fn finalize(self, now: Instant) -> SessionReport {
        let elapsed = now.saturating_duration_since(self.started_at).as_secs_f64();
        let throughput = if elapsed > 0.0 {
            self.total_acked_bytes as f64 / elapsed
        } else {
            0.0
        };

        let avg_delay = if self.delays.is_empty() {
            0.0
        } else {
            self.delays.iter().map(Duration::as_secs_f64).sum::<f64>() / self.delays.len() as f64
        };

        let performance = if avg_delay > 0.0 {
            0.3 * (throughput / 1000.0) + 0.7 / avg_delay
        } else {
            f64::INFINITY
        };

        SessionReport {
            throughput,
            avg_delay,
            performance,
        }
    }
}

/// Final per-session figures, produced once by [`SessionMetrics::finalize`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionReport {
    /// Acknowledged payload bytes per second over the whole session.
    pub throughput: f64,
    /// Mean first-send-to-acknowledgement delay, in seconds.
    pub avg_delay: f64,
    /// `0.3 * (throughput / 1000) + 0.7 / avg_delay`; infinite when no
    /// delays were recorded.
    pub performance: f64,
}

impl fmt::Display for SessionReport {
    /// The fixed program output: three floats, 7 decimal places,
    /// comma-and-space separated, no units.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.7}, {:.7}, {:.7}",
            self.throughput, self.avg_delay, self.performance
        )
    }
}
