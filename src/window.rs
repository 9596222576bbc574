//! Fixed sliding-window send-side state machine (go-back-N).
//!
//! [`FixedWindowSender`] maintains up to `window_size` in-flight chunks.
//! Unlike stop-and-wait, multiple chunks may be outstanding simultaneously.
//!
//! # Protocol contract
//!
//! - Invariant: `base <= next_index` and `next_index - base <= window_size`.
//! - ACKs are **cumulative**: an acknowledgement of `K` means the receiver
//!   has accepted all bytes up to (but not including) offset `K`; the
//!   window slides past every chunk whose end offset is `<= K`.
//! - On timeout, the caller retransmits **all** chunks in
//!   `[base, next_index)` — a single loss costs the whole in-flight window
//!   (go back to N).
//!
//! This module only manages indices; all socket I/O and metric recording is
//! the caller's responsibility.
//!
//! # Index layout
//!
//! ```text
//!     base           next_index
//!      │                  │
//!  ────┼──────────────────┼──────────────────▶ chunk index
//!      │ <── in flight ──▶│ <── unsent ─────▶
//! ```

use std::ops::Range;

use crate::chunk::Chunk;

/// Default window size, in packets.
pub const DEFAULT_WINDOW_SIZE: usize = 100;

/// Fixed sliding-window send-side state for one session.
#[derive(Debug)]
pub struct FixedWindowSender {
    /// Index of the first unacknowledged chunk (left window edge).
    pub base: usize,
    /// Index of the next chunk to send.
    pub next_index: usize,
    window_size: usize,
}

impl FixedWindowSender {
    /// `window_size` is the maximum number of in-flight chunks (≥ 1).
    pub fn new(window_size: usize) -> Self {
        assert!(window_size >= 1, "window_size must be at least 1");
        Self {
            base: 0,
            next_index: 0,
            window_size,
        }
    }

    /// Number of chunks currently awaiting acknowledgement.
    pub fn in_flight(&self) -> usize {
        self.next_index - self.base
    }

    /// `true` while an unsent chunk exists and the window has room.
    pub fn can_send(&self, total_chunks: usize) -> bool {
        self.next_index < total_chunks && self.in_flight() < self.window_size
    }

    /// Advance `next_index` past the chunk just transmitted.
    pub fn record_sent(&mut self) {
        debug_assert!(
            self.in_flight() < self.window_size,
            "record_sent called on a full window ({} / {})",
            self.in_flight(),
            self.window_size
        );
        self.next_index += 1;
    }

    /// Process a cumulative ACK.
    ///
    /// Slides `base` past every in-flight chunk whose end offset is covered
    /// by `ack` and returns the range of newly acknowledged indices (empty
    /// for a duplicate or stale ACK).  `base` never passes `next_index`, so
    /// an ACK claiming bytes that were never sent cannot break the window
    /// invariant.
    pub fn on_ack(&mut self, ack: i64, chunks: &[Chunk]) -> Range<usize> {
        let start = self.base;
        while self.base < self.next_index && chunks[self.base].end_offset() <= ack {
            self.base += 1;
        }
        start..self.base
    }

    /// Indices to retransmit after a timeout: the whole in-flight window.
    pub fn unacked_range(&self) -> Range<usize> {
        self.base..self.next_index
    }

    /// `true` once every chunk has been acknowledged.
    pub fn is_complete(&self, total_chunks: usize) -> bool {
        self.base >= total_chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Contiguous chunks of `len` bytes each.
    fn chunks(count: usize, len: usize) -> Vec<Chunk> {
        (0..count)
            .map(|i| Chunk {
                offset: (i * len) as u32,
                payload: vec![0u8; len],
            })
            .collect()
    }

    #[test]
    fn fills_window_then_blocks() {
        let cs = chunks(10, 100);
        let mut w = FixedWindowSender::new(3);

        while w.can_send(cs.len()) {
            w.record_sent();
        }
        assert_eq!(w.in_flight(), 3);
        assert_eq!(w.next_index, 3);
        assert!(!w.can_send(cs.len()));
    }

    #[test]
    fn in_flight_never_exceeds_window_size() {
        let cs = chunks(50, 100);
        let mut w = FixedWindowSender::new(4);

        // Alternate bursts and single-chunk ACKs; the bound must hold
        // throughout.
        for round in 0..20 {
            while w.can_send(cs.len()) {
                w.record_sent();
                assert!(w.in_flight() <= 4);
            }
            let ack = cs[round].end_offset();
            w.on_ack(ack, &cs);
            assert!(w.base <= w.next_index);
        }
    }

    #[test]
    fn cumulative_ack_slides_multiple_chunks() {
        let cs = chunks(5, 100);
        let mut w = FixedWindowSender::new(5);
        for _ in 0..5 {
            w.record_sent();
        }

        // One ACK covering the first three chunks.
        let acked = w.on_ack(300, &cs);
        assert_eq!(acked, 0..3);
        assert_eq!(w.base, 3);
        assert_eq!(w.in_flight(), 2);
    }

    #[test]
    fn duplicate_ack_slides_nothing() {
        let cs = chunks(3, 100);
        let mut w = FixedWindowSender::new(3);
        for _ in 0..3 {
            w.record_sent();
        }

        assert_eq!(w.on_ack(100, &cs), 0..1);
        let dup = w.on_ack(100, &cs);
        assert!(dup.is_empty());
        assert_eq!(w.base, 1);
    }

    #[test]
    fn ack_beyond_next_index_cannot_break_invariant() {
        let cs = chunks(10, 100);
        let mut w = FixedWindowSender::new(4);
        w.record_sent();
        w.record_sent();

        // Spurious ACK for bytes never sent: slides only through in-flight.
        w.on_ack(10_000, &cs);
        assert_eq!(w.base, 2);
        assert_eq!(w.base, w.next_index);
    }

    #[test]
    fn timeout_range_covers_exactly_the_in_flight_window() {
        let cs = chunks(10, 100);
        let mut w = FixedWindowSender::new(5);
        for _ in 0..5 {
            w.record_sent();
        }
        w.on_ack(200, &cs); // base = 2

        assert_eq!(w.unacked_range(), 2..5);
    }

    #[test]
    fn complete_when_base_reaches_total() {
        let cs = chunks(2, 100);
        let mut w = FixedWindowSender::new(2);
        w.record_sent();
        w.record_sent();
        w.on_ack(200, &cs);
        assert!(w.is_complete(2));
    }
}
