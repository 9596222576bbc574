//! Stop-and-Wait send-side state machine.
//!
//! [`StopWaitSender`] tracks the single chunk allowed in flight.  It does
//! **not** touch the socket; [`crate::session`] calls these methods and
//! owns the actual send/receive loop.
//!
//! # Stop-and-Wait contract
//! - At most **one** chunk is in flight at any moment (window fixed at 1).
//! - On a cumulative ACK covering the in-flight chunk: advance to the next
//!   chunk and return to `Idle`.
//! - On timeout or a non-covering ACK: resend the *same* packet without
//!   advancing.

use crate::chunk::Chunk;

/// The two states of the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopWaitState {
    /// No chunk in flight; the next chunk may be sent.
    Idle,
    /// The chunk at the current index has been sent and awaits its ACK.
    AwaitingAck,
}

/// Stop-and-wait send-side state for one session.
#[derive(Debug)]
pub struct StopWaitSender {
    /// Index of the chunk currently being delivered.
    pub index: usize,
    state: StopWaitState,
}

impl StopWaitSender {
    pub fn new() -> Self {
        Self {
            index: 0,
            state: StopWaitState::Idle,
        }
    }

    pub fn state(&self) -> StopWaitState {
        self.state
    }

    /// Mark the current chunk as sent (first transmission or retransmission).
    pub fn record_sent(&mut self) {
        self.state = StopWaitState::AwaitingAck;
    }

    /// Process a cumulative ACK against the in-flight `chunk`.
    ///
    /// Returns `true` when `ack` covers the chunk's final byte; the machine
    /// advances to the next index and returns to `Idle`.  A duplicate or
    /// stale ACK leaves the state untouched and returns `false`.
    pub fn on_ack(&mut self, ack: i64, chunk: &Chunk) -> bool {
        if ack >= chunk.end_offset() {
            self.index += 1;
            self.state = StopWaitState::Idle;
            true
        } else {
            false
        }
    }

    /// `true` once every chunk has been acknowledged.
    pub fn is_complete(&self, total_chunks: usize) -> bool {
        self.index >= total_chunks
    }
}

impl Default for StopWaitSender {
    fn default() -> Self {
        Self::new()
    }
}
