//! Sender session: one file transfer under one reliability strategy.
//!
//! # Architecture
//!
//! ```text
//!  Application
//!      │  Session::run(strategy, chunks)
//!      ▼
//!  Session ──────────────┬──────────────────┬────────────────┐
//!    │ owns              │ drives one of    │ records into   │
//!    ▼                   ▼                  ▼                │
//!  ArqSocket       StopWaitSender     SessionMetrics         │
//!  (UDP datagrams) FixedWindowSender  (send times, delays)   │
//!                  RenoSender                                │
//!                        │                                   │
//!                        └── shared termination handshake ◀──┘
//!                            (EOF → ACK/FIN → FINACK)
//! ```
//!
//! Execution is sequential: one task drives one socket.  The only
//! suspension point is the bounded wait for an inbound datagram
//! ([`Session::recv_ack`]), which doubles as the retransmission timer — a
//! fixed timeout configured once at session construction and never adapted.
//!
//! Error taxonomy (who sees what):
//! - **Timeout** — recoverable; triggers the strategy's retransmission
//!   policy, never surfaced to the caller.
//! - **Malformed datagram** — logged and discarded; no state advances.
//! - **Transport I/O failure** — fatal; propagates as [`SessionError`] and
//!   aborts metric finalization.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use tokio::time;

use crate::chunk::Chunk;
use crate::clock::{Clock, WallClock};
use crate::metrics::{SessionMetrics, SessionReport};
use crate::packet::Packet;
use crate::reno::{RenoAck, RenoSender};
use crate::socket::{ArqSocket, SocketError};
use crate::stop_wait::StopWaitSender;
use crate::window::FixedWindowSender;

/// Default retransmission timeout.
pub const DEFAULT_RTO: Duration = Duration::from_millis(500);

/// Errors that abort a session.
///
/// Only transport-level failures land here; timeouts and malformed
/// datagrams are handled inside the session loop.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("transport failure: {0}")]
    Transport(#[from] SocketError),
}

/// Which reliability strategy drives the transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// One packet in flight at a time.
    StopAndWait,
    /// Bounded window with cumulative-ACK sliding and go-back-N recovery.
    FixedWindow { window_size: usize },
    /// Reno-style congestion control: slow start, congestion avoidance,
    /// fast retransmit, timeout reset.
    Reno,
}

/// One sender-side transfer session.
///
/// The session exclusively owns its transport endpoint; `run` consumes the
/// session, so the socket closes when the transfer (and handshake) is done.
pub struct Session {
    socket: ArqSocket,
    peer: SocketAddr,
    rto: Duration,
    clock: Box<dyn Clock>,
}

impl Session {
    /// A session using the real clock.  `rto` is the fixed retransmission
    /// timeout for every bounded wait in this session.
    pub fn new(socket: ArqSocket, peer: SocketAddr, rto: Duration) -> Self {
        Self::with_clock(socket, peer, rto, Box::new(WallClock))
    }

    /// A session reading time from an injected clock (used by tests).
    pub fn with_clock(
        socket: ArqSocket,
        peer: SocketAddr,
        rto: Duration,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            socket,
            peer,
            rto,
            clock,
        }
    }

    /// Deliver `chunks` under `strategy`, run the termination handshake,
    /// and report the session metrics.
    ///
    /// Every chunk is represented exactly once in the acknowledged-byte
    /// accounting by the time this returns `Ok`.
    pub async fn run(
        self,
        strategy: Strategy,
        chunks: &[Chunk],
    ) -> Result<SessionReport, SessionError> {
        let mut metrics = SessionMetrics::new(chunks.len(), self.clock.now());
        log::info!(
            "[session] start: {:?}, {} chunk(s), peer {}",
            strategy,
            chunks.len(),
            self.peer
        );

        match strategy {
            Strategy::StopAndWait => self.run_stop_and_wait(chunks, &mut metrics).await?,
            Strategy::FixedWindow { window_size } => {
                self.run_fixed_window(chunks, &mut metrics, window_size).await?
            }
            Strategy::Reno => self.run_reno(chunks, &mut metrics).await?,
        }

        self.terminate(chunks).await?;
        let report = metrics.finalize(self.clock.now());
        log::info!("[session] done: {report}");
        Ok(report)
    }

    // -----------------------------------------------------------------------
    // Strategy loops
    // -----------------------------------------------------------------------

    /// §Stop-and-Wait: exactly one outstanding packet at all times.
    async fn run_stop_and_wait(
        &self,
        chunks: &[Chunk],
        metrics: &mut SessionMetrics,
    ) -> Result<(), SessionError> {
        let mut sender = StopWaitSender::new();

        while let Some(chunk) = chunks.get(sender.index) {
            let index = sender.index;
            metrics.record_send_attempt(index, self.clock.now());

            loop {
                self.send_chunk(chunk).await?;
                sender.record_sent();
                log::debug!(
                    "[stop-wait] → DATA seq={} len={}",
                    chunk.offset,
                    chunk.payload.len()
                );

                match self.recv_ack().await? {
                    Some(ack) => {
                        if sender.on_ack(ack, chunk) {
                            metrics.record_acknowledged(
                                index,
                                chunk.payload.len(),
                                self.clock.now(),
                            );
                            log::debug!("[stop-wait] ← ACK {ack}");
                            break;
                        }
                        log::debug!("[stop-wait] ← stale ACK {ack}; resending");
                    }
                    None => {
                        log::debug!("[stop-wait] timeout; resending seq={}", chunk.offset);
                    }
                }
            }
        }
        Ok(())
    }

    /// §Fixed window: burst-fill the window, block for one ACK, slide or go
    /// back N.
    async fn run_fixed_window(
        &self,
        chunks: &[Chunk],
        metrics: &mut SessionMetrics,
        window_size: usize,
    ) -> Result<(), SessionError> {
        let mut sender = FixedWindowSender::new(window_size);
        let total = chunks.len();

        while !sender.is_complete(total) {
            // (a) send unsent chunks while the window has room, in offset order.
            while sender.can_send(total) {
                let i = sender.next_index;
                metrics.record_send_attempt(i, self.clock.now());
                self.send_chunk(&chunks[i]).await?;
                sender.record_sent();
                log::debug!(
                    "[window] → DATA seq={} in_flight={}",
                    chunks[i].offset,
                    sender.in_flight()
                );
            }

            // (b) one bounded wait for a cumulative ACK.
            match self.recv_ack().await? {
                // (c) slide base past every chunk the ACK covers.
                Some(ack) => {
                    let newly_acked = sender.on_ack(ack, chunks);
                    if !newly_acked.is_empty() {
                        let now = self.clock.now();
                        log::debug!("[window] ← ACK {ack} slid {} chunk(s)", newly_acked.len());
                        for i in newly_acked {
                            metrics.record_acknowledged(i, chunks[i].payload.len(), now);
                        }
                    } else {
                        log::debug!("[window] ← duplicate ACK {ack}");
                    }
                }
                // (d) go-back-N: resend the whole in-flight window without
                // touching the pointers or the first-send timestamps.
                None => {
                    let range = sender.unacked_range();
                    log::debug!("[window] timeout — resending {} chunk(s)", range.len());
                    for i in range {
                        self.send_chunk(&chunks[i]).await?;
                    }
                }
            }
        }
        Ok(())
    }

    /// §Reno: fixed-window sliding plus dynamic window sizing.
    async fn run_reno(
        &self,
        chunks: &[Chunk],
        metrics: &mut SessionMetrics,
    ) -> Result<(), SessionError> {
        let mut sender = RenoSender::new();
        let total = chunks.len();

        while !sender.is_complete(total) {
            while sender.can_send(total) {
                let i = sender.next_index;
                metrics.record_send_attempt(i, self.clock.now());
                self.send_chunk(&chunks[i]).await?;
                sender.record_sent();
                log::debug!(
                    "[reno] → DATA seq={} cwnd={:.2} in_flight={}",
                    chunks[i].offset,
                    sender.cwnd(),
                    sender.in_flight()
                );
            }

            match self.recv_ack().await? {
                Some(ack) => match sender.on_ack(ack, chunks) {
                    RenoAck::Advanced { newly_acked } => {
                        let now = self.clock.now();
                        log::debug!(
                            "[reno] ← ACK {ack} slid {} chunk(s) cwnd={:.2}",
                            newly_acked.len(),
                            sender.cwnd()
                        );
                        for i in newly_acked {
                            metrics.record_acknowledged(i, chunks[i].payload.len(), now);
                        }
                    }
                    RenoAck::FastRetransmit => {
                        log::debug!(
                            "[reno] 3 dup ACKs — fast retransmit seq={} cwnd={:.2} ssthresh={:.0}",
                            chunks[sender.base].offset,
                            sender.cwnd(),
                            sender.ssthresh()
                        );
                        self.send_chunk(&chunks[sender.base]).await?;
                    }
                    RenoAck::Duplicate { count } => {
                        log::debug!("[reno] ← dup ACK {ack} ({count})");
                    }
                    RenoAck::Stale => {}
                },
                None => {
                    sender.on_timeout();
                    log::debug!(
                        "[reno] timeout — slow-start restart, ssthresh={:.0}",
                        sender.ssthresh()
                    );
                    self.send_chunk(&chunks[sender.base]).await?;
                }
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Termination handshake (shared by all strategies)
    // -----------------------------------------------------------------------

    /// EOF → (ACK, FIN) → FINACK.
    ///
    /// Each inbound step is one timeout-bounded wait and is best-effort: a
    /// timeout here is tolerated, since data-plane completeness is already
    /// established.  The handshake exists for graceful shutdown, not
    /// reliability, and is not retried.
    async fn terminate(&self, chunks: &[Chunk]) -> Result<(), SessionError> {
        let total_bytes = chunks.last().map_or(0, Chunk::end_offset);
        self.socket
            .send_to(&Packet::eof(total_bytes as i32), self.peer)
            .await?;
        log::debug!("[session] → EOF seq={total_bytes}");

        match self.recv_ack().await? {
            Some(_) => {
                if self.recv_ack().await?.is_some() {
                    log::debug!("[session] ← final ACK and FIN");
                } else {
                    log::debug!("[session] ← final ACK; FIN timed out");
                }
            }
            None => log::debug!("[session] final ACK timed out"),
        }

        self.socket.send_to(&Packet::finack(), self.peer).await?;
        log::debug!("[session] → FINACK");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    async fn send_chunk(&self, chunk: &Chunk) -> Result<(), SessionError> {
        let pkt = Packet::data(chunk.offset as i32, chunk.payload.clone());
        self.socket.send_to(&pkt, self.peer).await?;
        Ok(())
    }

    /// One bounded wait for a cumulative acknowledgement.
    ///
    /// `Ok(None)` is the retransmission timeout.  Datagrams from other
    /// peers and datagrams too short to decode are discarded without
    /// consuming the wait; transport I/O failures abort the session.
    async fn recv_ack(&self) -> Result<Option<i64>, SessionError> {
        let wait = async {
            loop {
                match self.socket.recv_from().await {
                    Ok((pkt, addr)) => {
                        if addr != self.peer {
                            log::debug!("[session] ignoring datagram from {addr}");
                            continue;
                        }
                        return Ok(i64::from(pkt.seq));
                    }
                    Err(SocketError::Malformed(e)) => {
                        log::warn!("[session] discarding malformed datagram: {e}");
                    }
                    Err(e) => return Err(SessionError::Transport(e)),
                }
            }
        };
        match time::timeout(self.rto, wait).await {
            Ok(result) => result.map(Some),
            Err(_elapsed) => Ok(None),
        }
    }
}
