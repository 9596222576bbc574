//! `arq-over-udp` — reliable, ordered file delivery over UDP with three
//! interchangeable sender-side ARQ strategies.
//!
//! # Architecture
//!
//! ```text
//!  ┌───────────┐  data packets   ┌────────────┐
//!  │  Session  │────────────────▶│  receiver  │  (collaborating endpoint,
//!  └────┬──────┘                 └─────┬──────┘   not implemented here)
//!       │       cumulative ACKs        │
//!       │◀──────────────────────────────┘
//!       │
//!  ┌────▼───────────────────────────────────┐
//!  │ StopWaitSender / FixedWindowSender /   │
//!  │ RenoSender  (pure window state)        │
//!  └────┬───────────────────────────────────┘
//!       │ raw UDP datagrams
//!  ┌────▼──────┐
//!  │ ArqSocket │  (thin async wrapper around tokio UdpSocket)
//!  └───────────┘
//! ```
//!
//! Each module has a single responsibility:
//! - [`packet`]    — wire format (serialise / deserialise)
//! - [`chunk`]     — file chunking into offset-tagged payloads
//! - [`clock`]     — injected time source for deterministic tests
//! - [`metrics`]   — per-session throughput / delay / score accounting
//! - [`stop_wait`] — Stop-and-Wait outbound state machine
//! - [`window`]    — fixed sliding-window (go-back-N) state machine
//! - [`reno`]      — Reno-style congestion-controlled state machine
//! - [`session`]   — strategy dispatch, send/receive loop, termination
//!   handshake
//! - [`socket`]    — async UDP socket abstraction

pub mod chunk;
pub mod clock;
pub mod metrics;
pub mod packet;
pub mod reno;
pub mod session;
pub mod socket;
pub mod stop_wait;
pub mod window;
