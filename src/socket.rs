//! Async UDP socket abstraction.
//!
//! [`ArqSocket`] is a thin wrapper around `tokio::net::UdpSocket` that
//! speaks [`crate::packet::Packet`] instead of raw bytes.  All protocol
//! logic lives elsewhere; this module owns only byte I/O.

use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::UdpSocket;

use crate::packet::{Packet, PacketError};

/// Receive buffer size; comfortably larger than any datagram we expect.
const MAX_DATAGRAM: usize = 65_535;

/// Errors that can arise from socket operations.
#[derive(Debug, Error)]
pub enum SocketError {
    /// Underlying I/O error from the OS.  Fatal for the session.
    #[error("socket I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The received datagram could not be decoded.  Recoverable — the
    /// caller discards the datagram and keeps waiting.
    #[error("packet decode error: {0}")]
    Malformed(#[from] PacketError),
}

/// An async, packet-oriented UDP socket.
///
/// All methods are `&self`; the session owns the socket exclusively for its
/// duration, so no locking is needed.
#[derive(Debug)]
pub struct ArqSocket {
    /// Address this socket is bound to (resolved after the OS assigns an
    /// ephemeral port when binding to port 0).
    pub local_addr: SocketAddr,
    inner: UdpSocket,
}

impl ArqSocket {
    /// Bind a new socket to `local_addr`.
    ///
    /// Passing port 0 lets the OS choose an ephemeral port.
    pub async fn bind(local_addr: SocketAddr) -> Result<Self, SocketError> {
        let inner = UdpSocket::bind(local_addr).await?;
        let local_addr = inner.local_addr()?;
        Ok(Self { local_addr, inner })
    }

    /// Encode `packet` and send it as a single UDP datagram to `dest`.
    pub async fn send_to(&self, packet: &Packet, dest: SocketAddr) -> Result<(), SocketError> {
        self.inner.send_to(&packet.encode(), dest).await?;
        Ok(())
    }

    /// Receive the next datagram and decode it into a [`Packet`].
    ///
    /// Returns `(packet, sender_address)`.  A datagram that fails to decode
    /// is returned as [`SocketError::Malformed`] — the caller decides
    /// whether to discard and retry.
    pub async fn recv_from(&self) -> Result<(Packet, SocketAddr), SocketError> {
        let mut buf = vec![0u8; MAX_DATAGRAM];
        let (n, addr) = self.inner.recv_from(&mut buf).await?;
        let packet = Packet::decode(&buf[..n])?;
        Ok((packet, addr))
    }
}
