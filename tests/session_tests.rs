//! End-to-end session tests.
//!
//! Each test spins up the sender session and an in-process receiver
//! endpoint talking over the loopback interface, spawned as separate tokio
//! tasks.  The receiver implements the collaborator contract: it emits a
//! cumulative acknowledgement (4-byte header, sequence number = highest
//! contiguous byte offset received) after each data packet, and
//! participates in the EOF → ACK/FIN → FINACK exchange.
//!
//! Loss is simulated on the receiver side by ignoring selected data-packet
//! arrivals, which is indistinguishable from in-network loss as far as the
//! sender is concerned.

use std::io::Cursor;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use arq_over_udp::chunk::{Chunk, ChunkSource};
use arq_over_udp::clock::ManualClock;
use arq_over_udp::packet::Packet;
use arq_over_udp::session::{Session, Strategy};
use arq_over_udp::socket::ArqSocket;

/// Short timeout so loss-recovery tests finish quickly, but long enough
/// that a healthy loopback exchange never trips it.
const TEST_RTO: Duration = Duration::from_millis(150);

/// Bind a socket to an OS-assigned port on loopback.
async fn ephemeral() -> ArqSocket {
    let addr = "127.0.0.1:0".parse().unwrap();
    ArqSocket::bind(addr).await.expect("bind failed")
}

/// Deterministic test payload.
fn make_data(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

fn make_chunks(data: &[u8], capacity: usize) -> Vec<Chunk> {
    ChunkSource::new(Cursor::new(data.to_vec()), capacity)
        .collect::<std::io::Result<Vec<_>>>()
        .unwrap()
}

// ---------------------------------------------------------------------------
// Test receiver
// ---------------------------------------------------------------------------

/// Which data-packet arrivals the receiver pretends never happened.
enum Faults {
    None,
    /// Ignore the Nth data-packet arrival (1-based), once.
    DropArrival(usize),
    /// Ignore each data-packet arrival with probability `rate` (seeded, so
    /// failures reproduce).
    Random { rate: f64, seed: u64 },
}

/// What the receiver observed over the whole session.
struct ReceiverLog {
    /// In-order reassembled payload bytes.
    data: Vec<u8>,
    /// Total data-packet arrivals, including dropped and out-of-order ones.
    data_arrivals: usize,
    saw_eof: bool,
    saw_finack: bool,
}

/// Run the collaborator endpoint until the FINACK sentinel arrives.
async fn run_receiver(socket: ArqSocket, faults: Faults) -> ReceiverLog {
    let mut rng = match faults {
        Faults::Random { seed, .. } => Some(StdRng::seed_from_u64(seed)),
        _ => None,
    };

    let mut log = ReceiverLog {
        data: Vec::new(),
        data_arrivals: 0,
        saw_eof: false,
        saw_finack: false,
    };
    let mut rcv_nxt: i64 = 0;

    loop {
        let (pkt, addr) = socket.recv_from().await.expect("receiver recv");

        if pkt.is_finack() {
            log.saw_finack = true;
            break;
        }

        if pkt.payload.is_empty() {
            // EOF marker: reply with the final cumulative ACK, then FIN.
            log.saw_eof = true;
            let ack = Packet::data(rcv_nxt as i32, vec![]);
            socket.send_to(&ack, addr).await.expect("final ack");
            let fin = Packet::data(rcv_nxt as i32, vec![]);
            socket.send_to(&fin, addr).await.expect("fin");
            continue;
        }

        log.data_arrivals += 1;
        let dropped = match &faults {
            Faults::None => false,
            Faults::DropArrival(n) => log.data_arrivals == *n,
            Faults::Random { rate, .. } => rng.as_mut().unwrap().random::<f64>() < *rate,
        };
        if dropped {
            continue;
        }

        // Accept only the in-order chunk; everything is (re-)ACKed
        // cumulatively either way.
        if i64::from(pkt.seq) == rcv_nxt {
            rcv_nxt += pkt.payload.len() as i64;
            log.data.extend_from_slice(&pkt.payload);
        }
        let ack = Packet::data(rcv_nxt as i32, vec![]);
        socket.send_to(&ack, addr).await.expect("ack");
    }

    log
}

/// Run one full session against a scripted receiver and return
/// `(receiver_log, sender_report)`.
async fn transfer(
    strategy: Strategy,
    data: &[u8],
    capacity: usize,
    faults: Faults,
) -> (ReceiverLog, arq_over_udp::metrics::SessionReport) {
    let recv_sock = ephemeral().await;
    let recv_addr = recv_sock.local_addr;
    let receiver = tokio::spawn(run_receiver(recv_sock, faults));

    let chunks = make_chunks(data, capacity);
    let send_sock = ephemeral().await;
    let session = Session::new(send_sock, recv_addr, TEST_RTO);
    let report = session.run(strategy, &chunks).await.expect("session run");

    let log = receiver.await.expect("receiver task");
    (log, report)
}

// ---------------------------------------------------------------------------
// Stop-and-Wait
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stop_and_wait_delivers_file_intact() {
    let data = make_data(5 * 64 + 17); // 6 chunks, last one short
    let (log, report) = transfer(Strategy::StopAndWait, &data, 64, Faults::None).await;

    assert_eq!(log.data, data);
    assert!(log.saw_eof);
    assert!(log.saw_finack);
    assert_eq!(log.data_arrivals, 6); // exactly one send per chunk
    assert!(report.throughput > 0.0);
    assert!(report.avg_delay > 0.0);
}

#[tokio::test]
async fn stop_and_wait_recovers_from_a_dropped_packet() {
    let data = make_data(4 * 64);
    // The second data packet is lost; the sender must retransmit it before
    // any later chunk is acknowledged.
    let (log, _) = transfer(Strategy::StopAndWait, &data, 64, Faults::DropArrival(2)).await;

    assert_eq!(log.data, data);
    // 4 first sends plus at least the one retransmission.
    assert!(log.data_arrivals >= 5);
}

// ---------------------------------------------------------------------------
// Fixed sliding window
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fixed_window_delivers_more_chunks_than_window() {
    let data = make_data(120 * 32);
    let strategy = Strategy::FixedWindow { window_size: 50 };
    let (log, report) = transfer(strategy, &data, 32, Faults::None).await;

    assert_eq!(log.data, data);
    assert!(log.saw_finack);
    assert!(report.throughput > 0.0);
}

#[tokio::test]
async fn fixed_window_goes_back_n_after_loss() {
    let data = make_data(8 * 64);
    let strategy = Strategy::FixedWindow { window_size: 4 };
    // Losing the third arrival forces at least one go-back-N retransmission
    // of the in-flight window.
    let (log, _) = transfer(strategy, &data, 64, Faults::DropArrival(3)).await;

    assert_eq!(log.data, data);
    assert!(log.data_arrivals > 8);
}

// ---------------------------------------------------------------------------
// Reno
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reno_delivers_file_intact() {
    let data = make_data(40 * 32 + 5);
    let (log, report) = transfer(Strategy::Reno, &data, 32, Faults::None).await;

    assert_eq!(log.data, data);
    assert!(log.saw_eof);
    assert!(log.saw_finack);
    assert!(report.throughput > 0.0);
}

#[tokio::test]
async fn reno_survives_random_loss() {
    let data = make_data(30 * 32);
    let faults = Faults::Random {
        rate: 0.25,
        seed: 7,
    };
    let (log, _) = transfer(Strategy::Reno, &data, 32, faults).await;

    // Heavy loss costs retransmissions but never data integrity.
    assert_eq!(log.data, data);
    assert!(log.data_arrivals > 30);
}

// ---------------------------------------------------------------------------
// Termination handshake
// ---------------------------------------------------------------------------

#[tokio::test]
async fn zero_byte_file_sends_only_eof_and_completes() {
    let (log, report) = transfer(Strategy::StopAndWait, &[], 64, Faults::None).await;

    assert!(log.data.is_empty());
    assert_eq!(log.data_arrivals, 0); // no data packet at all
    assert!(log.saw_eof);
    assert!(log.saw_finack);
    // Nothing was acknowledged, so the delay list is empty.
    assert_eq!(report.avg_delay, 0.0);
    assert!(report.performance.is_infinite());
}

#[tokio::test]
async fn session_tolerates_silent_receiver_during_handshake() {
    // A receiver that ACKs data but never answers the EOF: the sender's
    // handshake waits time out, yet the session still completes and
    // reports metrics.
    let recv_sock = ephemeral().await;
    let recv_addr = recv_sock.local_addr;

    let receiver = tokio::spawn(async move {
        let mut rcv_nxt: i64 = 0;
        loop {
            let (pkt, addr) = recv_sock.recv_from().await.expect("recv");
            if pkt.is_finack() {
                break;
            }
            if pkt.payload.is_empty() {
                continue; // ignore EOF: no final ACK, no FIN
            }
            if i64::from(pkt.seq) == rcv_nxt {
                rcv_nxt += pkt.payload.len() as i64;
            }
            let ack = Packet::data(rcv_nxt as i32, vec![]);
            recv_sock.send_to(&ack, addr).await.expect("ack");
        }
        rcv_nxt
    });

    let data = make_data(3 * 64);
    let chunks = make_chunks(&data, 64);
    let session = Session::new(ephemeral().await, recv_addr, TEST_RTO);
    let report = session.run(Strategy::StopAndWait, &chunks).await.unwrap();

    assert!(report.throughput > 0.0);
    assert_eq!(receiver.await.unwrap(), data.len() as i64);
}

// ---------------------------------------------------------------------------
// Injected clock
// ---------------------------------------------------------------------------

#[tokio::test]
async fn frozen_clock_reports_zero_elapsed() {
    let recv_sock = ephemeral().await;
    let recv_addr = recv_sock.local_addr;
    let receiver = tokio::spawn(run_receiver(recv_sock, Faults::None));

    let data = make_data(2 * 64);
    let chunks = make_chunks(&data, 64);
    let session = Session::with_clock(
        ephemeral().await,
        recv_addr,
        TEST_RTO,
        Box::new(ManualClock::new()),
    );
    let report = session.run(Strategy::StopAndWait, &chunks).await.unwrap();

    // The clock never moved: zero elapsed time, zero measured delay.
    assert_eq!(report.throughput, 0.0);
    assert_eq!(report.avg_delay, 0.0);

    let log = receiver.await.unwrap();
    assert_eq!(log.data, data);
}
