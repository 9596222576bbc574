//! Entry point for `arq-over-udp`.
//!
//! Parses CLI arguments, loads the file into chunks, and runs one sender
//! session under the selected reliability strategy.  All protocol work is
//! delegated to library modules; `main.rs` owns only process setup
//! (logging, argument parsing) and the single line of metrics output.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};

use arq_over_udp::chunk::load_chunks;
use arq_over_udp::session::{Session, Strategy};
use arq_over_udp::socket::ArqSocket;
use arq_over_udp::window::DEFAULT_WINDOW_SIZE;

/// Reliable file delivery over UDP.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// File to deliver.
    file: PathBuf,

    /// Reliability strategy.
    #[arg(short, long, value_enum, default_value = "stop-and-wait")]
    strategy: StrategyArg,

    /// Destination IP address.
    #[arg(long, default_value = "127.0.0.1")]
    dest: IpAddr,

    /// Destination port.
    #[arg(long, default_value_t = 5001)]
    dest_port: u16,

    /// Local port to bind.
    #[arg(long, default_value_t = 5002)]
    bind_port: u16,

    /// Retransmission timeout in milliseconds.
    #[arg(long, default_value_t = 500)]
    timeout_ms: u64,

    /// Window size for the fixed-window strategy, in packets.
    #[arg(long, default_value_t = DEFAULT_WINDOW_SIZE)]
    window_size: usize,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    /// One packet in flight at a time.
    StopAndWait,
    /// Bounded sliding window with go-back-N recovery.
    FixedWindow,
    /// Reno-style congestion control.
    Reno,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise env_logger; set RUST_LOG to control verbosity.
    env_logger::init();

    let cli = Cli::parse();

    let strategy = match cli.strategy {
        StrategyArg::StopAndWait => Strategy::StopAndWait,
        StrategyArg::FixedWindow => Strategy::FixedWindow {
            window_size: cli.window_size,
        },
        StrategyArg::Reno => Strategy::Reno,
    };

    let chunks = load_chunks(&cli.file)
        .with_context(|| format!("failed to read {}", cli.file.display()))?;

    let bind: SocketAddr = SocketAddr::from(([0, 0, 0, 0], cli.bind_port));
    let peer = SocketAddr::from((cli.dest, cli.dest_port));
    let socket = ArqSocket::bind(bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;

    let session = Session::new(socket, peer, Duration::from_millis(cli.timeout_ms));
    let report = session
        .run(strategy, &chunks)
        .await
        .context("transfer failed")?;

    println!("{report}");
    Ok(())
}
