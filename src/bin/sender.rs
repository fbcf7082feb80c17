/*  Terminal front-end for the sending side: reads a local file and
    streams it to a listening receiver.
 */

use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use gbn_transfer::{send_file, session, CancelToken, Logger, SenderConfig};

/// Command line arguments parser for this application.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Destination IP address or hostname
    #[arg(short, long)]
    dest: String,

    /// Destination port
    #[arg(short, long, default_value_t = session::DEFAULT_PORT)]
    port: u16,

    /// File to send
    #[arg(short, long)]
    file: PathBuf,

    /// Socket timeout in seconds
    #[arg(short, long, default_value_t = 2, value_parser = clap::value_parser!(u64).range(1..=10))]
    timeout: u64,

    /// Consecutive timeouts tolerated before giving up
    #[arg(short = 'r', long, default_value_t = session::DEFAULT_MAX_RETRIES, value_parser = clap::value_parser!(u32).range(1..=10))]
    max_retries: u32,

    /// Payload bytes per packet
    #[arg(short = 's', long, default_value_t = session::DEFAULT_PACKET_SIZE, value_parser = parse_packet_size)]
    packet_size: usize,

    /// Packets per ack window; 1 gives stop-and-wait
    #[arg(short, long, default_value_t = session::DEFAULT_WINDOW_SIZE as u64, value_parser = clap::value_parser!(u64).range(1..=10))]
    window_size: u64,

    /// Print protocol events to stdout
    #[arg(short, long)]
    log: bool,
}

fn parse_packet_size(raw: &str) -> Result<usize, String> {
    let size: usize = raw
        .parse()
        .map_err(|_| format!("invalid packet size: {}", raw))?;
    if session::PACKET_SIZES.contains(&size) {
        Ok(size)
    } else {
        Err(format!("packet size must be one of {:?}", session::PACKET_SIZES))
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    println!(
        "Sending '{}' to {}:{}",
        args.file.display(),
        args.dest,
        args.port
    );

    let config = SenderConfig {
        dest_addr: args.dest,
        port: args.port,
        timeout: Duration::from_secs(args.timeout),
        max_retries: args.max_retries,
        packet_size: args.packet_size,
        window_size: args.window_size as usize,
    };
    let logger = if args.log {
        Logger::stdout()
    } else {
        Logger::disabled()
    };

    send_file(&args.file, &config, &logger, &CancelToken::new())?;

    println!("Transfer complete");
    Ok(())
}
