//! Sending half of the protocol.
//!
//! Performs the three-way handshake, slices the source file into
//! fixed-size chunks, then drives a Go-Back-N sliding window: keep up to
//! `window_size` packets in flight, slide the base on cumulative acks, and
//! on timeout resend every unacked packet in the window. Consecutive
//! timeouts without forward progress are bounded by `max_retries`.

use std::collections::HashMap;
use std::fs;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::path::Path;
use std::time::Duration;

use crate::cancel::CancelToken;
use crate::error::TransferError;
use crate::frame::Frame;
use crate::log::Logger;
use crate::session::{self, SessionParams};

/// Tunables for one outgoing transfer.
#[derive(Debug, Clone)]
pub struct SenderConfig {
    /// Destination host, dotted quad or hostname.
    pub dest_addr: String,
    pub port: u16,
    /// Socket-read timeout for both the handshake and the data phase.
    pub timeout: Duration,
    /// Consecutive timeouts tolerated before the transfer is abandoned.
    pub max_retries: u32,
    /// Payload bytes per data packet, one of `session::PACKET_SIZES`.
    pub packet_size: usize,
    /// Unacked packets allowed in flight; 1 gives stop-and-wait.
    pub window_size: usize,
}

impl Default for SenderConfig {
    fn default() -> Self {
        SenderConfig {
            dest_addr: "127.0.0.1".to_string(),
            port: session::DEFAULT_PORT,
            timeout: session::DEFAULT_TIMEOUT,
            max_retries: session::DEFAULT_MAX_RETRIES,
            packet_size: session::DEFAULT_PACKET_SIZE,
            window_size: session::DEFAULT_WINDOW_SIZE,
        }
    }
}

/// Sliding-window bookkeeping for the data phase.
struct WindowState {
    /// The file, sliced into `packet_size` pieces; the last may be shorter.
    chunks: Vec<Vec<u8>>,
    /// Index of the first unacked chunk.
    base_chunk: usize,
    /// Index of the next chunk to put on the wire.
    next_chunk: usize,
    /// Consecutive timeouts since the window last moved forward.
    retries: u32,
    /// Encoded packets currently in flight, keyed by sequence number.
    sent_packets: HashMap<u64, Vec<u8>>,
}

/// Transmits `path` to the receiver named by `config`.
///
/// Blocks until the transfer finishes or dies. Cancellation is observed
/// between iterations of the sending loop.
pub fn send_file(
    path: impl AsRef<Path>,
    config: &SenderConfig,
    logger: &Logger,
    cancel: &CancelToken,
) -> Result<(), TransferError> {
    let path = path.as_ref();
    logger.log(format!(
        "Initializing connection to {}:{}...",
        config.dest_addr, config.port
    ));

    if !path.is_file() {
        return Err(TransferError::FileNotFound(path.to_path_buf()));
    }

    let dest = resolve(&config.dest_addr, config.port)?;
    let socket = UdpSocket::bind("0.0.0.0:0")?;
    socket.set_read_timeout(Some(config.timeout))?;
    session::widen_socket_buffers(&socket)?;

    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let filesize = fs::metadata(path)?.len();
    let mut params = SessionParams {
        filename,
        filesize,
        packet_size: config.packet_size,
        window_size: config.window_size,
        start_seq: 0,
    };
    logger.log(format!(
        "Preparing to send '{}' ({} bytes) to {}",
        params.filename, params.filesize, dest
    ));

    params.start_seq = handshake(&socket, dest, &params, logger)?;

    let chunks = read_chunks(path, config.packet_size)?;
    transmit(&socket, dest, &params, chunks, config, logger, cancel)?;

    socket.send_to(&Frame::End.encode(), dest)?;
    logger.log("File sent successfully!");
    Ok(())
}

fn resolve(host: &str, port: u16) -> Result<SocketAddr, TransferError> {
    let mut addrs = (host, port).to_socket_addrs()?;
    addrs
        .next()
        .ok_or_else(|| TransferError::Io(std::io::Error::other(format!("cannot resolve {}", host))))
}

/// SYN → SYN-ACK → ACK. Returns the starting sequence number the receiver
/// chose. The SYN goes out exactly once; the first timeout is fatal.
fn handshake(
    socket: &UdpSocket,
    dest: SocketAddr,
    params: &SessionParams,
    logger: &Logger,
) -> Result<u64, TransferError> {
    let syn = Frame::Syn {
        filename: &params.filename,
        filesize: params.filesize,
        packet_size: params.packet_size,
        window_size: params.window_size,
    }
    .encode();
    socket.send_to(&syn, dest)?;
    logger.log("SYN sent");

    let mut buf = [0u8; session::HANDSHAKE_BUF];
    let n = match socket.recv_from(&mut buf) {
        Ok((n, _)) => n,
        Err(e) if session::is_timeout(&e) => {
            return Err(TransferError::HandshakeTimeout { expected: "SYN-ACK" })
        }
        Err(e) => return Err(e.into()),
    };

    let start_seq = match Frame::parse(&buf[..n]) {
        Some(Frame::SynAck { start_seq }) => start_seq,
        _ => return Err(TransferError::HandshakeRejected),
    };
    logger.log(format!("SYN-ACK received, start_seq={}", start_seq));

    socket.send_to(&Frame::HandshakeAck { start_seq }.encode(), dest)?;
    logger.log("ACK sent, handshake complete");
    Ok(start_seq)
}

/// Reads the whole file up front so any chunk can be retransmitted later.
fn read_chunks(path: &Path, packet_size: usize) -> Result<Vec<Vec<u8>>, TransferError> {
    let data = fs::read(path)?;
    Ok(data.chunks(packet_size).map(<[u8]>::to_vec).collect())
}

/// The SENDING loop: fill the window, wait for one ack or a timeout, and
/// either slide forward or go back N.
fn transmit(
    socket: &UdpSocket,
    dest: SocketAddr,
    params: &SessionParams,
    chunks: Vec<Vec<u8>>,
    config: &SenderConfig,
    logger: &Logger,
    cancel: &CancelToken,
) -> Result<(), TransferError> {
    let total = chunks.len();
    let mut state = WindowState {
        chunks,
        base_chunk: 0,
        next_chunk: 0,
        retries: 0,
        sent_packets: HashMap::new(),
    };

    while state.base_chunk < total {
        if cancel.is_cancelled() {
            return Err(TransferError::Cancelled);
        }

        fill_window(socket, dest, params, &mut state, config.window_size, logger)?;

        let mut buf = [0u8; session::ACK_BUF];
        match socket.recv_from(&mut buf) {
            Ok((n, _)) => {
                if let Some(Frame::Ack { seq }) = Frame::parse(&buf[..n]) {
                    apply_ack(&mut state, params, seq, logger);
                }
                // anything else on the wire is dropped
            }
            Err(e) if session::is_timeout(&e) => {
                state.retries += 1;
                if state.retries >= config.max_retries {
                    logger.log(format!(
                        "No ack after {} consecutive timeouts, giving up",
                        state.retries
                    ));
                    return Err(TransferError::RetriesExhausted {
                        retries: state.retries,
                    });
                }
                logger.log(format!(
                    "Timeout waiting for ack, retransmitting window (chunks {} to {}) [retry {}]",
                    state.base_chunk,
                    state.next_chunk - 1,
                    state.retries
                ));
                retransmit_window(socket, dest, params, &mut state, logger)?;
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Emits new packets until the window is full or the file is exhausted.
fn fill_window(
    socket: &UdpSocket,
    dest: SocketAddr,
    params: &SessionParams,
    state: &mut WindowState,
    window_size: usize,
    logger: &Logger,
) -> Result<(), TransferError> {
    while state.next_chunk < state.chunks.len()
        && state.next_chunk - state.base_chunk < window_size
    {
        let seq = params.start_seq + state.next_chunk as u64;
        let packet = Frame::Data {
            seq,
            payload: &state.chunks[state.next_chunk],
        }
        .encode();
        socket.send_to(&packet, dest)?;
        logger.log(format!(
            "Sent packet {} (window chunks {}-{})",
            seq,
            state.base_chunk,
            state.base_chunk + window_size - 1
        ));
        state.sent_packets.insert(seq, packet);
        state.next_chunk += 1;
    }
    Ok(())
}

/// Applies one cumulative ack: `ack n` covers every sequence `<= n`. A
/// stale, duplicate, or negative ack never moves the window backward.
fn apply_ack(state: &mut WindowState, params: &SessionParams, ack_num: i64, logger: &Logger) {
    let ack_index = ack_num - params.start_seq as i64;
    if ack_index >= state.base_chunk as i64 {
        state.base_chunk = ack_index as usize + 1;
        state.retries = 0;
        logger.log(format!(
            "Ack {} received, window base advanced to chunk {}",
            ack_num, state.base_chunk
        ));
        state.sent_packets.retain(|&seq, _| seq as i64 > ack_num);
    }
}

/// Go-Back-N: everything in `[base_chunk, next_chunk)` goes out again in
/// ascending sequence order.
fn retransmit_window(
    socket: &UdpSocket,
    dest: SocketAddr,
    params: &SessionParams,
    state: &mut WindowState,
    logger: &Logger,
) -> Result<(), TransferError> {
    for chunk_idx in state.base_chunk..state.next_chunk {
        let seq = params.start_seq + chunk_idx as u64;
        if let Some(packet) = state.sent_packets.get(&seq) {
            socket.send_to(packet, dest)?;
            logger.log(format!("Resent packet {}", seq));
        } else {
            // Rebuild if the packet is somehow missing from the store.
            let packet = Frame::Data {
                seq,
                payload: &state.chunks[chunk_idx],
            }
            .encode();
            socket.send_to(&packet, dest)?;
            state.sent_packets.insert(seq, packet);
            logger.log(format!("Resent rebuilt packet {}", seq));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(start_seq: u64) -> SessionParams {
        SessionParams {
            filename: "f".to_string(),
            filesize: 12,
            packet_size: 4,
            window_size: 2,
            start_seq,
        }
    }

    fn state(start_seq: u64, base: usize, next: usize) -> WindowState {
        let mut sent_packets = HashMap::new();
        for chunk_idx in base..next {
            let seq = start_seq + chunk_idx as u64;
            sent_packets.insert(seq, Frame::Data { seq, payload: b"data" }.encode());
        }
        WindowState {
            chunks: vec![b"data".to_vec(); 3],
            base_chunk: base,
            next_chunk: next,
            retries: 1,
            sent_packets,
        }
    }

    #[test]
    fn cumulative_ack_slides_base_and_evicts() {
        let mut st = state(0, 0, 2);
        apply_ack(&mut st, &params(0), 1, &Logger::disabled());
        assert_eq!(st.base_chunk, 2);
        assert_eq!(st.retries, 0);
        assert!(st.sent_packets.is_empty());
    }

    #[test]
    fn stale_ack_is_a_no_op() {
        let mut st = state(0, 0, 2);
        apply_ack(&mut st, &params(0), 0, &Logger::disabled());
        assert_eq!(st.base_chunk, 1);
        assert_eq!(st.sent_packets.keys().copied().collect::<Vec<_>>(), [1]);

        // the same ack again changes nothing
        apply_ack(&mut st, &params(0), 0, &Logger::disabled());
        assert_eq!(st.base_chunk, 1);
        assert_eq!(st.sent_packets.keys().copied().collect::<Vec<_>>(), [1]);
    }

    #[test]
    fn negative_ack_never_moves_the_window() {
        let mut st = state(0, 0, 2);
        st.retries = 3;
        apply_ack(&mut st, &params(0), -1, &Logger::disabled());
        assert_eq!(st.base_chunk, 0);
        assert_eq!(st.retries, 3);
        assert_eq!(st.sent_packets.len(), 2);
    }

    #[test]
    fn ack_is_interpreted_relative_to_start_seq() {
        let mut st = state(100, 0, 2);
        // start_seq 100: ack 100 covers chunk 0 only
        apply_ack(&mut st, &params(100), 100, &Logger::disabled());
        assert_eq!(st.base_chunk, 1);
        assert_eq!(st.sent_packets.keys().copied().collect::<Vec<_>>(), [101]);
    }
}
