//! Receiving half of the protocol.
//!
//! Binds the listen port, waits for a SYN, answers the handshake, then
//! writes strictly in-order data to the destination file. Duplicates are
//! re-acked, out-of-order packets are discarded with a re-ack of the last
//! in-order sequence, and a bare `END` closes the session. The receiver
//! never retransmits data; its only outbound traffic is acks and the one
//! SYN-ACK.

use std::fs::File;
use std::io::Write;
use std::net::{SocketAddr, UdpSocket};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cancel::CancelToken;
use crate::error::TransferError;
use crate::frame::Frame;
use crate::log::Logger;
use crate::session::{self, SessionParams};

/// Starting sequence number offered in the SYN-ACK.
const START_SEQ: u64 = 0;

/// Tunables for one incoming transfer.
#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    pub port: u16,
    /// Directory the incoming file lands in.
    pub save_dir: PathBuf,
    /// Socket-read timeout. Bounds the handshake-ACK wait; in the data
    /// phase a timeout is not fatal but lets the loop observe
    /// cancellation.
    pub timeout: Duration,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        ReceiverConfig {
            port: session::DEFAULT_PORT,
            save_dir: PathBuf::from("."),
            timeout: session::DEFAULT_TIMEOUT,
        }
    }
}

/// Receives one file and returns the path it was saved under.
///
/// Blocks until a session completes or dies. A partial file is left on
/// disk if the session dies mid-transfer.
pub fn receive_file(
    config: &ReceiverConfig,
    logger: &Logger,
    cancel: &CancelToken,
) -> Result<PathBuf, TransferError> {
    let socket = UdpSocket::bind(("0.0.0.0", config.port)).map_err(|source| {
        TransferError::BindFailed {
            port: config.port,
            source,
        }
    })?;
    socket.set_read_timeout(Some(config.timeout))?;
    session::widen_socket_buffers(&socket)?;

    logger.log(format!(
        "Receiver started on port {}, waiting for SYN...",
        config.port
    ));

    let (params, peer) = await_syn(&socket, logger, cancel)?;

    socket.send_to(&Frame::SynAck { start_seq: params.start_seq }.encode(), peer)?;
    logger.log("SYN-ACK sent");

    await_handshake_ack(&socket)?;
    logger.log("ACK received, handshake complete");

    let save_path = config.save_dir.join(&params.filename);
    logger.log(format!(
        "Handshake done, saving incoming file as '{}'",
        save_path.display()
    ));

    receive_data(&socket, &params, &save_path, logger, cancel)?;

    logger.log(format!(
        "File transfer completed, file saved as {}",
        save_path.display()
    ));
    Ok(save_path)
}

/// LISTENING: everything except a well-formed SYN is dropped until a
/// session opens.
fn await_syn(
    socket: &UdpSocket,
    logger: &Logger,
    cancel: &CancelToken,
) -> Result<(SessionParams, SocketAddr), TransferError> {
    let mut buf = [0u8; session::SYN_BUF];
    loop {
        if cancel.is_cancelled() {
            return Err(TransferError::Cancelled);
        }
        let (n, peer) = match socket.recv_from(&mut buf) {
            Ok(received) => received,
            Err(e) if session::is_timeout(&e) => continue,
            Err(e) => return Err(e.into()),
        };
        let Some(Frame::Syn {
            filename,
            filesize,
            packet_size,
            window_size,
        }) = Frame::parse(&buf[..n])
        else {
            continue;
        };
        // Only the final path component is honored; a SYN trying to climb
        // out of the save directory is dropped like any malformed frame.
        let Some(filename) = basename(filename) else {
            continue;
        };
        logger.log(format!(
            "SYN received for file '{}', size={}, window={} from {}",
            filename,
            filesize,
            window_size,
            peer.ip()
        ));
        let params = SessionParams {
            filename: filename.to_string(),
            filesize,
            packet_size,
            window_size,
            start_seq: START_SEQ,
        };
        return Ok((params, peer));
    }
}

fn basename(raw: &str) -> Option<&str> {
    Path::new(raw).file_name()?.to_str()
}

/// SYN_ACK_SENT: one timed wait for the handshake ACK.
fn await_handshake_ack(socket: &UdpSocket) -> Result<(), TransferError> {
    let mut buf = [0u8; session::ACK_BUF];
    let n = match socket.recv_from(&mut buf) {
        Ok((n, _)) => n,
        Err(e) if session::is_timeout(&e) => {
            return Err(TransferError::HandshakeTimeout { expected: "ACK" })
        }
        Err(e) => return Err(e.into()),
    };
    match Frame::parse(&buf[..n]) {
        Some(Frame::HandshakeAck { .. }) => Ok(()),
        _ => Err(TransferError::HandshakeRejected),
    }
}

/// RECEIVING: write in-order payloads, ack everything we can vouch for.
fn receive_data(
    socket: &UdpSocket,
    params: &SessionParams,
    save_path: &Path,
    logger: &Logger,
    cancel: &CancelToken,
) -> Result<(), TransferError> {
    let mut sink = File::create(save_path)?;
    let mut expected_seq = params.start_seq;
    let mut buf = vec![0u8; params.packet_size + session::RECV_SLACK];

    loop {
        if cancel.is_cancelled() {
            return Err(TransferError::Cancelled);
        }
        let (n, peer) = match socket.recv_from(&mut buf) {
            Ok(received) => received,
            // The receiver never gives up on its own; a quiet wire just
            // means another wait.
            Err(e) if session::is_timeout(&e) => continue,
            Err(e) => return Err(e.into()),
        };
        match Frame::parse(&buf[..n]) {
            Some(Frame::End) => return Ok(()),
            Some(Frame::Data { seq, payload }) => {
                logger.log(format!("Packet {} received from {}", seq, peer));
                if seq == expected_seq {
                    sink.write_all(payload)?;
                    expected_seq = seq + 1;
                    socket.send_to(&Frame::Ack { seq: seq as i64 }.encode(), peer)?;
                    logger.log(format!(
                        "In-order packet {} written, expected_seq is now {}",
                        seq, expected_seq
                    ));
                    logger.log(format!("Ack {} sent", seq));
                } else if seq < expected_seq {
                    // Duplicate: echo its own ack so the sender can move on.
                    socket.send_to(&Frame::Ack { seq: seq as i64 }.encode(), peer)?;
                    logger.log(format!("Duplicate packet {} received, re-acked", seq));
                } else {
                    // Gap ahead of us: drop the payload and restate the
                    // last in-order sequence.
                    let last_in_order = expected_seq as i64 - 1;
                    socket.send_to(&Frame::Ack { seq: last_in_order }.encode(), peer)?;
                    logger.log(format!(
                        "Out-of-order packet {} received, re-acked last in-order {}",
                        seq, last_in_order
                    ));
                }
            }
            // malformed datagrams and stray control frames are ignored
            _ => {}
        }
    }
}
