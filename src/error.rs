use std::io;
use std::path::PathBuf;

/// Fatal session outcomes. Per-datagram trouble (malformed frames, stale
/// acks, duplicate or out-of-order data) is absorbed inside the state
/// machines and never surfaces here.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("could not bind UDP port {port}: {source}")]
    BindFailed { port: u16, source: io::Error },

    #[error("no {expected} within the timeout, handshake failed")]
    HandshakeTimeout { expected: &'static str },

    #[error("unexpected reply during handshake")]
    HandshakeRejected,

    #[error("no ack after {retries} consecutive timeouts, transfer aborted")]
    RetriesExhausted { retries: u32 },

    #[error("transfer cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] io::Error),
}
