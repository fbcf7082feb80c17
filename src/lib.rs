//! # Reliable file transfer over UDP
//!
//! Moves one byte-addressable file between two hosts across a best-effort
//! datagram network, adding reliability, ordering, and duplicate
//! suppression on top of plain UDP.
//!
//! ## Protocol Design
//!
//! ### Framing
//! Every datagram is an ASCII prefix delimited by `|` followed by an
//! opaque payload:
//!
//! - `SYN|<filename>|<filesize>|<packet_size>|<window_size>` - sender opens
//!   a session
//! - `SYN-ACK|<start_seq>` - receiver accepts and picks the starting
//!   sequence number
//! - `ACK|<start_seq>` - sender completes the three-way handshake
//! - `<seq>|<payload>` - one chunk of the file, split at the first `|` only
//! - `ack<n>` - cumulative acknowledgement for everything up to `n`
//! - `END` - end-of-stream marker, sent once, never acknowledged
//!
//! ### Go-Back-N
//! The sender slices the file into `packet_size` chunks and keeps at most
//! `window_size` of them in flight. Acks are cumulative: `ack n` slides the
//! window base past chunk `n - start_seq` and evicts everything up to `n`
//! from the retransmit store. A socket-read timeout retransmits the entire
//! outstanding window in ascending order; `max_retries` consecutive
//! timeouts without forward progress abort the transfer.
//!
//! ### Receiver
//! The receiver writes only the packet it expects next. Duplicates are
//! re-acked so a sender stuck behind a lost ack can move on; out-of-order
//! packets are discarded and answered with the last in-order sequence
//! (which is `ack-1` before any in-order packet has arrived; the sender's
//! cumulative check rejects it naturally).
//!
//! ### Timers
//! One configured duration bounds every timed receive on both sides, for
//! the handshake and the data phase alike. The receiver never abandons a
//! session on its own once data is flowing.
//!
//! ## Embedding
//! The library owns no UI: callers hand in a [`Logger`] for human-readable
//! event lines and a [`CancelToken`] for cooperative shutdown, and get a
//! structured [`TransferError`] back when a session dies. The `sender` and
//! `receiver` binaries are thin terminal front-ends over [`send_file`] and
//! [`receive_file`].

pub mod cancel;
pub mod error;
pub mod frame;
pub mod log;
pub mod receiver;
pub mod sender;
pub mod session;

pub use cancel::CancelToken;
pub use error::TransferError;
pub use log::Logger;
pub use receiver::{receive_file, ReceiverConfig};
pub use sender::{send_file, SenderConfig};
pub use session::SessionParams;
