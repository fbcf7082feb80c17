//! Session parameters fixed by the handshake, the shared timer defaults,
//! and the socket sizing both endpoints apply.

use std::io;
use std::net::UdpSocket;
use std::os::fd::AsRawFd;
use std::time::Duration;

use nix::sys::socket::{setsockopt, sockopt};

/// Default UDP port for both endpoints.
pub const DEFAULT_PORT: u16 = 9999;

/// Default socket-read timeout, shared by the handshake and data phases.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Default bound on consecutive sender timeouts.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Default payload bytes per data packet.
pub const DEFAULT_PACKET_SIZE: usize = 8000;

/// Default window size in packets.
pub const DEFAULT_WINDOW_SIZE: usize = 4;

/// Payload sizes the protocol supports on the wire.
pub const PACKET_SIZES: [usize; 4] = [1024, 2048, 4096, 8000];

/// Socket send/receive buffer floor, enough to absorb a full window of
/// maximum-size packets.
pub const SOCKET_BUFFER_BYTES: usize = 65536;

/// Extra room on top of `packet_size` when sizing the data receive buffer;
/// covers the ASCII sequence prefix of a data packet.
pub const RECV_SLACK: usize = 100;

/// Receive buffer for the receiver's SYN wait.
pub const SYN_BUF: usize = 4096;

/// Receive buffer for handshake replies on the sender side.
pub const HANDSHAKE_BUF: usize = 2048;

/// Receive buffer for acks.
pub const ACK_BUF: usize = 1024;

/// The tuple fixed by the three-way handshake. Built by the sender before
/// SYN, reconstructed by the receiver from the SYN fields; `start_seq` is
/// whatever the receiver offered in its SYN-ACK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionParams {
    pub filename: String,
    pub filesize: u64,
    pub packet_size: usize,
    pub window_size: usize,
    pub start_seq: u64,
}

/// Raises SO_SNDBUF and SO_RCVBUF to the protocol floor.
pub(crate) fn widen_socket_buffers(socket: &UdpSocket) -> io::Result<()> {
    let fd = socket.as_raw_fd();
    setsockopt(fd, sockopt::SndBuf, &SOCKET_BUFFER_BYTES).map_err(errno_to_io)?;
    setsockopt(fd, sockopt::RcvBuf, &SOCKET_BUFFER_BYTES).map_err(errno_to_io)?;
    Ok(())
}

fn errno_to_io(errno: nix::errno::Errno) -> io::Error {
    io::Error::from_raw_os_error(errno as i32)
}

/// True for the error kinds a timed-out `recv` surfaces.
pub(crate) fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}
