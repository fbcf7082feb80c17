//! On-wire framing.
//!
//! Every datagram carries an ASCII prefix delimited by `|` (0x7C) followed
//! by an opaque payload. Control frames are fully textual; a DATA frame is
//! split at the *first* `|` only, so payload bytes may contain any value
//! including the delimiter. All numbers are ASCII decimal.

use std::str;

/// One parsed datagram. Borrows from the receive buffer.
#[derive(Debug, PartialEq, Eq)]
pub enum Frame<'a> {
    /// `SYN|<filename>|<filesize>|<packet_size>|<window_size>` - opens a session.
    Syn {
        filename: &'a str,
        filesize: u64,
        packet_size: usize,
        window_size: usize,
    },
    /// `SYN-ACK|<start_seq>` - the receiver's handshake reply.
    SynAck { start_seq: u64 },
    /// `ACK|<start_seq>` - completes the handshake.
    HandshakeAck { start_seq: u64 },
    /// `<seq>|<payload>` - one chunk of the file.
    Data { seq: u64, payload: &'a [u8] },
    /// `ack<n>` - cumulative acknowledgement for everything up to and
    /// including `n`. Signed: a receiver that has not yet seen an in-order
    /// packet answers out-of-order data with `ack-1`.
    Ack { seq: i64 },
    /// `END` - end-of-stream marker, never acknowledged.
    End,
}

impl<'a> Frame<'a> {
    /// Parses a raw datagram. Anything malformed yields `None`; callers
    /// drop the datagram and keep waiting for the next one.
    pub fn parse(datagram: &'a [u8]) -> Option<Frame<'a>> {
        if datagram == b"END" {
            return Some(Frame::End);
        }
        if let Some(rest) = datagram.strip_prefix(b"ack") {
            let seq = str::from_utf8(rest).ok()?.parse().ok()?;
            return Some(Frame::Ack { seq });
        }

        let delim = datagram.iter().position(|&b| b == b'|')?;
        let (prefix, rest) = (&datagram[..delim], &datagram[delim + 1..]);
        match prefix {
            b"SYN" => {
                let rest = str::from_utf8(rest).ok()?;
                let mut fields = rest.split('|');
                let filename = fields.next()?;
                let filesize = fields.next()?.parse().ok()?;
                let packet_size = fields.next()?.parse().ok()?;
                let window_size = fields.next()?.parse().ok()?;
                if fields.next().is_some() || filename.is_empty() {
                    return None;
                }
                Some(Frame::Syn {
                    filename,
                    filesize,
                    packet_size,
                    window_size,
                })
            }
            b"SYN-ACK" => {
                let start_seq = str::from_utf8(rest).ok()?.parse().ok()?;
                Some(Frame::SynAck { start_seq })
            }
            b"ACK" => {
                let start_seq = str::from_utf8(rest).ok()?.parse().ok()?;
                Some(Frame::HandshakeAck { start_seq })
            }
            // A leading integer field marks a data packet.
            _ => {
                let seq = str::from_utf8(prefix).ok()?.parse().ok()?;
                Some(Frame::Data { seq, payload: rest })
            }
        }
    }

    /// Serializes the frame into a datagram ready for the socket.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Frame::Syn {
                filename,
                filesize,
                packet_size,
                window_size,
            } => format!("SYN|{}|{}|{}|{}", filename, filesize, packet_size, window_size)
                .into_bytes(),
            Frame::SynAck { start_seq } => format!("SYN-ACK|{}", start_seq).into_bytes(),
            Frame::HandshakeAck { start_seq } => format!("ACK|{}", start_seq).into_bytes(),
            Frame::Data { seq, payload } => {
                let mut datagram = format!("{}|", seq).into_bytes();
                datagram.extend_from_slice(payload);
                datagram
            }
            Frame::Ack { seq } => format!("ack{}", seq).into_bytes(),
            Frame::End => b"END".to_vec(),
        }
    }
}
