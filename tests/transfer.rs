//! End-to-end transfers: a real sender and a real receiver on loopback.

use std::fs;
use std::net::UdpSocket;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use gbn_transfer::{
    receive_file, send_file, CancelToken, Logger, ReceiverConfig, SenderConfig, TransferError,
};

/// Grabs an ephemeral port the kernel considers free right now.
fn reserve_port() -> u16 {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    socket.local_addr().unwrap().port()
}

fn spawn_receiver(
    port: u16,
    save_dir: PathBuf,
) -> thread::JoinHandle<Result<PathBuf, TransferError>> {
    thread::spawn(move || {
        receive_file(
            &ReceiverConfig {
                port,
                save_dir,
                timeout: Duration::from_millis(500),
            },
            &Logger::disabled(),
            &CancelToken::new(),
        )
    })
}

fn sender_config(port: u16, packet_size: usize, window_size: usize) -> SenderConfig {
    SenderConfig {
        dest_addr: "127.0.0.1".to_string(),
        port,
        timeout: Duration::from_secs(1),
        max_retries: 5,
        packet_size,
        window_size,
    }
}

fn run_transfer(contents: &[u8], packet_size: usize, window_size: usize) -> Vec<u8> {
    let src_dir = tempfile::tempdir().unwrap();
    let dst_dir = tempfile::tempdir().unwrap();
    let source = src_dir.path().join("payload.bin");
    fs::write(&source, contents).unwrap();

    let port = reserve_port();
    let receiver = spawn_receiver(port, dst_dir.path().to_path_buf());
    thread::sleep(Duration::from_millis(200));

    send_file(
        &source,
        &sender_config(port, packet_size, window_size),
        &Logger::disabled(),
        &CancelToken::new(),
    )
    .unwrap();

    let saved = receiver.join().unwrap().unwrap();
    assert_eq!(saved, dst_dir.path().join("payload.bin"));
    fs::read(&saved).unwrap()
}

#[test]
fn transfers_file_byte_identical() {
    let contents: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
    assert_eq!(run_transfer(&contents, 1024, 4), contents);
}

#[test]
fn empty_file_produces_empty_destination() {
    assert_eq!(run_transfer(b"", 1024, 4), b"");
}

#[test]
fn file_of_exact_packet_size() {
    let contents = vec![0xAB; 1024];
    assert_eq!(run_transfer(&contents, 1024, 4), contents);
}

#[test]
fn file_one_byte_over_packet_size() {
    let contents = vec![0xCD; 1025];
    assert_eq!(run_transfer(&contents, 1024, 4), contents);
}

#[test]
fn stop_and_wait_window_one() {
    let contents: Vec<u8> = (0..3 * 1024u32).map(|i| (i % 13) as u8).collect();
    assert_eq!(run_transfer(&contents, 1024, 1), contents);
}

#[test]
fn missing_source_fails_with_file_not_found() {
    let err = send_file(
        "/no/such/file.bin",
        &sender_config(reserve_port(), 1024, 4),
        &Logger::disabled(),
        &CancelToken::new(),
    )
    .unwrap_err();
    assert!(matches!(err, TransferError::FileNotFound(_)));
}

#[test]
fn absent_receiver_fails_with_handshake_timeout() {
    let src_dir = tempfile::tempdir().unwrap();
    let source = src_dir.path().join("payload.bin");
    fs::write(&source, b"data").unwrap();

    // nothing is listening on the reserved port
    let err = send_file(
        &source,
        &sender_config(reserve_port(), 1024, 4),
        &Logger::disabled(),
        &CancelToken::new(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        TransferError::HandshakeTimeout { expected: "SYN-ACK" }
    ));
}

#[test]
fn occupied_port_fails_with_bind_failed() {
    let dst_dir = tempfile::tempdir().unwrap();
    // hold the port so the receiver's bind must fail
    let blocker = UdpSocket::bind("0.0.0.0:0").unwrap();
    let port = blocker.local_addr().unwrap().port();

    let err = receive_file(
        &ReceiverConfig {
            port,
            save_dir: dst_dir.path().to_path_buf(),
            timeout: Duration::from_millis(100),
        },
        &Logger::disabled(),
        &CancelToken::new(),
    )
    .unwrap_err();
    assert!(matches!(err, TransferError::BindFailed { port: p, .. } if p == port));
}

#[test]
fn cancelled_receiver_stops_listening() {
    let dst_dir = tempfile::tempdir().unwrap();
    let port = reserve_port();
    let save_dir = dst_dir.path().to_path_buf();

    let cancel = CancelToken::new();
    cancel.cancel();
    let receiver = thread::spawn({
        let cancel = cancel.clone();
        move || {
            receive_file(
                &ReceiverConfig {
                    port,
                    save_dir,
                    timeout: Duration::from_millis(100),
                },
                &Logger::disabled(),
                &cancel,
            )
        }
    });

    let err = receiver.join().unwrap().unwrap_err();
    assert!(matches!(err, TransferError::Cancelled));
}
