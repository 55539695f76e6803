//! Relay Test - Socket → Ring → Writer lewat loopback TCP
//!
//! Usage:
//!   cargo test --test relay_test -- --nocapture

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use ringpipe::core::RingBuf;
use ringpipe::network::{
    drain_to, relay_stream, RelayError, RingReader, RingWriter, SocketReceiver, StreamEnd,
};

fn loopback_pair() -> (TcpStream, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let client = TcpStream::connect(addr).unwrap();
    let (server, _) = listener.accept().unwrap();
    (client, server)
}

fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 253) as u8).collect()
}

#[test]
fn test_socket_to_writer_end_to_end() {
    const TOTAL: usize = 2 * 1024 * 1024;
    let (mut client, server) = loopback_pair();
    let data = payload(TOTAL);

    let sender = {
        let data = data.clone();
        thread::spawn(move || {
            for chunk in data.chunks(7919) {
                client.write_all(chunk).unwrap();
            }
            // Drop = close → receiver melihat EOF
        })
    };

    let ring = RingBuf::new(16 * 1024).unwrap();
    let mut receiver = SocketReceiver::new(server, 4096).unwrap();
    let mut sink = Vec::with_capacity(TOTAL);

    let (end, drained) = thread::scope(|s| {
        let consumer = s.spawn(|| drain_to(&ring, &mut sink, 3000, None).unwrap());
        let end = receiver.run(&ring).unwrap();
        ring.set_stop_signal();
        (end, consumer.join().unwrap())
    });
    sender.join().unwrap();

    assert_eq!(end, StreamEnd::Eof);
    assert_eq!(drained, (TOTAL as u64, StreamEnd::Stopped));
    assert_eq!(receiver.bytes(), TOTAL as u64);
    assert_eq!(sink, data);
    assert_eq!(ring.data_size(), 0);
}

#[test]
fn test_stop_releases_idle_receiver() {
    let (_client, server) = loopback_pair();
    let ring = RingBuf::new(1024).unwrap();
    let mut receiver = SocketReceiver::new(server, 512).unwrap();

    let end = thread::scope(|s| {
        let worker = s.spawn(|| receiver.run(&ring).unwrap());
        thread::sleep(Duration::from_millis(100));
        assert!(!worker.is_finished());
        ring.set_stop_signal();
        worker.join().unwrap()
    });

    assert_eq!(end, StreamEnd::Stopped);
    assert_eq!(receiver.bytes(), 0);
}

#[test]
fn test_ring_reused_across_connections() {
    let ring = RingBuf::new(4096).unwrap();

    for round in 0..3u8 {
        let (mut client, server) = loopback_pair();
        let message = vec![round; 10_000];
        let expected = message.clone();
        let sender = thread::spawn(move || client.write_all(&message).unwrap());

        let mut receiver = SocketReceiver::new(server, 1024).unwrap();
        let mut sink = Vec::new();
        thread::scope(|s| {
            let consumer = s.spawn(|| drain_to(&ring, &mut sink, 1024, None).unwrap());
            assert_eq!(receiver.run(&ring).unwrap(), StreamEnd::Eof);
            ring.set_stop_signal();
            consumer.join().unwrap();
        });
        sender.join().unwrap();

        ring.clear_stop_signal();
        assert!(ring.clear().is_ready());
        assert_eq!(sink, expected);
    }
}

#[test]
fn test_io_adapters_over_socket() {
    let (mut client, mut server) = loopback_pair();
    let ring = RingBuf::new(256).unwrap();
    let data = payload(50_000);

    let echoed = thread::scope(|s| {
        // socket → ring lewat RingWriter (copy path)
        let pump = s.spawn(|| {
            let mut writer = RingWriter::new(&ring);
            std::io::copy(&mut server, &mut writer).unwrap();
            ring.set_stop_signal();
        });
        let sender = s.spawn(|| {
            client.write_all(&data).unwrap();
            client.shutdown(std::net::Shutdown::Write).unwrap();
        });

        let mut out = Vec::new();
        RingReader::new(&ring).read_to_end(&mut out).unwrap();
        pump.join().unwrap();
        sender.join().unwrap();
        out
    });

    assert_eq!(echoed, data);
}

/// Sink yang selalu gagal menulis.
struct BrokenSink;

impl Write for BrokenSink {
    fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
        Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "sink gone"))
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn send_and_close(mut client: TcpStream, data: Vec<u8>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        // Server boleh menutup lebih dulu kalau sesinya gagal
        let _ = client.write_all(&data);
    })
}

#[test]
fn test_failed_session_leaves_ring_reusable() {
    let ring = RingBuf::new(4096).unwrap();

    let (client, server) = loopback_pair();
    let sender = send_and_close(client, vec![0xEE; 1000]);
    let failed = relay_stream(&ring, server, &mut BrokenSink, 512);
    sender.join().unwrap();

    assert!(matches!(failed, Err(RelayError::Io(_))));
    assert!(!ring.is_stopped());
    assert_eq!(ring.data_size(), 0);

    // Sesi berikutnya hanya melihat byte miliknya sendiri
    let (client, server) = loopback_pair();
    let fresh = payload(20_000);
    let sender = send_and_close(client, fresh.clone());
    let mut sink = Vec::new();
    let stats = relay_stream(&ring, server, &mut sink, 512).unwrap();
    sender.join().unwrap();

    assert_eq!(stats.end, StreamEnd::Eof);
    assert_eq!(stats.received, fresh.len() as u64);
    assert_eq!(stats.written, fresh.len() as u64);
    assert_eq!(sink, fresh);
    assert!(!ring.is_stopped());
}
