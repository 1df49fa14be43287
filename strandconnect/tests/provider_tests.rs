//! Blocking-path tests for `ConnectionProvider::get`.

mod common;

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use strandconnect::{ConnectError, ConnectionProvider, ProviderConfig};
use strandvirtual::{IoMode, IoStream, ThroughputCaps, VirtualInterface};

use common::{Behaviour, ScriptedInterface};

fn assert_blocking(stream: &dyn IoStream, caps: ThroughputCaps) {
    assert_eq!(stream.input_io_mode(), IoMode::Blocking);
    assert_eq!(stream.output_io_mode(), IoMode::Blocking);
    assert_eq!(stream.throughput_caps(), caps);
}

// ---------------------------------------------------------------------------
// Zero timeout: connect on the calling thread
// ---------------------------------------------------------------------------

#[test]
fn zero_timeout_returns_configured_stream() {
    let iface = ScriptedInterface::new("zero-ok", Behaviour::Immediate);
    let mut provider = ConnectionProvider::new(iface.clone());
    provider.set_max_available_to_read_write(12, 34);

    let stream = provider.get(Duration::ZERO).unwrap().unwrap();
    assert_blocking(stream.as_ref(), ThroughputCaps::new(12, 34));
    assert_eq!(iface.connects(), 1);
}

#[test]
fn zero_timeout_invalid_submission_fails() {
    let iface = ScriptedInterface::new("zero-invalid", Behaviour::Invalid);
    let provider = ConnectionProvider::new(iface);

    match provider.get(Duration::ZERO) {
        Err(ConnectError::ConnectionFailed { interface }) => assert_eq!(interface, "zero-invalid"),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected ConnectionFailed"),
    }
}

#[test]
fn zero_timeout_waits_for_listener() {
    let iface = VirtualInterface::new("zero-listener");
    let listener = iface.bind().unwrap();
    let server = thread::spawn(move || {
        let socket = listener.accept().unwrap();
        let mut buf = [0u8; 4];
        let n = socket.read(&mut buf).unwrap();
        socket.write(&buf[..n]).unwrap();
        listener
    });

    let provider = ConnectionProvider::new(iface);
    let stream = provider.get(Duration::ZERO).unwrap().unwrap();
    assert_blocking(stream.as_ref(), ThroughputCaps::unlimited());

    stream.write(b"echo").unwrap();
    let mut buf = [0u8; 4];
    assert_eq!(stream.read(&mut buf).unwrap(), 4);
    assert_eq!(&buf, b"echo");
    server.join().unwrap();
}

// ---------------------------------------------------------------------------
// Positive timeout: worker thread bounded by the deadline
// ---------------------------------------------------------------------------

#[test]
fn resolves_within_timeout() {
    let iface = ScriptedInterface::new("in-time", Behaviour::After(Duration::from_millis(50)));
    let provider = ConnectionProvider::new(iface);

    let stream = provider.get(Duration::from_millis(200)).unwrap();
    let stream = stream.expect("stream should arrive within the timeout");
    assert_blocking(stream.as_ref(), ThroughputCaps::unlimited());
}

#[test]
fn never_resolves_returns_none() {
    let iface = ScriptedInterface::new("never", Behaviour::Never);
    let provider = ConnectionProvider::new(iface);

    let started = Instant::now();
    let result = provider.get(Duration::from_millis(100)).unwrap();
    let elapsed = started.elapsed();

    assert!(result.is_none());
    assert!(elapsed >= Duration::from_millis(100));
    assert!(elapsed < Duration::from_secs(2), "get overran its timeout: {elapsed:?}");
}

#[test]
fn invalid_with_timeout_fails() {
    let iface = ScriptedInterface::new("invalid-timeout", Behaviour::Invalid);
    let provider = ConnectionProvider::new(iface);

    let result = provider.get(Duration::from_millis(200));
    assert!(matches!(result, Err(ConnectError::ConnectionFailed { .. })));
}

#[test]
fn late_stream_is_closed_not_leaked() {
    let iface = ScriptedInterface::new("late", Behaviour::After(Duration::from_millis(300)));
    let provider = ConnectionProvider::new(iface.clone());

    assert!(provider.get(Duration::from_millis(50)).unwrap().is_none());

    // Give the helper thread time to resolve and the worker time to clean up.
    thread::sleep(Duration::from_millis(700));
    let peers = iface.take_peers();
    assert_eq!(peers.len(), 1);

    // The late resolution never reached a caller and its client half was
    // closed: the peer sees end of stream.
    let mut buf = [0u8; 1];
    assert_eq!(peers[0].read(&mut buf).unwrap(), 0);
}

#[test]
fn timed_out_attempt_is_never_accepted() {
    let iface = VirtualInterface::new("sync-abandoned");
    let listener = iface.bind().unwrap();
    let provider = ConnectionProvider::new(iface.clone());

    for _ in 0..3 {
        assert!(provider.get(Duration::from_millis(20)).unwrap().is_none());
    }

    // A worker that registers after the caller left closes its own submission.
    thread::sleep(Duration::from_millis(50));
    assert_eq!(iface.pending_count(), 0);
    assert!(listener.accept_non_blocking().is_none());
}

// ---------------------------------------------------------------------------
// Caps and independence
// ---------------------------------------------------------------------------

#[test]
fn caps_applied_verbatim_to_every_stream() {
    let iface = ScriptedInterface::new("caps", Behaviour::Immediate);
    let config = ProviderConfig::default().with_throughput(ThroughputCaps::new(5, 9));
    let provider = ConnectionProvider::with_config(iface, config);

    for timeout in [Duration::ZERO, Duration::from_millis(500), Duration::ZERO] {
        let stream = provider.get(timeout).unwrap().unwrap();
        assert_blocking(stream.as_ref(), ThroughputCaps::new(5, 9));
    }
}

#[test]
fn concurrent_attempts_are_independent() {
    let iface = ScriptedInterface::new("concurrent", Behaviour::After(Duration::from_millis(30)));
    let mut provider = ConnectionProvider::new(iface.clone());
    provider.set_max_available_to_read_write(64, 128);
    let provider = Arc::new(provider);

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let provider = Arc::clone(&provider);
            thread::spawn(move || provider.get(Duration::from_secs(2)).unwrap().unwrap())
        })
        .collect();
    let streams: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert!(!Arc::ptr_eq(&streams[0], &streams[1]));
    for stream in &streams {
        assert_blocking(stream.as_ref(), ThroughputCaps::new(64, 128));
    }

    streams[0].write(b"a").unwrap();
    streams[1].write(b"b").unwrap();
    let mut seen: Vec<u8> = iface
        .take_peers()
        .iter()
        .map(|peer| {
            let mut buf = [0u8; 1];
            assert_eq!(peer.read(&mut buf).unwrap(), 1);
            buf[0]
        })
        .collect();
    seen.sort_unstable();
    assert_eq!(seen, b"ab".to_vec());
}

#[test]
fn provider_recovers_after_failure() {
    let iface = VirtualInterface::new("recover");
    let provider = ConnectionProvider::new(iface.clone());

    assert!(provider.get(Duration::ZERO).is_err());
    assert!(provider.get(Duration::from_millis(100)).is_err());

    let listener = iface.bind().unwrap();
    let server = thread::spawn(move || {
        let socket = listener.accept().unwrap();
        (listener, socket)
    });

    let stream = provider.get(Duration::from_secs(2)).unwrap();
    assert!(stream.is_some());
    server.join().unwrap();
}
