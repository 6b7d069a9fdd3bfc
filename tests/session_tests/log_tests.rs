//! Tests for LogPoller

use hydradancer::session::LogPoller;
use hydradancer::transport::{MockRead, MockTransport};
use hydradancer::{HydraError, TransferBuffer};

const EP_LOG: u8 = 0x87;
const CAPACITY: usize = 64;

fn buffer() -> TransferBuffer {
    TransferBuffer::new(CAPACITY).unwrap()
}

#[test]
fn test_all_zero_read_reports_nothing() {
    let mut transport = MockTransport::new();
    transport.push_data(EP_LOG, vec![0u8; CAPACITY]);

    let mut buf = buffer();
    let text = LogPoller::new(EP_LOG).poll(&mut transport, &mut buf).unwrap();

    assert_eq!(text, None);
    assert_eq!(transport.read_count(EP_LOG), 1);
}

#[test]
fn test_empty_read_reports_nothing() {
    let mut transport = MockTransport::new();
    transport.push_read(EP_LOG, MockRead::Empty);

    let mut buf = buffer();
    assert_eq!(LogPoller::new(EP_LOG).poll(&mut transport, &mut buf).unwrap(), None);
}

#[test]
fn test_text_surfaced_up_to_terminator() {
    let mut transport = MockTransport::new();
    transport.push_data(EP_LOG, &b"boot ok\n\0garbage"[..]);

    let mut buf = buffer();
    let text = LogPoller::new(EP_LOG).poll(&mut transport, &mut buf).unwrap();

    assert_eq!(text.as_deref(), Some("boot ok\n"));
}

#[test]
fn test_full_buffer_cut_at_last_byte() {
    let mut transport = MockTransport::new();
    transport.push_data(EP_LOG, vec![b'x'; CAPACITY]);

    let mut buf = buffer();
    let text = LogPoller::new(EP_LOG).poll(&mut transport, &mut buf).unwrap().unwrap();

    assert_eq!(text.len(), CAPACITY - 1);
}

#[test]
fn test_buffer_zeroed_after_poll() {
    let mut transport = MockTransport::new();
    transport.push_data(EP_LOG, &b"first"[..]);
    transport.push_data(EP_LOG, &b"ab"[..]);

    let poller = LogPoller::new(EP_LOG);
    let mut buf = buffer();

    assert_eq!(poller.poll(&mut transport, &mut buf).unwrap().as_deref(), Some("first"));
    assert!(buf.as_slice().iter().all(|&b| b == 0));

    // A shorter message must not pick up the tail of the previous one
    assert_eq!(poller.poll(&mut transport, &mut buf).unwrap().as_deref(), Some("ab"));
}

#[test]
fn test_failed_read_reported_and_buffer_zeroed() {
    let mut transport = MockTransport::new();
    transport.push_failure(EP_LOG, "timeout");

    let mut buf = buffer();
    buf.load(b"stale");

    let result = LogPoller::new(EP_LOG).poll(&mut transport, &mut buf);

    assert!(matches!(result, Err(HydraError::TransportRead { endpoint: EP_LOG, .. })));
    assert!(buf.as_slice().iter().all(|&b| b == 0));
}

#[test]
fn test_poll_recovers_after_failure() {
    let mut transport = MockTransport::new();
    transport.push_failure(EP_LOG, "timeout");
    transport.push_data(EP_LOG, &b"alive"[..]);

    let poller = LogPoller::new(EP_LOG);
    let mut buf = buffer();

    assert!(poller.poll(&mut transport, &mut buf).is_err());
    assert_eq!(poller.poll(&mut transport, &mut buf).unwrap().as_deref(), Some("alive"));
}
