//! Tests for Controller
//!
//! These tests verify:
//! - Config validation on construction
//! - Mode commands and single descriptor upload
//! - Full descriptor set programming (order, failure tolerance, validation)
//! - Echo exchange through the transfer buffer
//! - Log once / follow behaviour

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use hydradancer::descriptors::DescriptorSet;
use hydradancer::protocol::{decode_frame, Command, CommandType, DescriptorIndex, SubCommand};
use hydradancer::transport::MockTransport;
use hydradancer::{Config, Controller, HydraError, PollBound};

const EP_OUT: u8 = 0x01;
const EP_IN: u8 = 0x81;
const EP_LOG: u8 = 0x87;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup() -> (MockTransport, Controller<MockTransport>) {
    setup_with(Config::default())
}

fn setup_with(config: Config) -> (MockTransport, Controller<MockTransport>) {
    let transport = MockTransport::new();
    let controller = Controller::new(config, transport.clone()).unwrap();
    (transport, controller)
}

fn rot13(data: &[u8]) -> Vec<u8> {
    data.iter()
        .map(|&b| match b {
            b'a'..=b'z' => (b - b'a' + 13) % 26 + b'a',
            b'A'..=b'Z' => (b - b'A' + 13) % 26 + b'A',
            _ => b,
        })
        .collect()
}

// =============================================================================
// Construction
// =============================================================================

#[test]
fn test_default_config_is_valid() {
    assert!(Config::default().validate().is_ok());
}

#[test]
fn test_rejects_invalid_configs() {
    let bad = [
        Config::builder().transfer_capacity(0).build(),
        Config::builder().log_capacity(70_000).build(),
        Config::builder().endpoint_out(0x81).build(),
        Config::builder().endpoint_in(0x01).build(),
        Config::builder().endpoint_log(0x07).build(),
        Config::builder()
            .echo_poll(PollBound::Attempts(0))
            .transfer_timeout(Some(Duration::from_millis(100)))
            .build(),
        Config::builder().echo_poll(PollBound::Attempts(5)).build(),
    ];
    for config in bad {
        let result = Controller::new(config.clone(), MockTransport::new());
        assert!(
            matches!(result, Err(HydraError::Config(_))),
            "{:?} should be rejected",
            config
        );
    }
}

// =============================================================================
// Commands
// =============================================================================

#[test]
fn test_send_command_writes_single_byte() {
    let (transport, mut controller) = setup();

    controller.send_command(CommandType::Identify).unwrap();
    controller.send_command(CommandType::Main).unwrap();

    let writes = transport.writes();
    assert_eq!(writes.len(), 2);
    assert_eq!((writes[0].0, &writes[0].1[..]), (EP_OUT, &[0x01][..]));
    assert_eq!((writes[1].0, &writes[1].1[..]), (EP_OUT, &[0x00][..]));
}

#[test]
fn test_send_command_reports_failure() {
    let (transport, mut controller) = setup();
    transport.fail_write(0);

    let result = controller.send_command(CommandType::Main);
    assert!(matches!(result, Err(HydraError::TransportWrite { .. })));
}

#[test]
fn test_set_descriptor_uses_configured_endpoint() {
    let config = Config::builder().endpoint_out(0x02).build();
    let (transport, mut controller) = setup_with(config);

    controller
        .set_descriptor(SubCommand::Config, 0, &[9, 2, 0x19, 0, 1, 1, 0, 0xA0, 0x32])
        .unwrap();

    assert!(transport.writes().iter().all(|(ep, _)| *ep == 0x02));
}

#[test]
fn test_set_descriptor_respects_transfer_capacity() {
    let config = Config::builder().transfer_capacity(16).build();
    let (transport, mut controller) = setup_with(config);

    let result = controller.set_descriptor(SubCommand::Device, 0, &[0u8; 18]);

    assert!(matches!(result, Err(HydraError::PreconditionViolation(_))));
    assert_eq!(transport.write_attempts(), 0);
}

// =============================================================================
// Descriptor Set Programming
// =============================================================================

#[test]
fn test_program_keyboard_in_order() {
    let (transport, mut controller) = setup();

    let report = controller.program_descriptors(&DescriptorSet::keyboard()).unwrap();
    assert!(report.is_complete());
    assert_eq!(report.uploaded, 8);

    let writes = transport.writes();
    assert_eq!(writes.len(), 16);

    let frames: Vec<Command> = writes
        .iter()
        .step_by(2)
        .map(|(_, bytes)| decode_frame(bytes).unwrap())
        .collect();
    let kinds: Vec<SubCommand> = frames
        .iter()
        .map(|c| match c {
            Command::SetDescriptor { kind, .. } => *kind,
            other => panic!("unexpected frame {:?}", other),
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            SubCommand::Device,
            SubCommand::Config,
            SubCommand::Interface,
            SubCommand::Endpoint,
            SubCommand::String,
            SubCommand::String,
            SubCommand::String,
            SubCommand::String,
        ]
    );

    // Every frame announces the length of the write that follows it
    for pair in writes.chunks(2) {
        match decode_frame(&pair[0].1).unwrap() {
            Command::SetDescriptor { length, .. } => assert_eq!(length, pair[1].1.len()),
            other => panic!("unexpected frame {:?}", other),
        }
    }
}

#[test]
fn test_program_continues_after_failure() {
    let (transport, mut controller) = setup();
    // Payload write of the config descriptor (calls: 0 frame, 1 payload, 2 frame, 3 payload)
    transport.fail_write(3);

    let report = controller.program_descriptors(&DescriptorSet::keyboard()).unwrap();

    assert_eq!(report.uploaded, 7);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].kind, SubCommand::Config);
    assert!(report.failures[0].error.is_transport());
    assert_eq!(transport.write_attempts(), 16);
}

#[test]
fn test_program_validates_before_sending() {
    let (transport, mut controller) = setup();
    let mut set = DescriptorSet::keyboard();
    set.strings
        .push((DescriptorIndex::new(4).unwrap(), vec![0u8; 600]));

    let result = controller.program_descriptors(&set);

    assert!(matches!(result, Err(HydraError::PreconditionViolation(_))));
    assert_eq!(transport.write_attempts(), 0);
}

// =============================================================================
// Echo
// =============================================================================

#[test]
fn test_echo_rot13() {
    let (transport, mut controller) = setup();
    transport.echo_with(EP_OUT, EP_IN, rot13);

    assert_eq!(controller.echo(b"Hello").unwrap(), "Uryyb");
    assert_eq!(controller.echo(b"Uryyb").unwrap(), "Hello");
}

#[test]
fn test_echo_truncates_long_message() {
    let config = Config::builder().transfer_capacity(8).build();
    let (transport, mut controller) = setup_with(config);
    transport.echo(EP_OUT, EP_IN);

    assert_eq!(controller.echo(b"0123456789").unwrap(), "0123456");
    assert_eq!(transport.writes()[0].1.len(), 8);
}

#[test]
fn test_echo_bounded_by_config() {
    let config = Config::builder()
        .echo_poll(PollBound::Attempts(3))
        .transfer_timeout(Some(Duration::from_millis(100)))
        .build();
    let (transport, mut controller) = setup_with(config);

    let result = controller.echo(b"anyone?");

    assert!(matches!(result, Err(HydraError::DeviceUnresponsive { attempts: 3 })));
    assert_eq!(transport.read_count(EP_IN), 3);
}

#[test]
fn test_attempts_bound_requires_transfer_timeout() {
    let blocking = Config::builder().echo_poll(PollBound::Attempts(5)).build();
    let result = Controller::new(blocking, MockTransport::new());
    assert!(matches!(result, Err(HydraError::Config(_))));

    // Deadline caps each read by itself, so no timeout is needed
    let deadline = Config::builder()
        .echo_poll(PollBound::Deadline(Duration::from_millis(50)))
        .build();
    assert!(Controller::new(deadline, MockTransport::new()).is_ok());

    let timed = Config::builder()
        .echo_poll(PollBound::Attempts(5))
        .transfer_timeout(Some(Duration::from_millis(100)))
        .build();
    let (transport, mut controller) = setup_with(timed);

    assert!(controller.echo(b"ping").is_err());
    assert!(transport
        .timeouts()
        .iter()
        .all(|t| *t == Some(Duration::from_millis(100))));
}

#[test]
fn test_echo_passes_configured_timeout() {
    let timeout = Some(Duration::from_millis(250));
    let config = Config::builder().transfer_timeout(timeout).build();
    let (transport, mut controller) = setup_with(config);
    transport.echo(EP_OUT, EP_IN);

    controller.echo(b"t").unwrap();

    assert!(transport.timeouts().iter().all(|t| *t == timeout));
}

// =============================================================================
// Log
// =============================================================================

#[test]
fn test_log_once_reads_twice() {
    let (transport, mut controller) = setup();
    transport.push_data(EP_LOG, Vec::new());
    transport.push_data(EP_LOG, &b"[INFO] ready\n"[..]);

    let messages = controller.log_once();

    assert_eq!(messages, vec!["[INFO] ready\n".to_string()]);
    assert_eq!(transport.read_count(EP_LOG), 2);
}

#[test]
fn test_log_once_skips_failures() {
    let (transport, mut controller) = setup();
    transport.push_failure(EP_LOG, "stall");
    transport.push_data(EP_LOG, &b"second"[..]);

    assert_eq!(controller.log_once(), vec!["second".to_string()]);
}

#[test]
fn test_poll_log_nothing_to_report() {
    let (_transport, mut controller) = setup();
    assert_eq!(controller.poll_log().unwrap(), None);
}

#[test]
fn test_follow_log_until_stopped() {
    let config = Config::builder().log_interval(Duration::from_millis(1)).build();
    let (transport, mut controller) = setup_with(config);
    transport.push_data(EP_LOG, &b"one "[..]);
    transport.push_failure(EP_LOG, "stall");
    transport.push_data(EP_LOG, &b"two"[..]);

    let stop = Arc::new(AtomicBool::new(false));
    let stopper = {
        let stop = Arc::clone(&stop);
        let transport = transport.clone();
        thread::spawn(move || {
            while transport.read_count(EP_LOG) < 5 {
                thread::sleep(Duration::from_millis(1));
            }
            stop.store(true, Ordering::Relaxed);
        })
    };

    let mut seen = String::new();
    let delivered = controller.follow_log(&stop, |text| seen.push_str(text));
    stopper.join().unwrap();

    assert_eq!(delivered, 2);
    assert_eq!(seen, "one two");
}

#[test]
fn test_follow_log_stopped_before_start() {
    let (transport, mut controller) = setup();
    let stop = AtomicBool::new(true);

    assert_eq!(controller.follow_log(&stop, |_| {}), 0);
    assert_eq!(transport.read_count(EP_LOG), 0);
}
