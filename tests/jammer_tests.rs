//! Tests for jammer control logic
//!
//! Tests the command interpreter, the emission controller and the
//! tick-driven composition against a recording transceiver. Time is simulated
//! through `tick`, so nothing here sleeps.

use std::cell::RefCell;
use std::rc::Rc;

use jammer_firmware::config::POLL_INTERVAL_MS;
use jammer_firmware::jammer::device::Jammer;
use jammer_firmware::jammer::emission::{
    EmissionController, EmissionState, StartOutcome, StopCause, Transceiver,
};
use jammer_firmware::jammer::interpreter::{CommandInterpreter, ControlRequest};
use jammer_firmware::protocol::{Ack, AckSink};
use jammer_firmware::types::{ChannelCode, SessionConfig, TxPower};

// ============================================================================
// Test Doubles
// ============================================================================

/// Everything observable from outside, in order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Event {
    Ack(Ack),
    DriverStart(TxPower, ChannelCode),
    DriverStop,
}

#[derive(Clone, Default)]
struct Log(Rc<RefCell<Vec<Event>>>);

impl Log {
    fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }

    fn acks(&self) -> Vec<Ack> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Ack(ack) => Some(ack),
                _ => None,
            })
            .collect()
    }

    fn driver_starts(&self) -> Vec<(TxPower, ChannelCode)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::DriverStart(power, channel) => Some((power, channel)),
                _ => None,
            })
            .collect()
    }

    fn driver_stops(&self) -> usize {
        self.events()
            .into_iter()
            .filter(|e| *e == Event::DriverStop)
            .count()
    }

    fn position(&self, event: Event) -> Option<usize> {
        self.events().iter().position(|e| *e == event)
    }
}

struct MockRadio(Log);

impl Transceiver for MockRadio {
    fn start_continuous_emission(&mut self, power: TxPower, channel: ChannelCode) {
        self.0.push(Event::DriverStart(power, channel));
    }

    fn stop_continuous_emission(&mut self) {
        self.0.push(Event::DriverStop);
    }
}

struct LogSink(Log);

impl AckSink for LogSink {
    fn send(&mut self, ack: Ack) {
        self.0.push(Event::Ack(ack));
    }
}

fn controller() -> (EmissionController<MockRadio>, LogSink, Log) {
    let log = Log::default();
    (
        EmissionController::new(MockRadio(log.clone())),
        LogSink(log.clone()),
        log,
    )
}

fn jammer() -> (Jammer<MockRadio>, LogSink, Log) {
    let log = Log::default();
    (
        Jammer::new(MockRadio(log.clone())),
        LogSink(log.clone()),
        log,
    )
}

/// Advance a jammer in poll-sized steps
fn run_for(jammer: &mut Jammer<MockRadio>, sink: &mut LogSink, ms: u32) {
    let mut left = ms;
    while left > 0 {
        let step = left.min(POLL_INTERVAL_MS);
        jammer.tick(step, sink);
        left -= step;
    }
}

// ============================================================================
// Command Interpreter Tests
// ============================================================================

#[test]
fn interpreter_default_config() {
    let interpreter = CommandInterpreter::default();
    assert_eq!(interpreter.config(), SessionConfig::default());
}

#[test]
fn interpreter_start_requests_snapshot_without_ack() {
    let mut interpreter = CommandInterpreter::default();
    let mut acks: Vec<Ack> = Vec::new();

    let request = interpreter.handle(b">", &mut acks);

    assert_eq!(request, Some(ControlRequest::Start(SessionConfig::default())));
    assert!(acks.is_empty());
}

#[test]
fn interpreter_stop_acks_then_requests() {
    let mut interpreter = CommandInterpreter::default();
    let mut acks: Vec<Ack> = Vec::new();

    let request = interpreter.handle(b"=", &mut acks);

    assert_eq!(request, Some(ControlRequest::Stop));
    assert_eq!(acks, vec![Ack::Stopped]);
}

#[test]
fn interpreter_sets_duration() {
    let mut interpreter = CommandInterpreter::default();
    let mut acks: Vec<Ack> = Vec::new();

    assert_eq!(interpreter.handle(b"&120", &mut acks), None);

    assert_eq!(interpreter.config().duration_s, 120);
    assert_eq!(acks, vec![Ack::Duration(120)]);
}

#[test]
fn interpreter_sets_channel() {
    let mut interpreter = CommandInterpreter::default();
    let mut acks: Vec<Ack> = Vec::new();

    assert_eq!(interpreter.handle(b"?42", &mut acks), None);

    assert_eq!(interpreter.config().channel, ChannelCode::new(42));
    assert_eq!(acks, vec![Ack::Channel(ChannelCode::new(42))]);
}

#[test]
fn interpreter_unknown_leaves_config() {
    let mut interpreter = CommandInterpreter::default();
    let mut acks: Vec<Ack> = Vec::new();

    assert_eq!(interpreter.handle(b"!reboot", &mut acks), None);
    assert_eq!(interpreter.handle(b"", &mut acks), None);

    assert_eq!(interpreter.config(), SessionConfig::default());
    assert_eq!(acks, vec![Ack::Unknown, Ack::Unknown]);
}

#[test]
fn interpreter_latest_value_wins() {
    let mut interpreter = CommandInterpreter::default();
    let mut acks: Vec<Ack> = Vec::new();

    interpreter.handle(b"&10", &mut acks);
    interpreter.handle(b"&20", &mut acks);

    assert_eq!(interpreter.config().duration_s, 20);
    assert_eq!(acks, vec![Ack::Duration(10), Ack::Duration(20)]);
}

#[test]
fn interpreter_start_snapshot_unaffected_by_later_changes() {
    let mut interpreter = CommandInterpreter::default();
    let mut acks: Vec<Ack> = Vec::new();

    interpreter.handle(b"&5", &mut acks);
    let request = interpreter.handle(b">", &mut acks);
    interpreter.handle(b"&99", &mut acks);

    match request {
        Some(ControlRequest::Start(config)) => assert_eq!(config.duration_s, 5),
        other => panic!("expected start request, got {other:?}"),
    }
}

#[test]
fn interpreter_survives_garbage() {
    let mut interpreter = CommandInterpreter::default();
    let mut acks: Vec<Ack> = Vec::new();

    let messages: [&[u8]; 6] = [b"\xff\xfe", b"&&&", b"??", b"\0", b"&-", b"?abc"];
    for message in messages {
        interpreter.handle(message, &mut acks);
    }

    // One ack per message
    assert_eq!(acks.len(), 6);
}

// ============================================================================
// Emission Controller Tests
// ============================================================================

#[test]
fn controller_starts_idle() {
    let (ctrl, _, log) = controller();
    assert_eq!(ctrl.state(), EmissionState::Idle);
    assert!(!ctrl.is_transmitting());
    assert!(ctrl.session().is_none());
    assert!(log.events().is_empty());
}

#[test]
fn controller_start_acks_before_driver() {
    let (mut ctrl, mut sink, log) = controller();
    let config = SessionConfig::default()
        .with_channel(ChannelCode::new(7))
        .with_power(TxPower::Zero);

    assert_eq!(ctrl.start(config, &mut sink), StartOutcome::Started);

    assert_eq!(
        log.events(),
        vec![
            Event::Ack(Ack::Started),
            Event::DriverStart(TxPower::Zero, ChannelCode::new(7)),
        ]
    );
    assert_eq!(ctrl.state(), EmissionState::Transmitting);
}

#[test]
fn controller_second_start_dropped() {
    let (mut ctrl, mut sink, log) = controller();
    let first = SessionConfig::default().with_channel(ChannelCode::new(1));
    let second = SessionConfig::default().with_channel(ChannelCode::new(2));

    ctrl.start(first, &mut sink);
    assert_eq!(
        ctrl.start(second, &mut sink),
        StartOutcome::AlreadyTransmitting
    );

    assert_eq!(log.acks(), vec![Ack::Started]);
    assert_eq!(log.driver_starts().len(), 1);
    assert_eq!(ctrl.session().map(|s| s.config()), Some(first));
}

#[test]
fn controller_requested_stop_calls_driver_without_ack() {
    let (mut ctrl, mut sink, log) = controller();
    ctrl.start(SessionConfig::default(), &mut sink);

    assert!(ctrl.stop(StopCause::Requested, &mut sink));

    assert_eq!(log.driver_stops(), 1);
    assert_eq!(log.acks(), vec![Ack::Started]);
    assert_eq!(ctrl.state(), EmissionState::Idle);
}

#[test]
fn controller_stop_when_idle_is_noop() {
    let (mut ctrl, mut sink, log) = controller();

    assert!(!ctrl.stop(StopCause::Requested, &mut sink));
    assert!(!ctrl.stop(StopCause::Expired, &mut sink));

    assert!(log.events().is_empty());
}

#[test]
fn controller_expiry_stops_driver_then_acks() {
    let (mut ctrl, mut sink, log) = controller();
    ctrl.start(SessionConfig::default().with_duration(1), &mut sink);

    assert_eq!(ctrl.tick(1000, &mut sink), EmissionState::Idle);

    let events = log.events();
    assert_eq!(events.len(), 4);
    assert_eq!(events[2], Event::DriverStop);
    assert_eq!(events[3], Event::Ack(Ack::Stopped));
}

#[test]
fn controller_countdown_tracks_remaining() {
    let (mut ctrl, mut sink, _) = controller();
    ctrl.start(SessionConfig::default().with_duration(3), &mut sink);

    ctrl.tick(1000, &mut sink);

    let session = ctrl.session().expect("session active");
    assert_eq!(session.remaining_ms(), 2000);
    assert_eq!(session.elapsed_ms(), 1000);
    assert!(!session.is_expired());
}

#[test]
fn controller_tick_when_idle_does_nothing() {
    let (mut ctrl, mut sink, log) = controller();
    assert_eq!(ctrl.tick(10_000, &mut sink), EmissionState::Idle);
    assert!(log.events().is_empty());
}

#[test]
fn controller_reusable_after_expiry() {
    let (mut ctrl, mut sink, log) = controller();
    let config = SessionConfig::default().with_duration(1);

    ctrl.start(config, &mut sink);
    ctrl.tick(1000, &mut sink);
    assert_eq!(ctrl.start(config, &mut sink), StartOutcome::Started);

    assert_eq!(log.driver_starts().len(), 2);
    assert_eq!(ctrl.state(), EmissionState::Transmitting);
}

#[test]
fn controller_zero_duration_expires_on_first_tick() {
    let (mut ctrl, mut sink, log) = controller();
    ctrl.start(SessionConfig::default().with_duration(0), &mut sink);
    assert!(ctrl.is_transmitting());

    ctrl.tick(0, &mut sink);

    assert!(!ctrl.is_transmitting());
    assert_eq!(log.acks(), vec![Ack::Started, Ack::Stopped]);
}

#[test]
fn controller_apply_dispatches() {
    let (mut ctrl, mut sink, log) = controller();

    ctrl.apply(ControlRequest::Start(SessionConfig::default()), &mut sink);
    assert!(ctrl.is_transmitting());

    ctrl.apply(ControlRequest::Stop, &mut sink);
    assert!(!ctrl.is_transmitting());
    assert_eq!(log.driver_stops(), 1);
}

#[test]
fn controller_gives_back_radio() {
    let (mut ctrl, mut sink, log) = controller();
    ctrl.start(SessionConfig::default(), &mut sink);

    let radio = ctrl.into_radio();
    radio.0.push(Event::DriverStop);
    assert_eq!(log.driver_stops(), 1);
}

// ============================================================================
// Jammer (tick runtime) Tests
// ============================================================================

#[test]
fn start_when_idle() {
    let (mut jammer, mut sink, log) = jammer();

    jammer.handle(b">", &mut sink);

    assert_eq!(jammer.state(), EmissionState::Transmitting);
    assert_eq!(log.acks(), vec![Ack::Started]);
    let config = SessionConfig::default();
    assert_eq!(log.driver_starts(), vec![(config.power, config.channel)]);
}

#[test]
fn start_while_transmitting_is_idempotent() {
    let (mut jammer, mut sink, log) = jammer();

    jammer.handle(b">", &mut sink);
    jammer.handle(b">", &mut sink);

    assert_eq!(log.acks(), vec![Ack::Started]);
    assert_eq!(log.driver_starts().len(), 1);
}

#[test]
fn stop_when_idle_acks_without_driver() {
    let (mut jammer, mut sink, log) = jammer();

    jammer.handle(b"=", &mut sink);

    assert_eq!(log.acks(), vec![Ack::Stopped]);
    assert_eq!(log.driver_stops(), 0);
}

#[test]
fn stop_when_transmitting_acks_once_before_driver() {
    let (mut jammer, mut sink, log) = jammer();
    jammer.handle(b">", &mut sink);

    jammer.handle(b"=", &mut sink);

    assert_eq!(jammer.state(), EmissionState::Idle);
    assert_eq!(log.acks(), vec![Ack::Started, Ack::Stopped]);
    assert_eq!(log.driver_stops(), 1);
    let ack = log.position(Event::Ack(Ack::Stopped)).expect("stop ack");
    let stop = log.position(Event::DriverStop).expect("driver stop");
    assert!(ack < stop);
}

#[test]
fn session_expires_autonomously() {
    let (mut jammer, mut sink, log) = jammer();
    jammer.handle(b"&5", &mut sink);
    jammer.handle(b">", &mut sink);

    run_for(&mut jammer, &mut sink, 4_900);
    assert_eq!(jammer.state(), EmissionState::Transmitting);
    assert_eq!(log.driver_stops(), 0);

    run_for(&mut jammer, &mut sink, 100);
    assert_eq!(jammer.state(), EmissionState::Idle);
    assert_eq!(log.driver_stops(), 1);
    assert_eq!(log.acks().last(), Some(&Ack::Stopped));

    let ack = log.position(Event::Ack(Ack::Stopped)).expect("stop ack");
    let stop = log.position(Event::DriverStop).expect("driver stop");
    assert!(stop < ack);
}

#[test]
fn stop_mid_session_ends_early() {
    let (mut jammer, mut sink, log) = jammer();
    jammer.handle(b"&60", &mut sink);
    jammer.handle(b">", &mut sink);

    run_for(&mut jammer, &mut sink, 1_000);
    jammer.handle(b"=", &mut sink);
    assert_eq!(jammer.state(), EmissionState::Idle);

    // Nothing more happens for the rest of the configured duration
    run_for(&mut jammer, &mut sink, 59_000);
    assert_eq!(log.driver_stops(), 1);
    assert_eq!(
        log.acks(),
        vec![Ack::Duration(60), Ack::Started, Ack::Stopped]
    );
}

#[test]
fn full_session_ack_sequence() {
    let (mut jammer, mut sink, log) = jammer();

    jammer.handle(b"?110", &mut sink);
    jammer.handle(b"&2", &mut sink);
    jammer.handle(b">", &mut sink);
    run_for(&mut jammer, &mut sink, 2_000);

    assert_eq!(
        log.acks(),
        vec![
            Ack::Channel(ChannelCode::new(110)),
            Ack::Duration(2),
            Ack::Started,
            Ack::Stopped,
        ]
    );
    assert_eq!(jammer.state(), EmissionState::Idle);
}

#[test]
fn channel_ack_reports_mapped_frequency() {
    let (mut jammer, mut sink, log) = jammer();

    jammer.handle(b"?110", &mut sink);

    match log.acks().as_slice() {
        [Ack::Channel(cc)] => assert_eq!(cc.frequency().as_khz(), 868_000),
        other => panic!("unexpected acks {other:?}"),
    }
    assert_eq!(jammer.config().channel, ChannelCode::new(110));
}

#[test]
fn configuration_change_does_not_touch_running_session() {
    let (mut jammer, mut sink, log) = jammer();
    jammer.handle(b"&2", &mut sink);
    jammer.handle(b">", &mut sink);

    jammer.handle(b"&100", &mut sink);
    jammer.handle(b"?3", &mut sink);
    run_for(&mut jammer, &mut sink, 2_000);

    assert_eq!(jammer.state(), EmissionState::Idle);
    assert_eq!(log.driver_stops(), 1);
    assert_eq!(jammer.config().duration_s, 100);
    assert_eq!(jammer.config().channel, ChannelCode::new(3));
}

#[test]
fn new_session_uses_updated_configuration() {
    let (mut jammer, mut sink, log) = jammer();
    jammer.handle(b"&1", &mut sink);
    jammer.handle(b">", &mut sink);
    run_for(&mut jammer, &mut sink, 1_000);

    jammer.handle(b"?200", &mut sink);
    jammer.handle(b">", &mut sink);

    let starts = log.driver_starts();
    assert_eq!(starts.len(), 2);
    assert_eq!(starts[1].1, ChannelCode::new(200));
    assert!(jammer.controller().is_transmitting());
}

#[test]
fn unknown_commands_do_not_disturb_session() {
    let (mut jammer, mut sink, log) = jammer();
    jammer.handle(b">", &mut sink);

    jammer.handle(b"x", &mut sink);
    jammer.handle(b"", &mut sink);

    assert_eq!(jammer.state(), EmissionState::Transmitting);
    assert_eq!(log.acks(), vec![Ack::Started, Ack::Unknown, Ack::Unknown]);
}

#[test]
fn with_config_seeds_interpreter() {
    let log = Log::default();
    let config = SessionConfig::default().with_power(TxPower::Plus2);
    let mut jammer = Jammer::with_config(MockRadio(log.clone()), config);
    let mut sink = LogSink(log.clone());

    jammer.handle(b">", &mut sink);

    assert_eq!(log.driver_starts()[0].0, TxPower::Plus2);
    assert_eq!(jammer.radio().0.events().len(), 2);
}
