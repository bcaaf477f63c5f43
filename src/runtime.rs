//! Embassy runtime
//!
//! Three cooperative tasks on one executor:
//!
//! ```text
//!  serial RX ──► command input ──CONTROL──► emission ──► transceiver
//!                     │                         │
//!                     └──────────ACKS───────────┴──► ack output ──► serial TX
//! ```
//!
//! The emission task races its session deadline against the control channel,
//! so a stop takes effect as soon as the interpreter forwards it.
//!
//! Ack ordering: the input task waits on [`APPLIED`] after every request, so
//! the controller's `>` is queued before the interpreter acks the next line.
//! A `>` followed by `=` in one read always reaches the host as `>` then `=`.

use defmt::{debug, info, warn};
use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, Timer};
use embedded_io_async::{Read, Write};

use crate::config::{ACK_QUEUE_DEPTH, CONTROL_QUEUE_DEPTH};
use crate::jammer::emission::{EmissionController, StartOutcome, StopCause, Transceiver};
use crate::jammer::input::{CommandInput, RequestPort};
use crate::jammer::interpreter::{CommandInterpreter, ControlRequest};
use crate::protocol::{Ack, AckSink};
use crate::serial::LineWriter;

/// Requests from the command input task to the emission task
pub static CONTROL: Channel<CriticalSectionRawMutex, ControlRequest, CONTROL_QUEUE_DEPTH> =
    Channel::new();

/// Raised by the emission task once a request has been applied
pub static APPLIED: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Acknowledgements waiting for the serial writer
pub static ACKS: Channel<CriticalSectionRawMutex, Ack, ACK_QUEUE_DEPTH> = Channel::new();

/// Ack sink feeding [`ACKS`]
///
/// Never blocks; an ack is dropped (and logged) if the writer has fallen a
/// full queue behind.
#[derive(Clone, Copy, Debug, Default)]
pub struct QueueSink;

impl AckSink for QueueSink {
    fn send(&mut self, ack: Ack) {
        if ACKS.try_send(ack).is_err() {
            warn!("ack queue full, dropped {}", ack);
        }
    }
}

/// Request port over [`CONTROL`], completing on [`APPLIED`]
#[derive(Clone, Copy, Debug, Default)]
pub struct ControlPort;

impl RequestPort for ControlPort {
    async fn submit(&mut self, request: ControlRequest) {
        CONTROL.send(request).await;
        APPLIED.wait().await;
    }
}

/// Read host lines and interpret them
pub async fn run_command_input<R: Read>(mut rx: R, interpreter: CommandInterpreter) -> ! {
    let mut input = CommandInput::new(interpreter);
    let mut chunk = [0u8; 16];

    info!("command input ready, defaults {}", input.interpreter().config());

    loop {
        let n = match rx.read(&mut chunk).await {
            Ok(n) => n,
            Err(_) => {
                warn!("serial read error");
                continue;
            }
        };

        input
            .receive(&chunk[..n], &mut QueueSink, &mut ControlPort)
            .await;
    }
}

/// Own the transceiver and run sessions
///
/// Every request taken from [`CONTROL`] is answered on [`APPLIED`] once its
/// acks are queued and the driver has been called.
pub async fn run_emission<T: Transceiver>(mut controller: EmissionController<T>) -> ! {
    let mut acks = QueueSink;

    loop {
        let request = CONTROL.receive().await;
        let ControlRequest::Start(config) = request else {
            // Idle: already acknowledged, nothing to stop
            controller.apply(request, &mut acks);
            APPLIED.signal(());
            continue;
        };

        let outcome = controller.start(config, &mut acks);
        APPLIED.signal(());
        if outcome == StartOutcome::AlreadyTransmitting {
            continue;
        }

        let deadline = Instant::now() + Duration::from_secs(u64::from(config.duration_s));
        loop {
            match select(Timer::at(deadline), CONTROL.receive()).await {
                Either::First(()) => {
                    controller.stop(StopCause::Expired, &mut acks);
                    break;
                }
                Either::Second(ControlRequest::Stop) => {
                    controller.stop(StopCause::Requested, &mut acks);
                    APPLIED.signal(());
                    break;
                }
                Either::Second(ControlRequest::Start(_)) => {
                    debug!("start dropped, {}s session running", config.duration_s);
                    APPLIED.signal(());
                }
            }
        }
    }
}

/// Write queued acknowledgements to the host
pub async fn run_ack_output<W: Write>(mut tx: W) -> ! {
    let mut writer = LineWriter::new();

    loop {
        let ack = ACKS.receive().await;
        writer.clear();
        writer.write_ack(&ack);
        if tx.write_all(writer.as_bytes()).await.is_err() {
            warn!("serial write error, lost {}", ack);
        }
    }
}
