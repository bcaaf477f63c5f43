//! Jammer Node Main Application
//!
//! Entry point for the STM32F103 testbed node. Brings up the host serial
//! link and the AT86RF212 transceiver, then spawns the command, emission and
//! acknowledgement tasks.

#![no_std]
#![no_main]

use defmt::{info, unwrap, warn};
use embassy_executor::Spawner;
use embassy_stm32::gpio::{Level, Output, Speed};
use embassy_stm32::mode::Blocking;
use embassy_stm32::spi::{self, Spi};
use embassy_stm32::time::Hertz;
use embassy_stm32::usart::{self, BufferedUart, BufferedUartRx, BufferedUartTx};
use embassy_stm32::{bind_interrupts, peripherals};
use embassy_time::Timer;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use jammer_firmware::config::{RF_SPI_FREQUENCY_HZ, SERIAL_BUFFER_SIZE};
use jammer_firmware::drivers::at86rf212::At86rf212;
use jammer_firmware::jammer::emission::EmissionController;
use jammer_firmware::jammer::interpreter::CommandInterpreter;
use jammer_firmware::runtime::{run_ack_output, run_command_input, run_emission};
use jammer_firmware::serial::{DataBits, LineCoding, Parity, StopBits};

type Radio = At86rf212<Spi<'static, Blocking>, Output<'static>>;

bind_interrupts!(struct Irqs {
    USART1 => usart::BufferedInterruptHandler<peripherals::USART1>;
});

static UART_TX_BUF: StaticCell<[u8; SERIAL_BUFFER_SIZE]> = StaticCell::new();
static UART_RX_BUF: StaticCell<[u8; SERIAL_BUFFER_SIZE]> = StaticCell::new();

/// Transceiver reset line, held high for the life of the firmware
static RF_RESET: StaticCell<Output<'static>> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Jammer firmware v{}", env!("CARGO_PKG_VERSION"));

    let p = embassy_stm32::init(embassy_stm32::Config::default());

    // Host link: USART1, PA9 = TX, PA10 = RX
    let coding = LineCoding::default();
    let mut uart_config = usart::Config::default();
    uart_config.baudrate = coding.baud_rate;
    uart_config.data_bits = match coding.data_bits {
        DataBits::Eight => usart::DataBits::DataBits8,
        DataBits::Nine => usart::DataBits::DataBits9,
    };
    uart_config.parity = match coding.parity {
        Parity::None => usart::Parity::ParityNone,
        Parity::Odd => usart::Parity::ParityOdd,
        Parity::Even => usart::Parity::ParityEven,
    };
    uart_config.stop_bits = match coding.stop_bits {
        StopBits::One => usart::StopBits::STOP1,
        StopBits::Two => usart::StopBits::STOP2,
    };

    let uart = unwrap!(BufferedUart::new(
        p.USART1,
        Irqs,
        p.PA10,
        p.PA9,
        UART_TX_BUF.init([0; SERIAL_BUFFER_SIZE]),
        UART_RX_BUF.init([0; SERIAL_BUFFER_SIZE]),
        uart_config,
    ));
    let (tx, rx) = uart.split();

    info!("USART1 initialized at {} baud", coding.baud_rate);

    // Transceiver: SPI1 (PA5 SCK, PA6 MISO, PA7 MOSI), PA4 = SEL, PC1 = RST
    let mut rst = Output::new(p.PC1, Level::Low, Speed::Low);
    Timer::after_micros(10).await;
    rst.set_high();
    Timer::after_micros(500).await;

    let mut spi_config = spi::Config::default();
    spi_config.frequency = Hertz(RF_SPI_FREQUENCY_HZ);
    let spi = Spi::new_blocking(p.SPI1, p.PA5, p.PA7, p.PA6, spi_config);
    let sel = Output::new(p.PA4, Level::High, Speed::VeryHigh);

    let mut radio: Radio = At86rf212::new(spi, sel);
    match radio.init() {
        Ok(()) => info!("AT86RF212 ready"),
        Err(err) => warn!("AT86RF212 init failed: {}", err.as_str()),
    }

    let _rst: &'static mut Output<'static> = RF_RESET.init(rst);

    unwrap!(spawner.spawn(ack_output_task(tx)));
    unwrap!(spawner.spawn(emission_task(EmissionController::new(radio))));
    unwrap!(spawner.spawn(command_input_task(rx)));

    info!("Tasks spawned, waiting for host commands");
}

/// Interprets host commands
#[embassy_executor::task]
async fn command_input_task(rx: BufferedUartRx<'static>) {
    run_command_input(rx, CommandInterpreter::default()).await
}

/// Runs emission sessions
#[embassy_executor::task]
async fn emission_task(controller: EmissionController<Radio>) {
    run_emission(controller).await
}

/// Sends acknowledgements to the host
#[embassy_executor::task]
async fn ack_output_task(tx: BufferedUartTx<'static>) {
    run_ack_output(tx).await
}
