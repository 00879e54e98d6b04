#![no_std]
#![no_main]

use bincom_firmware::{
    Board, CommandServer, UartPort, Watchdog, BAUD_RATE, COMMANDS, HEARTBEAT_TIMEOUT_TICKS,
};
use defmt::{error, info};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::uart::{Config as UartConfig, Uart};

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("bincom firmware starting...");

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    // --- UART Setup ---
    // Blocking mode: no UART interrupt is bound, the server polls the FIFOs
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = BAUD_RATE;
    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let port = UartPort::new(uart);

    // --- Board Setup ---
    let led = Output::new(p.PIN_25, Level::Low);
    let actuator = Output::new(p.PIN_15, Level::Low);
    let mut board = Board::new(led, actuator);

    let watchdog = Watchdog::new(HEARTBEAT_TIMEOUT_TICKS);
    let mut server = match CommandServer::new(port, &COMMANDS, watchdog) {
        Ok(server) => server,
        Err(e) => {
            error!("Invalid command table: {:?}", e);
            halt();
        }
    };
    info!(
        "Serving {} commands at {} baud",
        server.commands().count(),
        BAUD_RATE
    );

    // Never yields: this loop is the whole firmware
    while !board.is_halted() {
        if let Err(e) = server.poll(&mut board) {
            error!("UART error: {:?}", e);
        }
    }

    error!("Watchdog expired, command server stopped");
    halt();
}

fn halt() -> ! {
    loop {
        cortex_m::asm::wfi();
    }
}
