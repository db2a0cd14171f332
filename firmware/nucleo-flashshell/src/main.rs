//! Flash test shell firmware for the Nucleo-F103RB
//!
//! Serves the shell on the ST-LINK virtual COM port and blinks the user LED
//! while idle. The first 32 KiB of flash hold this firmware and are never
//! modified; the record store lives in the last 8 pages.
//!
//! ## Pin Assignments
//!
//! | Pin | Function            |
//! |-----|---------------------|
//! | PA2 | USART2 TX (VCP)     |
//! | PA3 | USART2 RX (VCP)     |
//! | PA5 | LD2 (heartbeat)     |

#![no_std]
#![no_main]

mod flash;

use cortex_m_rt::entry;
use defmt::{info, warn};
use embassy_stm32::gpio::{Level, Output, Speed};
use embassy_stm32::usart::{self, BufferedUart};
use embassy_stm32::{bind_interrupts, peripherals};
use embassy_time::Instant;
use embedded_io::{Read, ReadReady};
use flashshell_core::commands::{standard_commands, FirmwareInfo, Target};
use flashshell_core::config::NUCLEO_F103RB;
use flashshell_core::console::Console;
use flashshell_core::shell::{Outcome, Shell, ShellConfig};
use flashshell_core::store::LogStore;
use flashshell_core::tick::Heartbeat;
use {defmt_rtt as _, panic_probe as _};

use crate::flash::Stm32Flash;

bind_interrupts!(struct Irqs {
    USART2 => usart::BufferedInterruptHandler<peripherals::USART2>;
});

const FIRMWARE: FirmwareInfo = FirmwareInfo {
    name: env!("CARGO_PKG_NAME"),
    version: env!("CARGO_PKG_VERSION"),
    build: match option_env!("FLASHSHELL_BUILD") {
        Some(build) => build,
        None => "dev",
    },
};

/// LED toggle period
const HEARTBEAT_MS: u32 = 250;

/// Longest command line
const LINE_LEN: usize = 64;

#[entry]
fn main() -> ! {
    let p = embassy_stm32::init(Default::default());
    info!("{} {} starting", FIRMWARE.name, FIRMWARE.version);

    let mut led = Output::new(p.PA5, Level::Low, Speed::Low);

    let mut config = usart::Config::default();
    config.baudrate = 115_200;
    let mut tx_buf = [0u8; 256];
    let mut rx_buf = [0u8; 64];
    let uart = match BufferedUart::new(
        p.USART2,
        p.PA3,
        p.PA2,
        &mut tx_buf,
        &mut rx_buf,
        Irqs,
        config,
    ) {
        Ok(uart) => uart,
        Err(e) => defmt::panic!("USART2 config rejected: {}", e),
    };
    let (tx, mut rx) = uart.split();
    let mut console = Console::new(tx);

    let device = NUCLEO_F103RB;
    let mut target = Target::new(
        device.guard(),
        Stm32Flash::new(device.geometry),
        device.store(),
        FIRMWARE,
    );

    let table = standard_commands::<Stm32Flash, LogStore>();
    let mut shell: Shell<'_, _, LINE_LEN> = Shell::new(&table, ShellConfig::default());

    let now_ms = || Instant::now().as_millis() as u32;
    let mut heartbeat = Heartbeat::new(HEARTBEAT_MS, now_ms());
    let mut reported_errors = 0;

    info!("shell ready on USART2");
    shell.start(&mut console);

    loop {
        if heartbeat.poll(now_ms()) {
            led.toggle();
        }

        match rx.read_ready() {
            Ok(true) => {}
            Ok(false) => continue,
            Err(e) => {
                warn!("USART2 receive error: {}", e);
                continue;
            }
        }

        let mut byte = [0u8; 1];
        match rx.read(&mut byte) {
            Ok(1) => {}
            Ok(_) => continue,
            Err(e) => {
                warn!("USART2 receive error: {}", e);
                continue;
            }
        }

        if let Some(Outcome::Completed {
            command,
            result: Err(e),
        }) = shell.submit_byte(byte[0], &mut target, &mut console)
        {
            warn!("{} returned {}", command, e.code());
        }
        if console.errors() != reported_errors {
            reported_errors = console.errors();
            warn!("{} console writes failed", reported_errors);
        }
    }
}
