//! flashshell - Flash test shell on an emulated STM32F1
//!
//! Runs the same command shell as the Nucleo firmware against an in-memory
//! flash, either on the terminal or on a serial port. With `--image` the
//! flash contents persist across runs, records in the store included.

mod cli;
mod config;
mod error;
mod session;

use clap::Parser;
use cli::Cli;
use config::SimConfig;
use flashshell_core::commands::{FirmwareInfo, Target};
use flashshell_core::shell::ShellConfig;
use flashshell_dummy::DummyConfig;

const FIRMWARE: FirmwareInfo = FirmwareInfo {
    name: env!("CARGO_PKG_NAME"),
    version: env!("CARGO_PKG_VERSION"),
    build: match option_env!("FLASHSHELL_BUILD") {
        Some(build) => build,
        None => "dev",
    },
};

fn main() {
    // Logs go to stderr, the shell owns stdout
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> error::Result<()> {
    let mut sim = SimConfig::load(cli.config.as_deref())?;
    if cli.no_echo {
        sim.shell.echo = false;
    }
    if let Some(prompt) = cli.prompt {
        sim.shell.prompt = prompt;
    }

    let device = sim.device;
    if !sim.emulator.write_protected.is_empty() {
        log::info!(
            "Pages {}..{} write protected",
            sim.emulator.write_protected.start,
            sim.emulator.write_protected.end
        );
    }
    if sim.emulator.lock_jammed {
        log::info!("Flash controller will refuse to unlock");
    }
    let flash = session::load_flash(
        DummyConfig {
            geometry: device.geometry,
            write_protected: sim.emulator.write_protected,
            lock_jammed: sim.emulator.lock_jammed,
        },
        cli.image.as_deref(),
    )?;
    let mut target = Target::new(device.guard(), flash, device.store(), FIRMWARE);

    log::info!(
        "{} KiB flash at 0x{:08X}, pages {}..{} writable",
        device.geometry.total_size() / 1024,
        device.geometry.base,
        device.protected_boundary,
        device.geometry.page_count
    );

    let shell = ShellConfig {
        echo: sim.shell.echo,
        prompt: &sim.shell.prompt,
        help: true,
    };
    let summary = match cli.serial.as_deref() {
        Some(port) => session::run_serial(port, cli.baud, &mut target, shell)?,
        None => session::run_stdio(&mut target, shell)?,
    };

    let stats = target.flash.stats();
    log::info!(
        "{} commands ({} failed, {} unknown), {} erases, {} programs",
        summary.commands,
        summary.failures,
        summary.unknown,
        stats.erases,
        stats.programs
    );

    if let Some(image) = cli.image.as_deref() {
        session::save_flash(&target.flash, image)?;
    }
    Ok(())
}
