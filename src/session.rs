//! Shell sessions over stdin/stdout or a serial port
//!
//! The foreground loop of the firmware, hosted: bytes are read as they
//! arrive and fed to the shell one at a time, and a heartbeat is polled
//! between reads. A session ends at end of input or when the operator sends
//! Ctrl-D.

use std::fs;
use std::io::{self, ErrorKind, Read, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use flashshell_core::commands::{standard_commands, Target};
use flashshell_core::console::Console;
use flashshell_core::shell::{Outcome, Shell, ShellConfig};
use flashshell_core::store::LogStore;
use flashshell_core::tick::Heartbeat;
use flashshell_dummy::{DummyConfig, DummyFlash};

use crate::error::{AppError, Result};

/// Command context of the simulator
pub type HostTarget = Target<DummyFlash, LogStore>;

/// Size of the shell's line buffer
pub const LINE_LEN: usize = 128;

/// Ends the session (Ctrl-D)
const END_OF_TRANSMISSION: u8 = 0x04;

const HEARTBEAT_MS: u32 = 250;

/// Adapts a `std::io::Write` to `embedded_io::Write`
pub struct StdWriter<W>(pub W);

impl<W: Write> embedded_io::ErrorType for StdWriter<W> {
    type Error = embedded_io::ErrorKind;
}

impl<W: Write> embedded_io::Write for StdWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::result::Result<usize, Self::Error> {
        self.0.write(buf).map_err(|e| {
            log::debug!("console write: {}", e);
            embedded_io::ErrorKind::Other
        })
    }

    fn flush(&mut self) -> std::result::Result<(), Self::Error> {
        self.0.flush().map_err(|_| embedded_io::ErrorKind::Other)
    }
}

/// What happened during a session
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    /// Lines that ran a command (or help)
    pub commands: u32,
    /// Commands that returned an error code
    pub failures: u32,
    /// Lines naming no command
    pub unknown: u32,
}

/// Create the emulated flash, from `image` if it exists
pub fn load_flash(config: DummyConfig, image: Option<&Path>) -> Result<DummyFlash> {
    let Some(path) = image else {
        return Ok(DummyFlash::new(config));
    };

    match fs::read(path) {
        Ok(data) => {
            let size = config.geometry.total_size() as usize;
            if data.len() != size {
                return Err(AppError::Image {
                    path: path.to_path_buf(),
                    message: format!("{} bytes, flash has {}", data.len(), size),
                });
            }
            log::info!("Loaded flash image {}", path.display());
            Ok(DummyFlash::with_data(config, &data))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log::info!("{} does not exist, starting with erased flash", path.display());
            Ok(DummyFlash::new(config))
        }
        Err(e) => Err(e.into()),
    }
}

/// Write the flash contents back to `image`
pub fn save_flash(flash: &DummyFlash, image: &Path) -> Result<()> {
    fs::write(image, flash.data())?;
    log::info!("Saved flash image {}", image.display());
    Ok(())
}

/// Run a shell session until end of input
///
/// Reads that time out are not errors; they only give the heartbeat a
/// chance to run.
pub fn run<R: Read, W: Write>(
    mut input: R,
    output: W,
    target: &mut HostTarget,
    config: ShellConfig<'_>,
) -> Result<Summary> {
    let table = standard_commands::<DummyFlash, LogStore>();
    let mut shell: Shell<'_, _, LINE_LEN> = Shell::new(&table, config);
    let mut console = Console::new(StdWriter(output));
    let mut summary = Summary::default();

    let epoch = Instant::now();
    let now_ms = || epoch.elapsed().as_millis() as u32;
    let mut heartbeat = Heartbeat::new(HEARTBEAT_MS, now_ms());
    let mut buf = [0u8; 64];

    shell.start(&mut console);
    console.flush();

    'session: loop {
        if heartbeat.poll(now_ms()) {
            log::trace!("heartbeat");
        }

        let len = match input.read(&mut buf) {
            Ok(0) => break,
            Ok(len) => len,
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::Interrupted) => continue,
            Err(e) => return Err(e.into()),
        };

        for &byte in &buf[..len] {
            if byte == END_OF_TRANSMISSION {
                break 'session;
            }
            match shell.submit_byte(byte, target, &mut console) {
                Some(Outcome::Completed { result, .. }) => {
                    summary.commands += 1;
                    if result.is_err() {
                        summary.failures += 1;
                    }
                }
                Some(Outcome::Help) => summary.commands += 1,
                Some(Outcome::Unknown) | Some(Outcome::Rejected(_)) => summary.unknown += 1,
                None => {}
            }
        }
        console.flush();
    }

    console.flush();
    if console.errors() > 0 {
        log::warn!("{} console writes failed", console.errors());
    }
    Ok(summary)
}

/// Serve the shell on a serial port
pub fn run_serial(
    device: &str,
    baud: u32,
    target: &mut HostTarget,
    config: ShellConfig<'_>,
) -> Result<Summary> {
    use serialport::{DataBits, FlowControl, Parity, StopBits};

    let port = serialport::new(device, baud)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .timeout(Duration::from_millis(HEARTBEAT_MS as u64 / 5))
        .open()?;
    log::info!("Opened serial port {} at {} baud", device, baud);

    let output = port.try_clone()?;
    run(port, output, target, config)
}

/// Serve the shell on stdin/stdout
pub fn run_stdio(target: &mut HostTarget, config: ShellConfig<'_>) -> Result<Summary> {
    run(io::stdin().lock(), io::stdout().lock(), target, config)
}
