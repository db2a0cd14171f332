//! Flash commands: `dump`, `erase`, `write`, `lock`, `unlock`
//!
//! Erase and write go through the [`FlashGuard`](crate::flash::FlashGuard)
//! before the driver is touched. Memory dumps are not range checked.

use super::{parse_arg, required, Target};
use crate::console::Terminal;
use crate::dump::{self, DumpMode, DumpRequest};
use crate::error::{CommandError, Reason};
use crate::flash::FlashDriver;
use crate::shell::Command;
use crate::store::RecordStore;

/// Parse the optional render flag of `dump`
fn render_mode(flag: Option<&&str>) -> Result<DumpMode, CommandError> {
    match flag.copied() {
        None | Some("h") => Ok(DumpMode::Hex),
        Some("a") => Ok(DumpMode::Ascii),
        Some(_) => Err(CommandError::new(-2, Reason::InvalidMode)),
    }
}

/// Dump a page or a raw memory range
pub struct Dump;

impl<F: FlashDriver, S: RecordStore> Command<Target<F, S>> for Dump {
    fn name(&self) -> &'static str {
        "dump"
    }

    fn usage(&self) -> &'static str {
        "p <page> [a] | m <addr> <count> [a]: dump a page or memory"
    }

    fn execute(
        &self,
        ctx: &mut Target<F, S>,
        args: &[&str],
        out: &mut dyn Terminal,
    ) -> Result<(), CommandError> {
        let request = match required(args, 0, -1)? {
            "p" | "page" => {
                let page: u32 = parse_arg(required(args, 1, -1)?, "page", -3)?;
                let geometry = ctx.guard.geometry();
                if page >= geometry.page_count {
                    return Err(CommandError::new(-4, Reason::OutOfRange { arg: "page" }));
                }
                DumpRequest {
                    start: geometry.page_to_address(page),
                    count: geometry.page_size,
                    mode: render_mode(args.get(2))?,
                }
            }
            "m" | "memory" => DumpRequest {
                start: parse_arg(required(args, 1, -1)?, "address", -3)?,
                count: parse_arg(required(args, 2, -1)?, "count", -3)?,
                mode: render_mode(args.get(3))?,
            },
            _ => return Err(CommandError::new(-2, Reason::InvalidMode)),
        };

        log::debug!(
            "dump 0x{:08X} +{} ({:?})",
            request.start,
            request.count,
            request.mode
        );
        let flash = &mut ctx.flash;
        dump::render(out, &request, |address, buf| flash.read(address, buf))
            .map_err(|e| CommandError::new(-5, Reason::Driver(e)))?;
        Ok(())
    }
}

/// Erase one or more consecutive pages
pub struct Erase;

impl<F: FlashDriver, S: RecordStore> Command<Target<F, S>> for Erase {
    fn name(&self) -> &'static str {
        "erase"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["clr"]
    }

    fn usage(&self) -> &'static str {
        "<page> [count]: erase pages"
    }

    fn execute(
        &self,
        ctx: &mut Target<F, S>,
        args: &[&str],
        out: &mut dyn Terminal,
    ) -> Result<(), CommandError> {
        let first: u32 = parse_arg(required(args, 0, -1)?, "page", -2)?;
        let count: u32 = match args.get(1) {
            Some(token) => parse_arg(token, "count", -3)?,
            None => 1,
        };

        let pages = ctx.guard.erasable_pages(first, count).ok_or_else(|| {
            let reason = if first >= ctx.guard.geometry().page_count {
                Reason::OutOfRange { arg: "page" }
            } else if !ctx.guard.is_erasable(first) {
                Reason::ProtectedPage { page: first }
            } else {
                // Empty range or one running past the last page
                Reason::OutOfRange { arg: "count" }
            };
            CommandError::new(-4, reason)
        })?;

        for page in pages {
            let address = ctx.guard.page_to_address(page);
            log::debug!("erase page {} @ 0x{:08X}", page, address);
            if let Err(e) = ctx.flash.erase_page(address) {
                log::warn!("erase of page {} failed: {}", page, e);
                return Err(CommandError::new(-5, Reason::Driver(e)));
            }
            writeln!(out, "erased page {} @ 0x{:08X}", page, address);
        }
        Ok(())
    }
}

/// Program one half-word and verify it
pub struct Write;

impl<F: FlashDriver, S: RecordStore> Command<Target<F, S>> for Write {
    fn name(&self) -> &'static str {
        "write"
    }

    fn usage(&self) -> &'static str {
        "<addr> <value>: program a half-word"
    }

    fn execute(
        &self,
        ctx: &mut Target<F, S>,
        args: &[&str],
        _out: &mut dyn Terminal,
    ) -> Result<(), CommandError> {
        let address: u32 = parse_arg(required(args, 0, -1)?, "address", -2)?;
        let value: u16 = parse_arg(required(args, 1, -1)?, "value", -3)?;

        if !ctx.guard.is_writable(address) {
            log::warn!("refusing to write protected address 0x{:08X}", address);
            return Err(CommandError::new(-4, Reason::ProtectedAddress { address }));
        }
        if address % 2 != 0 {
            return Err(CommandError::new(-4, Reason::Unaligned { address }));
        }

        log::debug!("program 0x{:08X} = 0x{:04X}", address, value);
        let driver = |e| CommandError::new(-5, Reason::Driver(e));
        ctx.flash.program_half_word(address, value).map_err(driver)?;

        let found = ctx.flash.read_half_word(address).map_err(driver)?;
        if found != value {
            log::warn!(
                "readback mismatch at 0x{:08X}: 0x{:04X} != 0x{:04X}",
                address,
                found,
                value
            );
            return Err(CommandError::new(
                -6,
                Reason::Verify {
                    address,
                    expected: value,
                    found,
                },
            ));
        }
        Ok(())
    }
}

/// Lock the flash controller
pub struct Lock;

impl<F: FlashDriver, S: RecordStore> Command<Target<F, S>> for Lock {
    fn name(&self) -> &'static str {
        "lock"
    }

    fn usage(&self) -> &'static str {
        "Lock flash against erase and write"
    }

    fn execute(
        &self,
        ctx: &mut Target<F, S>,
        _args: &[&str],
        _out: &mut dyn Terminal,
    ) -> Result<(), CommandError> {
        ctx.flash.lock();
        Ok(())
    }
}

/// Unlock the flash controller
pub struct Unlock;

impl<F: FlashDriver, S: RecordStore> Command<Target<F, S>> for Unlock {
    fn name(&self) -> &'static str {
        "unlock"
    }

    fn usage(&self) -> &'static str {
        "Unlock flash for erase and write"
    }

    fn execute(
        &self,
        ctx: &mut Target<F, S>,
        _args: &[&str],
        _out: &mut dyn Terminal,
    ) -> Result<(), CommandError> {
        ctx.flash
            .unlock()
            .map_err(|e| CommandError::new(-1, Reason::Driver(e)))
    }
}
