//! `ver` and `info`

use super::Target;
use crate::console::Terminal;
use crate::error::CommandError;
use crate::flash::FlashDriver;
use crate::shell::Command;
use crate::store::RecordStore;

/// Print name, version and build
pub struct Ver;

impl<F: FlashDriver, S: RecordStore> Command<Target<F, S>> for Ver {
    fn name(&self) -> &'static str {
        "ver"
    }

    fn usage(&self) -> &'static str {
        "Print version information"
    }

    fn execute(
        &self,
        ctx: &mut Target<F, S>,
        _args: &[&str],
        out: &mut dyn Terminal,
    ) -> Result<(), CommandError> {
        let fw = &ctx.firmware;
        writeln!(out, "{} {}", fw.name, fw.version);
        writeln!(out, "build:   {}", fw.build);
        Ok(())
    }
}

/// Print flash geometry, protection and record store status
pub struct Info;

impl<F: FlashDriver, S: RecordStore> Command<Target<F, S>> for Info {
    fn name(&self) -> &'static str {
        "info"
    }

    fn usage(&self) -> &'static str {
        "Print flash layout and record store status"
    }

    fn execute(
        &self,
        ctx: &mut Target<F, S>,
        _args: &[&str],
        out: &mut dyn Terminal,
    ) -> Result<(), CommandError> {
        let g = ctx.guard.geometry();
        let writable = ctx.guard.writable_range();

        writeln!(out, "flash base:  0x{:08X}", g.base);
        writeln!(out, "page size:   {} bytes", g.page_size);
        writeln!(out, "page count:  {}", g.page_count);
        writeln!(
            out,
            "total size:  {} bytes ({} KiB)",
            g.total_size(),
            g.total_size() / 1024
        );
        writeln!(
            out,
            "writable:    0x{:08X}..0x{:08X} (pages {}..{})",
            writable.start,
            writable.end,
            ctx.guard.protected_boundary(),
            g.page_count
        );
        writeln!(
            out,
            "controller:  {}",
            if ctx.flash.is_locked() { "locked" } else { "unlocked" }
        );

        match ctx.store.status(&mut ctx.flash) {
            Ok(status) => writeln!(
                out,
                "fds:         {} records ({} entries), {}/{} bytes used",
                status.records, status.entries, status.used, status.capacity
            ),
            Err(e) => writeln!(out, "fds:         {}", e),
        }
        Ok(())
    }
}
