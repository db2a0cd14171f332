//! Shell commands
//!
//! Every command receives a [`Target`]: the guard, the flash driver and the
//! record store it is allowed to use. Nothing is looked up globally, so a
//! test can hand in doubles for any of them.
//!
//! Each command defines its own negative return codes:
//!
//! | command | codes |
//! |---|---|
//! | `dump` | -1 missing args, -2 bad mode, -3 bad number, -4 page out of range, -5 read failure |
//! | `erase` | -1 missing args, -2 bad page, -3 bad count, -4 protected/out of range, -5 driver error |
//! | `write` | -1 missing args, -2 bad address, -3 bad value, -4 protected/unaligned, -5 driver error, -6 readback mismatch |
//! | `unlock` | -1 driver error |
//! | `fds` | -1 missing args, -2 unknown subcommand, -3 bad number, -4 record too long, -5 store error |

mod fds;
mod flash;
mod system;

pub use fds::Fds;
pub use flash::{Dump, Erase, Lock, Unlock, Write};
pub use system::{Info, Ver};

use crate::error::{CommandError, Reason};
use crate::flash::{FlashDriver, FlashGuard};
use crate::number::parse_number;
use crate::shell::Command;
use crate::store::RecordStore;

/// Identification printed by `ver`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareInfo {
    /// Program name
    pub name: &'static str,
    /// Release
    pub version: &'static str,
    /// Build identification (timestamp or revision)
    pub build: &'static str,
}

/// Everything a command may operate on
pub struct Target<F, S> {
    /// Protection policy
    pub guard: FlashGuard,
    /// Flash driver
    pub flash: F,
    /// Record store
    pub store: S,
    /// Identification for `ver`
    pub firmware: FirmwareInfo,
}

impl<F: FlashDriver, S: RecordStore> Target<F, S> {
    /// Bundle the command context
    pub fn new(guard: FlashGuard, flash: F, store: S, firmware: FirmwareInfo) -> Self {
        Self {
            guard,
            flash,
            store,
            firmware,
        }
    }
}

/// The full command table
pub fn standard_commands<'a, F, S>() -> [&'a dyn Command<Target<F, S>>; 8]
where
    F: FlashDriver + 'a,
    S: RecordStore + 'a,
{
    [&Ver, &Info, &Dump, &Erase, &Write, &Lock, &Unlock, &Fds]
}

/// Argument `index`, or a missing-arguments failure with `code`
fn required<'a>(args: &[&'a str], index: usize, code: i8) -> Result<&'a str, CommandError> {
    args.get(index)
        .copied()
        .ok_or(CommandError::new(code, Reason::MissingArguments))
}

/// Parse `token` as the argument called `arg`, failing with `code`
fn parse_arg<T: TryFrom<u32>>(token: &str, arg: &'static str, code: i8) -> Result<T, CommandError> {
    parse_number(token).map_err(|error| CommandError::new(code, Reason::InvalidNumber { arg, error }))
}
