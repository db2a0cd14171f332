//! flashshell-core - Guarded internal flash access and its command shell
//!
//! This crate contains everything the flash test shell does that does not
//! touch hardware directly: parsing operator input, dispatching commands,
//! deciding which flash pages may be modified, and formatting dumps. The
//! flash driver and the record store are reached through the
//! [`flash::FlashDriver`] and [`store::RecordStore`] traits so the same
//! commands run on the target and against an emulator.
//!
//! # Features
//!
//! - `std` - Enable standard library support (`std::error::Error` impls)
//!
//! # Example
//!
//! ```ignore
//! use flashshell_core::commands::{standard_commands, FirmwareInfo, Target};
//! use flashshell_core::config::NUCLEO_F103RB;
//! use flashshell_core::shell::{Shell, ShellConfig};
//!
//! let mut target = Target::new(NUCLEO_F103RB.guard(), flash, NUCLEO_F103RB.store(), info);
//! let table = standard_commands();
//! let mut shell: Shell<'_, _, 64> = Shell::new(&table, ShellConfig::default());
//! for byte in b"info\n" {
//!     shell.submit_byte(*byte, &mut target, &mut console);
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(any(feature = "std", test))]
extern crate std;

pub mod commands;
pub mod config;
pub mod console;
pub mod dump;
pub mod error;
pub mod flash;
pub mod number;
pub mod shell;
pub mod store;
pub mod tick;

#[cfg(test)]
mod mock;

pub use error::{CommandError, DriverError, Reason, StoreError};
