//! Line oriented command shell
//!
//! Bytes arrive one at a time from the serial link through
//! [`Shell::submit_byte`]. A line terminator runs the command named by the
//! first token of the line with the remaining tokens as arguments.
//!
//! The command table is built once and never changes. Apart from the line
//! being typed the shell keeps no state between commands.

use heapless::Vec;

use crate::console::Terminal;
use crate::error::{CommandError, Reason};

/// Maximum number of argument tokens after the command name
pub const MAX_ARGS: usize = 8;

const BACKSPACE: u8 = 0x08;
const DELETE: u8 = 0x7F;

/// A command the shell can run
///
/// `C` is the context every command of a table receives, typically the
/// flash driver and record store bundled in a
/// [`Target`](crate::commands::Target).
pub trait Command<C: ?Sized> {
    /// Name typed by the operator
    fn name(&self) -> &'static str;

    /// Alternative names
    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    /// One line usage summary shown by `help`
    fn usage(&self) -> &'static str;

    /// Run the command with the tokens following its name
    fn execute(
        &self,
        ctx: &mut C,
        args: &[&str],
        out: &mut dyn Terminal,
    ) -> Result<(), CommandError>;

    /// Whether `name` selects this command
    fn matches(&self, name: &str) -> bool {
        self.name() == name || self.aliases().iter().any(|alias| *alias == name)
    }
}

/// Behaviour switches of a shell instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShellConfig<'a> {
    /// Echo typed characters back to the terminal
    pub echo: bool,
    /// Prompt printed when the shell is ready for a line (empty for none)
    pub prompt: &'a str,
    /// Answer `help` with the command table when no command claims it
    pub help: bool,
}

impl Default for ShellConfig<'_> {
    fn default() -> Self {
        Self {
            echo: true,
            prompt: "> ",
            help: true,
        }
    }
}

impl ShellConfig<'_> {
    /// No echo, no prompt: every output byte comes from a command
    pub const fn quiet() -> Self {
        Self {
            echo: false,
            prompt: "",
            help: true,
        }
    }
}

/// What happened to a completed line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A command ran
    Completed {
        /// Name of the command that ran
        command: &'static str,
        /// Its result
        result: Result<(), CommandError>,
    },
    /// The built-in help ran
    Help,
    /// No command has this name
    Unknown,
    /// The line could not be split into a command and arguments
    Rejected(Reason),
}

/// Command shell over a static table
///
/// `LINE` is the size of the line buffer; longer lines are cut silently.
pub struct Shell<'a, C: ?Sized, const LINE: usize> {
    commands: &'a [&'a dyn Command<C>],
    config: ShellConfig<'a>,
    line: Vec<u8, LINE>,
    after_cr: bool,
}

impl<'a, C: ?Sized, const LINE: usize> Shell<'a, C, LINE> {
    /// Create a shell over `commands`
    pub fn new(commands: &'a [&'a dyn Command<C>], config: ShellConfig<'a>) -> Self {
        Self {
            commands,
            config,
            line: Vec::new(),
            after_cr: false,
        }
    }

    /// The command table
    pub fn commands(&self) -> &'a [&'a dyn Command<C>] {
        self.commands
    }

    /// Print the prompt for the first line
    pub fn start(&self, out: &mut dyn Terminal) {
        out.write_str(self.config.prompt);
    }

    /// Feed one received byte
    ///
    /// Returns the outcome when the byte completed a non-empty line.
    pub fn submit_byte(&mut self, byte: u8, ctx: &mut C, out: &mut dyn Terminal) -> Option<Outcome> {
        let after_cr = core::mem::replace(&mut self.after_cr, byte == b'\r');

        match byte {
            b'\n' if after_cr => None,
            b'\r' | b'\n' => {
                if self.config.echo {
                    out.write_bytes(b"\n");
                }
                let outcome = self.process_line(ctx, out);
                self.line.clear();
                out.write_str(self.config.prompt);
                outcome
            }
            BACKSPACE | DELETE => {
                if self.line.pop().is_some() && self.config.echo {
                    out.write_bytes(b"\x08 \x08");
                }
                None
            }
            b'\t' | 0x20..=0x7E => {
                if self.line.push(byte).is_ok() && self.config.echo {
                    out.write_bytes(&[byte]);
                }
                None
            }
            _ => None,
        }
    }

    fn process_line(&self, ctx: &mut C, out: &mut dyn Terminal) -> Option<Outcome> {
        // Only printable ASCII and tabs are ever buffered.
        let line = core::str::from_utf8(&self.line).ok()?;
        let mut tokens = line.split_ascii_whitespace();
        let name = tokens.next()?;

        let mut args: Vec<&str, MAX_ARGS> = Vec::new();
        for token in tokens {
            if args.push(token).is_err() {
                writeln!(out, "{}: {}", name, Reason::TooManyArguments);
                return Some(Outcome::Rejected(Reason::TooManyArguments));
            }
        }

        log::trace!("shell: '{}' with {} argument(s)", name, args.len());

        let Some(command) = self.commands.iter().find(|c| c.matches(name)) else {
            if self.config.help && name == "help" {
                self.print_help(out);
                return Some(Outcome::Help);
            }
            writeln!(out, "unknown command: {}", name);
            return Some(Outcome::Unknown);
        };

        let result = command.execute(ctx, &args, out);
        if let Err(e) = result {
            log::debug!("shell: {} failed with {}", command.name(), e.code());
            writeln!(out, "{}", e);
        }

        Some(Outcome::Completed {
            command: command.name(),
            result,
        })
    }

    fn print_help(&self, out: &mut dyn Terminal) {
        writeln!(out, "Supported commands:");
        for command in self.commands {
            write!(out, "  {:<8} {}", command.name(), command.usage());
            for alias in command.aliases() {
                write!(out, " (alias: {})", alias);
            }
            writeln!(out);
        }
        writeln!(out, "  {:<8} Print this text", "help");
    }
}
