//! CLI argument parsing

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "flashshell")]
#[command(author, version, about = "Flash test shell on an emulated STM32F1", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Device and shell configuration (TOML format)
    /// Defaults to the Nucleo-F103RB layout
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Flash image backing the emulator, loaded at start and saved on exit
    #[arg(short, long)]
    pub image: Option<PathBuf>,

    /// Serve the shell on a serial port instead of stdin/stdout
    #[arg(short, long)]
    pub serial: Option<String>,

    /// Serial baud rate
    #[arg(short, long, default_value_t = 115_200)]
    pub baud: u32,

    /// Do not echo typed characters
    #[arg(long)]
    pub no_echo: bool,

    /// Prompt printed before each line (overrides the config file)
    #[arg(long)]
    pub prompt: Option<String>,
}
