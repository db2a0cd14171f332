//! Error types for the simulator

use std::path::PathBuf;

use thiserror::Error;

/// Anything that ends a simulator run
#[derive(Debug, Error)]
pub enum AppError {
    /// Console or file I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial port could not be opened or configured
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// Configuration file is unreadable or describes an impossible device
    #[error("Invalid configuration {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },

    /// Flash image does not match the configured flash
    #[error("Flash image {}: {message}", .path.display())]
    Image { path: PathBuf, message: String },
}

/// Result type for simulator operations
pub type Result<T> = std::result::Result<T, AppError>;
