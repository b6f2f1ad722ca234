//! Error types.
//!
//! Nothing in the modem core is fatal: every error here ends up as a line of
//! text on the emulated terminal (or a log record), never as a panic.

use thiserror::Error;

/// Validation and configuration failures.
#[derive(Debug, Error)]
pub enum ModemError {
    /// Not four dot-separated decimal octets.
    #[error("invalid IPv4 address: {0:?}")]
    InvalidIp(String),

    /// Not six colon-separated hex octets.
    #[error("invalid MAC address: {0:?}")]
    InvalidMac(String),

    /// DHCP switch other than `0` or `1`.
    #[error("invalid DHCP switch: {0:?}")]
    InvalidSwitch(String),

    /// Timeout value that is not a non-zero 16-bit decimal.
    #[error("invalid timeout: {0:?}")]
    InvalidTimeout(String),

    /// Port suffix that is not a 16-bit decimal.
    #[error("invalid port: {0:?}")]
    InvalidPort(String),

    #[error("config parse error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures opening the download sink.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No storage medium (SD card) present.
    #[error("no storage medium")]
    NoMedia,

    /// Refusing to overwrite an existing file.
    #[error("file already exists: {0}")]
    AlreadyExists(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Text shown on the terminal for this failure.
    pub fn terminal_message(&self) -> &'static str {
        match self {
            StorageError::NoMedia => "No SD card",
            StorageError::AlreadyExists(_) => "File already exists",
            StorageError::Io(_) => "Error opening file",
        }
    }
}
