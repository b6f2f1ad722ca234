//! Modem configuration.
//!
//! Every field has a default, so an empty TOML document (or no file at all)
//! gives the stock cartridge behaviour. Sections:
//!
//! ```toml
//! [acia]
//! cycles_between_rx = 2300
//! nmi_timeout_us = 300
//!
//! [queue]
//! rx_capacity = 327680
//!
//! [dial]
//! default_port = 6400
//! escape_guard_ms = 1000
//!
//! [browser]
//! page_char_limit = 880
//! home = "sensoriumembedded.com:80/teensyrom/"
//!
//! [network]
//! dhcp_enabled = true
//! ```

use crate::error::ModemError;
use crate::rx_queue::DEFAULT_RX_CAPACITY;
use crate::services::NetSettings;
use crate::timing::RetryBudget;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModemConfig {
    pub acia: AciaConfig,
    pub queue: QueueConfig,
    pub dial: DialConfig,
    pub browser: BrowserConfig,
    pub wait: WaitConfig,
    /// Initial contents of the settings store.
    pub network: NetSettings,
}

impl ModemConfig {
    /// Load from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ModemError> {
        Ok(toml::from_str(s)?)
    }

    /// Load from a TOML file on disk.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ModemError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }
}

/// Bus timing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AciaConfig {
    /// Host cycles between receive interrupts. Lower values lose characters
    /// on large transfers.
    pub cycles_between_rx: u32,
    /// Longest an unread byte keeps the NMI asserted.
    pub nmi_timeout_us: u64,
}

impl Default for AciaConfig {
    fn default() -> Self {
        Self {
            cycles_between_rx: 2300,
            nmi_timeout_us: 300,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub rx_capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            rx_capacity: DEFAULT_RX_CAPACITY,
        }
    }
}

/// Raw connect (`ATDT`) and online mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialConfig {
    /// Port used when `ATDT` names none.
    pub default_port: u16,
    /// Silence required around `+++`.
    pub escape_guard_ms: u64,
}

impl Default for DialConfig {
    fn default() -> Self {
        Self {
            default_port: 6400,
            escape_guard_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Characters per page before output pauses (22 lines of 40).
    pub page_char_limit: u32,
    /// Page every history slot starts out pointing at.
    pub home: String,
    pub search_host: String,
    /// Query path the encoded search term is appended to.
    pub search_path: String,
    /// File name used by link downloads.
    pub download_file: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            page_char_limit: 880,
            home: "sensoriumembedded.com:80/teensyrom/".to_string(),
            search_host: "www.frogfind.com".to_string(),
            search_path: "/?q=".to_string(),
            download_file: "download1.prg".to_string(),
        }
    }
}

/// Budgets for the waits the polling context performs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitConfig {
    /// Waiting for the host to take a byte.
    pub host_max_spins: u32,
    pub host_timeout_us: u64,
    /// Waiting for network data (HTTP header lines, downloads).
    pub network_max_spins: u32,
    pub network_timeout_ms: u64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            host_max_spins: 1_000_000,
            host_timeout_us: 100_000,
            network_max_spins: u32::MAX,
            network_timeout_ms: 15_000,
        }
    }
}

impl WaitConfig {
    pub fn host_budget(&self) -> RetryBudget {
        RetryBudget {
            max_spins: self.host_max_spins,
            max_micros: self.host_timeout_us,
        }
    }

    pub fn network_budget(&self) -> RetryBudget {
        RetryBudget {
            max_spins: self.network_max_spins,
            max_micros: self.network_timeout_ms.saturating_mul(1000),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::net::Ipv4Addr;

    #[test]
    fn test_empty_document_is_default() {
        let config = ModemConfig::from_toml_str("").unwrap();
        assert_eq!(config, ModemConfig::default());
        assert_eq!(config.acia.cycles_between_rx, 2300);
        assert_eq!(config.acia.nmi_timeout_us, 300);
        assert_eq!(config.queue.rx_capacity, 1024 * 320);
        assert_eq!(config.dial.default_port, 6400);
        assert_eq!(config.browser.page_char_limit, 880);
    }

    #[test]
    fn test_partial_sections() {
        let config = ModemConfig::from_toml_str(
            r#"
            [dial]
            default_port = 23

            [network]
            dhcp_enabled = false
            my_ip = "10.0.0.5"
            "#,
        )
        .unwrap();
        assert_eq!(config.dial.default_port, 23);
        assert_eq!(config.dial.escape_guard_ms, 1000);
        assert!(!config.network.dhcp_enabled);
        assert_eq!(config.network.my_ip, Ipv4Addr::new(10, 0, 0, 5));
        assert_eq!(config.network.dhcp_timeout_ms, 9000);
    }

    #[test]
    fn test_bad_document_is_config_error() {
        let err = ModemConfig::from_toml_str("[acia]\ncycles_between_rx = \"fast\"").unwrap_err();
        assert!(matches!(err, ModemError::Config(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[browser]\npage_char_limit = 400").unwrap();
        let config = ModemConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.browser.page_char_limit, 400);

        let missing = ModemConfig::from_toml_file(file.path().with_extension("none"));
        assert!(matches!(missing, Err(ModemError::Io(_))));
    }
}
