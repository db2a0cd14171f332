//! Simulator configuration file
//!
//! Every key is optional; missing keys keep the Nucleo-F103RB values.
//!
//! ```toml
//! [flash]
//! base = "0x08000000"
//! page_size = 1024
//! page_count = 128
//! protected_boundary = 32
//!
//! [store]
//! first_page = 120
//! page_count = 8
//! id_count = 16
//! max_record_len = 64
//!
//! [shell]
//! echo = true
//! prompt = "> "
//!
//! [emulator]
//! write_protected_first = 0
//! write_protected_count = 0
//! lock_jammed = false
//! ```
//!
//! Numbers may be written as integers or as strings in decimal or `0x` hex.

use std::fs;
use std::ops::Range;
use std::path::Path;

use flashshell_core::config::{DeviceConfig, StoreConfig, NUCLEO_F103RB};
use flashshell_core::flash::Geometry;
use serde::Deserialize;

use crate::error::{AppError, Result};

/// Deserialize a u32 that can be hex (0x...) or decimal
fn deserialize_hex_u32<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum HexOrInt {
        Int(u32),
        Str(String),
    }

    match HexOrInt::deserialize(deserializer)? {
        HexOrInt::Int(n) => Ok(n),
        HexOrInt::Str(s) => flashshell_core::number::parse_number(s.trim())
            .map_err(|e| serde::de::Error::custom(format!("{}: {}", s, e))),
    }
}

/// Like [`deserialize_hex_u32`], narrowed to a smaller integer type
fn deserialize_hex<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: TryFrom<u32>,
{
    let n = deserialize_hex_u32(deserializer)?;
    T::try_from(n).map_err(|_| serde::de::Error::custom(format!("{} out of range", n)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    flash: FlashSection,
    #[serde(default)]
    store: StoreSection,
    #[serde(default)]
    shell: ShellSettings,
    #[serde(default)]
    emulator: EmulatorSection,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FlashSection {
    #[serde(deserialize_with = "deserialize_hex_u32")]
    base: u32,
    #[serde(deserialize_with = "deserialize_hex_u32")]
    page_size: u32,
    #[serde(deserialize_with = "deserialize_hex_u32")]
    page_count: u32,
    #[serde(deserialize_with = "deserialize_hex_u32")]
    protected_boundary: u32,
}

impl Default for FlashSection {
    fn default() -> Self {
        let device = NUCLEO_F103RB;
        Self {
            base: device.geometry.base,
            page_size: device.geometry.page_size,
            page_count: device.geometry.page_count,
            protected_boundary: device.protected_boundary,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct StoreSection {
    #[serde(deserialize_with = "deserialize_hex_u32")]
    first_page: u32,
    #[serde(deserialize_with = "deserialize_hex_u32")]
    page_count: u32,
    #[serde(deserialize_with = "deserialize_hex")]
    id_count: u8,
    #[serde(deserialize_with = "deserialize_hex")]
    max_record_len: usize,
}

impl Default for StoreSection {
    fn default() -> Self {
        let store = NUCLEO_F103RB.store;
        Self {
            first_page: store.first_page,
            page_count: store.page_count,
            id_count: store.id_count,
            max_record_len: store.max_record_len,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct EmulatorSection {
    #[serde(deserialize_with = "deserialize_hex_u32")]
    write_protected_first: u32,
    #[serde(deserialize_with = "deserialize_hex_u32")]
    write_protected_count: u32,
    lock_jammed: bool,
}

/// Faults the emulated flash controller reproduces
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmulatorSettings {
    /// Pages whose erase and program fail with WRPRTERR
    pub write_protected: Range<u32>,
    /// Every unlock fails, as after a wrong key sequence
    pub lock_jammed: bool,
}

/// Terminal behaviour of the shell
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShellSettings {
    /// Echo typed characters
    pub echo: bool,
    /// Prompt printed before each line
    pub prompt: String,
}

impl Default for ShellSettings {
    fn default() -> Self {
        Self {
            echo: true,
            prompt: "> ".to_string(),
        }
    }
}

/// Validated simulator configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimConfig {
    /// Emulated board
    pub device: DeviceConfig,
    /// Shell settings
    pub shell: ShellSettings,
    /// Emulated controller faults
    pub emulator: EmulatorSettings,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            device: NUCLEO_F103RB,
            shell: ShellSettings::default(),
            emulator: EmulatorSettings::default(),
        }
    }
}

impl SimConfig {
    /// Parse and validate a configuration file's contents
    pub fn parse(content: &str) -> std::result::Result<Self, String> {
        let file: ConfigFile = toml::from_str(content).map_err(|e| e.to_string())?;

        // Built field by field: `Geometry::new` would panic on bad values
        // before `validate` gets to report them.
        let device = DeviceConfig {
            geometry: Geometry {
                base: file.flash.base,
                page_size: file.flash.page_size,
                page_count: file.flash.page_count,
            },
            protected_boundary: file.flash.protected_boundary,
            store: StoreConfig {
                first_page: file.store.first_page,
                page_count: file.store.page_count,
                id_count: file.store.id_count,
                max_record_len: file.store.max_record_len,
            },
        };
        device.validate().map_err(|e| e.to_string())?;

        let wrp = &file.emulator;
        let wrp_end = wrp.write_protected_first as u64 + wrp.write_protected_count as u64;
        if wrp_end > device.geometry.page_count as u64 {
            return Err("write protected pages beyond last page".to_string());
        }

        Ok(Self {
            device,
            shell: file.shell,
            emulator: EmulatorSettings {
                write_protected: wrp.write_protected_first..wrp_end as u32,
                lock_jammed: wrp.lock_jammed,
            },
        })
    }

    /// Load the configuration at `path`, or the defaults without one
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = fs::read_to_string(path)?;
        let config = Self::parse(&content).map_err(|message| AppError::Config {
            path: path.to_path_buf(),
            message,
        })?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_nucleo() {
        let config = SimConfig::parse("").unwrap();
        assert_eq!(config, SimConfig::default());
        assert_eq!(config.device, NUCLEO_F103RB);
        assert!(config.shell.echo);
        assert_eq!(config.shell.prompt, "> ");
    }

    #[test]
    fn test_hex_and_decimal_values() {
        let config = SimConfig::parse(
            r#"
            [flash]
            base = "0x08000000"
            page_size = "0x800"
            page_count = "0x100"
            protected_boundary = "16"

            [store]
            first_page = "0xFA"
            page_count = 6
            id_count = "0x08"
            max_record_len = "0x20"

            [shell]
            echo = false
            prompt = ""
            "#,
        )
        .unwrap();
        assert_eq!(config.device.geometry, Geometry::new(0x0800_0000, 2048, 256));
        assert_eq!(config.device.protected_boundary, 16);
        assert_eq!(config.device.store.first_page, 250);
        assert_eq!(config.device.store.page_count, 6);
        assert_eq!(config.device.store.id_count, 8);
        assert_eq!(config.device.store.max_record_len, 32);
        assert!(!config.shell.echo);
        assert!(config.shell.prompt.is_empty());
    }

    #[test]
    fn test_partial_override() {
        let config = SimConfig::parse("[flash]\nprotected_boundary = 64\n").unwrap();
        assert_eq!(config.device.protected_boundary, 64);
        assert_eq!(config.device.geometry, NUCLEO_F103RB.geometry);
        assert_eq!(config.device.store, NUCLEO_F103RB.store);
    }

    #[test]
    fn test_invalid_layouts_rejected() {
        // Store would overlap protected pages
        assert!(SimConfig::parse("[flash]\nprotected_boundary = 124\n").is_err());
        assert!(SimConfig::parse("[flash]\npage_size = 0\n").is_err());
        assert!(SimConfig::parse("[flash]\nbase = \"0xFFFFF000\"\n").is_err());
        assert!(SimConfig::parse("[store]\nid_count = 255\n").is_err());
        assert!(SimConfig::parse("[flash]\nbase = \"0x08zz\"\n").is_err());
        assert!(SimConfig::parse("[flash]\nsize = 4\n").is_err());
        assert!(SimConfig::parse("[store]\nid_count = \"0x100\"\n").is_err());
        assert!(SimConfig::parse("[flash]\npage_size = \"0x10000\"\npage_count = \"0x10000\"\n").is_err());
    }

    #[test]
    fn test_emulator_faults() {
        assert_eq!(SimConfig::parse("").unwrap().emulator, EmulatorSettings::default());

        let config = SimConfig::parse(
            "[emulator]\nwrite_protected_first = \"0x28\"\nwrite_protected_count = 2\nlock_jammed = true\n",
        )
        .unwrap();
        assert_eq!(config.emulator.write_protected, 40..42);
        assert!(config.emulator.lock_jammed);

        assert!(SimConfig::parse("[emulator]\nwrite_protected_first = 127\nwrite_protected_count = 2\n").is_err());
    }

    #[test]
    fn test_missing_file_is_error() {
        let err = SimConfig::load(Some(Path::new("/nonexistent/flashshell.toml"))).unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
    }
}
