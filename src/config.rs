//! Simulator configuration, consumed once at [`crate::kernel::Kernel`]
//! construction: `[memory]`, `[simulation]`, and `[logs]` sections in one
//! TOML document, deserialized through `serde`.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
    pub ram_kb: u32,
    pub swap_kb: u32,
    pub page_kb: u32,
}

/// Workload-generator knobs. The generator itself lives in the driver, not
/// the core, but the config value still carries these so a driver can read
/// them out of the same document.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "SimulationConfig::default_max_processes")]
    pub max_processes: u32,
    #[serde(default = "SimulationConfig::default_size_min")]
    pub process_size_min_kb: u32,
    #[serde(default = "SimulationConfig::default_size_max")]
    pub process_size_max_kb: u32,
    #[serde(default = "SimulationConfig::default_lifetime_min")]
    pub process_lifetime_min: u32,
    #[serde(default = "SimulationConfig::default_lifetime_max")]
    pub process_lifetime_max: u32,
    #[serde(default)]
    pub process_arrival_min: u32,
    #[serde(default = "SimulationConfig::default_arrival_max")]
    pub process_arrival_max: u32,
}

impl SimulationConfig {
    fn default_max_processes() -> u32 {
        50
    }
    fn default_size_min() -> u32 {
        4
    }
    fn default_size_max() -> u32 {
        64
    }
    fn default_lifetime_min() -> u32 {
        2
    }
    fn default_lifetime_max() -> u32 {
        40
    }
    fn default_arrival_max() -> u32 {
        20
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogsConfig {
    #[serde(default)]
    pub enable_logs: bool,
    #[serde(default = "LogsConfig::default_log_file")]
    pub log_file: String,
}

impl LogsConfig {
    fn default_log_file() -> String {
        "simulator.log".to_string()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimConfig {
    pub memory: MemoryConfig,
    #[serde(default = "SimConfig::default_simulation")]
    pub simulation: SimulationConfig,
    #[serde(default = "SimConfig::default_logs")]
    pub logs: LogsConfig,
}

impl SimConfig {
    fn default_simulation() -> SimulationConfig {
        toml::from_str("").unwrap()
    }

    fn default_logs() -> LogsConfig {
        toml::from_str("").unwrap()
    }

    pub fn from_str(text: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str(&text)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let MemoryConfig {
            ram_kb,
            swap_kb,
            page_kb,
        } = self.memory;

        if page_kb == 0 {
            return Err(ConfigError::ZeroPageSize);
        }
        if ram_kb % page_kb != 0 {
            return Err(ConfigError::RamNotPageAligned { ram_kb, page_kb });
        }
        if swap_kb % page_kb != 0 {
            return Err(ConfigError::SwapNotPageAligned { swap_kb, page_kb });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_document() {
        let config = SimConfig::from_str(
            r#"
            [memory]
            ram_kb = 64
            swap_kb = 64
            page_kb = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.memory.ram_kb, 64);
        assert_eq!(config.memory.swap_kb, 64);
        assert_eq!(config.memory.page_kb, 4);
        assert_eq!(config.simulation.max_processes, 50);
        assert!(!config.logs.enable_logs);
    }

    #[test]
    fn rejects_misaligned_ram() {
        let err = SimConfig::from_str(
            r#"
            [memory]
            ram_kb = 10
            swap_kb = 8
            page_kb = 4
            "#,
        )
        .unwrap_err();

        assert!(matches!(err, ConfigError::RamNotPageAligned { .. }));
    }

    #[test]
    fn rejects_zero_page_size() {
        let err = SimConfig::from_str(
            r#"
            [memory]
            ram_kb = 10
            swap_kb = 8
            page_kb = 0
            "#,
        )
        .unwrap_err();

        assert!(matches!(err, ConfigError::ZeroPageSize));
    }
}
