// CLASSIFICATION: COMMUNITY
// Filename: config.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-10-17

//! TOML configuration for a load: parameters plus target profile.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::params::OverclockParams;
use crate::target::TargetProfile;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("unknown parameter {0}")]
    UnknownParam(String),
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },
    #[error("vdd_uv {vdd_uv} exceeds ceiling {max_uv}")]
    VoltageAboveCeiling { vdd_uv: u32, max_uv: u32 },
    #[error("invalid target profile: {0}")]
    InvalidProfile(String),
}

/// Validated configuration; immutable once loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OverclockConfig {
    pub params: OverclockParams,
    pub target: TargetProfile,
}

impl OverclockConfig {
    pub fn new(params: OverclockParams, target: TargetProfile) -> Result<Self, ConfigError> {
        let config = Self { params, target };
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.params.validate()?;
        self.target.validate()
    }

    /// Target frequency in KHz.
    #[must_use]
    pub fn target_khz(&self) -> u32 {
        self.params.target_khz(self.target.hfpll_khz)
    }
}

/// Load and validate a configuration file.
pub fn load_config(path: &Path) -> Result<OverclockConfig, ConfigError> {
    let text = fs::read_to_string(path)?;
    OverclockConfig::from_toml(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::SpeedBin;

    #[test]
    fn empty_document_uses_defaults() {
        let config = OverclockConfig::from_toml("").unwrap();
        assert_eq!(config, OverclockConfig::default());
        assert_eq!(config.target_khz(), 1_917_000);
    }

    #[test]
    fn params_and_tables_override() {
        let text = r#"
            [params]
            pll_l_val = 75
            vdd_uv = 1250000

            [target]
            stock_max_khz = 1458000

            [[target.tables]]
            bin = "fast"
            symbol = "acpu_freq_tbl_custom"
            rows = 8
        "#;
        let config = OverclockConfig::from_toml(text).unwrap();
        assert_eq!(config.params.pll_l_val, 75);
        assert_eq!(config.target.hfpll_khz, 27_000);
        assert_eq!(config.target.stock_max_khz, 1_458_000);
        assert_eq!(config.target.tables.len(), 1);
        assert_eq!(config.target.tables[0].bin, SpeedBin::Fast);
        assert_eq!(config.target_khz(), 2_025_000);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            OverclockConfig::from_toml("[params]\nvdd_uv = 1400000\n"),
            Err(ConfigError::VoltageAboveCeiling { .. })
        ));
        assert!(matches!(
            OverclockConfig::from_toml("[params]\nturbo = true\n"),
            Err(ConfigError::Toml(_))
        ));
    }
}
