// CLASSIFICATION: COMMUNITY
// Filename: target.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-17

//! Per-SoC constants: PLL step, symbol names and table bounds.

use std::fmt;

use serde::Deserialize;

use crate::config::ConfigError;

/// Speed of the HFPLL reference step in KHz.
pub const HFPLL_FREQ_KHZ: u32 = 27_000;

/// Symbol of the function returning a CPU's cpufreq policy.
pub const CPUFREQ_CPU_GET: &str = "cpufreq_cpu_get";

/// Stock maximum frequency of the Krait v2 cores in KHz.
pub const STOCK_MAX_KHZ: u32 = 1_512_000;

/// Rows in each Krait v2 `acpu_freq_tbl`, terminator included.
pub const KRAITV2_TABLE_ROWS: usize = 24;

/// Silicon speed bin a scaling table belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedBin {
    Nominal,
    Slow,
    Fast,
}

impl fmt::Display for SpeedBin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Nominal => "nominal",
            Self::Slow => "slow",
            Self::Fast => "fast",
        })
    }
}

/// Where to find one scaling table and how many rows it has.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScalingTableSpec {
    pub bin: SpeedBin,
    pub symbol: String,
    pub rows: usize,
}

impl ScalingTableSpec {
    fn kraitv2(bin: SpeedBin, suffix: &str) -> Self {
        Self {
            bin,
            symbol: format!("acpu_freq_tbl_8960_kraitv2_{suffix}"),
            rows: KRAITV2_TABLE_ROWS,
        }
    }
}

/// Everything that differs between kernel builds for the same SoC.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TargetProfile {
    pub hfpll_khz: u32,
    pub policy_symbol: String,
    pub stock_max_khz: u32,
    pub tables: Vec<ScalingTableSpec>,
}

impl TargetProfile {
    /// MSM8960 with Krait v2 cores.
    #[must_use]
    pub fn msm8960_kraitv2() -> Self {
        Self {
            hfpll_khz: HFPLL_FREQ_KHZ,
            policy_symbol: CPUFREQ_CPU_GET.to_owned(),
            stock_max_khz: STOCK_MAX_KHZ,
            tables: vec![
                ScalingTableSpec::kraitv2(SpeedBin::Nominal, "nom"),
                ScalingTableSpec::kraitv2(SpeedBin::Slow, "slow"),
                ScalingTableSpec::kraitv2(SpeedBin::Fast, "fast"),
            ],
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hfpll_khz == 0 {
            return Err(ConfigError::InvalidProfile("hfpll_khz must be non-zero".into()));
        }
        if self.policy_symbol.is_empty() {
            return Err(ConfigError::InvalidProfile("policy_symbol is empty".into()));
        }
        if let Some(spec) = self.tables.iter().find(|spec| spec.rows < 2) {
            return Err(ConfigError::InvalidProfile(format!(
                "{} needs at least two rows",
                spec.symbol
            )));
        }
        Ok(())
    }
}

impl Default for TargetProfile {
    fn default() -> Self {
        Self::msm8960_kraitv2()
    }
}
