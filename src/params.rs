// CLASSIFICATION: COMMUNITY
// Filename: params.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-10-17

//! Load-time parameters: PLL L value and core voltage.

use serde::Deserialize;

use crate::config::ConfigError;

/// Highest core voltage the overclocked row may request, in uV.
pub const VDD_UV_MAX: u32 = 1_300_000;

/// Default PLL L value (27 MHz * 0x47 = 1917 MHz).
pub const DEFAULT_PLL_L_VAL: u32 = 0x47;

/// Parameters read once at load and fixed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OverclockParams {
    /// Frequency multiplier for the overclocked frequency.
    pub pll_l_val: u32,
    /// Core voltage in uV for frequencies without a tabulated voltage.
    pub vdd_uv: u32,
}

impl Default for OverclockParams {
    fn default() -> Self {
        Self {
            pll_l_val: DEFAULT_PLL_L_VAL,
            vdd_uv: VDD_UV_MAX,
        }
    }
}

impl OverclockParams {
    /// Target frequency for a PLL step of `hfpll_khz`.
    ///
    /// Not range-checked: any multiplier the caller supplies is used.
    #[must_use]
    pub fn target_khz(&self, hfpll_khz: u32) -> u32 {
        self.pll_l_val.wrapping_mul(hfpll_khz)
    }

    /// Parse a module argument string such as `pll_l_val=0x4b vdd_uv=1250000`.
    ///
    /// Keys not present keep their defaults. The result is validated.
    pub fn parse_args(args: &str) -> Result<Self, ConfigError> {
        let mut params = Self::default();
        for arg in args.split_whitespace() {
            let (key, value) = arg
                .split_once('=')
                .ok_or_else(|| ConfigError::InvalidValue {
                    key: arg.to_owned(),
                    value: String::new(),
                })?;
            let parsed = parse_uint(value).ok_or_else(|| ConfigError::InvalidValue {
                key: key.to_owned(),
                value: value.to_owned(),
            })?;
            match key {
                "pll_l_val" => params.pll_l_val = parsed,
                "vdd_uv" => params.vdd_uv = parsed,
                _ => return Err(ConfigError::UnknownParam(key.to_owned())),
            }
        }
        params.validate()?;
        Ok(params)
    }

    /// Reject a zero multiplier and voltages above [`VDD_UV_MAX`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pll_l_val == 0 {
            return Err(ConfigError::InvalidValue {
                key: "pll_l_val".into(),
                value: "0".into(),
            });
        }
        if self.vdd_uv > VDD_UV_MAX {
            return Err(ConfigError::VoltageAboveCeiling {
                vdd_uv: self.vdd_uv,
                max_uv: VDD_UV_MAX,
            });
        }
        Ok(())
    }
}

/// Unsigned integer with automatic base: `0x` hex, leading `0` octal, else decimal.
fn parse_uint(text: &str) -> Option<u32> {
    let text = text.strip_prefix('+').unwrap_or(text);
    if let Some(hex) = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
    {
        u32::from_str_radix(hex, 16).ok()
    } else if text.len() > 1 && text.starts_with('0') {
        u32::from_str_radix(&text[1..], 8).ok()
    } else {
        text.parse().ok()
    }
}
