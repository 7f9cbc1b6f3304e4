// CLASSIFICATION: COMMUNITY
// Filename: voltage.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-17

//! Core voltage lookup for overclocked frequencies.

/// A tabulated `(frequency, voltage)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoltageBreakpoint {
    pub khz: u32,
    pub vdd_uv: u32,
}

/// Known-good voltages, terminated by a zero row.
pub const FREQ_VDD_TABLE: [VoltageBreakpoint; 5] = [
    VoltageBreakpoint { khz: 1_620_000, vdd_uv: 1_200_000 },
    VoltageBreakpoint { khz: 1_728_000, vdd_uv: 1_200_000 },
    VoltageBreakpoint { khz: 1_809_000, vdd_uv: 1_250_000 },
    VoltageBreakpoint { khz: 1_917_000, vdd_uv: 1_300_000 },
    VoltageBreakpoint { khz: 0, vdd_uv: 0 },
];

/// Voltage for `khz`, or `default_uv` when the frequency is not tabulated.
///
/// Exact match only. A frequency 1 KHz away from a breakpoint still gets
/// `default_uv`.
#[must_use]
pub fn resolve_vdd(khz: u32, default_uv: u32) -> u32 {
    FREQ_VDD_TABLE
        .iter()
        .take_while(|bp| bp.khz != 0)
        .find(|bp| bp.khz == khz)
        .map_or(default_uv, |bp| bp.vdd_uv)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_breakpoint_resolves_exactly() {
        for bp in FREQ_VDD_TABLE.iter().take_while(|bp| bp.khz != 0) {
            assert_eq!(resolve_vdd(bp.khz, 42), bp.vdd_uv);
        }
    }

    #[test]
    fn untabulated_frequency_gets_default() {
        assert_eq!(resolve_vdd(1_917_000, 1_300_000), 1_300_000);
        assert_eq!(resolve_vdd(2_000_000, 1_300_000), 1_300_000);
        assert_eq!(resolve_vdd(1_620_001, 1_100_000), 1_100_000);
        assert_eq!(resolve_vdd(384_000, 900_000), 900_000);
    }

    #[test]
    fn terminator_is_not_a_breakpoint() {
        assert_eq!(resolve_vdd(0, 1_234_000), 1_234_000);
    }
}
