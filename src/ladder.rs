// CLASSIFICATION: COMMUNITY
// Filename: ladder.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-10-17

//! cpufreq frequency ladder for the MSM8960 Krait v2 cores.
//!
//! The ladder is laid out exactly like the kernel's
//! `struct cpufreq_frequency_table` array so a pointer to it can be handed
//! to the cpufreq core. Capacity is fixed: building a ladder only replaces
//! the frequency of the overclock slot, it never inserts or removes rows.

/// Sentinel frequency marking the end of a cpufreq table.
pub const CPUFREQ_TABLE_END: u32 = !1;

/// Number of rows in the ladder, terminator included.
pub const LADDER_LEN: usize = 17;

/// First row above the stock maximum; rows from here on are written into
/// the scaling tables.
pub const OVERCLOCK_START: usize = 12;

/// Row whose frequency is replaced with the configured target.
pub const OVERCLOCK_SLOT: usize = LADDER_LEN - 2;

/// One `(index, frequency)` row of a cpufreq table.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatingPoint {
    /// Driver-private row index.
    pub index: u32,
    /// Frequency in KHz, or [`CPUFREQ_TABLE_END`].
    pub frequency_khz: u32,
}

impl OperatingPoint {
    const fn new(index: u32, frequency_khz: u32) -> Self {
        Self {
            index,
            frequency_khz,
        }
    }

    /// Whether this row terminates the table.
    #[must_use]
    pub const fn is_end(&self) -> bool {
        self.frequency_khz == CPUFREQ_TABLE_END
    }
}

/// Stock ladder; row [`OVERCLOCK_SLOT`] is overwritten at build time.
pub const STOCK_LADDER: [OperatingPoint; LADDER_LEN] = [
    OperatingPoint::new(0, 384_000),
    OperatingPoint::new(1, 486_000),
    OperatingPoint::new(2, 594_000),
    OperatingPoint::new(3, 702_000),
    OperatingPoint::new(4, 810_000),
    OperatingPoint::new(5, 918_000),
    OperatingPoint::new(6, 1_026_000),
    OperatingPoint::new(7, 1_134_000),
    OperatingPoint::new(8, 1_242_000),
    OperatingPoint::new(9, 1_350_000),
    OperatingPoint::new(10, 1_458_000),
    OperatingPoint::new(11, 1_512_000),
    OperatingPoint::new(12, 1_620_000),
    OperatingPoint::new(13, 1_728_000),
    OperatingPoint::new(14, 1_809_000),
    OperatingPoint::new(15, 1_917_000),
    OperatingPoint::new(16, CPUFREQ_TABLE_END),
];

/// Fixed-capacity ladder handed to the cpufreq core.
#[repr(C)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyLadder {
    points: [OperatingPoint; LADDER_LEN],
}

impl FrequencyLadder {
    /// The unmodified stock ladder.
    #[must_use]
    pub const fn stock() -> Self {
        Self {
            points: STOCK_LADDER,
        }
    }

    /// Build the ladder with the overclock slot set to `target_khz`.
    ///
    /// The target is not checked against its neighbours; see
    /// [`FrequencyLadder::monotonic_violation`].
    #[must_use]
    pub fn build(target_khz: u32) -> Self {
        let mut ladder = Self::stock();
        ladder.points[OVERCLOCK_SLOT].frequency_khz = target_khz;
        ladder
    }

    /// All rows, terminator included.
    #[must_use]
    pub fn points(&self) -> &[OperatingPoint] {
        &self.points
    }

    /// Rows from [`OVERCLOCK_START`] up to, not including, the terminator.
    pub fn overclock_region(&self) -> impl Iterator<Item = &OperatingPoint> {
        self.points[OVERCLOCK_START..]
            .iter()
            .take_while(|point| !point.is_end())
    }

    /// Frequency of the overclock slot.
    #[must_use]
    pub fn target_khz(&self) -> u32 {
        self.points[OVERCLOCK_SLOT].frequency_khz
    }

    /// First row whose frequency does not exceed its predecessor's.
    ///
    /// A low multiplier can put the overclock slot below the row before it.
    /// What the cpufreq core does with such a table is undefined, so callers
    /// only get a diagnostic; the ladder is still used as built.
    #[must_use]
    pub fn monotonic_violation(&self) -> Option<usize> {
        self.points
            .iter()
            .take_while(|point| !point.is_end())
            .collect::<Vec<_>>()
            .windows(2)
            .position(|pair| pair[1].frequency_khz <= pair[0].frequency_khz)
            .map(|pos| pos + 1)
    }

    /// Address of the first row, as registered with the cpufreq core.
    #[must_use]
    pub fn as_ptr(&self) -> *const OperatingPoint {
        self.points.as_ptr()
    }
}

impl Default for FrequencyLadder {
    fn default() -> Self {
        Self::stock()
    }
}
