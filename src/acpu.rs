// CLASSIFICATION: COMMUNITY
// Filename: acpu.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-10-17

//! Layout of the Krait `acpu_freq_tbl` rows and a bounded view over them.

use core::ffi::c_void;

use crate::kernel::SymbolAddr;

/// `src` value for the standby (QSB) source.
pub const SRC_QSB: i32 = 0;
/// `src` value for the PLL8 source.
pub const SRC_PLL_8: i32 = 1;
/// `src` value for the high-frequency PLL.
pub const SRC_HFPLL: i32 = 2;

/// Frequency stored in the standby row.
pub const STBY_KHZ: u32 = 1;

/// Row 0 is the standby row; scanning for free rows starts after it.
pub const FIRST_SCALING_ROW: usize = 1;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreSpeed {
    pub khz: u32,
    pub src: i32,
    pub pri_src_sel: u32,
    pub sec_src_sel: u32,
    pub pll_l_val: u32,
}

/// One row of an `acpu_freq_tbl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcpuLevel {
    pub use_for_scaling: u32,
    pub speed: CoreSpeed,
    pub l2_level: *const c_void,
    pub vdd_core: u32,
}

impl AcpuLevel {
    /// The `{ 0, { 0 } }` row closing a table.
    pub const END: Self = Self {
        use_for_scaling: 0,
        speed: CoreSpeed {
            khz: 0,
            src: 0,
            pri_src_sel: 0,
            sec_src_sel: 0,
            pll_l_val: 0,
        },
        l2_level: core::ptr::null(),
        vdd_core: 0,
    };

    #[must_use]
    pub fn is_end(&self) -> bool {
        self.speed.khz == 0
    }

    #[must_use]
    pub fn is_used(&self) -> bool {
        self.use_for_scaling != 0
    }
}

/// Values written into a free row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowUpdate {
    pub khz: u32,
    pub pll_l_val: u32,
    pub vdd_uv: u32,
}

/// Mutable view of a scaling table with a known row count.
pub struct ScalingTable<'a> {
    rows: &'a mut [AcpuLevel],
}

impl<'a> ScalingTable<'a> {
    pub fn new(rows: &'a mut [AcpuLevel]) -> Self {
        Self { rows }
    }

    /// View `rows` entries starting at a resolved symbol.
    ///
    /// # Safety
    ///
    /// `addr` must be the start of an `AcpuLevel` array of at least `rows`
    /// entries, valid for writes for `'a`, with no other live reference to it.
    pub unsafe fn from_symbol(addr: SymbolAddr, rows: usize) -> Self {
        // SAFETY: upheld by the caller.
        let rows = unsafe { core::slice::from_raw_parts_mut(addr.get() as *mut AcpuLevel, rows) };
        Self { rows }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn rows(&self) -> &[AcpuLevel] {
        &self.rows[..]
    }

    /// First row at or after `start` not used for scaling.
    ///
    /// Stops at the row bound or at the terminator row, which is never
    /// handed out.
    #[must_use]
    pub fn next_free_slot(&self, start: usize) -> Option<usize> {
        self.rows
            .iter()
            .enumerate()
            .skip(start)
            .take_while(|(_, row)| !row.is_end())
            .find(|(_, row)| !row.is_used())
            .map(|(index, _)| index)
    }

    /// Write frequency, PLL L value and voltage into row `index`.
    ///
    /// Source select, L2 level and the scaling flag are left as they are.
    pub fn write(&mut self, index: usize, update: RowUpdate) {
        let row = &mut self.rows[index];
        row.speed.khz = update.khz;
        row.speed.pll_l_val = update.pll_l_val;
        row.vdd_core = update.vdd_uv;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(used: bool, khz: u32) -> AcpuLevel {
        AcpuLevel {
            use_for_scaling: u32::from(used),
            speed: CoreSpeed {
                khz,
                src: SRC_HFPLL,
                pri_src_sel: 1,
                sec_src_sel: 0,
                pll_l_val: khz / 27_000,
            },
            l2_level: core::ptr::null(),
            vdd_core: 1_000_000,
        }
    }

    #[test]
    fn free_slot_skips_used_rows() {
        let mut rows = [
            row(false, STBY_KHZ),
            row(true, 384_000),
            row(true, 486_000),
            row(false, 540_000),
            AcpuLevel::END,
        ];
        let table = ScalingTable::new(&mut rows);
        assert_eq!(table.next_free_slot(FIRST_SCALING_ROW), Some(3));
        assert_eq!(table.next_free_slot(3), Some(3));
    }

    #[test]
    fn free_slot_never_returns_terminator_or_past_bound() {
        let mut rows = [row(false, STBY_KHZ), row(true, 384_000), AcpuLevel::END];
        let table = ScalingTable::new(&mut rows);
        assert_eq!(table.next_free_slot(FIRST_SCALING_ROW), None);
        assert_eq!(table.next_free_slot(10), None);

        let mut unterminated = [row(false, STBY_KHZ), row(true, 384_000), row(true, 486_000)];
        let table = ScalingTable::new(&mut unterminated);
        assert_eq!(table.next_free_slot(FIRST_SCALING_ROW), None);
    }

    #[test]
    fn write_touches_only_speed_and_voltage() {
        let mut rows = [row(false, STBY_KHZ), row(false, 432_000), AcpuLevel::END];
        let mut table = ScalingTable::new(&mut rows);
        table.write(
            1,
            RowUpdate {
                khz: 1_917_000,
                pll_l_val: 71,
                vdd_uv: 1_300_000,
            },
        );
        let patched = table.rows()[1];
        assert_eq!(patched.speed.khz, 1_917_000);
        assert_eq!(patched.speed.pll_l_val, 71);
        assert_eq!(patched.vdd_core, 1_300_000);
        assert_eq!(patched.use_for_scaling, 0);
        assert_eq!(patched.speed.src, SRC_HFPLL);
        assert_eq!(patched.speed.pri_src_sel, 1);
    }
}
