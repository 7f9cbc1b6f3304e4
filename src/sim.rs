// CLASSIFICATION: COMMUNITY
// Filename: sim.rs v0.3
// Author: Lukas Bower
// Date Modified: 2026-10-17

//! In-memory MSM8960 kernel for host-side runs.
//!
//! Provides the three Krait v2 scaling tables, a symbol map, per-CPU policy
//! objects behind a real `cpufreq_cpu_get`-shaped function, and per-CPU
//! table registrations. Policy objects are process-wide because the getter
//! is a plain function pointer; only one [`SimKernel`] should be in use at a
//! time.

use core::cell::UnsafeCell;
use core::ffi::c_int;
use core::ptr::{self, NonNull};
use std::collections::HashMap;

use log::debug;

use crate::acpu::{AcpuLevel, CoreSpeed, SRC_HFPLL, SRC_PLL_8, SRC_QSB, STBY_KHZ};
use crate::kernel::{
    CpuInfo, CpufreqHost, CpufreqPolicy, FreqTableRef, PolicyGetFn, SymbolAddr, SymbolResolver,
};
use crate::ladder::{OperatingPoint, CPUFREQ_TABLE_END};
use crate::target::{ScalingTableSpec, SpeedBin, TargetProfile, KRAITV2_TABLE_ROWS};

/// CPUs modelled by the simulator.
pub const SIM_CPUS: usize = 2;

const MIN_KHZ: u32 = 384_000;
const FIRST_HFPLL_KHZ: u32 = 432_000;
const HFPLL_STEP_KHZ: u32 = 54_000;
const HFPLL_ROWS: u32 = 21;

struct PolicySlot(UnsafeCell<CpufreqPolicy>);

// SAFETY: slots are only touched by the thread driving the simulator; tests
// sharing them run serially.
unsafe impl Sync for PolicySlot {}

impl PolicySlot {
    const fn new() -> Self {
        Self(UnsafeCell::new(stock_policy(0)))
    }
}

static SIM_POLICIES: [PolicySlot; SIM_CPUS] = [PolicySlot::new(), PolicySlot::new()];

const fn stock_policy(cpu: u32) -> CpufreqPolicy {
    CpufreqPolicy {
        cpu,
        min: MIN_KHZ,
        max: crate::target::STOCK_MAX_KHZ,
        cur: MIN_KHZ,
        cpuinfo: CpuInfo {
            max_freq: crate::target::STOCK_MAX_KHZ,
            min_freq: MIN_KHZ,
            transition_latency: 0,
        },
    }
}

unsafe extern "C" fn sim_cpufreq_cpu_get(cpu: c_int) -> *mut CpufreqPolicy {
    usize::try_from(cpu)
        .ok()
        .and_then(|cpu| SIM_POLICIES.get(cpu))
        .map_or(ptr::null_mut(), |slot| slot.0.get())
}

unsafe extern "C" fn sim_cpufreq_cpu_get_none(_cpu: c_int) -> *mut CpufreqPolicy {
    ptr::null_mut()
}

fn fn_addr(getter: PolicyGetFn) -> Option<SymbolAddr> {
    SymbolAddr::new(getter as usize)
}

/// Stock Krait v2 table for `bin`, padded with terminator rows to `rows`.
///
/// Every other HFPLL row is reserved (not used for scaling); those are the
/// rows the overclock pass fills.
#[must_use]
pub fn kraitv2_table(bin: SpeedBin, rows: usize) -> Vec<AcpuLevel> {
    let base_uv = match bin {
        SpeedBin::Slow => 950_000,
        SpeedBin::Nominal => 925_000,
        SpeedBin::Fast => 900_000,
    };
    let level = |used: bool, khz: u32, src: i32, pri: u32, sec: u32, pll: u32, vdd: u32| AcpuLevel {
        use_for_scaling: u32::from(used),
        speed: CoreSpeed {
            khz,
            src,
            pri_src_sel: pri,
            sec_src_sel: sec,
            pll_l_val: pll,
        },
        l2_level: ptr::null(),
        vdd_core: vdd,
    };

    let mut table = vec![
        level(false, STBY_KHZ, SRC_QSB, 0, 0, 0, base_uv),
        level(true, MIN_KHZ, SRC_PLL_8, 0, 2, 0, base_uv),
    ];
    for step in 0..HFPLL_ROWS {
        let khz = FIRST_HFPLL_KHZ + step * HFPLL_STEP_KHZ;
        let used = step % 2 == 1 || step == HFPLL_ROWS - 1;
        let pri = if khz < 594_000 { 2 } else { 1 };
        table.push(level(used, khz, SRC_HFPLL, pri, 0, khz / 27_000, base_uv + 12_500 * step));
    }
    table.resize(rows.max(table.len() + 1), AcpuLevel::END);
    table
}

struct SimTable {
    spec: ScalingTableSpec,
    rows: NonNull<[AcpuLevel]>,
}

impl SimTable {
    fn new(spec: ScalingTableSpec) -> Self {
        let rows = kraitv2_table(spec.bin, spec.rows.max(KRAITV2_TABLE_ROWS)).into_boxed_slice();
        Self {
            spec,
            rows: NonNull::from(Box::leak(rows)),
        }
    }
}

impl Drop for SimTable {
    fn drop(&mut self) {
        // SAFETY: `rows` came from `Box::leak` in `SimTable::new`.
        drop(unsafe { Box::from_raw(self.rows.as_ptr()) });
    }
}

/// Symbol map over the simulator's objects.
pub struct SimSymbols {
    map: HashMap<String, SymbolAddr>,
    tables: Vec<SimTable>,
}

// SAFETY: table addresses stay valid until `SimSymbols` drops the tables, and
// function addresses are real `PolicyGetFn`s.
unsafe impl SymbolResolver for SimSymbols {
    fn lookup_name(&self, name: &str) -> Option<SymbolAddr> {
        let addr = self.map.get(name).copied();
        debug!("sim: lookup {name} -> {addr:?}");
        addr
    }
}

impl SimSymbols {
    fn table(&self, bin: SpeedBin) -> Option<&SimTable> {
        self.tables.iter().find(|table| table.spec.bin == bin)
    }
}

/// cpufreq registrations of the simulator.
pub struct SimCpufreq {
    present: Vec<u32>,
    registered: Vec<Option<FreqTableRef>>,
    stock: Box<[OperatingPoint]>,
}

impl SimCpufreq {
    fn new(stock_rows: &[AcpuLevel]) -> Self {
        let mut stock: Vec<OperatingPoint> = stock_rows
            .iter()
            .filter(|row| row.is_used())
            .zip(0..)
            .map(|(row, index)| OperatingPoint {
                index,
                frequency_khz: row.speed.khz,
            })
            .collect();
        stock.push(OperatingPoint {
            index: u32::try_from(stock.len()).unwrap_or(u32::MAX),
            frequency_khz: CPUFREQ_TABLE_END,
        });
        let stock = stock.into_boxed_slice();
        let stock_ref = FreqTableRef::from_raw(NonNull::from(&stock[0]));
        Self {
            present: (0..SIM_CPUS as u32).collect(),
            registered: vec![Some(stock_ref); SIM_CPUS],
            stock,
        }
    }

    /// The table registered at boot.
    #[must_use]
    pub fn stock_table(&self) -> FreqTableRef {
        FreqTableRef::from_raw(NonNull::from(&self.stock[0]))
    }

    #[must_use]
    pub fn stock_points(&self) -> &[OperatingPoint] {
        &self.stock
    }

    #[must_use]
    pub fn registration(&self, cpu: u32) -> Option<FreqTableRef> {
        self.registered.get(cpu as usize).copied().flatten()
    }
}

impl CpufreqHost for SimCpufreq {
    fn present_cpus(&self) -> Vec<u32> {
        self.present.clone()
    }

    fn frequency_get_table(&self, cpu: u32) -> Option<FreqTableRef> {
        self.registration(cpu)
    }

    fn table_put_attr(&mut self, cpu: u32) {
        if let Some(slot) = self.registered.get_mut(cpu as usize) {
            *slot = None;
        }
    }

    fn table_get_attr(&mut self, table: FreqTableRef, cpu: u32) {
        if let Some(slot) = self.registered.get_mut(cpu as usize) {
            *slot = Some(table);
        }
    }
}

/// Simulated kernel: symbols plus cpufreq state.
pub struct SimKernel {
    profile: TargetProfile,
    symbols: SimSymbols,
    cpufreq: SimCpufreq,
}

impl SimKernel {
    /// Stock MSM8960 Krait v2 kernel.
    #[must_use]
    pub fn msm8960() -> Self {
        Self::for_profile(&TargetProfile::msm8960_kraitv2())
    }

    /// Kernel exporting every symbol `profile` names.
    ///
    /// Resets the process-wide policy objects to stock.
    #[must_use]
    pub fn for_profile(profile: &TargetProfile) -> Self {
        for (cpu, slot) in (0..).zip(SIM_POLICIES.iter()) {
            // SAFETY: see `PolicySlot`.
            unsafe { *slot.0.get() = stock_policy(cpu) };
        }

        let tables: Vec<SimTable> = profile.tables.iter().cloned().map(SimTable::new).collect();
        let mut map = HashMap::new();
        for table in &tables {
            if let Some(addr) = SymbolAddr::new(table.rows.as_ptr() as *mut AcpuLevel as usize) {
                map.insert(table.spec.symbol.clone(), addr);
            }
        }
        if let Some(addr) = fn_addr(sim_cpufreq_cpu_get) {
            map.insert(profile.policy_symbol.clone(), addr);
        }

        let stock_rows = kraitv2_table(SpeedBin::Nominal, KRAITV2_TABLE_ROWS);
        Self {
            profile: profile.clone(),
            symbols: SimSymbols { map, tables },
            cpufreq: SimCpufreq::new(&stock_rows),
        }
    }

    #[must_use]
    pub fn profile(&self) -> &TargetProfile {
        &self.profile
    }

    /// Borrow the resolver and the cpufreq host together.
    pub fn parts(&mut self) -> (&SimSymbols, &mut SimCpufreq) {
        (&self.symbols, &mut self.cpufreq)
    }

    #[must_use]
    pub fn symbols(&self) -> &SimSymbols {
        &self.symbols
    }

    #[must_use]
    pub fn cpufreq(&self) -> &SimCpufreq {
        &self.cpufreq
    }

    /// Make `name` unresolvable, as on a kernel built without it.
    pub fn hide_symbol(&mut self, name: &str) {
        self.symbols.map.remove(name);
    }

    /// Point the policy symbol at a getter that never finds a policy.
    pub fn break_policy_getter(&mut self) {
        if let Some(addr) = fn_addr(sim_cpufreq_cpu_get_none) {
            self.symbols
                .map
                .insert(self.profile.policy_symbol.clone(), addr);
        }
    }

    #[must_use]
    pub fn table(&self, bin: SpeedBin) -> Option<&[AcpuLevel]> {
        let table = self.symbols.table(bin)?;
        // SAFETY: the rows live as long as `self`; `&self` excludes writers.
        Some(unsafe { table.rows.as_ref() })
    }

    pub fn table_mut(&mut self, bin: SpeedBin) -> Option<&mut [AcpuLevel]> {
        let table = self.symbols.table(bin)?;
        let mut rows = table.rows;
        // SAFETY: `&mut self` excludes every other access to the rows.
        Some(unsafe { rows.as_mut() })
    }

    /// Overwrite `cpuinfo.max_freq` of `cpu`, as another driver might have.
    pub fn set_policy_max(&mut self, cpu: u32, khz: u32) {
        if let Some(slot) = SIM_POLICIES.get(cpu as usize) {
            // SAFETY: see `PolicySlot`.
            unsafe { (*slot.0.get()).cpuinfo.max_freq = khz };
        }
    }

    /// Copy of the policy object of `cpu`.
    #[must_use]
    pub fn policy(&self, cpu: u32) -> Option<CpufreqPolicy> {
        let slot = SIM_POLICIES.get(cpu as usize)?;
        // SAFETY: see `PolicySlot`.
        Some(unsafe { *slot.0.get() })
    }
}
