// CLASSIFICATION: COMMUNITY
// Filename: patcher.rs v0.5
// Author: Lukas Bower
// Date Modified: 2026-10-17

//! Patch and revert passes.
//!
//! [`Overclock::apply`] raises the policy maximum, registers the new ladder
//! on every present CPU and writes the overclock rows into each scaling
//! table. [`OverclockContext::revert`] undoes the policy and registration
//! changes only. The scaling-table rows stay patched until reboot.
//!
//! Nothing here takes a lock around the host objects. The caller must make
//! sure no other patch or revert runs at the same time; [`crate::module`]
//! does that for the load/unload entry points.

use log::{info, warn};

use crate::acpu::{RowUpdate, ScalingTable, FIRST_SCALING_ROW};
use crate::config::OverclockConfig;
use crate::error::OverclockError;
use crate::kernel::{CpufreqHost, FreqTableRef, PolicyGetter, SymbolResolver};
use crate::ladder::FrequencyLadder;
use crate::target::{ScalingTableSpec, SpeedBin};
use crate::voltage::resolve_vdd;

pub const DRIVER_DESCRIPTION: &str = "MSM 8960 Overclock Driver";
pub const DRIVER_VERSION: &str = "1.1";
pub const DRIVER_AUTHOR: &str =
    "Michael Huang <mike@setcpu.com>, Miguel Boton <mboton@gmail.com>";

/// CPU whose policy carries the frequency limits.
const POLICY_CPU: u32 = 0;

/// A row written into a scaling table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchedSlot {
    pub row: usize,
    pub khz: u32,
    pub pll_l_val: u32,
    pub vdd_uv: u32,
}

/// Outcome of patching one scaling table.
///
/// `slots` holds every row written, including rows written before `error`
/// stopped the pass.
#[derive(Debug)]
pub struct TablePatch {
    pub bin: SpeedBin,
    pub symbol: String,
    pub slots: Vec<PatchedSlot>,
    pub error: Option<OverclockError>,
}

impl TablePatch {
    /// Whether any row of the table was written.
    #[must_use]
    pub fn is_patched(&self) -> bool {
        !self.slots.is_empty()
    }

    /// Whether every overclock row was written.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-table results of a patch pass.
#[derive(Debug, Default)]
pub struct PatchReport {
    pub tables: Vec<TablePatch>,
}

impl PatchReport {
    #[must_use]
    pub fn table(&self, bin: SpeedBin) -> Option<&TablePatch> {
        self.tables.iter().find(|table| table.bin == bin)
    }

    /// Bins with at least one row written.
    #[must_use]
    pub fn patched_bins(&self) -> Vec<SpeedBin> {
        self.tables
            .iter()
            .filter(|table| table.is_patched())
            .map(|table| table.bin)
            .collect()
    }
}

/// Write the ladder's overclock region into the table named by `spec`.
///
/// Each ladder row goes into the next row of the table not used for
/// scaling, starting after the standby row. The PLL L value is the
/// frequency divided by `hfpll_khz`, truncated. Rows already written stay
/// written if the scan runs out of free rows part way; use
/// [`patch_scaling_table_into`] to keep track of them.
pub fn patch_scaling_table<R: SymbolResolver + ?Sized>(
    resolver: &R,
    spec: &ScalingTableSpec,
    ladder: &FrequencyLadder,
    hfpll_khz: u32,
    default_vdd_uv: u32,
) -> Result<Vec<PatchedSlot>, OverclockError> {
    let mut slots = Vec::new();
    patch_scaling_table_into(resolver, spec, ladder, hfpll_khz, default_vdd_uv, &mut slots)?;
    Ok(slots)
}

/// Like [`patch_scaling_table`], but pushes each written row onto `slots`
/// as it goes, so a failed pass still reports what it changed.
pub fn patch_scaling_table_into<R: SymbolResolver + ?Sized>(
    resolver: &R,
    spec: &ScalingTableSpec,
    ladder: &FrequencyLadder,
    hfpll_khz: u32,
    default_vdd_uv: u32,
    slots: &mut Vec<PatchedSlot>,
) -> Result<(), OverclockError> {
    let addr = resolver
        .lookup_name(&spec.symbol)
        .ok_or_else(|| OverclockError::SymbolNotFound(spec.symbol.clone()))?;
    // SAFETY: the resolver contract makes `addr` a live `acpu_freq_tbl`;
    // `spec.rows` bounds it and this pass is its only accessor.
    let mut table = unsafe { ScalingTable::from_symbol(addr, spec.rows) };

    let mut next = FIRST_SCALING_ROW;
    for point in ladder.overclock_region() {
        let row = table
            .next_free_slot(next)
            .ok_or_else(|| OverclockError::SlotExhausted {
                symbol: spec.symbol.clone(),
                row: next,
            })?;
        let khz = point.frequency_khz;
        let slot = PatchedSlot {
            row,
            khz,
            pll_l_val: khz / hfpll_khz,
            vdd_uv: resolve_vdd(khz, default_vdd_uv),
        };
        table.write(
            row,
            RowUpdate {
                khz: slot.khz,
                pll_l_val: slot.pll_l_val,
                vdd_uv: slot.vdd_uv,
            },
        );
        info!(
            "krait_oc: [{}] KHz={} PLL={} VDD={}",
            slot.row, slot.khz, slot.pll_l_val, slot.vdd_uv
        );
        slots.push(slot);
        next = row + 1;
    }
    Ok(())
}

/// A configured overclock that has not touched the host yet.
#[derive(Debug, Clone)]
pub struct Overclock {
    config: OverclockConfig,
    ladder: FrequencyLadder,
}

impl Overclock {
    #[must_use]
    pub fn new(config: OverclockConfig) -> Self {
        let ladder = FrequencyLadder::build(config.target_khz());
        Self { config, ladder }
    }

    #[must_use]
    pub fn config(&self) -> &OverclockConfig {
        &self.config
    }

    #[must_use]
    pub fn ladder(&self) -> &FrequencyLadder {
        &self.ladder
    }

    /// Run the patch pass.
    ///
    /// Fails without touching anything when the policy getter cannot be
    /// resolved or returns no policy for CPU 0. A scaling table that cannot
    /// be found or has no free row is logged, recorded in the report and
    /// skipped; the other tables are still patched.
    pub fn apply<R, H>(self, resolver: &R, host: &mut H) -> Result<OverclockContext, OverclockError>
    where
        R: SymbolResolver + ?Sized,
        H: CpufreqHost + ?Sized,
    {
        let Self { config, ladder } = self;
        let target_khz = ladder.target_khz();

        info!("krait_oc: {DRIVER_DESCRIPTION} version {DRIVER_VERSION}");
        info!("krait_oc: by {DRIVER_AUTHOR}");
        info!(
            "krait_oc: overclocking to {} at {} uV",
            target_khz, config.params.vdd_uv
        );
        if let Some(row) = ladder.monotonic_violation() {
            warn!("krait_oc: frequency table is not increasing at row {row}");
        }

        info!("krait_oc: updating cpufreq policy");
        let Some(getter) = PolicyGetter::resolve(resolver, &config.target.policy_symbol) else {
            warn!("krait_oc: symbol not found");
            warn!("krait_oc: not attempting overclock");
            return Err(OverclockError::SymbolNotFound(
                config.target.policy_symbol.clone(),
            ));
        };
        let original_max_khz = getter
            .with_policy(POLICY_CPU, |policy| {
                let original = policy.cpuinfo.max_freq;
                policy.cpuinfo.max_freq = target_khz;
                original
            })
            .ok_or_else(|| {
                warn!("krait_oc: no policy for cpu {POLICY_CPU}, not attempting overclock");
                OverclockError::PolicyUnavailable { cpu: POLICY_CPU }
            })?;
        if original_max_khz != config.target.stock_max_khz {
            warn!(
                "krait_oc: policy max {} KHz differs from stock {} KHz",
                original_max_khz, config.target.stock_max_khz
            );
        }

        info!("krait_oc: updating cpufreq tables");
        // The cpufreq core keeps this pointer for as long as it is
        // registered, and stale readers may still hold it after revert.
        let ladder: &'static FrequencyLadder = Box::leak(Box::new(ladder));
        let original_table = host.frequency_get_table(POLICY_CPU);
        let cpus = host.present_cpus();
        let ladder_ref = FreqTableRef::from_ladder(ladder);
        for &cpu in &cpus {
            host.table_put_attr(cpu);
            host.table_get_attr(ladder_ref, cpu);
        }

        let mut report = PatchReport::default();
        for spec in &config.target.tables {
            info!("krait_oc: updating {} acpu_freq_tbl", spec.bin);
            let mut slots = Vec::new();
            let error = patch_scaling_table_into(
                resolver,
                spec,
                ladder,
                config.target.hfpll_khz,
                config.params.vdd_uv,
                &mut slots,
            )
            .err();
            match &error {
                Some(OverclockError::SymbolNotFound(_)) => {
                    warn!("krait_oc: symbol not found");
                    warn!("krait_oc: skipping this table");
                }
                Some(err) => warn!(
                    "krait_oc: {err}, {} of {} rows written",
                    slots.len(),
                    ladder.overclock_region().count()
                ),
                None => {}
            }
            report.tables.push(TablePatch {
                bin: spec.bin,
                symbol: spec.symbol.clone(),
                slots,
                error,
            });
        }

        Ok(OverclockContext {
            config,
            ladder,
            original_table,
            original_max_khz,
            cpus,
            report,
        })
    }
}

/// State kept between a successful patch pass and its revert.
#[derive(Debug)]
pub struct OverclockContext {
    config: OverclockConfig,
    ladder: &'static FrequencyLadder,
    original_table: Option<FreqTableRef>,
    original_max_khz: u32,
    cpus: Vec<u32>,
    report: PatchReport,
}

impl OverclockContext {
    #[must_use]
    pub fn config(&self) -> &OverclockConfig {
        &self.config
    }

    /// The ladder registered on every CPU.
    #[must_use]
    pub fn ladder(&self) -> &'static FrequencyLadder {
        self.ladder
    }

    /// Table that was active on CPU 0 before patching.
    #[must_use]
    pub fn original_table(&self) -> Option<FreqTableRef> {
        self.original_table
    }

    #[must_use]
    pub fn original_max_khz(&self) -> u32 {
        self.original_max_khz
    }

    /// CPUs the ladder was registered on.
    #[must_use]
    pub fn cpus(&self) -> &[u32] {
        &self.cpus
    }

    #[must_use]
    pub fn report(&self) -> &PatchReport {
        &self.report
    }

    /// Restore the policy maximum and the original table registration.
    ///
    /// Skipped with a warning if the policy getter no longer resolves. If no
    /// table was registered before patching, the ladder stays registered.
    /// Scaling-table rows written by the patch pass are not restored.
    pub fn revert<R, H>(self, resolver: &R, host: &mut H) -> RevertReport
    where
        R: SymbolResolver + ?Sized,
        H: CpufreqHost + ?Sized,
    {
        let mut policy_restored = false;
        if let Some(getter) = PolicyGetter::resolve(resolver, &self.config.target.policy_symbol) {
            info!("krait_oc: reverting cpufreq policy");
            let restored = getter.with_policy(POLICY_CPU, |policy| {
                policy.cpuinfo.max_freq = self.original_max_khz;
            });
            if restored.is_none() {
                warn!("krait_oc: no policy for cpu {POLICY_CPU}, max frequency not restored");
            }

            info!("krait_oc: reverting cpufreq tables");
            match self.original_table {
                Some(table) => {
                    for &cpu in &self.cpus {
                        host.table_put_attr(cpu);
                        host.table_get_attr(table, cpu);
                    }
                }
                None => warn!(
                    "krait_oc: no table was registered before overclocking, ladder left registered"
                ),
            }
            policy_restored = restored.is_some();
        } else {
            warn!("krait_oc: symbol not found, cpufreq policy left overclocked");
        }

        let tables_left_patched = self.report.patched_bins();
        for bin in &tables_left_patched {
            warn!("krait_oc: {bin} acpu_freq_tbl stays patched until reboot");
        }
        info!("krait_oc: unloaded");

        RevertReport {
            policy_restored,
            tables_left_patched,
        }
    }
}

/// What a revert pass restored and what it could not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevertReport {
    pub policy_restored: bool,
    /// Scaling tables still carrying overclock rows.
    pub tables_left_patched: Vec<SpeedBin>,
}
