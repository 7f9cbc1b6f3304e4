// CLASSIFICATION: COMMUNITY
// Filename: module.rs v0.3
// Author: Lukas Bower
// Date Modified: 2026-10-17

//! Load and unload entry points.
//!
//! The loaded [`OverclockContext`] lives in a single process-wide slot from
//! load until unload. The slot's lock serialises load and unload, so a
//! second load while loaded is rejected instead of patching the tables
//! again.

use log::{info, warn};
use spin::Mutex;

use crate::config::OverclockConfig;
use crate::error::OverclockError;
use crate::kernel::{CpufreqHost, SymbolResolver};
use crate::patcher::{Overclock, OverclockContext, PatchReport, RevertReport, TablePatch};
use crate::target::SpeedBin;

static LOADED: Mutex<Option<OverclockContext>> = Mutex::new(None);

/// Summary of a successful load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSummary {
    pub target_khz: u32,
    pub patched_bins: Vec<SpeedBin>,
    pub skipped_bins: Vec<SpeedBin>,
}

impl LoadSummary {
    fn from_report(target_khz: u32, report: &PatchReport) -> Self {
        let (patched, skipped): (Vec<&TablePatch>, Vec<&TablePatch>) =
            report.tables.iter().partition(|table| table.is_patched());
        Self {
            target_khz,
            patched_bins: patched.iter().map(|table| table.bin).collect(),
            skipped_bins: skipped.iter().map(|table| table.bin).collect(),
        }
    }
}

/// Patch the host and keep the context for [`try_unload`].
pub fn try_load<R, H>(
    config: OverclockConfig,
    resolver: &R,
    host: &mut H,
) -> Result<LoadSummary, OverclockError>
where
    R: SymbolResolver + ?Sized,
    H: CpufreqHost + ?Sized,
{
    config.validate()?;
    let mut slot = LOADED.lock();
    if slot.is_some() {
        return Err(OverclockError::AlreadyLoaded);
    }
    let context = Overclock::new(config).apply(resolver, host)?;
    let summary = LoadSummary::from_report(context.ladder().target_khz(), context.report());
    *slot = Some(context);
    Ok(summary)
}

/// Revert the loaded context and clear the slot.
pub fn try_unload<R, H>(resolver: &R, host: &mut H) -> Result<RevertReport, OverclockError>
where
    R: SymbolResolver + ?Sized,
    H: CpufreqHost + ?Sized,
{
    let mut slot = LOADED.lock();
    let context = slot.take().ok_or(OverclockError::NotLoaded)?;
    let report = context.revert(resolver, host);
    drop(slot);
    Ok(report)
}

/// Whether a context is currently loaded.
#[must_use]
pub fn is_loaded() -> bool {
    LOADED.lock().is_some()
}

/// Whether a load or unload currently holds the slot.
#[must_use]
pub fn is_busy() -> bool {
    LOADED.is_locked()
}

/// `module_init` counterpart. Always returns 0; failures are logged.
pub fn init<R, H>(config: OverclockConfig, resolver: &R, host: &mut H) -> i32
where
    R: SymbolResolver + ?Sized,
    H: CpufreqHost + ?Sized,
{
    match try_load(config, resolver, host) {
        Ok(summary) => info!(
            "krait_oc: loaded at {} KHz, {} of {} tables patched",
            summary.target_khz,
            summary.patched_bins.len(),
            summary.patched_bins.len() + summary.skipped_bins.len()
        ),
        Err(err) => warn!("krait_oc: {err}"),
    }
    0
}

/// `module_exit` counterpart.
pub fn exit<R, H>(resolver: &R, host: &mut H)
where
    R: SymbolResolver + ?Sized,
    H: CpufreqHost + ?Sized,
{
    match try_unload(resolver, host) {
        Ok(_) => {}
        Err(OverclockError::NotLoaded) => info!("krait_oc: unloaded"),
        Err(err) => warn!("krait_oc: {err}"),
    }
}
