// CLASSIFICATION: COMMUNITY
// Filename: overclock_revert.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-10-17

use krait_oc::kernel::{CpufreqHost, FreqTableRef};
use krait_oc::sim::{SimCpufreq, SimKernel};
use krait_oc::{Overclock, OverclockConfig, SpeedBin};
use serial_test::serial;

fn init_log() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Host on which no CPU had a table registered before the overclock.
struct NoBootTable<'a>(&'a mut SimCpufreq);

impl CpufreqHost for NoBootTable<'_> {
    fn present_cpus(&self) -> Vec<u32> {
        self.0.present_cpus()
    }

    fn frequency_get_table(&self, _cpu: u32) -> Option<FreqTableRef> {
        None
    }

    fn table_put_attr(&mut self, cpu: u32) {
        self.0.table_put_attr(cpu);
    }

    fn table_get_attr(&mut self, table: FreqTableRef, cpu: u32) {
        self.0.table_get_attr(table, cpu);
    }
}

#[test]
#[serial]
fn revert_restores_policy_and_registration_only() {
    init_log();
    let mut kernel = SimKernel::msm8960();
    let stock_table = kernel.cpufreq().stock_table();
    let (symbols, cpufreq) = kernel.parts();
    let ctx = Overclock::new(OverclockConfig::default())
        .apply(symbols, cpufreq)
        .unwrap();
    let patched: Vec<_> = [SpeedBin::Nominal, SpeedBin::Slow, SpeedBin::Fast]
        .iter()
        .map(|bin| kernel.table(*bin).unwrap().to_vec())
        .collect();

    let (symbols, cpufreq) = kernel.parts();
    let report = ctx.revert(symbols, cpufreq);

    assert!(report.policy_restored);
    assert_eq!(
        report.tables_left_patched,
        vec![SpeedBin::Nominal, SpeedBin::Slow, SpeedBin::Fast]
    );
    assert_eq!(kernel.policy(0).unwrap().cpuinfo.max_freq, 1_512_000);
    for cpu in [0, 1] {
        assert_eq!(kernel.cpufreq().registration(cpu), Some(stock_table));
    }
    for (bin, rows) in [SpeedBin::Nominal, SpeedBin::Slow, SpeedBin::Fast]
        .iter()
        .zip(patched)
    {
        assert_eq!(kernel.table(*bin).unwrap(), rows.as_slice());
        assert_eq!(kernel.table(*bin).unwrap()[8].speed.khz, 1_917_000);
    }
}

#[test]
#[serial]
fn revert_restores_non_stock_maximum_exactly() {
    init_log();
    let mut kernel = SimKernel::msm8960();
    kernel.set_policy_max(0, 1_458_000);
    let (symbols, cpufreq) = kernel.parts();
    let ctx = Overclock::new(OverclockConfig::default())
        .apply(symbols, cpufreq)
        .unwrap();
    assert_eq!(ctx.original_max_khz(), 1_458_000);
    assert_eq!(kernel.policy(0).unwrap().cpuinfo.max_freq, 1_917_000);

    let (symbols, cpufreq) = kernel.parts();
    ctx.revert(symbols, cpufreq);
    assert_eq!(kernel.policy(0).unwrap().cpuinfo.max_freq, 1_458_000);
}

#[test]
#[serial]
fn revert_without_policy_symbol_leaves_overclock_in_place() {
    init_log();
    let mut kernel = SimKernel::msm8960();
    let (symbols, cpufreq) = kernel.parts();
    let ctx = Overclock::new(OverclockConfig::default())
        .apply(symbols, cpufreq)
        .unwrap();
    let ladder = ctx.ladder().as_ptr();

    kernel.hide_symbol("cpufreq_cpu_get");
    let (symbols, cpufreq) = kernel.parts();
    let report = ctx.revert(symbols, cpufreq);

    assert!(!report.policy_restored);
    assert_eq!(report.tables_left_patched.len(), 3);
    assert_eq!(kernel.policy(0).unwrap().cpuinfo.max_freq, 1_917_000);
    for cpu in [0, 1] {
        assert_eq!(kernel.cpufreq().registration(cpu).unwrap().as_ptr(), ladder);
    }
}

#[test]
#[serial]
fn revert_reports_no_tables_when_none_were_found() {
    init_log();
    let mut kernel = SimKernel::msm8960();
    for spec in kernel.profile().tables.clone() {
        kernel.hide_symbol(&spec.symbol);
    }
    let (symbols, cpufreq) = kernel.parts();
    let ctx = Overclock::new(OverclockConfig::default())
        .apply(symbols, cpufreq)
        .unwrap();
    assert!(ctx.report().patched_bins().is_empty());

    let (symbols, cpufreq) = kernel.parts();
    let report = ctx.revert(symbols, cpufreq);
    assert!(report.policy_restored);
    assert!(report.tables_left_patched.is_empty());
}

#[test]
#[serial]
fn revert_without_boot_table_keeps_ladder_registered() {
    init_log();
    let mut kernel = SimKernel::msm8960();
    let (symbols, cpufreq) = kernel.parts();
    let ctx = Overclock::new(OverclockConfig::default())
        .apply(symbols, &mut NoBootTable(cpufreq))
        .unwrap();
    assert_eq!(ctx.original_table(), None);
    let ladder = ctx.ladder().as_ptr();

    let (symbols, cpufreq) = kernel.parts();
    let report = ctx.revert(symbols, &mut NoBootTable(cpufreq));

    assert!(report.policy_restored);
    assert_eq!(kernel.policy(0).unwrap().cpuinfo.max_freq, 1_512_000);
    for cpu in [0, 1] {
        let registered = kernel.cpufreq().registration(cpu);
        assert_eq!(registered.map(FreqTableRef::as_ptr), Some(ladder));
    }
}
