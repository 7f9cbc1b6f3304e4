// CLASSIFICATION: COMMUNITY
// Filename: main.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-17

//! Run a load/unload cycle against the simulated MSM8960 kernel.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use krait_oc::kernel::CpufreqHost;
use krait_oc::sim::SimKernel;
use krait_oc::{load_config, module, OverclockConfig, OverclockParams};
use log::info;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// TOML config with optional [params] and [target] tables.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Module arguments, e.g. "pll_l_val=0x4b vdd_uv=1250000".
    #[arg(long)]
    params: Option<String>,
    /// Symbols to remove from the simulated kernel before loading.
    #[arg(long = "hide-symbol")]
    hide_symbols: Vec<String>,
    /// Stay loaded instead of unloading after the dump.
    #[arg(long)]
    keep: bool,
}

fn dump(kernel: &SimKernel, stage: &str) {
    println!("== {stage}");
    for cpu in kernel.cpufreq().present_cpus() {
        let policy = kernel.policy(cpu).map(|p| p.cpuinfo.max_freq);
        let registered = kernel.cpufreq().registration(cpu);
        let stock = registered == Some(kernel.cpufreq().stock_table());
        println!(
            "cpu{cpu}: max_freq={} table={}",
            policy.map_or_else(|| "-".to_owned(), |khz| khz.to_string()),
            match registered {
                None => "none",
                Some(_) if stock => "stock",
                Some(_) => "overclock",
            }
        );
    }
    for spec in &kernel.profile().tables {
        let Some(rows) = kernel.table(spec.bin) else {
            continue;
        };
        println!("{} ({}):", spec.bin, spec.symbol);
        for (row, level) in rows.iter().enumerate().take_while(|(_, level)| !level.is_end()) {
            println!(
                "  [{row:2}] used={} khz={:7} pll={:3} vdd={}",
                level.use_for_scaling, level.speed.khz, level.speed.pll_l_val, level.vdd_core
            );
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => OverclockConfig::default(),
    };
    if let Some(params) = &args.params {
        config.params = OverclockParams::parse_args(params).context("parsing --params")?;
    }

    let mut kernel = SimKernel::for_profile(&config.target);
    for name in &args.hide_symbols {
        kernel.hide_symbol(name);
    }

    let (symbols, cpufreq) = kernel.parts();
    let status = module::init(config, symbols, cpufreq);
    println!("init returned {status}");
    dump(&kernel, "loaded");

    if args.keep {
        info!("ocsim: leaving overclock loaded");
        return Ok(());
    }
    let (symbols, cpufreq) = kernel.parts();
    module::exit(symbols, cpufreq);
    dump(&kernel, "unloaded");
    Ok(())
}
