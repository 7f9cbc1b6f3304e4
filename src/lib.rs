// CLASSIFICATION: COMMUNITY
// Filename: lib.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-10-17

//! Runtime overclock for MSM8960 Krait cores.
//!
//! Splices one higher frequency into the cpufreq ladder, writes matching
//! operating points into the kernel's per-bin `acpu_freq_tbl`s located by
//! symbol name, and restores the cpufreq policy on unload.

/// Kernel-style module parameters.
pub mod params;

/// Per-SoC symbol names, bounds and clocks.
pub mod target;

/// TOML configuration loading and validation.
pub mod config;

pub mod error;

/// cpufreq frequency ladder.
pub mod ladder;

/// Frequency to core-voltage lookup.
pub mod voltage;

/// Host kernel seams.
pub mod kernel;

/// Scaling-table row layout and bounded access.
pub mod acpu;

/// Patch and revert passes.
pub mod patcher;

/// Load/unload entry points.
pub mod module;

/// Simulated MSM8960 kernel.
pub mod sim;

pub use config::{load_config, ConfigError, OverclockConfig};
pub use error::OverclockError;
pub use ladder::FrequencyLadder;
pub use params::OverclockParams;
pub use patcher::{Overclock, OverclockContext, PatchReport, RevertReport};
pub use target::{SpeedBin, TargetProfile};
