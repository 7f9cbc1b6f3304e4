// CLASSIFICATION: COMMUNITY
// Filename: error.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-17

use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised while patching or reverting.
#[derive(Debug, Error)]
pub enum OverclockError {
    #[error("symbol not found: {0}")]
    SymbolNotFound(String),
    #[error("no cpufreq policy for cpu {cpu}")]
    PolicyUnavailable { cpu: u32 },
    #[error("no unused row in {symbol} at or after row {row}")]
    SlotExhausted { symbol: String, row: usize },
    #[error("overclock already loaded")]
    AlreadyLoaded,
    #[error("overclock not loaded")]
    NotLoaded,
    #[error(transparent)]
    Config(#[from] ConfigError),
}
