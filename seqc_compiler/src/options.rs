//! Compiler options.
//!
//! Loaded from TOML or constructed directly. Defaults match the reference
//! hardware; validation rejects values the scheduler cannot honor.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Error type for options loading.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptionsError {
    /// Options file not found at the given path.
    #[error("Options file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse options: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Options validation failed: {0}")]
    ValidationError(String),
}

/// Tunable compiler behavior.
///
/// # TOML Example
///
/// ```toml
/// allow_cross_epoch_pull = false
/// sync_safety_margin_cyc = 25
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompileOptions {
    /// Permit pulling a load into the preceding sync frame when its own
    /// frame has no room.
    #[serde(default = "default_cross_epoch_pull")]
    pub allow_cross_epoch_pull: bool,

    /// Safety margin added to the back-filled master wait [cycles].
    #[serde(default = "default_sync_margin")]
    pub sync_safety_margin_cyc: u64,
}

fn default_cross_epoch_pull() -> bool {
    true
}

fn default_sync_margin() -> u64 {
    10
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            allow_cross_epoch_pull: true,
            sync_safety_margin_cyc: 10,
        }
    }
}

impl CompileOptions {
    /// Validate semantic bounds.
    ///
    /// # Errors
    ///
    /// Returns `OptionsError::ValidationError` if the sync margin exceeds
    /// 10 000 cycles (40 µs of dead time on every trigger).
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.sync_safety_margin_cyc > 10_000 {
            return Err(OptionsError::ValidationError(format!(
                "sync_safety_margin_cyc {} exceeds 10000",
                self.sync_safety_margin_cyc
            )));
        }
        Ok(())
    }

    /// Parse and validate options from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, OptionsError> {
        let options: Self =
            toml::from_str(s).map_err(|e| OptionsError::ParseError(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Load and validate options from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, OptionsError> {
        if !path.exists() {
            return Err(OptionsError::FileNotFound);
        }
        let content =
            std::fs::read_to_string(path).map_err(|e| OptionsError::ParseError(e.to_string()))?;
        Self::from_toml_str(&content)
    }
}
