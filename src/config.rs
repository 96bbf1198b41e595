//! Application configuration for the `mm-sim` binary.
//!
//! Loads from `config.toml` at the project root. The `[sim]` table is a full
//! `SimConfig`; `[output]` controls logging, batch mode and record export.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::core::SimConfig;
use crate::metrics::TRADING_MINUTES_PER_YEAR;

/// Where results go and how the binary runs
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Fallback filter when `RUST_LOG` is unset
    pub log_level: String,
    /// JSON-lines record export; batch runs get one file per seed
    pub records_path: Option<PathBuf>,
    /// Non-empty switches to a seed sweep over these seeds
    pub batch_seeds: Vec<u64>,
    pub workers: usize,
    /// Annualization for the Sharpe ratio
    pub periods_per_year: f64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            records_path: None,
            batch_seeds: Vec::new(),
            workers: 4,
            periods_per_year: TRADING_MINUTES_PER_YEAR,
        }
    }
}

/// Top-level config file structure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sim: SimConfig,
    pub output: OutputConfig,
}

impl AppConfig {
    /// Load and validate config from the given TOML file path.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(content)?;
        config.sim.validate()?;
        if !config.output.periods_per_year.is_finite() || config.output.periods_per_year <= 0.0 {
            anyhow::bail!("periods_per_year must be > 0");
        }
        Ok(config)
    }

    /// First existing default location (project root config.toml)
    pub fn default_path() -> Option<PathBuf> {
        let candidates = [
            "config.toml",
            concat!(env!("CARGO_MANIFEST_DIR"), "/config.toml"),
        ];
        candidates
            .iter()
            .map(PathBuf::from)
            .find(|path| path.is_file())
    }

    /// Per-seed export path for batch mode: `records.jsonl` -> `records-7.jsonl`
    pub fn records_path_for_seed(&self, seed: u64) -> Option<PathBuf> {
        let path = self.output.records_path.as_ref()?;
        let stem = path.file_stem()?.to_string_lossy();
        let name = match path.extension() {
            Some(ext) => format!("{}-{}.{}", stem, seed, ext.to_string_lossy()),
            None => format!("{}-{}", stem, seed),
        };
        Some(path.with_file_name(name))
    }
}
