//! Configuration - Type-safe, validated config
//!
//! Every section can be loaded from TOML. Missing sections fall back to
//! `SimConfig::default()`. `validate()` runs before any simulation step.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::{Error, Result, RiskLimits};

/// Full configuration of one simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Seed for the run's single random generator
    pub seed: u64,

    /// Number of steps to simulate (a replay series may end sooner)
    pub steps: u64,

    /// End the run right after a stop-loss halt instead of emitting flat records
    pub stop_on_halt: bool,

    /// Starting cash balance; PnL is measured relative to it
    pub initial_cash: f64,

    pub price: PriceConfig,
    pub signal: SignalConfig,
    pub quote: QuoteConfig,
    pub risk: RiskLimits,
    pub execution: ExecutionConfig,
}

/// Mid-price source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PriceConfig {
    /// Additive walk: `mid + drift + volatility * mid * N(0,1)`
    RandomWalk {
        initial_price: f64,
        volatility: f64,
        #[serde(default)]
        drift: f64,
    },
    /// Log-normal walk: `mid * exp(drift + volatility * N(0,1))`
    Geometric {
        initial_price: f64,
        volatility: f64,
        #[serde(default)]
        drift: f64,
    },
    /// Pre-loaded historical series
    Replay { prices: Vec<f64> },
}

/// Signal strategy selection and parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SignalConfig {
    Momentum {
        lookback: usize,
        /// EMA span applied to the raw momentum before normalization
        #[serde(default)]
        smoothing_span: Option<usize>,
    },
    MeanReversion {
        window: usize,
        #[serde(default = "default_z_scale")]
        z_scale: f64,
    },
    Crossover {
        short: usize,
        long: usize,
    },
    Rsi {
        period: usize,
    },
    Breakout {
        window: usize,
    },
    Composite {
        components: Vec<WeightedSignal>,
    },
}

fn default_z_scale() -> f64 {
    2.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedSignal {
    pub weight: f64,
    pub signal: SignalConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteConfig {
    /// Full bid/ask distance before widening
    pub base_spread: f64,
    /// Price shift per unit of inventory
    pub inventory_skew_coefficient: f64,
    /// Price shift per unit of signal
    pub signal_bias_coefficient: f64,
    pub size_per_quote: u64,
    /// half_spread = max(base_spread / 2, multiplier * realized vol); 0 disables
    pub volatility_multiplier: f64,
    /// Price history length used for realized volatility
    pub volatility_window: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Fill probability for a quote sitting exactly at mid
    pub base_fill_prob: f64,
    /// Exponential decay of fill probability with distance from mid
    pub aggressiveness_decay: f64,
    /// Steps of staleness in the mid used for fill decisions; 0 = live
    pub latency_steps: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            steps: 1000,
            stop_on_halt: false,
            initial_cash: 0.0,
            price: PriceConfig::default(),
            signal: SignalConfig::default(),
            quote: QuoteConfig::default(),
            risk: RiskLimits::default(),
            execution: ExecutionConfig::default(),
        }
    }
}

impl Default for PriceConfig {
    fn default() -> Self {
        PriceConfig::RandomWalk {
            initial_price: 100.0,
            volatility: 0.01,
            drift: 0.0,
        }
    }
}

impl Default for SignalConfig {
    fn default() -> Self {
        SignalConfig::Momentum {
            lookback: 5,
            smoothing_span: None,
        }
    }
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            base_spread: 0.02,
            inventory_skew_coefficient: 0.001,
            signal_bias_coefficient: 0.01,
            size_per_quote: 1,
            volatility_multiplier: 0.0,
            volatility_window: 20,
        }
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            base_fill_prob: 0.3,
            aggressiveness_decay: 50.0,
            latency_steps: 0,
        }
    }
}

impl SimConfig {
    /// Load from TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read config {}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Parse from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(format!("Failed to parse config: {}", e)))
    }

    /// Validate every section. Nothing runs unless this passes.
    pub fn validate(&self) -> Result<()> {
        if self.steps == 0 {
            return Err(Error::config("steps must be > 0"));
        }
        if !self.initial_cash.is_finite() {
            return Err(Error::config("initial_cash must be finite"));
        }
        self.price.validate()?;
        self.signal.validate()?;
        self.quote.validate()?;
        validate_risk_limits(&self.risk)?;
        self.execution.validate()
    }

    /// Same config with a different seed (for seed sweeps)
    pub fn with_seed(&self, seed: u64) -> Self {
        Self {
            seed,
            ..self.clone()
        }
    }
}

impl PriceConfig {
    pub fn validate(&self) -> Result<()> {
        match self {
            PriceConfig::RandomWalk {
                initial_price,
                volatility,
                drift,
            }
            | PriceConfig::Geometric {
                initial_price,
                volatility,
                drift,
            } => {
                if !initial_price.is_finite() || *initial_price <= 0.0 {
                    return Err(Error::config(format!(
                        "initial_price must be > 0, got {}",
                        initial_price
                    )));
                }
                if !volatility.is_finite() || *volatility < 0.0 {
                    return Err(Error::config(format!(
                        "volatility must be >= 0, got {}",
                        volatility
                    )));
                }
                if !drift.is_finite() {
                    return Err(Error::config("drift must be finite"));
                }
                Ok(())
            }
            PriceConfig::Replay { prices } => {
                if prices.is_empty() {
                    return Err(Error::config("replay series is empty"));
                }
                if let Some((i, p)) = prices
                    .iter()
                    .enumerate()
                    .find(|(_, p)| !p.is_finite() || **p <= 0.0)
                {
                    return Err(Error::config(format!(
                        "replay price at index {} must be > 0, got {}",
                        i, p
                    )));
                }
                Ok(())
            }
        }
    }
}

impl SignalConfig {
    pub fn validate(&self) -> Result<()> {
        match self {
            SignalConfig::Momentum {
                lookback,
                smoothing_span,
            } => {
                if *lookback < 2 {
                    return Err(Error::config("momentum lookback must be >= 2"));
                }
                if matches!(smoothing_span, Some(0)) {
                    return Err(Error::config("momentum smoothing_span must be >= 1"));
                }
            }
            SignalConfig::MeanReversion { window, z_scale } => {
                if *window < 2 {
                    return Err(Error::config("mean_reversion window must be >= 2"));
                }
                if !z_scale.is_finite() || *z_scale <= 0.0 {
                    return Err(Error::config("mean_reversion z_scale must be > 0"));
                }
            }
            SignalConfig::Crossover { short, long } => {
                if *short < 1 || *long < 2 || short >= long {
                    return Err(Error::config(format!(
                        "crossover needs 1 <= short < long (long >= 2), got short={} long={}",
                        short, long
                    )));
                }
            }
            SignalConfig::Rsi { period } => {
                if *period < 2 {
                    return Err(Error::config("rsi period must be >= 2"));
                }
            }
            SignalConfig::Breakout { window } => {
                if *window < 1 {
                    return Err(Error::config("breakout window must be >= 1"));
                }
            }
            SignalConfig::Composite { components } => {
                if components.is_empty() {
                    return Err(Error::config("composite signal needs at least one component"));
                }
                let mut total = 0.0;
                for c in components {
                    if !c.weight.is_finite() {
                        return Err(Error::config("composite weights must be finite"));
                    }
                    total += c.weight.abs();
                    c.signal.validate()?;
                }
                if total <= 0.0 {
                    return Err(Error::config("composite weights must not all be zero"));
                }
            }
        }
        Ok(())
    }
}

impl QuoteConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.base_spread.is_finite() || self.base_spread <= 0.0 {
            return Err(Error::config(format!(
                "base_spread must be > 0, got {}",
                self.base_spread
            )));
        }
        if !self.inventory_skew_coefficient.is_finite() || self.inventory_skew_coefficient < 0.0 {
            return Err(Error::config("inventory_skew_coefficient must be >= 0"));
        }
        if !self.signal_bias_coefficient.is_finite() {
            return Err(Error::config("signal_bias_coefficient must be finite"));
        }
        if !self.volatility_multiplier.is_finite() || self.volatility_multiplier < 0.0 {
            return Err(Error::config("volatility_multiplier must be >= 0"));
        }
        if self.size_per_quote > i64::MAX as u64 {
            return Err(Error::config(format!(
                "size_per_quote must be <= {}, got {}",
                i64::MAX,
                self.size_per_quote
            )));
        }
        if self.volatility_multiplier > 0.0 && self.volatility_window < 3 {
            return Err(Error::config("volatility_window must be >= 3 when widening is on"));
        }
        Ok(())
    }
}

impl ExecutionConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.base_fill_prob) {
            return Err(Error::config(format!(
                "base_fill_prob must be in [0, 1], got {}",
                self.base_fill_prob
            )));
        }
        if !self.aggressiveness_decay.is_finite() || self.aggressiveness_decay < 0.0 {
            return Err(Error::config("aggressiveness_decay must be >= 0"));
        }
        Ok(())
    }
}

pub fn validate_risk_limits(limits: &RiskLimits) -> Result<()> {
    if limits.max_abs_position > i64::MAX as u64 {
        return Err(Error::config(format!(
            "max_abs_position must be <= {}, got {}",
            i64::MAX,
            limits.max_abs_position
        )));
    }
    // -inf is allowed: it disables the stop-loss
    if limits.stop_loss_threshold.is_nan() || limits.stop_loss_threshold >= 0.0 {
        return Err(Error::config(format!(
            "stop_loss_threshold must be negative, got {}",
            limits.stop_loss_threshold
        )));
    }
    Ok(())
}
