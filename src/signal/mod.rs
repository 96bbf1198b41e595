//! Signal engines - bounded short-term direction forecasts from price history
//!
//! Each strategy maps a window of past mids to a value in [-1, 1].
//! `SignalTracker` owns the rolling history, the cold-start policy and the
//! final saturation; strategies only see complete windows.

pub mod breakout;
pub mod composite;
pub mod crossover;
pub mod mean_reversion;
pub mod momentum;
pub mod rsi;
pub mod tracker;

pub use breakout::Breakout;
pub use composite::Composite;
pub use crossover::Crossover;
pub use mean_reversion::MeanReversion;
pub use momentum::Momentum;
pub use rsi::Rsi;
pub use tracker::SignalTracker;

use crate::core::{Result, SignalConfig};

/// Capability set shared by every signal strategy
pub trait SignalEngine {
    /// Strategy name for logging
    fn name(&self) -> &str;

    /// Number of past prices (current one included) needed for a value
    fn window_size(&self) -> usize;

    /// Compute the raw signal from the most recent `window_size()` prices.
    /// The tracker clamps the result; strategies may return any real.
    fn compute(&mut self, window: &[f64]) -> f64;
}

/// Closed set of strategies. Composite nests other strategies by value.
#[derive(Debug, Clone)]
pub enum SignalStrategy {
    Momentum(Momentum),
    MeanReversion(MeanReversion),
    Crossover(Crossover),
    Rsi(Rsi),
    Breakout(Breakout),
    Composite(Composite),
}

impl SignalStrategy {
    pub fn from_config(config: &SignalConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: &SignalConfig) -> Self {
        match config {
            SignalConfig::Momentum {
                lookback,
                smoothing_span,
            } => SignalStrategy::Momentum(Momentum::new(*lookback, *smoothing_span)),
            SignalConfig::MeanReversion { window, z_scale } => {
                SignalStrategy::MeanReversion(MeanReversion::new(*window, *z_scale))
            }
            SignalConfig::Crossover { short, long } => {
                SignalStrategy::Crossover(Crossover::new(*short, *long))
            }
            SignalConfig::Rsi { period } => SignalStrategy::Rsi(Rsi::new(*period)),
            SignalConfig::Breakout { window } => SignalStrategy::Breakout(Breakout::new(*window)),
            SignalConfig::Composite { components } => SignalStrategy::Composite(Composite::new(
                components
                    .iter()
                    .map(|c| (Self::build(&c.signal), c.weight))
                    .collect(),
            )),
        }
    }
}

impl SignalEngine for SignalStrategy {
    fn name(&self) -> &str {
        match self {
            SignalStrategy::Momentum(s) => s.name(),
            SignalStrategy::MeanReversion(s) => s.name(),
            SignalStrategy::Crossover(s) => s.name(),
            SignalStrategy::Rsi(s) => s.name(),
            SignalStrategy::Breakout(s) => s.name(),
            SignalStrategy::Composite(s) => s.name(),
        }
    }

    fn window_size(&self) -> usize {
        match self {
            SignalStrategy::Momentum(s) => s.window_size(),
            SignalStrategy::MeanReversion(s) => s.window_size(),
            SignalStrategy::Crossover(s) => s.window_size(),
            SignalStrategy::Rsi(s) => s.window_size(),
            SignalStrategy::Breakout(s) => s.window_size(),
            SignalStrategy::Composite(s) => s.window_size(),
        }
    }

    fn compute(&mut self, window: &[f64]) -> f64 {
        match self {
            SignalStrategy::Momentum(s) => s.compute(window),
            SignalStrategy::MeanReversion(s) => s.compute(window),
            SignalStrategy::Crossover(s) => s.compute(window),
            SignalStrategy::Rsi(s) => s.compute(window),
            SignalStrategy::Breakout(s) => s.compute(window),
            SignalStrategy::Composite(s) => s.compute(window),
        }
    }
}

/// Saturate into [-1, 1]; NaN maps to neutral.
#[inline]
pub fn bound(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(-1.0, 1.0)
    }
}

/// Last `n` elements of `window` (all of it if shorter)
#[inline]
pub(crate) fn tail(window: &[f64], n: usize) -> &[f64] {
    &window[window.len().saturating_sub(n)..]
}

pub(crate) fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Sample standard deviation (n - 1 denominator)
pub(crate) fn sample_std(xs: &[f64]) -> f64 {
    if xs.len() < 2 {
        return 0.0;
    }
    let m = mean(xs);
    let var = xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (xs.len() - 1) as f64;
    var.sqrt()
}

/// `numer / denom`, saturating to +-inf (or 0) when the denominator vanishes
pub(crate) fn ratio(numer: f64, denom: f64) -> f64 {
    if denom > f64::EPSILON {
        numer / denom
    } else if numer == 0.0 {
        0.0
    } else {
        numer.signum() * f64::INFINITY
    }
}
