//! Momentum - price change over a lookback, normalized by recent dispersion

use super::{ratio, sample_std, tail, SignalEngine};

/// `tanh((p[t] - p[t-lookback]) / std(last lookback prices))`,
/// optionally EMA-smoothing the raw change first.
#[derive(Debug, Clone)]
pub struct Momentum {
    lookback: usize,
    alpha: Option<f64>,
    ema: Option<f64>,
}

impl Momentum {
    pub fn new(lookback: usize, smoothing_span: Option<usize>) -> Self {
        Self {
            lookback,
            alpha: smoothing_span.map(|span| 2.0 / (span as f64 + 1.0)),
            ema: None,
        }
    }

    fn smooth(&mut self, raw: f64) -> f64 {
        let Some(alpha) = self.alpha else {
            return raw;
        };
        let next = match self.ema {
            Some(prev) => prev + alpha * (raw - prev),
            None => raw,
        };
        self.ema = Some(next);
        next
    }
}

impl SignalEngine for Momentum {
    fn name(&self) -> &str {
        "momentum"
    }

    fn window_size(&self) -> usize {
        self.lookback + 1
    }

    fn compute(&mut self, window: &[f64]) -> f64 {
        let w = tail(window, self.window_size());
        if w.len() < 2 {
            return 0.0;
        }
        let raw = w[w.len() - 1] - w[0];
        let change = self.smooth(raw);
        let dispersion = sample_std(&w[1..]);
        ratio(change, dispersion).tanh()
    }
}
