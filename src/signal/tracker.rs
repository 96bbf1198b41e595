//! Rolling price history feeding a signal strategy

use std::collections::VecDeque;

use super::{bound, sample_std, SignalEngine, SignalStrategy};
use crate::core::{PricePoint, Result, SignalConfig, SignalValue};

/// Owns the history ring buffer for one run.
///
/// Until `window_size` prices have been seen the signal is exactly 0. After
/// that every value is clamped to [-1, 1]. Only prices up to and including
/// the current step are ever visible to the strategy.
#[derive(Debug, Clone)]
pub struct SignalTracker {
    strategy: SignalStrategy,
    history: VecDeque<f64>,
    window_size: usize,
    capacity: usize,
    /// Most recent prices used by `realized_volatility`
    volatility_window: usize,
}

impl SignalTracker {
    pub fn new(strategy: SignalStrategy) -> Self {
        let window_size = strategy.window_size().max(1);
        Self {
            strategy,
            history: VecDeque::with_capacity(window_size + 1),
            window_size,
            capacity: window_size,
            volatility_window: window_size,
        }
    }

    pub fn from_config(config: &SignalConfig) -> Result<Self> {
        Ok(Self::new(SignalStrategy::from_config(config)?))
    }

    /// Measure realized volatility over the last `n` prices. The history
    /// grows to `n` if the strategy needs fewer.
    pub fn with_volatility_window(mut self, n: usize) -> Self {
        self.volatility_window = n;
        self.capacity = self.capacity.max(n);
        self
    }

    pub fn strategy(&self) -> &SignalStrategy {
        &self.strategy
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Record the step's mid and produce that step's signal
    pub fn update(&mut self, point: &PricePoint) -> SignalValue {
        self.history.push_back(point.mid);
        while self.history.len() > self.capacity {
            self.history.pop_front();
        }
        if self.history.len() < self.window_size {
            return SignalValue::neutral(point.step);
        }

        let prices = self.history.make_contiguous();
        let window = &prices[prices.len() - self.window_size..];
        SignalValue {
            step: point.step,
            value: bound(self.strategy.compute(window)),
        }
    }

    /// Std of one-step price changes over the last `volatility_window` prices
    pub fn realized_volatility(&self) -> f64 {
        let n = self.history.len().min(self.volatility_window);
        if n < 3 {
            return 0.0;
        }
        let recent = self.history.range(self.history.len() - n..);
        let changes: Vec<f64> = recent
            .clone()
            .zip(recent.skip(1))
            .map(|(prev, cur)| cur - prev)
            .collect();
        sample_std(&changes)
    }
}
