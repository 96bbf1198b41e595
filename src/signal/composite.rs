//! Weighted blend of independently bounded sub-signals

use super::{bound, tail, SignalEngine, SignalStrategy};

#[derive(Debug, Clone)]
pub struct Composite {
    components: Vec<(SignalStrategy, f64)>,
    total_weight: f64,
}

impl Composite {
    /// Weights are validated by `SignalConfig::validate`; their absolute sum
    /// must be positive.
    pub fn new(components: Vec<(SignalStrategy, f64)>) -> Self {
        let total_weight = components.iter().map(|(_, w)| w.abs()).sum();
        Self {
            components,
            total_weight,
        }
    }
}

impl SignalEngine for Composite {
    fn name(&self) -> &str {
        "composite"
    }

    fn window_size(&self) -> usize {
        self.components
            .iter()
            .map(|(s, _)| s.window_size())
            .max()
            .unwrap_or(1)
    }

    fn compute(&mut self, window: &[f64]) -> f64 {
        if self.total_weight <= 0.0 {
            return 0.0;
        }
        let blended: f64 = self
            .components
            .iter_mut()
            .map(|(strategy, weight)| {
                let n = strategy.window_size();
                *weight * bound(strategy.compute(tail(window, n)))
            })
            .sum();
        bound(blended / self.total_weight)
    }
}
