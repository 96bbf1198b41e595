//! Mean reversion - fade deviations from the rolling mean

use super::{mean, ratio, sample_std, tail, SignalEngine};

/// `-zscore(p[t]) / z_scale` over the last `window` prices
#[derive(Debug, Clone)]
pub struct MeanReversion {
    window: usize,
    z_scale: f64,
}

impl MeanReversion {
    pub fn new(window: usize, z_scale: f64) -> Self {
        Self { window, z_scale }
    }
}

impl SignalEngine for MeanReversion {
    fn name(&self) -> &str {
        "mean_reversion"
    }

    fn window_size(&self) -> usize {
        self.window
    }

    fn compute(&mut self, window: &[f64]) -> f64 {
        let w = tail(window, self.window);
        let Some(&last) = w.last() else {
            return 0.0;
        };
        let z = ratio(last - mean(w), sample_std(w));
        -z / self.z_scale
    }
}
