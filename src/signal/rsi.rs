//! Relative strength index, recentred and squashed to [-1, 1]

use super::{tail, SignalEngine};

/// `tanh((rsi - 50) / 10)` using simple averages over `period` changes
#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    pub fn rsi(&self, window: &[f64]) -> Option<f64> {
        let w = tail(window, self.period + 1);
        if w.len() < 2 {
            return None;
        }
        let (gains, losses) = w.windows(2).fold((0.0, 0.0), |(g, l), pair| {
            let change = pair[1] - pair[0];
            if change > 0.0 {
                (g + change, l)
            } else {
                (g, l - change)
            }
        });
        if gains + losses == 0.0 {
            // no movement at all
            return Some(50.0);
        }
        let n = (w.len() - 1) as f64;
        let rs = (gains / n) / (losses / n + 1e-9);
        Some(100.0 - 100.0 / (1.0 + rs))
    }
}

impl SignalEngine for Rsi {
    fn name(&self) -> &str {
        "rsi"
    }

    fn window_size(&self) -> usize {
        self.period + 1
    }

    fn compute(&mut self, window: &[f64]) -> f64 {
        match self.rsi(window) {
            Some(rsi) => ((rsi - 50.0) / 10.0).tanh(),
            None => 0.0,
        }
    }
}
