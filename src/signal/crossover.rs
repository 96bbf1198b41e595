//! Moving-average crossover

use super::{mean, ratio, sample_std, tail, SignalEngine};

/// `tanh((sma_short - sma_long) / std_long)`
#[derive(Debug, Clone)]
pub struct Crossover {
    short: usize,
    long: usize,
}

impl Crossover {
    pub fn new(short: usize, long: usize) -> Self {
        Self { short, long }
    }
}

impl SignalEngine for Crossover {
    fn name(&self) -> &str {
        "crossover"
    }

    fn window_size(&self) -> usize {
        self.long
    }

    fn compute(&mut self, window: &[f64]) -> f64 {
        let w = tail(window, self.long);
        let fast = mean(tail(w, self.short));
        let slow = mean(w);
        ratio(fast - slow, sample_std(w)).tanh()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rising_prices_cross_up() {
        let mut c = Crossover::new(3, 10);
        let window: Vec<f64> = (0..10).map(|i| 50.0 + i as f64 * 0.1).collect();
        assert!(c.compute(&window) > 0.0);
    }

    #[test]
    fn test_falling_prices_cross_down() {
        let mut c = Crossover::new(3, 10);
        let window: Vec<f64> = (0..10).map(|i| 50.0 - i as f64 * 0.1).collect();
        assert!(c.compute(&window) < 0.0);
    }
}
