//! Range breakout

use super::{tail, SignalEngine};

/// +1 when the current price clears the high of the previous `window`
/// prices, -1 when it breaks the low, 0 inside the range
#[derive(Debug, Clone)]
pub struct Breakout {
    window: usize,
}

impl Breakout {
    pub fn new(window: usize) -> Self {
        Self { window }
    }
}

impl SignalEngine for Breakout {
    fn name(&self) -> &str {
        "breakout"
    }

    fn window_size(&self) -> usize {
        self.window + 1
    }

    fn compute(&mut self, window: &[f64]) -> f64 {
        let w = tail(window, self.window + 1);
        let Some((&last, prior)) = w.split_last() else {
            return 0.0;
        };
        if prior.is_empty() {
            return 0.0;
        }
        let high = prior.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let low = prior.iter().copied().fold(f64::INFINITY, f64::min);
        if last > high {
            1.0
        } else if last < low {
            -1.0
        } else {
            0.0
        }
    }
}
