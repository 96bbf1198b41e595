//! Execution simulator - probabilistic fills against our quotes
//!
//! Each side fills independently with
//! `p = base_fill_prob * exp(-decay * |quote - reference_mid|)`, clamped to
//! [0, 1]. Two uniforms are drawn every step in a fixed order (bid, then ask),
//! even for unquoted sides, so the random stream never depends on sizing.

use rand::Rng;
use std::collections::VecDeque;
use tracing::debug;

use crate::core::{Error, ExecutionConfig, Fill, PricePoint, Quote, Result, Side};

#[derive(Debug, Clone)]
pub struct ExecutionSimulator {
    config: ExecutionConfig,
    /// Last `latency_steps + 1` mids, oldest first
    mids: VecDeque<f64>,
}

impl ExecutionSimulator {
    pub fn new(config: ExecutionConfig) -> Result<Self> {
        config.validate()?;
        let capacity = config.latency_steps + 1;
        Ok(Self {
            config,
            mids: VecDeque::with_capacity(capacity),
        })
    }

    /// Record the live mid for this step
    pub fn observe(&mut self, price: &PricePoint) {
        self.mids.push_back(price.mid);
        while self.mids.len() > self.config.latency_steps + 1 {
            self.mids.pop_front();
        }
    }

    /// Mid used for fill decisions: `latency_steps` behind the live mid, or
    /// the oldest mid seen while the lag buffer is still filling
    pub fn reference_mid(&self) -> Option<f64> {
        self.mids.front().copied()
    }

    pub fn fill_probability(&self, quote_price: f64, reference_mid: f64) -> f64 {
        let distance = (quote_price - reference_mid).abs();
        (self.config.base_fill_prob * (-self.config.aggressiveness_decay * distance).exp())
            .clamp(0.0, 1.0)
    }

    /// Decide fills for this step's quote. Call `observe` for the step first.
    pub fn execute<R: Rng>(&self, quote: &Quote, rng: &mut R) -> Result<Vec<Fill>> {
        let reference = self.reference_mid().ok_or_else(|| {
            Error::invariant(quote.step, "execution called before any mid was observed")
        })?;

        let bid_draw: f64 = rng.random();
        let ask_draw: f64 = rng.random();

        let p_bid = self.checked_probability(quote.step, quote.bid_price, reference)?;
        let p_ask = self.checked_probability(quote.step, quote.ask_price, reference)?;

        let mut fills = Vec::with_capacity(2);
        if quote.bid_size > 0 && bid_draw < p_bid {
            fills.push(Fill {
                step: quote.step,
                side: Side::Sell,
                price: quote.bid_price,
                size: quote.bid_size,
                liquidation: false,
            });
        }
        if quote.ask_size > 0 && ask_draw < p_ask {
            fills.push(Fill {
                step: quote.step,
                side: Side::Buy,
                price: quote.ask_price,
                size: quote.ask_size,
                liquidation: false,
            });
        }

        for fill in &fills {
            debug!(
                step = fill.step,
                side = %fill.side,
                price = fill.price,
                size = fill.size,
                reference_mid = reference,
                "quote filled"
            );
        }
        Ok(fills)
    }

    fn checked_probability(&self, step: u64, quote_price: f64, reference: f64) -> Result<f64> {
        let p = self.fill_probability(quote_price, reference);
        if !(0.0..=1.0).contains(&p) {
            return Err(Error::invariant(
                step,
                format!("fill probability {} outside [0, 1]", p),
            ));
        }
        Ok(p)
    }
}
