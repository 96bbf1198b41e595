//! Quote generation - inventory skew, signal bias and position-limit sizing

use crate::core::{Error, PricePoint, Quote, QuoteConfig, Result, RiskLimits, SignalValue};

/// Builds the two-sided quote for a step.
///
/// The center moves away from inventory (long inventory lowers both sides)
/// and toward the signal. A side whose fill would breach the position limit
/// is quoted at size 0, as are both sides once the run is halted.
#[derive(Debug, Clone)]
pub struct QuoteGenerator {
    config: QuoteConfig,
    limits: RiskLimits,
}

impl QuoteGenerator {
    pub fn new(config: QuoteConfig, limits: RiskLimits) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, limits })
    }

    pub fn config(&self) -> &QuoteConfig {
        &self.config
    }

    /// `mid - skew * position`
    pub fn reservation_price(&self, mid: f64, position: i64) -> f64 {
        mid - self.config.inventory_skew_coefficient * position as f64
    }

    /// Half of the base spread, widened when realized volatility calls for it
    pub fn half_spread(&self, realized_vol: f64) -> f64 {
        let base = self.config.base_spread / 2.0;
        if self.config.volatility_multiplier > 0.0 && realized_vol.is_finite() {
            base.max(self.config.volatility_multiplier * realized_vol)
        } else {
            base
        }
    }

    /// (bid_size, ask_size) allowed at the current position
    pub fn sizes(&self, position: i64, halted: bool) -> (u64, u64) {
        if halted {
            return (0, 0);
        }
        let size = self.config.size_per_quote;
        let max = i128::from(self.limits.max_abs_position);
        let pos = i128::from(position);
        let bid_size = if pos + i128::from(size) > max { 0 } else { size };
        let ask_size = if pos - i128::from(size) < -max { 0 } else { size };
        (bid_size, ask_size)
    }

    pub fn quote(
        &self,
        price: &PricePoint,
        signal: &SignalValue,
        position: i64,
        halted: bool,
        realized_vol: f64,
    ) -> Result<Quote> {
        let center = self.reservation_price(price.mid, position)
            + self.config.signal_bias_coefficient * signal.value;
        let half_spread = self.half_spread(realized_vol);
        let (bid_size, ask_size) = self.sizes(position, halted);

        let quote = Quote {
            step: price.step,
            bid_price: center - half_spread,
            bid_size,
            ask_price: center + half_spread,
            ask_size,
        };

        if !quote.bid_price.is_finite() || !quote.ask_price.is_finite() || quote.is_crossed() {
            return Err(Error::invariant(
                price.step,
                format!(
                    "crossed or non-finite quote: bid {} / ask {}",
                    quote.bid_price, quote.ask_price
                ),
            ));
        }
        Ok(quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator(skew: f64, bias: f64) -> QuoteGenerator {
        let config = QuoteConfig {
            base_spread: 0.02,
            inventory_skew_coefficient: skew,
            signal_bias_coefficient: bias,
            size_per_quote: 1,
            volatility_multiplier: 0.0,
            volatility_window: 20,
        };
        let limits = RiskLimits {
            max_abs_position: 3,
            stop_loss_threshold: -100.0,
        };
        QuoteGenerator::new(config, limits).unwrap()
    }

    fn at(mid: f64) -> PricePoint {
        PricePoint { step: 1, mid }
    }

    fn signal(value: f64) -> SignalValue {
        SignalValue { step: 1, value }
    }

    #[test]
    fn test_symmetric_quote_when_flat() {
        let q = generator(0.01, 0.0).quote(&at(100.0), &signal(0.5), 0, false, 0.0).unwrap();
        assert!((q.bid_price - 99.99).abs() < 1e-12);
        assert!((q.ask_price - 100.01).abs() < 1e-12);
        assert_eq!((q.bid_size, q.ask_size), (1, 1));
    }

    #[test]
    fn test_long_inventory_skews_down() {
        let g = generator(0.01, 0.0);
        let q = g.quote(&at(100.0), &signal(0.0), 2, false, 0.0).unwrap();
        assert!((q.bid_price - 99.97).abs() < 1e-12);
        assert!((q.ask_price - 99.99).abs() < 1e-12);
    }

    #[test]
    fn test_bullish_signal_raises_both_sides() {
        let g = generator(0.0, 0.1);
        let q = g.quote(&at(100.0), &signal(1.0), 0, false, 0.0).unwrap();
        assert!(q.bid_price > 100.0);
        assert!((q.spread() - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_position_limit_zeroes_one_side() {
        let g = generator(0.0, 0.0);
        assert_eq!(g.sizes(3, false), (0, 1));
        assert_eq!(g.sizes(-3, false), (1, 0));
        assert_eq!(g.sizes(2, false), (1, 1));
        assert_eq!(g.sizes(0, true), (0, 0));
    }

    #[test]
    fn test_volatility_widening() {
        let mut config = generator(0.0, 0.0).config().clone();
        config.volatility_multiplier = 2.0;
        let g = QuoteGenerator::new(config, RiskLimits::default()).unwrap();
        assert_eq!(g.half_spread(0.001), 0.01);
        assert!((g.half_spread(0.05) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_collapsed_spread_is_invariant_violation() {
        // half-spread below f64 resolution at this price level
        let config = QuoteConfig {
            base_spread: 1e-30,
            ..generator(0.0, 0.0).config().clone()
        };
        let g = QuoteGenerator::new(config, RiskLimits::default()).unwrap();
        let err = g.quote(&at(1e6), &signal(0.0), 0, false, 0.0).unwrap_err();
        assert!(err.is_invariant_violation());
    }

    #[test]
    fn test_rejects_non_positive_spread() {
        let config = QuoteConfig {
            base_spread: -0.01,
            ..QuoteConfig::default()
        };
        assert!(matches!(
            QuoteGenerator::new(config, RiskLimits::default()),
            Err(Error::Config(_))
        ));
    }
}
