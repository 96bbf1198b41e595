//! Core types - the per-step data model

use serde::{Deserialize, Serialize};

/// Mid-price observation for one step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub step: u64,
    pub mid: f64,
}

/// Bounded predictive signal, always in [-1, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalValue {
    pub step: u64,
    pub value: f64,
}

impl SignalValue {
    pub fn neutral(step: u64) -> Self {
        Self { step, value: 0.0 }
    }
}

/// Two-sided quote. A zero size means that side is not quoted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub step: u64,
    pub bid_price: f64,
    pub bid_size: u64,
    pub ask_price: f64,
    pub ask_size: u64,
}

impl Quote {
    pub fn spread(&self) -> f64 {
        self.ask_price - self.bid_price
    }

    pub fn is_crossed(&self) -> bool {
        !(self.bid_price < self.ask_price)
    }

    /// Number of sides with a non-zero size
    pub fn quoted_sides(&self) -> u32 {
        u32::from(self.bid_size > 0) + u32::from(self.ask_size > 0)
    }
}

/// Trade side from the counterparty's point of view.
/// `Buy` lifts our ask (we sell), `Sell` hits our bid (we buy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Signed change in the agent's inventory per unit filled
    pub fn inventory_sign(&self) -> i64 {
        match self {
            Side::Buy => -1,
            Side::Sell => 1,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Execution against one side of our quote
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub step: u64,
    pub side: Side,
    pub price: f64,
    pub size: u64,
    /// Forced stop-loss liquidation rather than a quote fill
    #[serde(default)]
    pub liquidation: bool,
}

impl Fill {
    /// Cash received by the agent (negative when the agent pays)
    pub fn cash_flow(&self) -> f64 {
        let notional = self.price * self.size as f64;
        match self.side {
            Side::Buy => notional,
            Side::Sell => -notional,
        }
    }

    /// Signed inventory change for the agent; `None` if the size does not
    /// fit in an `i64`
    pub fn position_delta(&self) -> Option<i64> {
        i64::try_from(self.size)
            .ok()
            .map(|size| self.side.inventory_sign() * size)
    }
}

/// Agent inventory and PnL snapshot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InventoryState {
    pub position: i64,
    pub cash: f64,
    /// Cumulative net cash flow from fills
    pub realized_pnl: f64,
    /// `position * mid + cash - initial_cash`
    pub mark_to_market_pnl: f64,
    pub halted: bool,
}

impl InventoryState {
    pub fn flat(initial_cash: f64) -> Self {
        Self {
            position: 0,
            cash: initial_cash,
            realized_pnl: 0.0,
            mark_to_market_pnl: 0.0,
            halted: false,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.position == 0
    }
}

/// Hard risk limits for one run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskLimits {
    pub max_abs_position: u64,
    /// Negative loss level; `-inf` disables the stop-loss
    pub stop_loss_threshold: f64,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_abs_position: 50,
            stop_loss_threshold: f64::NEG_INFINITY,
        }
    }
}

impl RiskLimits {
    pub fn stop_loss_enabled(&self) -> bool {
        self.stop_loss_threshold.is_finite()
    }
}

/// Everything that happened in one simulation step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub price: PricePoint,
    pub signal: SignalValue,
    pub quote: Quote,
    pub fills: Vec<Fill>,
    pub inventory: InventoryState,
}

impl StepRecord {
    pub fn step(&self) -> u64 {
        self.price.step
    }

    /// Fills that came from our quotes (excludes stop-loss liquidation)
    pub fn quote_fills(&self) -> impl Iterator<Item = &Fill> {
        self.fills.iter().filter(|f| !f.liquidation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_cash_flow_and_delta() {
        let ask_lift = Fill {
            step: 3,
            side: Side::Buy,
            price: 100.5,
            size: 2,
            liquidation: false,
        };
        assert_eq!(ask_lift.cash_flow(), 201.0);
        assert_eq!(ask_lift.position_delta(), Some(-2));

        let bid_hit = Fill {
            side: Side::Sell,
            ..ask_lift
        };
        assert_eq!(bid_hit.cash_flow(), -201.0);
        assert_eq!(bid_hit.position_delta(), Some(2));

        let oversized = Fill {
            size: 1 << 63,
            ..ask_lift
        };
        assert_eq!(oversized.position_delta(), None);
    }

    #[test]
    fn test_quote_crossed_and_sides() {
        let q = Quote {
            step: 0,
            bid_price: 99.99,
            bid_size: 1,
            ask_price: 100.01,
            ask_size: 0,
        };
        assert!(!q.is_crossed());
        assert_eq!(q.quoted_sides(), 1);

        let crossed = Quote {
            ask_price: 99.99,
            ..q
        };
        assert!(crossed.is_crossed());
    }

    #[test]
    fn test_side_serde_lowercase() {
        let json = serde_json::to_string(&Side::Buy).unwrap();
        assert_eq!(json, "\"buy\"");
    }
}
