//! Risk manager - inventory/cash bookkeeping, hard limits and stop-loss halt.

use tracing::warn;

use crate::core::config::validate_risk_limits;
use crate::core::{Error, Fill, InventoryState, PricePoint, Result, RiskLimits, Side};

/// Sole owner of the run's `InventoryState`.
///
/// Once the stop-loss fires the manager liquidates at mid and stays halted
/// for the rest of the run; any later fill is an invariant violation.
#[derive(Debug, Clone)]
pub struct RiskManager {
    limits: RiskLimits,
    initial_cash: f64,
    state: InventoryState,
    halted_at: Option<u64>,
}

impl RiskManager {
    pub fn new(limits: RiskLimits, initial_cash: f64) -> Result<Self> {
        validate_risk_limits(&limits)?;
        if !initial_cash.is_finite() {
            return Err(Error::config("initial_cash must be finite"));
        }
        Ok(Self {
            limits,
            initial_cash,
            state: InventoryState::flat(initial_cash),
            halted_at: None,
        })
    }

    pub fn limits(&self) -> &RiskLimits {
        &self.limits
    }

    pub fn state(&self) -> InventoryState {
        self.state
    }

    pub fn position(&self) -> i64 {
        self.state.position
    }

    pub fn is_halted(&self) -> bool {
        self.state.halted
    }

    /// Step at which the stop-loss fired
    pub fn halted_at(&self) -> Option<u64> {
        self.halted_at
    }

    /// Apply one step's fills, mark to the step's mid and run the stop-loss.
    ///
    /// Returns the fills as recorded (including any liquidation fill) and the
    /// post-step inventory snapshot.
    pub fn apply(
        &mut self,
        price: &PricePoint,
        mut fills: Vec<Fill>,
    ) -> Result<(Vec<Fill>, InventoryState)> {
        if self.state.halted && !fills.is_empty() {
            return Err(Error::invariant(
                price.step,
                format!("{} fill(s) received after stop-loss halt", fills.len()),
            ));
        }

        for fill in &fills {
            self.apply_fill(fill)?;
        }
        self.mark(price.mid);

        if !self.state.halted
            && self.limits.stop_loss_enabled()
            && self.state.mark_to_market_pnl < self.limits.stop_loss_threshold
        {
            let breach_pnl = self.state.mark_to_market_pnl;
            let open = self.state.position;
            if !self.state.is_flat() {
                let liquidation = Fill {
                    step: price.step,
                    side: if open > 0 { Side::Buy } else { Side::Sell },
                    price: price.mid,
                    size: open.unsigned_abs(),
                    liquidation: true,
                };
                self.apply_fill(&liquidation)?;
                fills.push(liquidation);
            }
            self.state.halted = true;
            self.halted_at = Some(price.step);
            self.mark(price.mid);

            warn!(
                step = price.step,
                mid = price.mid,
                liquidated = open,
                pnl = breach_pnl,
                threshold = self.limits.stop_loss_threshold,
                "🛑 stop-loss breached, flattening and halting quotes"
            );
        }

        Ok((fills, self.state))
    }

    fn apply_fill(&mut self, fill: &Fill) -> Result<()> {
        let delta = fill.position_delta().ok_or_else(|| {
            Error::invariant(fill.step, format!("fill size {} exceeds i64 range", fill.size))
        })?;
        let next = self
            .state
            .position
            .checked_add(delta)
            .ok_or_else(|| Error::invariant(fill.step, "position overflow"))?;
        if next.unsigned_abs() > self.limits.max_abs_position {
            return Err(Error::invariant(
                fill.step,
                format!(
                    "position {} + fill {} {} exceeds max {}",
                    self.state.position, fill.side, fill.size, self.limits.max_abs_position
                ),
            ));
        }
        self.state.position = next;
        self.state.cash += fill.cash_flow();
        self.state.realized_pnl = self.state.cash - self.initial_cash;
        Ok(())
    }

    /// Fresh mark-to-market; never accumulated incrementally
    fn mark(&mut self, mid: f64) {
        self.state.mark_to_market_pnl =
            self.state.position as f64 * mid + self.state.cash - self.initial_cash;
    }
}
