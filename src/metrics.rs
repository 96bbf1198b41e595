//! Performance summary over a finished run's step records

use serde::{Deserialize, Serialize};

use crate::core::StepRecord;

/// 252 sessions of 390 one-minute bars
pub const TRADING_MINUTES_PER_YEAR: f64 = 252.0 * 390.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub steps: usize,
    /// Final mark-to-market PnL
    pub total_pnl: f64,
    pub realized_pnl: f64,
    pub final_position: i64,
    /// Worst `mtm - running peak` (peak starts at 0); always <= 0
    pub max_drawdown: f64,
    /// Annualized; `None` with fewer than two steps or flat PnL
    pub sharpe_ratio: Option<f64>,
    pub average_inventory: f64,
    pub max_abs_inventory: u64,
    /// Quote fills only; liquidation fills are excluded
    pub fill_count: usize,
    /// Quote fills / quoted sides
    pub hit_rate: f64,
    /// Σ |fill_price - mid| * size over quote fills
    pub spread_captured: f64,
    pub halted: bool,
}

impl PerformanceSummary {
    pub fn from_records(records: &[StepRecord], periods_per_year: f64) -> Self {
        let steps = records.len();
        let last = records.last().map(|r| r.inventory);

        let mut peak = 0.0_f64;
        let mut max_drawdown = 0.0_f64;
        let mut prev_mtm = 0.0;
        let mut changes = Vec::with_capacity(steps);
        let mut position_sum = 0.0;
        let mut max_abs_inventory = 0;
        let mut fill_count = 0;
        let mut quoted_sides = 0u64;
        let mut spread_captured = 0.0;

        for r in records {
            let mtm = r.inventory.mark_to_market_pnl;
            peak = peak.max(mtm);
            max_drawdown = max_drawdown.min(mtm - peak);
            changes.push(mtm - prev_mtm);
            prev_mtm = mtm;

            position_sum += r.inventory.position as f64;
            max_abs_inventory = max_abs_inventory.max(r.inventory.position.unsigned_abs());

            quoted_sides += u64::from(r.quote.quoted_sides());
            for fill in r.quote_fills() {
                fill_count += 1;
                spread_captured += (fill.price - r.price.mid).abs() * fill.size as f64;
            }
        }

        Self {
            steps,
            total_pnl: last.map(|s| s.mark_to_market_pnl).unwrap_or(0.0),
            realized_pnl: last.map(|s| s.realized_pnl).unwrap_or(0.0),
            final_position: last.map(|s| s.position).unwrap_or(0),
            max_drawdown,
            sharpe_ratio: sharpe(&changes, periods_per_year),
            average_inventory: if steps > 0 {
                position_sum / steps as f64
            } else {
                0.0
            },
            max_abs_inventory,
            fill_count,
            hit_rate: if quoted_sides > 0 {
                fill_count as f64 / quoted_sides as f64
            } else {
                0.0
            },
            spread_captured,
            halted: last.is_some_and(|s| s.halted),
        }
    }
}

fn sharpe(changes: &[f64], periods_per_year: f64) -> Option<f64> {
    if changes.len() < 2 {
        return None;
    }
    let n = changes.len() as f64;
    let mean = changes.iter().sum::<f64>() / n;
    let var = changes.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std = var.sqrt();
    if std == 0.0 || !std.is_finite() {
        return None;
    }
    Some(mean / std * periods_per_year.sqrt())
}
